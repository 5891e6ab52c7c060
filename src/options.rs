use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::budget::{Budget, BudgetReport};

/// Duplicate key handling policy for mappings.
///
/// Applies to keys written explicitly in one mapping. Keys spread in by a
/// merge (`<<`) are always overridable and never count as duplicates.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateKeyPolicy {
    /// Error out on encountering a duplicate key.
    Error,
    /// First key wins: later duplicate pairs are skipped.
    FirstWins,
    /// Last key wins: a later pair replaces the value but keeps the original position.
    LastWins,
}

/// Handling of an anchor name that is defined more than once in a document.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateAnchorPolicy {
    /// Reject the document with [`crate::Error::DuplicateAnchor`].
    Error,
    /// Aliases bind to the most recent definition, as plain YAML does. Both
    /// nodes keep their `anchor` annotation.
    LastWins,
}

/// Parser configuration options.
///
/// ```rust
/// use yaml_anchor_codec::{parse_with_options, DuplicateKeyPolicy};
///
/// let options = yaml_anchor_codec::options! {
///     budget: Some(yaml_anchor_codec::budget! {
///         max_aliases: 16,
///     }),
///     duplicate_keys: DuplicateKeyPolicy::LastWins,
/// };
///
/// let value = parse_with_options("a: 1\na: 2\n", options).unwrap();
/// assert_eq!(value.get("a").and_then(|v| v.as_i128()), Some(2));
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Optional budget enforced over the raw parser events.
    pub budget: Option<Budget>,
    /// Invoked with the final budget report, both on success and when the
    /// budget was breached.
    #[serde(skip)]
    pub budget_report_cb: Option<BudgetReportCallback>,
    /// Policy for duplicate keys.
    pub duplicate_keys: DuplicateKeyPolicy,
    /// Policy for anchors defined twice.
    pub duplicate_anchors: DuplicateAnchorPolicy,
    /// Maximum nesting of sequences and mappings, counted after alias expansion.
    pub max_depth: usize,
    /// Maximum number of nodes materialized by resolving aliases and merge keys.
    pub max_expanded_nodes: usize,
}

pub type BudgetReportCallback = Rc<std::cell::RefCell<dyn FnMut(BudgetReport) + 'static>>;

impl Options {
    /// Registers a budget-report callback. Any closure can be used, including
    /// ones that capture state from the surrounding scope.
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// use yaml_anchor_codec::{parse_with_options, Options};
    ///
    /// let aliases = Rc::new(Cell::new(0));
    /// let seen = aliases.clone();
    /// let options = Options::default().with_budget_report(move |report| seen.set(report.aliases));
    ///
    /// parse_with_options("a: &x [1]\nb: *x\nc: *x\n", options).unwrap();
    /// assert_eq!(aliases.get(), 2);
    /// ```
    pub fn with_budget_report<F>(mut self, cb: F) -> Self
    where
        F: FnMut(BudgetReport) + 'static,
    {
        self.budget_report_cb = Some(Rc::new(std::cell::RefCell::new(cb)));
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            budget: Some(Budget::default()),
            budget_report_cb: None,
            duplicate_keys: DuplicateKeyPolicy::Error,
            duplicate_anchors: DuplicateAnchorPolicy::Error,
            max_depth: 256,
            max_expanded_nodes: 1_000_000,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("budget", &self.budget)
            .field(
                "budget_report_cb",
                &if self.budget_report_cb.is_some() { "set" } else { "none" },
            )
            .field("duplicate_keys", &self.duplicate_keys)
            .field("duplicate_anchors", &self.duplicate_anchors)
            .field("max_depth", &self.max_depth)
            .field("max_expanded_nodes", &self.max_expanded_nodes)
            .finish()
    }
}

/// Emitter configuration options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    /// Drop sibling keys of a merge node when they equal the anchor's own
    /// value under the same key. With `false`, every sibling is written as
    /// an override.
    pub prune_inherited: bool,
    /// Collections nested deeper than this are written as `null`.
    pub max_depth: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            prune_inherited: true,
            max_depth: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let opts = Options::default();
        assert!(opts.budget.is_some());
        assert!(opts.budget_report_cb.is_none());
        assert_eq!(opts.duplicate_keys, DuplicateKeyPolicy::Error);
        assert_eq!(opts.duplicate_anchors, DuplicateAnchorPolicy::Error);
        assert_eq!(opts.max_depth, 256);
        assert!(GenerateOptions::default().prune_inherited);
        assert_eq!(GenerateOptions::default().max_depth, opts.max_depth);
    }

    #[test]
    fn test_options_debug_format() {
        let opts = Options::default();
        let debug_str = format!("{:?}", opts);
        assert!(debug_str.contains("budget_report_cb: \"none\""));

        let opts_with_cb = opts.with_budget_report(|_| {});
        let debug_str_cb = format!("{:?}", opts_with_cb);
        assert!(debug_str_cb.contains("budget_report_cb: \"set\""));
    }

    #[test]
    fn options_read_from_partial_json() {
        let opts: Options =
            serde_json::from_str(r#"{"duplicate_keys": "LastWins", "max_depth": 8}"#).unwrap();
        assert_eq!(opts.duplicate_keys, DuplicateKeyPolicy::LastWins);
        assert_eq!(opts.max_depth, 8);
        assert_eq!(opts.max_expanded_nodes, 1_000_000);
    }
}
