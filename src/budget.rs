//! Streaming budget checks over the raw saphyr-parser event stream.
//!
//! Anchors and merge keys make small YAML texts expand into large trees.
//! The enforcer here watches the events before any tree is built and stops
//! inputs that are clearly out of proportion.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use saphyr_parser::{Event, Parser, ScalarStyle, ScanError};

/// Budgets for a streaming YAML scan.
///
/// The defaults are permissive for typical configuration files while
/// stopping obvious resource-amplifying inputs.
///
/// ```rust
/// use yaml_anchor_codec::{parse_with_options, Budget, Options};
///
/// let yaml = "base: &b {x: 1}\nuse: *b\n";
///
/// let options = Options {
///     budget: Some(Budget::default()),
///     ..Options::default()
/// };
///
/// let value = parse_with_options(yaml, options).unwrap();
/// assert!(value.as_mapping().is_some());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Maximum total parser events (counting every event).
    ///
    /// Default: 1,000,000
    pub max_events: usize,
    /// Maximum number of alias (`*ref`) events allowed.
    ///
    /// Default: 50,000
    pub max_aliases: usize,
    /// Maximum number of aliases pointing at one anchor.
    ///
    /// Default: 10,000
    pub max_aliases_per_anchor: usize,
    /// Maximal total number of anchors (distinct `&anchor` definitions).
    ///
    /// Default: 50,000
    pub max_anchors: usize,
    /// Maximum structural nesting depth (sequences + mappings) in the raw stream.
    ///
    /// Default: 2,000
    pub max_depth: usize,
    /// Maximum number of *nodes* (SequenceStart/MappingStart/Scalar).
    ///
    /// Default: 250,000
    pub max_nodes: usize,
    /// Maximum total bytes of scalar contents.
    ///
    /// Default: 67,108,864 (64 MiB)
    pub max_total_scalar_bytes: usize,
    /// Maximum number of merge keys (`<<`).
    ///
    /// Default: 10,000
    pub max_merge_keys: usize,
    /// If `true`, flag inputs that use far more aliases than anchors.
    ///
    /// Default: true
    pub enforce_alias_anchor_ratio: bool,
    /// Minimum number of aliases before the alias/anchor ratio is evaluated.
    ///
    /// Default: 100
    pub alias_anchor_min_aliases: usize,
    /// A breach occurs when `aliases > alias_anchor_ratio_multiplier * anchors`,
    /// once [`Budget::alias_anchor_min_aliases`] is met.
    ///
    /// Default: 10
    pub alias_anchor_ratio_multiplier: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_events: 1_000_000,
            max_aliases: 50_000,
            max_aliases_per_anchor: 10_000,
            max_anchors: 50_000,
            max_depth: 2_000,
            max_nodes: 250_000,
            max_total_scalar_bytes: 64 * 1024 * 1024,
            max_merge_keys: 10_000,
            enforce_alias_anchor_ratio: true,
            alias_anchor_min_aliases: 100,
            alias_anchor_ratio_multiplier: 10,
        }
    }
}

/// What tripped the budget.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BudgetBreach {
    /// Exceeded [`Budget::max_events`].
    Events { events: usize },
    /// Exceeded [`Budget::max_aliases`].
    Aliases { aliases: usize },
    /// Exceeded [`Budget::max_aliases_per_anchor`] for the anchor with this parser id.
    AliasesPerAnchor { anchor_id: usize, aliases: usize },
    /// Exceeded [`Budget::max_anchors`].
    Anchors { anchors: usize },
    /// Exceeded [`Budget::max_depth`].
    Depth { depth: usize },
    /// Exceeded [`Budget::max_nodes`].
    Nodes { nodes: usize },
    /// Exceeded [`Budget::max_total_scalar_bytes`].
    ScalarBytes { total_scalar_bytes: usize },
    /// Exceeded [`Budget::max_merge_keys`].
    MergeKeys { merge_keys: usize },
    /// Too many aliases relative to the anchors they use.
    AliasAnchorRatio { aliases: usize, anchors: usize },
    /// A closing event without a matching opening event.
    Unbalanced,
}

/// Summary of the scan (even if no breach).
#[derive(Clone, Debug, Default)]
pub struct BudgetReport {
    /// `Some(..)` if a limit was exceeded.
    pub breached: Option<BudgetBreach>,
    pub events: usize,
    pub aliases: usize,
    /// Distinct anchors defined (by parser id).
    pub anchors: usize,
    /// Scalars plus sequence and mapping starts.
    pub nodes: usize,
    pub max_depth: usize,
    pub total_scalar_bytes: usize,
    pub merge_keys: usize,
}

/// Stateful helper that enforces a [`Budget`] while consuming a stream of [`Event`]s.
#[derive(Debug)]
pub struct BudgetEnforcer {
    budget: Budget,
    report: BudgetReport,
    depth: usize,
    defined_anchors: HashSet<usize>,
    alias_uses: HashMap<usize, usize>,
    // `true` for a mapping waiting for its next key.
    containers: Vec<Option<bool>>,
}

impl BudgetEnforcer {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            report: BudgetReport::default(),
            depth: 0,
            defined_anchors: HashSet::new(),
            alias_uses: HashMap::new(),
            containers: Vec::with_capacity(32),
        }
    }

    /// Observe a parser [`Event`], updating the internal counters.
    ///
    /// Returns `Err(BudgetBreach)` as soon as a limit is exceeded.
    pub fn observe(&mut self, ev: &Event) -> Result<(), BudgetBreach> {
        self.report.events += 1;
        if self.report.events > self.budget.max_events {
            return Err(BudgetBreach::Events {
                events: self.report.events,
            });
        }

        match ev {
            Event::Alias(anchor_id) => {
                self.report.aliases += 1;
                if self.report.aliases > self.budget.max_aliases {
                    return Err(BudgetBreach::Aliases {
                        aliases: self.report.aliases,
                    });
                }
                let uses = self.alias_uses.entry(*anchor_id).or_insert(0);
                *uses += 1;
                if *uses > self.budget.max_aliases_per_anchor {
                    return Err(BudgetBreach::AliasesPerAnchor {
                        anchor_id: *anchor_id,
                        aliases: *uses,
                    });
                }
                self.node_done();
            }
            Event::Scalar(value, style, anchor_id, tag) => {
                self.bump_nodes()?;
                self.report.total_scalar_bytes =
                    self.report.total_scalar_bytes.saturating_add(value.len());
                if self.report.total_scalar_bytes > self.budget.max_total_scalar_bytes {
                    return Err(BudgetBreach::ScalarBytes {
                        total_scalar_bytes: self.report.total_scalar_bytes,
                    });
                }
                self.record_anchor(*anchor_id)?;
                if self.expecting_key() && is_merge_key(value, style, tag.is_some()) {
                    self.report.merge_keys += 1;
                    if self.report.merge_keys > self.budget.max_merge_keys {
                        return Err(BudgetBreach::MergeKeys {
                            merge_keys: self.report.merge_keys,
                        });
                    }
                }
                self.node_done();
            }
            Event::SequenceStart(anchor_id, _) => {
                self.enter(None)?;
                self.record_anchor(*anchor_id)?;
            }
            Event::MappingStart(anchor_id, _) => {
                self.enter(Some(true))?;
                self.record_anchor(*anchor_id)?;
            }
            Event::SequenceEnd | Event::MappingEnd => {
                self.depth = self.depth.checked_sub(1).ok_or(BudgetBreach::Unbalanced)?;
                self.containers.pop().ok_or(BudgetBreach::Unbalanced)?;
                self.node_done();
            }
            Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart(_)
            | Event::DocumentEnd
            | Event::Nothing => {}
        }

        Ok(())
    }

    fn enter(&mut self, container: Option<bool>) -> Result<(), BudgetBreach> {
        self.bump_nodes()?;
        self.depth = self.depth.saturating_add(1);
        self.report.max_depth = self.report.max_depth.max(self.depth);
        if self.depth > self.budget.max_depth {
            return Err(BudgetBreach::Depth { depth: self.depth });
        }
        self.containers.push(container);
        Ok(())
    }

    fn bump_nodes(&mut self) -> Result<(), BudgetBreach> {
        self.report.nodes += 1;
        if self.report.nodes > self.budget.max_nodes {
            return Err(BudgetBreach::Nodes {
                nodes: self.report.nodes,
            });
        }
        Ok(())
    }

    fn record_anchor(&mut self, anchor_id: usize) -> Result<(), BudgetBreach> {
        if anchor_id != 0 && self.defined_anchors.insert(anchor_id) {
            let count = self.defined_anchors.len();
            if count > self.budget.max_anchors {
                self.report.anchors = count;
                return Err(BudgetBreach::Anchors { anchors: count });
            }
        }
        self.report.anchors = self.defined_anchors.len();
        Ok(())
    }

    fn expecting_key(&self) -> bool {
        matches!(self.containers.last(), Some(Some(true)))
    }

    /// A complete node was seen: a mapping parent flips between key and value.
    fn node_done(&mut self) {
        if let Some(Some(expecting_key)) = self.containers.last_mut() {
            *expecting_key = !*expecting_key;
        }
    }

    /// Consume the enforcer and return the accumulated [`BudgetReport`].
    pub fn into_report(mut self) -> BudgetReport {
        self.report.anchors = self.defined_anchors.len();
        self.report
    }

    /// Finalize the enforcement, performing the alias/anchor ratio heuristic.
    pub fn finalize(mut self) -> BudgetReport {
        self.report.anchors = self.defined_anchors.len();

        if self.budget.enforce_alias_anchor_ratio
            && self.report.aliases >= self.budget.alias_anchor_min_aliases
            && (self.report.anchors == 0
                || self.report.aliases
                    > self
                        .budget
                        .alias_anchor_ratio_multiplier
                        .saturating_mul(self.report.anchors))
        {
            self.report.breached = Some(BudgetBreach::AliasAnchorRatio {
                aliases: self.report.aliases,
                anchors: self.report.anchors,
            });
        }

        self.report
    }
}

fn is_merge_key(value: &Cow<'_, str>, style: &ScalarStyle, has_tag: bool) -> bool {
    !has_tag && matches!(style, ScalarStyle::Plain) && value.as_ref() == "<<"
}

/// Check YAML text against the given `Budget` without building any tree.
///
/// Returns:
/// - `Ok(report)`: `report.breached.is_none()` means within budget.
/// - `Err(ScanError)`: scanning failed.
pub fn check_budget(input: &str, budget: &Budget) -> Result<BudgetReport, ScanError> {
    let mut parser = Parser::new_from_str(input);
    let mut enforcer = BudgetEnforcer::new(budget.clone());

    while let Some(item) = parser.next() {
        let (ev, _span) = item?;
        if let Err(breach) = enforcer.observe(&ev) {
            let mut report = enforcer.into_report();
            report.breached = Some(breach);
            return Ok(report);
        }
    }

    Ok(enforcer.finalize())
}
