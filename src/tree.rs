//! Helpers that inspect and edit anchors and references in a value tree.
//!
//! Editing helpers never modify their input; they return an edited copy.

use std::fmt;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::path::{Path, PathSegment};
use crate::value::{AnnotatedValue, Mapping};

/// Key under the root that holds anchors created by [`create_anchor`].
pub(crate) const DEFAULTS_KEY: &str = "defaults";

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// The path text cannot be parsed, or cannot be used for this operation.
    BadPath { path: String },
    /// Nothing at this path.
    NotFound { path: String },
    /// The node at this path is not a mapping.
    NotAMapping { path: String },
    /// An anchor with this name is already defined.
    AnchorExists { name: String },
    /// No anchor with this name is defined.
    AnchorMissing { name: String },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::BadPath { path } => write!(f, "invalid path `{path}`"),
            TreeError::NotFound { path } => write!(f, "no node at `{path}`"),
            TreeError::NotAMapping { path } => write!(f, "node at `{path}` is not a mapping"),
            TreeError::AnchorExists { name } => write!(f, "anchor `{name}` is already defined"),
            TreeError::AnchorMissing { name } => write!(f, "anchor `{name}` is not defined"),
        }
    }
}

impl std::error::Error for TreeError {}

/// An anchor definition found in a tree.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorInfo {
    pub name: String,
    pub path: Path,
    /// The anchored node without its own `anchor`.
    pub data: AnnotatedValue,
}

/// A node produced from an anchor (alias copy or merge).
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceInfo {
    pub path: Path,
    pub anchor: String,
    pub data: AnnotatedValue,
}

/// Every anchored mapping and sequence, keyed by anchor name, in document
/// order. A later definition of a name replaces the earlier one.
///
/// ```rust
/// let value = yaml_anchor_codec::parse("a: &x {k: 1}\nb: [&y [1]]\n").unwrap();
/// let anchors = yaml_anchor_codec::find_anchors(&value);
/// assert_eq!(anchors["x"].path.to_string(), "a");
/// assert_eq!(anchors["y"].path.to_string(), "b[0]");
/// assert_eq!(anchors["x"].data.anchor(), None);
/// ```
pub fn find_anchors(value: &AnnotatedValue) -> IndexMap<String, AnchorInfo> {
    let mut anchors = IndexMap::new();
    walk(value, &Path::root(), &mut |node, path| {
        if let Some(name) = node.anchor() {
            let mut data = node.clone();
            data.set_anchor(None);
            anchors.insert(
                name.to_owned(),
                AnchorInfo {
                    name: name.to_owned(),
                    path: path.clone(),
                    data,
                },
            );
        }
    });
    anchors
}

/// Every node carrying `reference_of`, in document order.
pub fn find_references(value: &AnnotatedValue) -> Vec<ReferenceInfo> {
    let mut references = Vec::new();
    walk(value, &Path::root(), &mut |node, path| {
        if let Some(anchor) = node.reference_of() {
            references.push(ReferenceInfo {
                path: path.clone(),
                anchor: anchor.to_owned(),
                data: node.clone(),
            });
        }
    });
    references
}

/// Node at `path`, if any.
pub fn get<'v>(value: &'v AnnotatedValue, path: &Path) -> Option<&'v AnnotatedValue> {
    path.lookup(value)
}

/// Turn the mapping at `path` into a reusable anchor.
///
/// A copy of the node is stored as `defaults.<name>` with `anchor = name`,
/// and the node itself is replaced by a copy with `reference_of = name`.
/// A new `defaults` mapping is created when missing; `defaults` is moved to
/// the front of the root so the anchor precedes its aliases.
///
/// ```rust
/// use yaml_anchor_codec::{create_anchor, generate, parse, Path};
///
/// let value = parse("server:\n  host: example.org\n  port: 80\n").unwrap();
/// let edited = create_anchor(&value, &Path::parse("server").unwrap(), "srv").unwrap();
///
/// assert_eq!(edited.get("server").unwrap().reference_of(), Some("srv"));
/// let yaml = generate(&edited);
/// assert!(yaml.contains("defaults:\n  srv: &srv\n    host: example.org\n"));
/// assert!(yaml.contains("server: *srv\n"));
/// ```
pub fn create_anchor(value: &AnnotatedValue, path: &Path, name: &str) -> Result<AnnotatedValue, TreeError> {
    if path.is_root() {
        return Err(TreeError::BadPath {
            path: path.to_string(),
        });
    }
    let target = mapping_at(value, path)?;
    if find_anchors(value).contains_key(name) {
        return Err(TreeError::AnchorExists { name: name.to_owned() });
    }

    let mut definition = target.clone();
    definition.anchor = Some(name.to_owned());
    definition.reference_of = None;

    let mut reference = target.clone();
    reference.reference_of = Some(name.to_owned());
    reference
        .entries
        .values_mut()
        .for_each(AnnotatedValue::strip_anchors);

    let mut edited = value.clone();
    replace_at(&mut edited, path, AnnotatedValue::Mapping(reference))?;

    let root = edited.as_mapping_mut().ok_or_else(|| TreeError::NotAMapping {
        path: String::new(),
    })?;
    match root.entries.get_index_of(DEFAULTS_KEY) {
        Some(idx) => root.entries.move_index(idx, 0),
        None => {
            root.entries
                .shift_insert(0, DEFAULTS_KEY.to_owned(), AnnotatedValue::Mapping(Mapping::new()));
        }
    }
    let Some((_, AnnotatedValue::Mapping(defaults))) = root.entries.get_index_mut(0) else {
        return Err(TreeError::NotAMapping {
            path: DEFAULTS_KEY.to_owned(),
        });
    };
    defaults
        .entries
        .insert(name.to_owned(), AnnotatedValue::Mapping(definition));
    Ok(edited)
}

/// Point the node at `path` to the anchor `name`.
///
/// The node becomes the anchor's data plus every key of the current node
/// that the anchor lacks, with `reference_of = name`. An anchored sequence
/// replaces the node as a plain alias copy.
pub fn set_reference(value: &AnnotatedValue, path: &Path, name: &str) -> Result<AnnotatedValue, TreeError> {
    let anchors = find_anchors(value);
    let info = anchors.get(name).ok_or_else(|| TreeError::AnchorMissing { name: name.to_owned() })?;
    let current = path.lookup(value).ok_or_else(|| TreeError::NotFound {
        path: path.to_string(),
    })?;

    let mut replacement = info.data.clone();
    replacement.strip_anchors();
    replacement.set_reference_of(Some(name.to_owned()));
    if let (AnnotatedValue::Mapping(merged), AnnotatedValue::Mapping(current)) = (&mut replacement, current) {
        for (key, entry) in &current.entries {
            if !merged.entries.contains_key(key) {
                merged.entries.insert(key.clone(), entry.clone());
            }
        }
        merged.anchor = current.anchor.clone();
    }

    let mut edited = value.clone();
    replace_at(&mut edited, path, replacement)?;
    Ok(edited)
}

/// Detach the node at `path` from its anchor. The materialized entries stay,
/// so the node is written inline from now on.
pub fn remove_reference(value: &AnnotatedValue, path: &Path) -> Result<AnnotatedValue, TreeError> {
    let mut edited = value.clone();
    let node = path.lookup_mut(&mut edited).ok_or_else(|| TreeError::NotFound {
        path: path.to_string(),
    })?;
    node.set_reference_of(None);
    Ok(edited)
}

/// Markdown summary of anchors and the references to them.
///
/// ```rust
/// use yaml_anchor_codec::{find_anchors, find_references, parse, scope_report};
///
/// let value = parse("base: &b {x: 1}\nuse:\n  - *b\n").unwrap();
/// let report = scope_report(&find_anchors(&value), &find_references(&value), "demo.yaml");
/// assert!(report.contains("- `b` → `/base`\n"));
/// assert!(report.contains("- `use[0]` → `b`\n"));
/// assert!(report.contains("- **Total References**: 1\n"));
/// ```
pub fn scope_report(
    anchors: &IndexMap<String, AnchorInfo>,
    references: &[ReferenceInfo],
    file_name: &str,
) -> String {
    let mut doc = String::from("# Anchor/Reference Scope Document\n\n");

    doc.push_str("## Defined Anchors\n");
    if anchors.is_empty() {
        doc.push_str("- No anchors defined\n");
    }
    for (name, info) in anchors {
        let _ = writeln!(doc, "- `{name}` → `{}`", info.path.to_slash());
    }

    doc.push_str("\n## References\n");
    if references.is_empty() {
        doc.push_str("- No references found\n");
    }
    for reference in references {
        let _ = writeln!(doc, "- `{}` → `{}`", reference.path, reference.anchor);
    }

    doc.push_str("\n## Summary\n");
    let _ = writeln!(doc, "- **Total Anchors**: {}", anchors.len());
    let _ = writeln!(doc, "- **Total References**: {}", references.len());
    let _ = writeln!(doc, "- **File**: {file_name}");
    doc
}

/// Pre-order walk over mappings and sequences.
fn walk(value: &AnnotatedValue, path: &Path, visit: &mut dyn FnMut(&AnnotatedValue, &Path)) {
    visit(value, path);
    match value {
        AnnotatedValue::Mapping(m) => {
            for (key, entry) in &m.entries {
                walk(entry, &path.join(key.as_str()), visit);
            }
        }
        AnnotatedValue::Sequence(s) => {
            for (idx, item) in s.items.iter().enumerate() {
                walk(item, &path.join(idx), visit);
            }
        }
        _ => {}
    }
}

fn mapping_at<'v>(value: &'v AnnotatedValue, path: &Path) -> Result<&'v Mapping, TreeError> {
    path.lookup(value)
        .ok_or_else(|| TreeError::NotFound {
            path: path.to_string(),
        })?
        .as_mapping()
        .ok_or_else(|| TreeError::NotAMapping {
            path: path.to_string(),
        })
}

fn replace_at(root: &mut AnnotatedValue, path: &Path, replacement: AnnotatedValue) -> Result<(), TreeError> {
    let Some((parent, last)) = path.split_last() else {
        *root = replacement;
        return Ok(());
    };
    let not_found = || TreeError::NotFound {
        path: path.to_string(),
    };
    let parent = parent.lookup_mut(root).ok_or_else(not_found)?;
    let slot = match last {
        PathSegment::Key(key) => parent.as_mapping_mut().and_then(|m| m.entries.get_mut(key)),
        PathSegment::Index(i) => parent.as_sequence_mut().and_then(|s| s.items.get_mut(*i)),
    };
    *slot.ok_or_else(not_found)? = replacement;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_anchor_definition_wins() {
        let value: AnnotatedValue = Mapping::from_iter([
            ("a", AnnotatedValue::from(Mapping::from_iter([("v", 1)]).with_anchor("x"))),
            ("b", AnnotatedValue::from(Mapping::from_iter([("v", 2)]).with_anchor("x"))),
        ])
        .into();
        let anchors = find_anchors(&value);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors["x"].path.to_string(), "b");
    }

    #[test]
    fn create_anchor_rejects_used_name_and_non_mapping() {
        let value = crate::parse("a: &x {k: 1}\nb: {k: 2}\nc: [1]\n").unwrap();
        let err = create_anchor(&value, &Path::parse("b").unwrap(), "x").unwrap_err();
        assert_eq!(err, TreeError::AnchorExists { name: "x".into() });
        let err = create_anchor(&value, &Path::parse("c").unwrap(), "y").unwrap_err();
        assert_eq!(err, TreeError::NotAMapping { path: "c".into() });
        let err = create_anchor(&value, &Path::parse("zz").unwrap(), "y").unwrap_err();
        assert_eq!(err, TreeError::NotFound { path: "zz".into() });
    }

    #[test]
    fn existing_defaults_move_to_front() {
        let value = crate::parse("item: {k: 1}\ndefaults: {}\n").unwrap();
        let edited = create_anchor(&value, &Path::parse("item").unwrap(), "it").unwrap();
        let root = edited.as_mapping().unwrap();
        assert_eq!(root.entries.get_index(0).map(|(k, _)| k.as_str()), Some("defaults"));
        assert_eq!(
            edited.get("defaults").and_then(|d| d.get("it")).and_then(|a| a.anchor()),
            Some("it")
        );
    }

    #[test]
    fn set_reference_keeps_extra_keys() {
        let value = crate::parse("base: &b {role: guest}\nme: {role: x, name: n}\n").unwrap();
        let edited = set_reference(&value, &Path::parse("me").unwrap(), "b").unwrap();
        let me = edited.get("me").unwrap();
        assert_eq!(me.reference_of(), Some("b"));
        assert_eq!(me.get("role").and_then(|v| v.as_str()), Some("guest"));
        assert_eq!(me.get("name").and_then(|v| v.as_str()), Some("n"));

        let err = set_reference(&value, &Path::parse("me").unwrap(), "nope").unwrap_err();
        assert_eq!(err, TreeError::AnchorMissing { name: "nope".into() });
    }

    #[test]
    fn remove_reference_inlines() {
        let value = crate::parse("base: &b {k: 1}\nuse: *b\n").unwrap();
        let edited = remove_reference(&value, &Path::parse("use").unwrap()).unwrap();
        let node = edited.get("use").unwrap();
        assert_eq!(node.reference_of(), None);
        assert_eq!(node.get("k").and_then(|v| v.as_i128()), Some(1));
        assert_eq!(value.get("use").unwrap().reference_of(), Some("b"));
    }

    #[test]
    fn empty_scope_report() {
        let report = scope_report(&IndexMap::new(), &[], "x.yaml");
        assert!(report.starts_with("# Anchor/Reference Scope Document\n\n## Defined Anchors\n- No anchors defined\n"));
        assert!(report.contains("## References\n- No references found\n"));
        assert!(report.ends_with("- **File**: x.yaml\n"));
    }
}
