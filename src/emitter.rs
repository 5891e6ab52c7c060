//! Writes an [`AnnotatedValue`] as block-style YAML, re-creating anchors,
//! aliases and merge keys from the annotations.
//!
//! Output is built line by line with explicit indentation (2 spaces per
//! level). A sequence item that holds a block collection is written one
//! level deeper and then its first indentation is overwritten with `- `,
//! so the dash absorbs that indentation (`- name: x`, `- <<: *ref`,
//! `- - nested`).
//!
//! A node with `reference_of` is written as an alias only while that still
//! reads back as the same content. Edited copies are written in full, and
//! anchors defined inside a copy are never dropped.

use indexmap::IndexMap;

use crate::options::GenerateOptions;
use crate::quoting::{write_key, write_string_value};
use crate::value::{AnnotatedValue, Mapping, Sequence};

pub(crate) const HEADER: &str = "# Generated YAML from JSON with anchors and references";

const INDENT: &str = "  ";

pub(crate) struct Emitter<'v> {
    out: String,
    options: GenerateOptions,
    /// Anchor name -> defining node; a later definition replaces an earlier one.
    anchors: IndexMap<&'v str, &'v AnnotatedValue>,
}

impl<'v> Emitter<'v> {
    pub(crate) fn new(root: &'v AnnotatedValue, options: GenerateOptions) -> Self {
        let mut anchors = IndexMap::new();
        collect_anchors(root, &mut anchors, options.max_depth);
        Self {
            out: String::new(),
            options,
            anchors,
        }
    }

    pub(crate) fn emit(mut self, root: &'v AnnotatedValue) -> String {
        self.out.push_str(HEADER);
        self.out.push_str("\n\n");
        match root {
            AnnotatedValue::Mapping(m) if m.is_empty() && m.reference_of.is_none() => {
                if let Some(anchor) = &m.anchor {
                    self.line(0, &format!("&{anchor} {{}}"));
                }
            }
            AnnotatedValue::Mapping(m) => {
                if let Some(anchor) = &m.anchor {
                    self.line(0, &format!("&{anchor}"));
                }
                match &m.reference_of {
                    Some(name) if self.is_mergeable(m, name) => self.write_merge_body(m, name, 0),
                    _ => self.write_mapping_body(m, 0),
                }
            }
            AnnotatedValue::Sequence(s @ Sequence { reference_of: Some(name), .. })
                if self.is_alias_copy(s, name) =>
            {
                self.line(0, &format!("*{name}"));
            }
            AnnotatedValue::Sequence(s) if s.items.is_empty() => match &s.anchor {
                Some(anchor) => self.line(0, &format!("&{anchor} []")),
                None => self.line(0, "[]"),
            },
            AnnotatedValue::Sequence(s) => {
                if let Some(anchor) = &s.anchor {
                    self.line(0, &format!("&{anchor}"));
                }
                self.write_sequence_body(s, 0);
            }
            scalar => {
                let text = format_scalar(scalar);
                self.line(0, &text);
            }
        }
        self.out
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Entries of `m` that must be written next to `<<: *name`.
    ///
    /// An entry equal to the anchor's own entry under the same key was
    /// inherited and is left out. Without a definition, everything stays.
    fn overrides(&self, m: &'v Mapping, name: &str) -> Vec<(&'v String, &'v AnnotatedValue)> {
        let base = if self.options.prune_inherited {
            self.anchors.get(name).and_then(|v| v.as_mapping())
        } else {
            None
        };
        m.entries
            .iter()
            .filter(|(key, value)| match base.and_then(|b| b.get(key)) {
                Some(inherited) => value.defines_anchor() || !value.content_eq(inherited),
                None => true,
            })
            .collect()
    }

    /// `<<: *name` can rebuild `m` only when the definition is a mapping
    /// whose keys are all still present in `m`.
    fn is_mergeable(&self, m: &Mapping, name: &str) -> bool {
        match self.anchors.get(name) {
            None => true,
            Some(AnnotatedValue::Mapping(definition)) => {
                definition.entries.keys().all(|key| m.entries.contains_key(key))
            }
            Some(_) => false,
        }
    }

    /// A sequence copy can be written as `*name` when it defines no anchor
    /// and still holds what the definition holds. Without a definition the
    /// alias is written as it is.
    fn is_alias_copy(&self, s: &Sequence, name: &str) -> bool {
        if s.anchor.is_some() || s.items.iter().any(AnnotatedValue::defines_anchor) {
            return false;
        }
        match self.anchors.get(name) {
            None => true,
            Some(AnnotatedValue::Sequence(definition)) => {
                definition.items.len() == s.items.len()
                    && definition.items.iter().zip(&s.items).all(|(d, v)| d.content_eq(v))
            }
            Some(_) => false,
        }
    }

    /// Collections at nesting level `depth + 1` are past the limit.
    fn too_deep(&self, value: &AnnotatedValue, depth: usize) -> bool {
        !value.is_scalar() && depth + 1 >= self.options.max_depth
    }

    fn write_mapping_body(&mut self, m: &'v Mapping, depth: usize) {
        for (key, value) in &m.entries {
            self.write_entry(key, value, depth);
        }
    }

    fn write_merge_body(&mut self, m: &'v Mapping, name: &str, depth: usize) {
        self.line(depth, &format!("<<: *{name}"));
        for (key, value) in self.overrides(m, name) {
            self.write_entry(key, value, depth);
        }
    }

    fn write_sequence_body(&mut self, s: &'v Sequence, depth: usize) {
        for item in &s.items {
            self.write_item(item, depth);
        }
    }

    fn write_entry(&mut self, key: &str, value: &'v AnnotatedValue, depth: usize) {
        let mut head = String::new();
        write_key(&mut head, key);
        head.push(':');

        match value {
            _ if self.too_deep(value, depth) => {
                head.push_str(" null");
                self.line(depth, &head);
            }
            AnnotatedValue::Mapping(m @ Mapping { reference_of: Some(name), .. })
                if self.is_mergeable(m, name) =>
            {
                if m.anchor.is_none() && self.overrides(m, name).is_empty() {
                    head.push_str(" *");
                    head.push_str(name);
                    self.line(depth, &head);
                } else {
                    push_anchor(&mut head, m.anchor.as_deref());
                    self.line(depth, &head);
                    self.write_merge_body(m, name, depth + 1);
                }
            }
            AnnotatedValue::Sequence(s @ Sequence { reference_of: Some(name), .. })
                if self.is_alias_copy(s, name) =>
            {
                head.push_str(" *");
                head.push_str(name);
                self.line(depth, &head);
            }
            AnnotatedValue::Mapping(m) => {
                push_anchor(&mut head, m.anchor.as_deref());
                self.line(depth, &head);
                self.write_mapping_body(m, depth + 1);
            }
            AnnotatedValue::Sequence(s) => {
                push_anchor(&mut head, s.anchor.as_deref());
                self.line(depth, &head);
                self.write_sequence_body(s, depth + 1);
            }
            scalar => {
                head.push(' ');
                head.push_str(&format_scalar(scalar));
                self.line(depth, &head);
            }
        }
    }

    fn write_item(&mut self, item: &'v AnnotatedValue, depth: usize) {
        match item {
            _ if self.too_deep(item, depth) => self.line(depth, "- null"),
            AnnotatedValue::Mapping(m @ Mapping { reference_of: Some(name), .. })
                if self.is_mergeable(m, name) =>
            {
                if let Some(anchor) = &m.anchor {
                    self.line(depth, &format!("- &{anchor}"));
                    self.write_merge_body(m, name, depth + 1);
                } else if self.overrides(m, name).is_empty() {
                    self.line(depth, &format!("- *{name}"));
                } else {
                    self.dashed(depth, |e| e.write_merge_body(m, name, depth + 1));
                }
            }
            AnnotatedValue::Sequence(s @ Sequence { reference_of: Some(name), .. })
                if self.is_alias_copy(s, name) =>
            {
                self.line(depth, &format!("- *{name}"));
            }
            AnnotatedValue::Mapping(m) if m.is_empty() => {
                self.line(depth, &dash_with_anchor(m.anchor.as_deref()));
            }
            AnnotatedValue::Sequence(s) if s.items.is_empty() => {
                self.line(depth, &dash_with_anchor(s.anchor.as_deref()));
            }
            AnnotatedValue::Mapping(m) => match &m.anchor {
                Some(anchor) => {
                    self.line(depth, &format!("- &{anchor}"));
                    self.write_mapping_body(m, depth + 1);
                }
                None => self.dashed(depth, |e| e.write_mapping_body(m, depth + 1)),
            },
            AnnotatedValue::Sequence(s) => match &s.anchor {
                Some(anchor) => {
                    self.line(depth, &format!("- &{anchor}"));
                    self.write_sequence_body(s, depth + 1);
                }
                None => self.dashed(depth, |e| e.write_sequence_body(s, depth + 1)),
            },
            scalar => {
                let text = format!("- {}", format_scalar(scalar));
                self.line(depth, &text);
            }
        }
    }

    /// Write a block one level deeper, then let the item dash take over the
    /// indentation of its first line.
    fn dashed(&mut self, depth: usize, body: impl FnOnce(&mut Self)) {
        let start = self.out.len() + depth * INDENT.len();
        body(self);
        if self.out.len() >= start + 2 {
            self.out.replace_range(start..start + 2, "- ");
        }
    }
}

fn push_anchor(head: &mut String, anchor: Option<&str>) {
    if let Some(anchor) = anchor {
        head.push_str(" &");
        head.push_str(anchor);
    }
}

fn dash_with_anchor(anchor: Option<&str>) -> String {
    match anchor {
        Some(anchor) => format!("- &{anchor}"),
        None => "-".to_string(),
    }
}

/// Scalar text for value position.
pub(crate) fn format_scalar(value: &AnnotatedValue) -> String {
    match value {
        AnnotatedValue::Null => "null".to_string(),
        AnnotatedValue::Bool(b) => b.to_string(),
        AnnotatedValue::Number(n) => n.to_string(),
        AnnotatedValue::String(s) => {
            let mut out = String::with_capacity(s.len() + 2);
            write_string_value(&mut out, s);
            out
        }
        // Collections are never formatted as scalars; flow form keeps the
        // output parseable if it happens.
        AnnotatedValue::Sequence(_) => "[]".to_string(),
        AnnotatedValue::Mapping(_) => "{}".to_string(),
    }
}

fn collect_anchors<'v>(
    value: &'v AnnotatedValue,
    anchors: &mut IndexMap<&'v str, &'v AnnotatedValue>,
    levels: usize,
) {
    if levels == 0 {
        return;
    }
    if let Some(name) = value.anchor() {
        anchors.insert(name, value);
    }
    match value {
        AnnotatedValue::Mapping(m) => m.entries.values().for_each(|v| collect_anchors(v, anchors, levels - 1)),
        AnnotatedValue::Sequence(s) => s.items.iter().for_each(|v| collect_anchors(v, anchors, levels - 1)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Number;

    fn body(value: &AnnotatedValue) -> String {
        let out = Emitter::new(value, GenerateOptions::default()).emit(value);
        out[HEADER.len() + 2..].to_string()
    }

    #[test]
    fn nested_sequences_share_the_dash_line() {
        let inner = Sequence::new(vec![AnnotatedValue::from(1), AnnotatedValue::from(2)]);
        let outer = Sequence::new(vec![AnnotatedValue::Sequence(inner)]);
        let mut root = Mapping::new();
        root.insert("grid", AnnotatedValue::Sequence(outer));
        assert_eq!(body(&AnnotatedValue::Mapping(root)), "grid:\n  - - 1\n    - 2\n");
    }

    #[test]
    fn anchored_item_keeps_the_body_below_the_dash() {
        let mut item = Mapping::new().with_anchor("first");
        item.insert("name", "x");
        let mut root = Mapping::new();
        root.insert("list", AnnotatedValue::Sequence(Sequence::new(vec![AnnotatedValue::Mapping(item)])));
        assert_eq!(body(&AnnotatedValue::Mapping(root)), "list:\n  - &first\n    name: x\n");
    }

    #[test]
    fn empty_items_and_root() {
        let items = vec![
            AnnotatedValue::Mapping(Mapping::new()),
            AnnotatedValue::Sequence(Sequence::new(Vec::new()).with_anchor("e")),
        ];
        let root = AnnotatedValue::Sequence(Sequence::new(items));
        assert_eq!(body(&root), "-\n- &e\n");
        assert_eq!(body(&AnnotatedValue::Mapping(Mapping::new())), "");
        assert_eq!(body(&AnnotatedValue::Sequence(Sequence::new(Vec::new()))), "[]\n");
    }

    #[test]
    fn scalars() {
        assert_eq!(format_scalar(&AnnotatedValue::Null), "null");
        assert_eq!(format_scalar(&AnnotatedValue::Bool(false)), "false");
        assert_eq!(format_scalar(&AnnotatedValue::Number(Number::Float(0.5))), "0.5");
        assert_eq!(format_scalar(&AnnotatedValue::Number(Number::Float(f64::NEG_INFINITY))), "-.inf");
        assert_eq!(format_scalar(&AnnotatedValue::from("yes")), "\"yes\"");
    }
}
