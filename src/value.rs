//! The annotated value tree shared by the parser and the emitter.
//!
//! A value is a plain JSON-like tree. Mappings and sequences may additionally
//! carry two pieces of metadata:
//!
//! - `anchor`: this node defines the named anchor (`&name`).
//! - `reference_of`: this node was produced by resolving an alias or merge key
//!   against the named anchor (`*name`, `<<: *name`).

use std::fmt;

use indexmap::IndexMap;

/// Numeric scalar.
///
/// Integral finite floats that fit into `i128` are stored as [`Number::Int`],
/// so `1.2e3` and `1200` are the same value. Equality is numeric across
/// variants.
#[derive(Clone, Copy, Debug)]
pub enum Number {
    Int(i128),
    Float(f64),
}

impl Number {
    /// Build a number from a float, normalizing integral values.
    pub fn from_f64(f: f64) -> Self {
        // 2^127 is exactly representable; anything at or beyond it stays a float.
        const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
        if f.is_finite() && f.fract() == 0.0 && f >= -LIMIT && f < LIMIT {
            Number::Int(f as i128)
        } else {
            Number::Float(f)
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Number::Int(i) => Some(i),
            Number::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (*self, *other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Number::Int(a), Number::Float(b)) | (Number::Float(b), Number::Int(a)) => {
                a as f64 == b
            }
        }
    }
}

/// Canonical decimal form without exponent; `.inf`, `-.inf`, `.nan` for
/// non-finite floats.
impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(v) if v.is_nan() => f.write_str(".nan"),
            Number::Float(v) if v.is_infinite() => {
                f.write_str(if v.is_sign_positive() { ".inf" } else { "-.inf" })
            }
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Number {
    fn from(i: i64) -> Self {
        Number::Int(i as i128)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::from_f64(f)
    }
}

/// Ordered sequence with optional anchor metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequence {
    pub items: Vec<AnnotatedValue>,
    pub anchor: Option<String>,
    pub reference_of: Option<String>,
}

/// Ordered mapping with optional anchor metadata.
///
/// Insertion order of `entries` drives emission order. Equality ignores
/// order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mapping {
    pub entries: IndexMap<String, AnnotatedValue>,
    pub anchor: Option<String>,
    pub reference_of: Option<String>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry. A replaced key keeps its position.
    pub fn insert<K: Into<String>, V: Into<AnnotatedValue>>(&mut self, key: K, value: V) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&AnnotatedValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builder-style anchor setter.
    pub fn with_anchor<S: Into<String>>(mut self, name: S) -> Self {
        self.anchor = Some(name.into());
        self
    }

    /// Builder-style reference setter.
    pub fn with_reference_of<S: Into<String>>(mut self, name: S) -> Self {
        self.reference_of = Some(name.into());
        self
    }

    /// `reference_of` set and no entries: rendered as `*name`.
    pub fn is_pure_alias(&self) -> bool {
        self.reference_of.is_some() && self.entries.is_empty()
    }

    /// `reference_of` set together with entries: rendered as `<<: *name` plus overrides.
    pub fn is_merge_node(&self) -> bool {
        self.reference_of.is_some() && !self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<AnnotatedValue>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Mapping {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            anchor: None,
            reference_of: None,
        }
    }
}

impl Sequence {
    pub fn new(items: Vec<AnnotatedValue>) -> Self {
        Sequence {
            items,
            anchor: None,
            reference_of: None,
        }
    }

    pub fn with_anchor<S: Into<String>>(mut self, name: S) -> Self {
        self.anchor = Some(name.into());
        self
    }
}

/// In-memory YAML value plus anchor/reference metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AnnotatedValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Sequence),
    Mapping(Mapping),
}

impl AnnotatedValue {
    /// Short name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AnnotatedValue::Null => "null",
            AnnotatedValue::Bool(_) => "boolean",
            AnnotatedValue::Number(_) => "number",
            AnnotatedValue::String(_) => "string",
            AnnotatedValue::Sequence(_) => "sequence",
            AnnotatedValue::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AnnotatedValue::Null)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, AnnotatedValue::Sequence(_) | AnnotatedValue::Mapping(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotatedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match self {
            AnnotatedValue::Number(n) => n.as_i128(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AnnotatedValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotatedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            AnnotatedValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&mut self) -> Option<&mut Sequence> {
        match self {
            AnnotatedValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            AnnotatedValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            AnnotatedValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Mapping entry lookup; `None` for non-mappings.
    pub fn get(&self, key: &str) -> Option<&AnnotatedValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Sequence item lookup; `None` for non-sequences.
    pub fn get_index(&self, index: usize) -> Option<&AnnotatedValue> {
        self.as_sequence().and_then(|s| s.items.get(index))
    }

    /// Anchor defined on this node, if any.
    pub fn anchor(&self) -> Option<&str> {
        match self {
            AnnotatedValue::Mapping(m) => m.anchor.as_deref(),
            AnnotatedValue::Sequence(s) => s.anchor.as_deref(),
            _ => None,
        }
    }

    /// Anchor this node was resolved from, if any.
    pub fn reference_of(&self) -> Option<&str> {
        match self {
            AnnotatedValue::Mapping(m) => m.reference_of.as_deref(),
            AnnotatedValue::Sequence(s) => s.reference_of.as_deref(),
            _ => None,
        }
    }

    /// Set or clear the anchor. No effect on scalars.
    pub fn set_anchor(&mut self, name: Option<String>) {
        match self {
            AnnotatedValue::Mapping(m) => m.anchor = name,
            AnnotatedValue::Sequence(s) => s.anchor = name,
            _ => {}
        }
    }

    /// Set or clear the reference. No effect on scalars.
    pub fn set_reference_of(&mut self, name: Option<String>) {
        match self {
            AnnotatedValue::Mapping(m) => m.reference_of = name,
            AnnotatedValue::Sequence(s) => s.reference_of = name,
            _ => {}
        }
    }

    /// Remove every anchor in this subtree.
    ///
    /// Copies produced by aliases and merge keys must not define anchors
    /// again, or the anchor names would stop being unique.
    pub fn strip_anchors(&mut self) {
        match self {
            AnnotatedValue::Mapping(m) => {
                m.anchor = None;
                m.entries.values_mut().for_each(AnnotatedValue::strip_anchors);
            }
            AnnotatedValue::Sequence(s) => {
                s.anchor = None;
                s.items.iter_mut().for_each(AnnotatedValue::strip_anchors);
            }
            _ => {}
        }
    }

    /// True if this node or anything below it carries an anchor.
    pub fn defines_anchor(&self) -> bool {
        match self {
            AnnotatedValue::Mapping(m) => {
                m.anchor.is_some() || m.entries.values().any(AnnotatedValue::defines_anchor)
            }
            AnnotatedValue::Sequence(s) => {
                s.anchor.is_some() || s.items.iter().any(AnnotatedValue::defines_anchor)
            }
            _ => false,
        }
    }

    /// Structural equality that ignores `anchor` everywhere in both trees.
    /// `reference_of` still has to match.
    pub fn content_eq(&self, other: &AnnotatedValue) -> bool {
        match (self, other) {
            (AnnotatedValue::Mapping(a), AnnotatedValue::Mapping(b)) => {
                a.reference_of == b.reference_of
                    && a.entries.len() == b.entries.len()
                    && a.entries
                        .iter()
                        .all(|(k, v)| b.entries.get(k).is_some_and(|w| v.content_eq(w)))
            }
            (AnnotatedValue::Sequence(a), AnnotatedValue::Sequence(b)) => {
                a.reference_of == b.reference_of
                    && a.items.len() == b.items.len()
                    && a.items.iter().zip(&b.items).all(|(v, w)| v.content_eq(w))
            }
            _ => self == other,
        }
    }
}

impl From<bool> for AnnotatedValue {
    fn from(b: bool) -> Self {
        AnnotatedValue::Bool(b)
    }
}

impl From<i64> for AnnotatedValue {
    fn from(i: i64) -> Self {
        AnnotatedValue::Number(i.into())
    }
}

impl From<i32> for AnnotatedValue {
    fn from(i: i32) -> Self {
        AnnotatedValue::Number(Number::Int(i as i128))
    }
}

impl From<f64> for AnnotatedValue {
    fn from(f: f64) -> Self {
        AnnotatedValue::Number(Number::from_f64(f))
    }
}

impl From<Number> for AnnotatedValue {
    fn from(n: Number) -> Self {
        AnnotatedValue::Number(n)
    }
}

impl From<&str> for AnnotatedValue {
    fn from(s: &str) -> Self {
        AnnotatedValue::String(s.to_owned())
    }
}

impl From<String> for AnnotatedValue {
    fn from(s: String) -> Self {
        AnnotatedValue::String(s)
    }
}

impl From<Mapping> for AnnotatedValue {
    fn from(m: Mapping) -> Self {
        AnnotatedValue::Mapping(m)
    }
}

impl From<Sequence> for AnnotatedValue {
    fn from(s: Sequence) -> Self {
        AnnotatedValue::Sequence(s)
    }
}

impl From<Vec<AnnotatedValue>> for AnnotatedValue {
    fn from(items: Vec<AnnotatedValue>) -> Self {
        AnnotatedValue::Sequence(Sequence::new(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_become_ints() {
        assert_eq!(Number::from_f64(1.2e3).as_i128(), Some(1200));
        assert_eq!(Number::from_f64(-0.0).as_i128(), Some(0));
        assert!(Number::from_f64(0.5).as_i128().is_none());
        assert!(Number::from_f64(1e40).as_i128().is_none());
        assert!(Number::from_f64(f64::INFINITY).as_i128().is_none());
    }

    #[test]
    fn numbers_compare_across_variants() {
        assert_eq!(Number::Int(3), Number::Float(3.0));
        assert_ne!(Number::Int(3), Number::Float(3.5));
        assert_eq!(Number::Float(f64::NAN), Number::Float(f64::NAN));
    }

    #[test]
    fn number_display_has_no_exponent() {
        assert_eq!(Number::from_f64(1e21).to_string(), "1000000000000000000000");
        assert_eq!(Number::Float(0.25).to_string(), "0.25");
        assert_eq!(Number::Float(f64::NEG_INFINITY).to_string(), "-.inf");
        assert_eq!(Number::Float(f64::NAN).to_string(), ".nan");
    }

    #[test]
    fn content_eq_ignores_nested_anchors() {
        let inner = Mapping::from_iter([("x", 1)]);
        let anchored: AnnotatedValue = Mapping::from_iter([(
            "inner",
            AnnotatedValue::from(inner.clone().with_anchor("i")),
        )])
        .into();
        let mut plain = anchored.clone();
        plain.strip_anchors();

        assert_ne!(anchored, plain);
        assert!(anchored.content_eq(&plain));
        assert_eq!(plain.get("inner").and_then(|v| v.anchor()), None);
        assert!(anchored.defines_anchor());
        assert!(!plain.defines_anchor());
    }

    #[test]
    fn merge_and_pure_alias_classification() {
        let pure = Mapping::new().with_reference_of("u");
        assert!(pure.is_pure_alias());
        assert!(!pure.is_merge_node());

        let mut merged = pure.clone();
        merged.insert("role", "admin");
        assert!(merged.is_merge_node());
    }
}
