//! Dotted paths into an [`AnnotatedValue`] tree: `users[0].name`.
//!
//! Keys are separated by `.`, sequence indices are written `[n]`. The empty
//! string is the root. Keys containing `.`, `[` or `]` cannot be addressed.

use std::fmt;
use std::str::FromStr;

use crate::tree::TreeError;
use crate::value::AnnotatedValue;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        PathSegment::Key(value.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        PathSegment::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        PathSegment::Index(value)
    }
}

/// Location of a node inside a value tree.
///
/// ```rust
/// use yaml_anchor_codec::{Path, PathSegment};
///
/// let path = Path::parse("users[0].name").unwrap();
/// assert_eq!(path.segments()[1], PathSegment::Index(0));
/// assert_eq!(path.to_string(), "users[0].name");
/// assert_eq!(path.to_slash(), "/users[0]/name");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, TreeError> {
        let bad = || TreeError::BadPath {
            path: text.to_owned(),
        };
        let mut path = Path::root();
        let mut rest = text;
        let mut expect_key = true;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']').ok_or_else(bad)?;
                let index = after[..close].parse::<usize>().map_err(|_| bad())?;
                path.segments.push(PathSegment::Index(index));
                rest = &after[close + 1..];
                expect_key = false;
                continue;
            }
            if !expect_key {
                rest = rest.strip_prefix('.').ok_or_else(bad)?;
            }
            let end = rest.find(['.', '[', ']']).unwrap_or(rest.len());
            if end == 0 {
                return Err(bad());
            }
            path.segments.push(PathSegment::Key(rest[..end].to_owned()));
            rest = &rest[end..];
            expect_key = false;
        }
        Ok(path)
    }

    pub fn join<T: Into<PathSegment>>(&self, segment: T) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Parent path and last segment; `None` for the root.
    pub fn split_last(&self) -> Option<(Path, &PathSegment)> {
        let (last, parent) = self.segments.split_last()?;
        Some((
            Path {
                segments: parent.to_vec(),
            },
            last,
        ))
    }

    /// Slash form used in reports: keys as `/name`, indices as `[n]`.
    pub fn to_slash(&self) -> String {
        let mut out = String::from("/");
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if idx > 0 {
                        out.push('/');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    /// Node at this path.
    pub fn lookup<'v>(&self, root: &'v AnnotatedValue) -> Option<&'v AnnotatedValue> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| match segment {
                PathSegment::Key(key) => node.get(key),
                PathSegment::Index(i) => node.get_index(*i),
            })
    }

    /// Mutable node at this path.
    pub fn lookup_mut<'v>(&self, root: &'v mut AnnotatedValue) -> Option<&'v mut AnnotatedValue> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| match segment {
                PathSegment::Key(key) => node.as_mapping_mut()?.entries.get_mut(key),
                PathSegment::Index(i) => node.as_sequence_mut()?.items.get_mut(*i),
            })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        for text in ["", "a", "a.b", "a[2]", "a.b[2].c", "[0]", "[0][1].x"] {
            assert_eq!(Path::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn bad_paths() {
        for text in ["a..b", ".a", "a.", "a[x]", "a[1", "a]b", "a[1]b"] {
            assert!(Path::parse(text).is_err(), "{text}");
        }
    }

    #[test]
    fn root_is_empty() {
        let root = Path::parse("").unwrap();
        assert!(root.is_root());
        assert_eq!(root.to_slash(), "/");
        assert!(root.split_last().is_none());
    }

    #[test]
    fn lookup_walks_mappings_and_sequences() {
        let value = crate::parse("users:\n  - name: a\n  - name: b\n").unwrap();
        let path = Path::parse("users[1].name").unwrap();
        assert_eq!(path.lookup(&value).and_then(|v| v.as_str()), Some("b"));
        assert!(Path::parse("users[2]").unwrap().lookup(&value).is_none());
        assert!(Path::parse("users.name").unwrap().lookup(&value).is_none());
    }
}
