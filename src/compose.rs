//! Builds a syntax tree from live events.
//!
//! The tree keeps what the annotator needs and nothing else: scalar text with
//! its style and tag, ordered sequence items, ordered mapping pairs, anchor
//! names, and aliases linked to the node they name. Aliased nodes are shared
//! through `Rc`, never copied at this stage.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use saphyr_parser::ScalarStyle;

use crate::error::Error;
use crate::live_events::{Ev, LiveEvents};
use crate::location::Location;
use crate::options::{DuplicateAnchorPolicy, Options};

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) anchor: Option<String>,
    pub(crate) location: Location,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Scalar {
        value: String,
        style: ScalarStyle,
        tag: Option<String>,
    },
    Sequence(Vec<Rc<Node>>),
    Mapping(Vec<(Rc<Node>, Rc<Node>)>),
    Alias {
        name: String,
        target: Rc<Node>,
    },
}

impl Node {
    /// Plain, untagged `<<`.
    pub(crate) fn is_merge_key(&self) -> bool {
        matches!(
            &self.kind,
            NodeKind::Scalar { value, style: ScalarStyle::Plain, tag: None } if value == "<<"
        )
    }
}

enum Frame {
    Sequence {
        anchor: Option<String>,
        location: Location,
        items: Vec<Rc<Node>>,
    },
    Mapping {
        anchor: Option<String>,
        location: Location,
        pairs: Vec<(Rc<Node>, Rc<Node>)>,
        pending_key: Option<Rc<Node>>,
    },
}

/// Composer state: open containers and anchors known so far.
struct Composer<'o> {
    options: &'o Options,
    stack: Vec<Frame>,
    anchors: HashMap<String, Rc<Node>>,
    /// Anchors on containers that have started but not ended.
    open_anchors: HashSet<String>,
    root: Option<Rc<Node>>,
}

/// Read all events and build the document tree. `Ok(None)` for an empty stream.
pub(crate) fn compose(
    events: &mut LiveEvents<'_>,
    options: &Options,
) -> Result<Option<Rc<Node>>, Error> {
    let mut composer = Composer {
        options,
        stack: Vec::new(),
        anchors: HashMap::new(),
        open_anchors: HashSet::new(),
        root: None,
    };

    while let Some(ev) = events.next()? {
        composer.accept(ev)?;
    }
    if !composer.stack.is_empty() {
        return Err(Error::syntax("unterminated collection").with_location(events.last_location()));
    }
    Ok(composer.root)
}

impl Composer<'_> {
    fn accept(&mut self, ev: Ev) -> Result<(), Error> {
        match ev {
            Ev::Scalar {
                value,
                style,
                tag,
                anchor,
                location,
            } => {
                if let Some(name) = &anchor {
                    self.check_redefinition(name, location)?;
                }
                let node = Rc::new(Node {
                    kind: NodeKind::Scalar { value, style, tag },
                    anchor,
                    location,
                });
                self.register(&node);
                self.attach(node)
            }
            Ev::SeqStart { anchor, location } => {
                self.open(anchor.as_deref(), location)?;
                self.stack.push(Frame::Sequence {
                    anchor,
                    location,
                    items: Vec::new(),
                });
                Ok(())
            }
            Ev::MapStart { anchor, location } => {
                self.open(anchor.as_deref(), location)?;
                self.stack.push(Frame::Mapping {
                    anchor,
                    location,
                    pairs: Vec::new(),
                    pending_key: None,
                });
                Ok(())
            }
            Ev::SeqEnd { location } | Ev::MapEnd { location } => {
                let node = match self.stack.pop() {
                    Some(Frame::Sequence {
                        anchor,
                        location,
                        items,
                    }) => Node {
                        kind: NodeKind::Sequence(items),
                        anchor,
                        location,
                    },
                    Some(Frame::Mapping {
                        anchor,
                        location,
                        pairs,
                        pending_key: None,
                    }) => Node {
                        kind: NodeKind::Mapping(pairs),
                        anchor,
                        location,
                    },
                    Some(Frame::Mapping { .. }) => {
                        return Err(Error::syntax("mapping key without a value").with_location(location));
                    }
                    None => {
                        return Err(Error::syntax("collection end with no start").with_location(location));
                    }
                };
                let node = Rc::new(node);
                if let Some(name) = &node.anchor {
                    self.open_anchors.remove(name);
                }
                self.register(&node);
                self.attach(node)
            }
            Ev::Alias { name, location } => {
                if self.open_anchors.contains(&name) {
                    return Err(Error::RecursiveAlias { name, location });
                }
                let target = match self.anchors.get(&name) {
                    Some(target) => Rc::clone(target),
                    None => return Err(Error::UndefinedAnchor { name, location }),
                };
                self.attach(Rc::new(Node {
                    kind: NodeKind::Alias { name, target },
                    anchor: None,
                    location,
                }))
            }
        }
    }

    fn open(&mut self, anchor: Option<&str>, location: Location) -> Result<(), Error> {
        if self.stack.len() >= self.options.max_depth {
            return Err(Error::TooDeep {
                limit: self.options.max_depth,
                location,
            });
        }
        if let Some(name) = anchor {
            self.check_redefinition(name, location)?;
            self.open_anchors.insert(name.to_string());
        }
        Ok(())
    }

    fn check_redefinition(&self, name: &str, location: Location) -> Result<(), Error> {
        let defined = self.anchors.contains_key(name) || self.open_anchors.contains(name);
        if defined && self.options.duplicate_anchors == DuplicateAnchorPolicy::Error {
            return Err(Error::DuplicateAnchor {
                name: name.to_string(),
                location,
            });
        }
        Ok(())
    }

    fn register(&mut self, node: &Rc<Node>) {
        if let Some(name) = &node.anchor {
            self.anchors.insert(name.clone(), Rc::clone(node));
        }
    }

    fn attach(&mut self, node: Rc<Node>) -> Result<(), Error> {
        match self.stack.last_mut() {
            None => {
                self.root = Some(node);
            }
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping {
                pairs, pending_key, ..
            }) => match pending_key.take() {
                Some(key) => pairs.push((key, node)),
                None => *pending_key = Some(node),
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(src: &str) -> Result<Option<Rc<Node>>, Error> {
        let options = Options::default();
        let mut events = LiveEvents::new(src, options.budget.clone());
        compose(&mut events, &options)
    }

    #[test]
    fn aliases_share_the_anchored_node() {
        let root = tree("a: &x [1]\nb: *x\n").unwrap().unwrap();
        let NodeKind::Mapping(pairs) = &root.kind else {
            panic!("expected mapping");
        };
        let NodeKind::Alias { name, target } = &pairs[1].1.kind else {
            panic!("expected alias");
        };
        assert_eq!(name, "x");
        assert!(Rc::ptr_eq(target, &pairs[0].1));
    }

    #[test]
    fn empty_stream_has_no_root() {
        assert!(tree("").unwrap().is_none());
        assert!(tree("# only a comment\n").unwrap().is_none());
    }

    #[test]
    fn alias_into_open_anchor_is_recursive() {
        let err = tree("a: &x\n  b: *x\n").unwrap_err();
        assert!(matches!(err, Error::RecursiveAlias { ref name, .. } if name == "x"), "{err:?}");
    }

    #[test]
    fn redefined_anchor_is_rejected_by_default() {
        let err = tree("a: &x 1\nb: &x 2\n").unwrap_err();
        assert!(matches!(err, Error::DuplicateAnchor { ref name, .. } if name == "x"), "{err:?}");
    }

    #[test]
    fn merge_key_detection_ignores_quoted_form() {
        let root = tree("<<: {}\n\"<<\": 1\n").unwrap().unwrap();
        let NodeKind::Mapping(pairs) = &root.kind else {
            panic!("expected mapping");
        };
        assert!(pairs[0].0.is_merge_key());
        assert!(!pairs[1].0.is_merge_key());
    }
}
