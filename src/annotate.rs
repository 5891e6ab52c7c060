//! Turns the syntax tree into an [`AnnotatedValue`], resolving aliases and
//! merge keys and recording where anchors were defined and used.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::compose::{Node, NodeKind};
use crate::error::Error;
use crate::location::Location;
use crate::options::{DuplicateKeyPolicy, Options};
use crate::parse_scalars::resolve_scalar;
use crate::value::{AnnotatedValue, Mapping, Sequence};

pub(crate) struct Annotator<'o> {
    options: &'o Options,
    /// Nodes materialized while expanding aliases and merge keys.
    expanded: usize,
}

impl<'o> Annotator<'o> {
    pub(crate) fn new(options: &'o Options) -> Self {
        Self {
            options,
            expanded: 0,
        }
    }

    /// Annotate `node`. `copy_site` is the alias location when the node is
    /// being materialized as a copy, `None` for nodes read in place.
    pub(crate) fn annotate(
        &mut self,
        node: &Node,
        depth: usize,
        copy_site: Option<Location>,
    ) -> Result<AnnotatedValue, Error> {
        if let Some(site) = copy_site {
            self.expanded += 1;
            if self.expanded > self.options.max_expanded_nodes {
                return Err(Error::ExpansionLimit {
                    limit: self.options.max_expanded_nodes,
                    location: site,
                });
            }
        }

        match &node.kind {
            NodeKind::Scalar { value, style, tag } => {
                resolve_scalar(value, *style, tag.as_deref(), node.location)
            }
            NodeKind::Alias { name, target } => self.resolve_alias(name, target, node.location, depth),
            NodeKind::Sequence(items) => {
                self.check_depth(depth, node.location)?;
                let items = items
                    .iter()
                    .map(|item| self.annotate(item, depth + 1, copy_site))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AnnotatedValue::Sequence(Sequence {
                    items,
                    anchor: node.anchor.clone(),
                    reference_of: None,
                }))
            }
            NodeKind::Mapping(pairs) => {
                self.check_depth(depth, node.location)?;
                let mut mapping = self.annotate_mapping(pairs, depth, copy_site)?;
                mapping.anchor = node.anchor.clone();
                Ok(AnnotatedValue::Mapping(mapping))
            }
        }
    }

    fn check_depth(&self, depth: usize, location: Location) -> Result<(), Error> {
        if depth >= self.options.max_depth {
            return Err(Error::TooDeep {
                limit: self.options.max_depth,
                location,
            });
        }
        Ok(())
    }

    /// Alias in value position. Scalars come back as they are; collections
    /// come back as anchor-free copies that remember the alias name.
    fn resolve_alias(
        &mut self,
        name: &str,
        target: &Node,
        site: Location,
        depth: usize,
    ) -> Result<AnnotatedValue, Error> {
        let mut value = self.annotate(target, depth, Some(site))?;
        if !value.is_scalar() {
            value.strip_anchors();
            value.set_reference_of(Some(name.to_string()));
        }
        Ok(value)
    }

    fn annotate_mapping(
        &mut self,
        pairs: &[(Rc<Node>, Rc<Node>)],
        depth: usize,
        copy_site: Option<Location>,
    ) -> Result<Mapping, Error> {
        let mut mapping = Mapping::new();

        // Merge keys first, in source order; earlier sources win.
        for (_, value) in pairs.iter().filter(|(key, _)| key.is_merge_key()) {
            self.apply_merge(&mut mapping, value, depth, copy_site)?;
        }

        let mut explicit: HashSet<String> = HashSet::new();
        for (key, value) in pairs.iter().filter(|(key, _)| !key.is_merge_key()) {
            let key_text = key_text(key)?;
            if !explicit.insert(key_text.clone()) {
                match self.options.duplicate_keys {
                    DuplicateKeyPolicy::FirstWins => continue,
                    DuplicateKeyPolicy::LastWins => {}
                    DuplicateKeyPolicy::Error => {
                        return Err(Error::DuplicateKey {
                            key: key_text,
                            location: key.location,
                        });
                    }
                }
            }
            let value = self.annotate(value, depth + 1, copy_site)?;
            // An existing merged key keeps its position.
            mapping.entries.insert(key_text, value);
        }

        Ok(mapping)
    }

    /// Spread the entries named by a `<<` value into `mapping`, keeping
    /// entries that are already present.
    fn apply_merge(
        &mut self,
        mapping: &mut Mapping,
        value: &Node,
        depth: usize,
        copy_site: Option<Location>,
    ) -> Result<(), Error> {
        match &value.kind {
            NodeKind::Alias { name, target } => {
                let entries = self.merge_source(name, target, value.location, depth)?;
                spread(mapping, entries);
                mapping.reference_of.get_or_insert_with(|| name.clone());
            }
            NodeKind::Sequence(items) => {
                for item in items {
                    let NodeKind::Alias { name, target } = &item.kind else {
                        return Err(Error::InvalidMerge {
                            location: item.location,
                        });
                    };
                    let entries = self.merge_source(name, target, item.location, depth)?;
                    spread(mapping, entries);
                    mapping.reference_of.get_or_insert_with(|| name.clone());
                }
            }
            NodeKind::Mapping(_) => {
                if let AnnotatedValue::Mapping(inline) = self.annotate(value, depth + 1, copy_site)? {
                    spread(mapping, inline.entries);
                }
            }
            NodeKind::Scalar { .. } => {
                return Err(Error::InvalidMerge {
                    location: value.location,
                });
            }
        }
        Ok(())
    }

    fn merge_source(
        &mut self,
        name: &str,
        target: &Node,
        site: Location,
        depth: usize,
    ) -> Result<IndexMap<String, AnnotatedValue>, Error> {
        if !matches!(target.kind, NodeKind::Mapping(_)) {
            return Err(Error::InvalidMerge { location: site });
        }
        match self.resolve_alias(name, target, site, depth + 1)? {
            AnnotatedValue::Mapping(m) => Ok(m.entries),
            _ => Err(Error::InvalidMerge { location: site }),
        }
    }
}

fn spread(mapping: &mut Mapping, entries: IndexMap<String, AnnotatedValue>) {
    for (key, value) in entries {
        mapping.entries.entry(key).or_insert(value);
    }
}

/// Keys are taken as their source text. An alias to a scalar stands for
/// that scalar's text.
fn key_text(key: &Node) -> Result<String, Error> {
    match &key.kind {
        NodeKind::Scalar { value, .. } => Ok(value.clone()),
        NodeKind::Alias { target, .. } => match &target.kind {
            NodeKind::Scalar { value, .. } => Ok(value.clone()),
            _ => Err(Error::UnsupportedKey {
                location: key.location,
            }),
        },
        _ => Err(Error::UnsupportedKey {
            location: key.location,
        }),
    }
}
