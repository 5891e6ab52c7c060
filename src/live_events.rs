//!
//! Live events: a compact layer over the YAML event stream from `saphyr_parser::Parser`.
//!
//! Responsibilities
//! - Provide owned, simplified events (`Ev`) for the composer.
//! - Hide stream/document markers; reject a second document.
//! - Track source locations for diagnostics.
//! - Give anchors and aliases their names (the parser only numbers them).
//! - Enforce the raw-event budget.
//!
//! Anchor names
//! - A cursor follows the source text. Scalars and aliases move it past
//!   their span; anchored nodes move it past their `&name` lexeme.
//! - For an anchored event the name is read from the first anchor lexeme
//!   after the cursor. If it cannot be found, a generated `a{id}` name is
//!   used and a warning is logged.
//! - Alias events carry the anchor id; the name comes from the table built
//!   while anchors were defined.

use std::borrow::Cow;
use std::collections::HashMap;

use saphyr_parser::{Event, Parser, ScalarStyle, Span, StrInput};
use tracing::{trace, warn};

use crate::budget::{Budget, BudgetEnforcer, BudgetReport};
use crate::error::{budget_error, Error};
use crate::location::{location_from_span, Location};
use crate::source_names::{alias_name_at, byte_position, next_anchor};

/// Owned event with anchor names resolved.
#[derive(Clone, Debug)]
pub(crate) enum Ev {
    Scalar {
        value: String,
        style: ScalarStyle,
        tag: Option<String>,
        anchor: Option<String>,
        location: Location,
    },
    SeqStart {
        anchor: Option<String>,
        location: Location,
    },
    SeqEnd {
        location: Location,
    },
    MapStart {
        anchor: Option<String>,
        location: Location,
    },
    MapEnd {
        location: Location,
    },
    Alias {
        name: String,
        location: Location,
    },
}

/// Live event source that wraps `saphyr_parser::Parser`.
pub(crate) struct LiveEvents<'a> {
    source: &'a str,
    parser: Parser<'a, StrInput<'a>>,
    /// Byte position in `source` up to which names have been consumed.
    cursor: usize,
    /// Anchor id (as numbered by the parser) -> name.
    names: HashMap<usize, String>,
    budget: Option<BudgetEnforcer>,
    /// Final budget report, once the stream is finished or the budget breached.
    report: Option<BudgetReport>,
    documents: usize,
    /// Location of the last yielded event (for better error reporting).
    last_location: Location,
}

impl<'a> LiveEvents<'a> {
    pub(crate) fn new(source: &'a str, budget: Option<Budget>) -> Self {
        Self {
            source,
            parser: Parser::new_from_str(source),
            cursor: 0,
            names: HashMap::new(),
            budget: budget.map(BudgetEnforcer::new),
            report: None,
            documents: 0,
            last_location: Location::UNKNOWN,
        }
    }

    pub(crate) fn last_location(&self) -> Location {
        self.last_location
    }

    /// Pull the next logical event, or `Ok(None)` at end of stream.
    pub(crate) fn next(&mut self) -> Result<Option<Ev>, Error> {
        while let Some(item) = self.parser.next() {
            let (raw, span) = item.map_err(|err| Error::from_scan_error(err, self.source))?;
            let location = location_from_span(&span);

            if let Some(mut budget) = self.budget.take() {
                match budget.observe(&raw) {
                    Ok(()) => self.budget = Some(budget),
                    Err(breach) => {
                        let mut report = budget.into_report();
                        report.breached = Some(breach.clone());
                        self.report = Some(report);
                        return Err(budget_error(breach).with_location(location));
                    }
                }
            }
            self.last_location = location;

            let ev = match raw {
                Event::StreamStart | Event::StreamEnd | Event::DocumentEnd | Event::Nothing => {
                    continue;
                }
                Event::DocumentStart(_) => {
                    self.documents += 1;
                    if self.documents > 1 {
                        return Err(Error::syntax(
                            "multiple documents in one stream are not supported",
                        )
                        .with_location(location));
                    }
                    continue;
                }
                Event::Scalar(value, style, anchor_id, tag) => {
                    let anchor = self.anchor_name(anchor_id, &span);
                    let value = match value {
                        Cow::Borrowed(v) => v.to_string(),
                        Cow::Owned(v) => v,
                    };
                    if !value.is_empty() || !matches!(style, ScalarStyle::Plain) {
                        self.advance_to(&span);
                    }
                    Ev::Scalar {
                        value,
                        style,
                        tag: tag.map(|t| t.to_string()),
                        anchor,
                        location,
                    }
                }
                Event::SequenceStart(anchor_id, _tag) => Ev::SeqStart {
                    anchor: self.anchor_name(anchor_id, &span),
                    location,
                },
                Event::SequenceEnd => Ev::SeqEnd { location },
                Event::MappingStart(anchor_id, _tag) => Ev::MapStart {
                    anchor: self.anchor_name(anchor_id, &span),
                    location,
                },
                Event::MappingEnd => Ev::MapEnd { location },
                Event::Alias(anchor_id) => {
                    let name = match self.names.get(&anchor_id) {
                        Some(name) => name.clone(),
                        None => {
                            let at = byte_position(self.source, &span.start);
                            let name = alias_name_at(self.source, at)
                                .unwrap_or_else(|| format!("a{anchor_id}"));
                            return Err(Error::UndefinedAnchor { name, location });
                        }
                    };
                    self.advance_to(&span);
                    trace!(alias = %name, line = location.line(), "alias");
                    Ev::Alias { name, location }
                }
            };
            return Ok(Some(ev));
        }

        Ok(None)
    }

    /// Resolve the name for `anchor_id` (0 means no anchor) and record it.
    fn anchor_name(&mut self, anchor_id: usize, span: &Span) -> Option<String> {
        if anchor_id == 0 {
            return None;
        }
        let name = match next_anchor(self.source, self.cursor) {
            Some((name, end)) => {
                self.cursor = end;
                name
            }
            None => {
                let name = format!("a{anchor_id}");
                warn!(
                    anchor = %name,
                    line = span.start.line(),
                    "could not read anchor name from source, using a generated one"
                );
                name
            }
        };
        trace!(anchor = %name, id = anchor_id, line = span.start.line(), "anchor");
        self.names.insert(anchor_id, name.clone());
        Some(name)
    }

    fn advance_to(&mut self, span: &Span) {
        let end = byte_position(self.source, &span.end);
        self.cursor = self.cursor.max(end);
    }

    /// Finalize the stream: run the final budget heuristics.
    pub(crate) fn finish(&mut self) -> Result<(), Error> {
        if let Some(budget) = self.budget.take() {
            let report = budget.finalize();
            let breached = report.breached.clone();
            self.report = Some(report);
            if let Some(breach) = breached {
                return Err(budget_error(breach).with_location(self.last_location));
            }
        }
        Ok(())
    }

    /// Budget report, available after [`LiveEvents::finish`] or a breach.
    pub(crate) fn take_report(&mut self) -> Option<BudgetReport> {
        self.report.take()
    }
}
