//! Defines error and its location
use std::fmt;

use saphyr_parser::ScanError;

use crate::budget::BudgetBreach;
use crate::location::{location_from_marker, Location};

/// Error returned by [`crate::parse`] and the other fallible entry points.
///
/// Every variant that can be tied to the input carries a [`Location`];
/// [`Error::location`] returns it when known.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Scanner or parser failure, or a stream with more than one document.
    Syntax {
        msg: String,
        location: Location,
    },
    /// Alias or merge key naming an anchor that was never defined.
    UndefinedAnchor {
        name: String,
        location: Location,
    },
    /// The same anchor name defined twice under [`crate::DuplicateAnchorPolicy::Error`].
    DuplicateAnchor {
        name: String,
        location: Location,
    },
    /// Duplicate mapping key under [`crate::DuplicateKeyPolicy::Error`].
    DuplicateKey {
        key: String,
        location: Location,
    },
    /// The value of `<<` is not an alias, a sequence of aliases or a mapping.
    InvalidMerge {
        location: Location,
    },
    /// Mapping key that is not a scalar.
    UnsupportedKey {
        location: Location,
    },
    /// Alias that points into the node still being defined.
    RecursiveAlias {
        name: String,
        location: Location,
    },
    /// Nesting deeper than [`crate::Options::max_depth`].
    TooDeep {
        limit: usize,
        location: Location,
    },
    /// Alias expansion produced more nodes than [`crate::Options::max_expanded_nodes`].
    ExpansionLimit {
        limit: usize,
        location: Location,
    },
    /// A YAML budget limit was exceeded.
    Budget {
        breach: BudgetBreach,
        location: Location,
    },
    /// Malformed JSON input.
    InvalidJson {
        msg: String,
        location: Location,
    },
    /// Unexpected I/O error. This may happen only when parsing from a reader.
    Io {
        cause: std::io::Error,
    },
}

impl Error {
    /// Construct a `Syntax` error with no known location.
    pub(crate) fn syntax<S: Into<String>>(msg: S) -> Self {
        Error::Syntax {
            msg: msg.into(),
            location: Location::UNKNOWN,
        }
    }

    /// Attach/override a concrete location to this error and return it.
    ///
    /// Called by:
    /// - Most error paths once the event position becomes known.
    pub(crate) fn with_location(mut self, set_location: Location) -> Self {
        match &mut self {
            Error::Syntax { location, .. }
            | Error::UndefinedAnchor { location, .. }
            | Error::DuplicateAnchor { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::InvalidMerge { location }
            | Error::UnsupportedKey { location }
            | Error::RecursiveAlias { location, .. }
            | Error::TooDeep { location, .. }
            | Error::ExpansionLimit { location, .. }
            | Error::Budget { location, .. }
            | Error::InvalidJson { location, .. } => {
                *location = set_location;
            }
            Error::Io { .. } => {} // this error does not support location
        }
        self
    }

    /// If the error has a known location, return it.
    ///
    /// Returns:
    /// - `Some(Location)` when coordinates are known; `None` otherwise.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Syntax { location, .. }
            | Error::UndefinedAnchor { location, .. }
            | Error::DuplicateAnchor { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::InvalidMerge { location }
            | Error::UnsupportedKey { location }
            | Error::RecursiveAlias { location, .. }
            | Error::TooDeep { location, .. }
            | Error::ExpansionLimit { location, .. }
            | Error::Budget { location, .. }
            | Error::InvalidJson { location, .. } => {
                if location != &Location::UNKNOWN {
                    Some(*location)
                } else {
                    None
                }
            }
            Error::Io { .. } => None,
        }
    }

    /// Map a `saphyr_parser::ScanError` into our error type with location.
    ///
    /// The parser reports aliases to unknown anchors as scan errors; those
    /// become [`Error::UndefinedAnchor`] when the alias name can be read from
    /// `source` at the error position.
    ///
    /// Called by:
    /// - The live events adapter when the underlying parser fails.
    pub(crate) fn from_scan_error(err: ScanError, source: &str) -> Self {
        let marker = err.marker();
        let location = location_from_marker(marker);
        let info = err.info();
        if info.contains("unknown anchor") {
            let offset = crate::source_names::byte_position(source, marker);
            if let Some(name) = crate::source_names::alias_name_at(source, offset) {
                return Error::UndefinedAnchor { name, location };
            }
        }
        Error::Syntax {
            msg: info.to_owned(),
            location,
        }
    }

    /// Map a `serde_json::Error` into [`Error::InvalidJson`].
    pub(crate) fn from_json_error(err: serde_json::Error) -> Self {
        let location = if err.line() > 0 {
            Location::new(err.line(), err.column())
        } else {
            Location::UNKNOWN
        };
        // serde_json appends its own "at line X column Y"; keep only the cause.
        let full = err.to_string();
        let msg = match full.rfind(" at line ") {
            Some(cut) if err.line() > 0 => full[..cut].to_string(),
            _ => full,
        };
        Error::InvalidJson { msg, location }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax { msg, location } => fmt_with_location(f, msg, location),
            Error::UndefinedAnchor { name, location } => {
                fmt_with_location(f, &format!("undefined anchor `{name}`"), location)
            }
            Error::DuplicateAnchor { name, location } => {
                fmt_with_location(f, &format!("duplicate anchor `{name}`"), location)
            }
            Error::DuplicateKey { key, location } => {
                fmt_with_location(f, &format!("duplicate mapping key `{key}`"), location)
            }
            Error::InvalidMerge { location } => fmt_with_location(
                f,
                "merge key value must be an alias, a sequence of aliases or a mapping",
                location,
            ),
            Error::UnsupportedKey { location } => {
                fmt_with_location(f, "mapping keys must be scalars", location)
            }
            Error::RecursiveAlias { name, location } => fmt_with_location(
                f,
                &format!("alias `{name}` refers to its own enclosing node"),
                location,
            ),
            Error::TooDeep { limit, location } => {
                fmt_with_location(f, &format!("nesting deeper than {limit} levels"), location)
            }
            Error::ExpansionLimit { limit, location } => fmt_with_location(
                f,
                &format!("alias expansion exceeded {limit} nodes"),
                location,
            ),
            Error::Budget { breach, location } => {
                fmt_with_location(f, &format!("YAML budget breached: {breach:?}"), location)
            }
            Error::InvalidJson { msg, location } => {
                fmt_with_location(f, &format!("invalid JSON: {msg}"), location)
            }
            Error::Io { cause } => write!(f, "IO error: {cause}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { cause } => Some(cause),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(cause: std::io::Error) -> Self {
        Error::Io { cause }
    }
}

/// Print a message optionally suffixed with "at line X, column Y".
fn fmt_with_location(f: &mut fmt::Formatter<'_>, msg: &str, location: &Location) -> fmt::Result {
    if location != &Location::UNKNOWN {
        write!(
            f,
            "{msg} at line {}, column {}",
            location.line, location.column
        )
    } else {
        write!(f, "{msg}")
    }
}

/// Convert a budget breach report into a user-facing error.
///
/// Called by:
/// - The live events layer when enforcing budgets during/after parsing.
pub(crate) fn budget_error(breach: BudgetBreach) -> Error {
    Error::Budget {
        breach,
        location: Location::UNKNOWN,
    }
}
