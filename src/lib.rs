//! Round-trips YAML anchors (`&name`), aliases (`*name`) and merge keys
//! (`<<`) through a plain value tree.
//!
//! [`parse`] resolves every alias and merge key into ordinary data and
//! records where each anchor was defined ([`Mapping::anchor`],
//! [`Sequence::anchor`]) and which anchor a node was copied or merged from
//! (`reference_of`). [`generate`] writes such a tree back as block YAML,
//! re-creating `&anchor`, `*alias` and `<<: *alias` plus the overriding
//! keys.
//!
//! ```rust
//! use indoc::indoc;
//! use yaml_anchor_codec::{generate, parse};
//!
//! let yaml = indoc! {"
//!     base: &base
//!       role: guest
//!       level: 1
//!     admin:
//!       <<: *base
//!       role: admin
//! "};
//!
//! let value = parse(yaml).unwrap();
//! let admin = value.get("admin").unwrap();
//! assert_eq!(admin.reference_of(), Some("base"));
//! assert_eq!(admin.get("role").unwrap().as_str(), Some("admin"));
//! assert_eq!(admin.get("level").unwrap().as_i128(), Some(1));
//!
//! // `level` equals the anchor's own value and is left to the merge.
//! assert_eq!(
//!     generate(&value),
//!     indoc! {"
//!         ## Generated YAML from JSON with anchors and references
//!
//!         base: &base
//!           role: guest
//!           level: 1
//!         admin:
//!           <<: *base
//!           role: admin
//!     "}
//! );
//! ```

#![forbid(unsafe_code)]

use tracing::debug;

pub use budget::{check_budget, Budget, BudgetBreach, BudgetReport};
pub use error::Error;
pub use json::{from_annotated_json, parse_json, to_annotated_json};
pub use location::{Location, Span};
pub use options::{BudgetReportCallback, DuplicateAnchorPolicy, DuplicateKeyPolicy, GenerateOptions, Options};
pub use path::{Path, PathSegment};
pub use reader::{parse_reader, parse_reader_with_options};
pub use snippet::render_error;
pub use tree::{
    create_anchor, find_anchors, find_references, get, remove_reference, scope_report, set_reference, AnchorInfo,
    ReferenceInfo, TreeError,
};
pub use value::{AnnotatedValue, Mapping, Number, Sequence};

mod annotate;
pub mod budget;
mod compose;
mod emitter;
mod error;
mod json;
mod live_events;
mod location;
#[macro_use]
mod macros;
mod options;
mod parse_scalars;
mod path;
mod quoting;
mod reader;
mod snippet;
mod source_names;
mod tags;
mod tree;
mod value;

/// Parse one YAML document into an [`AnnotatedValue`] with default [`Options`].
///
/// Empty input (or only comments) gives an empty mapping.
///
/// ```rust
/// let value = yaml_anchor_codec::parse("list: &l [1, 2]\ncopy: *l\n").unwrap();
/// let copy = value.get("copy").unwrap();
/// assert_eq!(copy.reference_of(), Some("l"));
/// assert_eq!(copy.anchor(), None);
/// assert_eq!(value.get("list").unwrap().anchor(), Some("l"));
/// ```
pub fn parse(input: &str) -> Result<AnnotatedValue, Error> {
    parse_with_options(input, Options::default())
}

/// Parse one YAML document with explicit [`Options`].
///
/// The budget report callback, when set, sees the report both for accepted
/// documents and for documents rejected by the budget.
pub fn parse_with_options(input: &str, options: Options) -> Result<AnnotatedValue, Error> {
    debug!(bytes = input.len(), "parse");
    let mut events = live_events::LiveEvents::new(input, options.budget.clone());

    let result = compose::compose(&mut events, &options).and_then(|root| {
        events.finish()?;
        match root {
            Some(node) => annotate::Annotator::new(&options).annotate(&node, 0, None),
            None => Ok(AnnotatedValue::Mapping(Mapping::new())),
        }
    });

    if let (Some(cb), Some(report)) = (&options.budget_report_cb, events.take_report()) {
        (cb.borrow_mut())(report);
    }
    if let Err(err) = &result {
        debug!(error = %err, "parse failed");
    }
    result
}

/// Write `value` as YAML with default [`GenerateOptions`].
///
/// ```rust
/// use yaml_anchor_codec::{generate, AnnotatedValue, Mapping};
///
/// let value: AnnotatedValue = Mapping::from_iter([
///     ("count", AnnotatedValue::from(1.2e3)),
///     ("id", AnnotatedValue::from("123")),
/// ])
/// .into();
/// assert_eq!(
///     generate(&value),
///     "# Generated YAML from JSON with anchors and references\n\ncount: 1200\nid: \"123\"\n"
/// );
/// ```
pub fn generate(value: &AnnotatedValue) -> String {
    generate_with_options(value, GenerateOptions::default())
}

/// Write `value` as YAML. Never fails: every tree has a YAML rendering.
pub fn generate_with_options(value: &AnnotatedValue, options: GenerateOptions) -> String {
    debug!(kind = value.kind_name(), "generate");
    emitter::Emitter::new(value, options).emit(value)
}
