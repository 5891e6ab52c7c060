//! Public macros for constructing option structs without relying on struct literal syntax.
//!
//! Call sites stay valid when the option structs gain fields.

/// Construct [`crate::Options`] from `Default` and a list of field assignments.
///
/// ```rust
/// use yaml_anchor_codec::DuplicateAnchorPolicy;
///
/// let options = yaml_anchor_codec::options! {
///     duplicate_anchors: DuplicateAnchorPolicy::LastWins,
///     max_depth: 64,
/// };
/// assert_eq!(options.max_depth, 64);
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::Options::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Construct [`crate::Budget`] from `Default` and a list of field assignments.
///
/// ```rust
/// let budget = yaml_anchor_codec::budget! {
///     max_aliases: 10,
///     enforce_alias_anchor_ratio: false,
/// };
/// assert_eq!(budget.max_aliases, 10);
/// ```
#[macro_export]
macro_rules! budget {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut budget = $crate::Budget::default();
        $(
            budget.$field = $value;
        )*
        budget
    }};
}

/// Construct [`crate::GenerateOptions`] from `Default` and a list of field assignments.
///
/// ```rust
/// let opts = yaml_anchor_codec::generate_options! {
///     prune_inherited: false,
/// };
/// assert!(!opts.prune_inherited);
/// ```
#[macro_export]
macro_rules! generate_options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::GenerateOptions::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}
