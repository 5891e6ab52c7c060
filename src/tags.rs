pub(crate) const TAG_STR: &str = "!!str";
pub(crate) const TAG_STR_SHORTHAND: &str = "!str";
pub(crate) const TAG_STR_CANONICAL: &str = "tag:yaml.org,2002:str";

pub(crate) const TAG_INT: &str = "!!int";
pub(crate) const TAG_INT_SHORTHAND: &str = "!int";
pub(crate) const TAG_INT_CANONICAL: &str = "tag:yaml.org,2002:int";

pub(crate) const TAG_FLOAT: &str = "!!float";
pub(crate) const TAG_FLOAT_SHORTHAND: &str = "!float";
pub(crate) const TAG_FLOAT_CANONICAL: &str = "tag:yaml.org,2002:float";

pub(crate) const TAG_BOOL: &str = "!!bool";
pub(crate) const TAG_BOOL_SHORTHAND: &str = "!bool";
pub(crate) const TAG_BOOL_CANONICAL: &str = "tag:yaml.org,2002:bool";

pub(crate) const TAG_NULL: &str = "!!null";
pub(crate) const TAG_NULL_SHORTHAND: &str = "!null";
pub(crate) const TAG_NULL_CANONICAL: &str = "tag:yaml.org,2002:null";

/// Core schema tag recognized on a scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScalarTag {
    Str,
    Int,
    Float,
    Bool,
    Null,
}

impl ScalarTag {
    pub(crate) fn name(self) -> &'static str {
        match self {
            ScalarTag::Str => TAG_STR,
            ScalarTag::Int => TAG_INT,
            ScalarTag::Float => TAG_FLOAT,
            ScalarTag::Bool => TAG_BOOL,
            ScalarTag::Null => TAG_NULL,
        }
    }
}

/// Classify a rendered tag. Tags outside the core schema yield `None` and the
/// scalar is resolved from its content.
pub(crate) fn classify_tag(tag: Option<&str>) -> Option<ScalarTag> {
    match tag? {
        TAG_STR | TAG_STR_SHORTHAND | TAG_STR_CANONICAL => Some(ScalarTag::Str),
        TAG_INT | TAG_INT_SHORTHAND | TAG_INT_CANONICAL => Some(ScalarTag::Int),
        TAG_FLOAT | TAG_FLOAT_SHORTHAND | TAG_FLOAT_CANONICAL => Some(ScalarTag::Float),
        TAG_BOOL | TAG_BOOL_SHORTHAND | TAG_BOOL_CANONICAL => Some(ScalarTag::Bool),
        TAG_NULL | TAG_NULL_SHORTHAND | TAG_NULL_CANONICAL => Some(ScalarTag::Null),
        _ => None,
    }
}
