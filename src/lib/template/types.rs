use std::collections::HashMap;

/// Key/value view of a container: `name`, `image`, then every label.
pub type Attributes = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder { key: String, default: String },
}

/// A parsed filename format such as `rules/{name}-{env:prod}.yml`.
///
/// Built once from a format string and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub(super) segments: Vec<Segment>,
}
