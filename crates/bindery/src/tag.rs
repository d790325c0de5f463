//! Source tags.
//!
//! A [`Tag`] names both the annotation slot consulted on each field and the
//! logical origin of the data being bound.

use std::fmt;

/// Identifier selecting an annotation slot and the origin of a source map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    /// URL path segments (`param` annotation).
    Param,
    /// URL query parameters.
    Query,
    /// HTTP headers.
    Header,
    /// JSON body fields.
    Json,
    /// XML body fields.
    Xml,
    /// Form body fields (urlencoded or multipart).
    Form,
}

impl Tag {
    /// All tags, in annotation-slot order.
    pub const ALL: [Tag; 6] = [
        Tag::Param,
        Tag::Query,
        Tag::Header,
        Tag::Json,
        Tag::Xml,
        Tag::Form,
    ];

    /// Returns the annotation name of this tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Param => "param",
            Self::Query => "query",
            Self::Header => "header",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Form => "form",
        }
    }

    /// Whether a pass under this tag silently accepts a destination that is
    /// neither a structure nor a compatible map.
    ///
    /// Path, query and header data may belong to a destination that is only
    /// meant to be filled from the body, so those passes become no-ops.
    #[must_use]
    pub const fn tolerates_opaque_destination(self) -> bool {
        matches!(self, Self::Param | Self::Query | Self::Header)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
