//! Binding error types.
//!
//! This module provides the error taxonomy for every binding pass and for
//! the fluent [`ValueBinder`](crate::ValueBinder), plus the configuration
//! error returned by [`BinderConfig`](crate::BinderConfig) loading.

use http::StatusCode;
use std::fmt;
use thiserror::Error;

use crate::field::Kind;
use crate::tag::Tag;

/// Boxed error returned by decoding hooks and external decoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Body format handed to an external decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// `application/json`
    Json,
    /// `application/xml` or `text/xml`
    Xml,
    /// `multipart/form-data`
    Multipart,
}

impl fmt::Display for BodyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Xml => write!(f, "xml"),
            Self::Multipart => write!(f, "multipart"),
        }
    }
}

/// Error that occurs while binding request data into a destination.
///
/// Passes abort on the first error; fields written before the error keep
/// their new values.
///
/// # Example
///
/// ```rust
/// use bindery::{BindError, Kind};
/// use http::StatusCode;
///
/// let err = BindError::ConversionFailure {
///     kind: Kind::I64,
///     raw: "abc".to_string(),
///     source: "invalid digit found in string".into(),
/// };
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.error_code(), "CONVERSION_FAILED");
/// assert!(err.to_string().contains("abc"));
/// ```
#[derive(Debug, Error)]
pub enum BindError {
    /// The body carries a content type no decoder is registered for.
    #[error("unsupported media type: {}", content_type.as_deref().unwrap_or("none"))]
    UnsupportedMediaType {
        /// The declared content type, if any.
        content_type: Option<String>,
    },

    /// An external structured decoder rejected the body.
    #[error("malformed {format} body{}: {source}", position(.line, .column))]
    MalformedBody {
        /// Which decoder failed.
        format: BodyFormat,
        /// 1-based line reported by the decoder.
        line: Option<usize>,
        /// 1-based column reported by the decoder.
        column: Option<usize>,
        /// Underlying decoder error.
        #[source]
        source: BoxError,
    },

    /// An embedded field carries an annotation for the active tag.
    #[error("{tag} annotation is not allowed on embedded field '{field}'")]
    AnnotationConflict {
        /// Name of the embedded field.
        field: &'static str,
        /// The active tag.
        tag: Tag,
    },

    /// The destination is neither a structure nor a compatible map.
    #[error("binding element must be a struct (tag '{tag}')")]
    UnsupportedDestinationShape {
        /// The active tag.
        tag: Tag,
    },

    /// The field kind has no scalar conversion.
    #[error("unknown field kind: {kind}")]
    UnknownFieldKind {
        /// Kind reported by the field.
        kind: Kind,
    },

    /// A raw value could not be parsed into the field kind.
    #[error("failed to convert {raw:?} to {kind}: {source}")]
    ConversionFailure {
        /// Target kind.
        kind: Kind,
        /// The offending raw value.
        raw: String,
        /// Parser error.
        #[source]
        source: BoxError,
    },

    /// A caller-implemented decoding hook failed.
    #[error("decoding hook failed: {source}")]
    Hook {
        /// Error returned by the hook.
        #[source]
        source: BoxError,
    },

    /// A required fluent-binder value is absent.
    #[error("missing required {tag} value: {key}")]
    MissingRequiredValue {
        /// Source the binder reads from.
        tag: Tag,
        /// The requested key.
        key: String,
    },

    /// Delimiter splitting produced several tokens for a scalar destination.
    #[error("{tag} value '{key}' splits into {tokens} values but the destination holds one")]
    DelimiterArityMismatch {
        /// Source the binder reads from.
        tag: Tag,
        /// The requested key.
        key: String,
        /// Number of tokens produced by the split.
        tokens: usize,
    },

    /// A fluent-binder value failed to convert.
    #[error("invalid {tag} value '{key}': {source}")]
    InvalidValue {
        /// Source the binder reads from.
        tag: Tag,
        /// The requested key.
        key: String,
        /// The conversion or hook error.
        #[source]
        source: Box<BindError>,
    },

    /// The body exceeds the configured limit.
    #[error("payload too large: max {max} bytes, got {actual} bytes")]
    PayloadTooLarge {
        /// Configured limit in bytes.
        max: usize,
        /// Actual body length in bytes.
        actual: usize,
    },
}

fn position(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(column)) => format!(" at line {line}, column {column}"),
        (Some(line), None) => format!(" at line {line}"),
        _ => String::new(),
    }
}

impl BindError {
    pub(crate) fn hook(source: BoxError) -> Self {
        Self::Hook { source }
    }

    pub(crate) fn conversion(
        kind: Kind,
        raw: &str,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::ConversionFailure {
            kind,
            raw: raw.to_owned(),
            source: source.into(),
        }
    }

    pub(crate) fn malformed(format: BodyFormat, source: impl Into<BoxError>) -> Self {
        Self::MalformedBody {
            format,
            line: None,
            column: None,
            source: source.into(),
        }
    }

    /// Returns the HTTP status code a caller would typically map this error to.
    ///
    /// Destination-shape problems are programming errors and map to 500.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::AnnotationConflict { .. }
            | Self::UnsupportedDestinationShape { .. }
            | Self::UnknownFieldKind { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MalformedBody { .. }
            | Self::ConversionFailure { .. }
            | Self::Hook { .. }
            | Self::MissingRequiredValue { .. }
            | Self::DelimiterArityMismatch { .. }
            | Self::InvalidValue { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns the error code suitable for error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            Self::MalformedBody { .. } => "MALFORMED_BODY",
            Self::AnnotationConflict { .. } => "ANNOTATION_CONFLICT",
            Self::UnsupportedDestinationShape { .. } => "UNSUPPORTED_DESTINATION",
            Self::UnknownFieldKind { .. } => "UNKNOWN_FIELD_KIND",
            Self::ConversionFailure { .. } => "CONVERSION_FAILED",
            Self::Hook { .. } => "HOOK_FAILED",
            Self::MissingRequiredValue { .. } => "MISSING_PARAMETER",
            Self::DelimiterArityMismatch { .. } => "DELIMITER_ARITY_MISMATCH",
            Self::InvalidValue { .. } => "INVALID_PARAMETER",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
        }
    }
}

/// Errors that can occur while loading a [`BinderConfig`](crate::BinderConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
