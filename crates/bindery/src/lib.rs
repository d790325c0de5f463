//! # Bindery
//!
//! Annotation-driven request data binding.
//!
//! Bindery populates typed destinations from the parts of an HTTP request:
//! path parameters, the URL query, headers and the body. Each field declares
//! which key it reads for each source; values are converted by the field's
//! type, with custom decoding hooks for types that need them.
//!
//! ## Sources
//!
//! | Tag | Source | Entry point |
//! |-----|--------|-------------|
//! | `param` | Path parameters | [`bind_path`] |
//! | `query` | URL query | [`bind_query`] |
//! | `header` | Headers | [`bind_headers`] |
//! | `json` | JSON body | [`bind_body`] |
//! | `xml` | XML body | [`bind_body`] |
//! | `form` | Urlencoded or multipart body | [`bind_body`] |
//!
//! [`bind_all`] runs path, query and body in that order; later sources
//! overwrite what earlier ones set.
//!
//! ## Example
//!
//! ```rust
//! use bindery::{bind_all, Bind, BindRequest};
//! use http::{Method, Uri};
//!
//! #[derive(Bind, Default, Debug)]
//! struct UpdateUser {
//!     #[bind(param = "id", query = "id", json = "id")]
//!     id: u64,
//!     #[bind(query = "notify")]
//!     notify: bool,
//!     #[bind(json = "name")]
//!     name: Option<String>,
//! }
//!
//! let request = BindRequest::builder()
//!     .method(Method::PUT)
//!     .uri(Uri::from_static("/users/7?notify=true"))
//!     .header("content-type", "application/json")
//!     .body(r#"{"name": "Ferris"}"#)
//!     .path_param("id", "7")
//!     .build();
//!
//! let mut update = UpdateUser::default();
//! bind_all(&mut update, &request).unwrap();
//!
//! assert_eq!(update.id, 7);
//! assert!(update.notify);
//! assert_eq!(update.name.as_deref(), Some("Ferris"));
//! ```
//!
//! ## Fluent Binding
//!
//! [`ValueBinder`] reads values one key at a time, with required variants
//! and error accumulation:
//!
//! ```rust
//! use bindery::{SourceMap, Tag, ValueBinder};
//!
//! let source = SourceMap::from_query("limit=x&offset=10");
//!
//! let mut limit = 20_u32;
//! let mut offset = 0_u32;
//! let errors = ValueBinder::new(&source, Tag::Query)
//!     .fail_fast(false)
//!     .value("limit", &mut limit)
//!     .must_value("offset", &mut offset)
//!     .bind_errors();
//!
//! assert_eq!(errors.len(), 1);
//! assert_eq!(offset, 10);
//! ```
//!
//! ## Error Handling
//!
//! Every pass returns [`BindError`], which carries a suggested HTTP status
//! and a stable error code:
//!
//! ```rust
//! use bindery::{BindError, Tag};
//!
//! let err = BindError::MissingRequiredValue {
//!     tag: Tag::Query,
//!     key: "id".to_string(),
//! };
//! assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
//! assert_eq!(err.error_code(), "MISSING_PARAMETER");
//! ```

#![doc(html_root_url = "https://docs.rs/bindery/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

extern crate self as bindery;

mod binder;
mod body;
mod config;
mod context;
mod convert;
mod descriptor;
mod error;
mod field;
mod form;
mod populate;
mod source;
mod tag;
mod value_binder;

pub use binder::{
    bind_all, bind_body, bind_headers, bind_path, bind_query, Binder, MIME_APPLICATION_FORM,
    MIME_APPLICATION_JSON, MIME_APPLICATION_XML, MIME_MULTIPART_FORM, MIME_TEXT_XML,
};
pub use body::{json_from_slice, xml_from_slice, BodyValue, DecodeBody};
pub use config::{BinderConfig, DEFAULT_MAX_BODY_SIZE, DEFAULT_MULTIPART_MAX_FIELDS, ENV_PREFIX};
pub use context::{BindRequest, BindRequestBuilder};
pub use convert::convert_scalar;
pub use descriptor::{
    Annotations, Bind, Destination, FieldDescriptor, MapElement, MapTarget, Target,
};
pub use error::{BindError, BodyFormat, BoxError, ConfigError};
pub use field::{
    DecodeParam, DecodeParams, DecodeText, Field, FromText, Kind, Pointer, Sequence,
};
pub use form::{parse_multipart, parse_urlencoded};
pub use populate::populate;
pub use source::{PathParams, SourceMap};
pub use tag::Tag;
pub use value_binder::ValueBinder;

/// Derives [`Bind`], [`Field`], [`Destination`] and [`DecodeBody`].
///
/// Field attributes: `#[bind(param = "..", query = "..", header = "..",
/// json = "..", xml = "..", form = "..")]` name the key per source,
/// `#[bind(flatten)]` promotes an embedded structure's fields and
/// `#[bind(skip)]` keeps a field out of every pass. A `"-"` json or xml
/// key excludes the field from that body decoder. Fields the body decoders
/// read implement [`BodyValue`]; nested `Bind` structures merge key by key.
///
/// The container attribute `#[bind(hooks(param, params, text))]` exposes
/// the decoding hooks the type implements when it is used as a field.
pub use bindery_macros::Bind;

#[doc(hidden)]
pub mod __private {
    pub use crate::body::{merge_json, merge_xml, BodyFields, BodyPatch};
    pub use serde;
}
