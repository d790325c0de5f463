//! Multi-source orchestration.
//!
//! [`Binder`] runs populate passes against a [`BindRequest`]. The combined
//! [`Binder::bind`] applies path, then query, then body, so later sources
//! overwrite the fields earlier ones set. The order is fixed.

use http::Method;
use tracing::debug;

use crate::body::DecodeBody;
use crate::config::BinderConfig;
use crate::context::BindRequest;
use crate::descriptor::Destination;
use crate::error::BindError;
use crate::form::{parse_multipart, parse_urlencoded};
use crate::populate::populate;
use crate::source::SourceMap;
use crate::tag::Tag;
use crate::value_binder::ValueBinder;

/// `application/json`
pub const MIME_APPLICATION_JSON: &str = "application/json";
/// `application/xml`
pub const MIME_APPLICATION_XML: &str = "application/xml";
/// `text/xml`
pub const MIME_TEXT_XML: &str = "text/xml";
/// `application/x-www-form-urlencoded`
pub const MIME_APPLICATION_FORM: &str = "application/x-www-form-urlencoded";
/// `multipart/form-data`
pub const MIME_MULTIPART_FORM: &str = "multipart/form-data";

/// Configured entry point for binding passes.
///
/// A `Binder` holds no per-request state and can be shared freely.
///
/// # Example
///
/// ```rust
/// use bindery::{Bind, BindRequest, Binder, BinderConfig};
/// use http::{Method, Uri};
///
/// #[derive(Bind, Default)]
/// struct Search {
///     #[bind(param = "team", query = "team")]
///     team: String,
///     #[bind(query = "limit", json = "limit")]
///     limit: u32,
/// }
///
/// let request = BindRequest::builder()
///     .method(Method::POST)
///     .uri(Uri::from_static("/teams/core/search?limit=10"))
///     .header("content-type", "application/json")
///     .body(r#"{"limit": 25}"#)
///     .path_param("team", "core")
///     .build();
///
/// let binder = Binder::new(BinderConfig::default());
/// let mut search = Search::default();
/// binder.bind(&mut search, &request).unwrap();
///
/// assert_eq!(search.team, "core");
/// assert_eq!(search.limit, 25);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Binder {
    config: BinderConfig,
}

impl Binder {
    /// Creates a binder with the given configuration.
    #[must_use]
    pub fn new(config: BinderConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Runs the path, query and body passes in that order.
    ///
    /// The first failing pass aborts; later passes do not run.
    pub fn bind<D>(&self, destination: &mut D, request: &BindRequest) -> Result<(), BindError>
    where
        D: Destination + DecodeBody + ?Sized,
    {
        self.bind_path(destination, request)?;
        self.bind_query(destination, request)?;
        self.bind_body(destination, request)
    }

    /// Populates `param`-annotated fields from the path parameters.
    pub fn bind_path<D>(&self, destination: &mut D, request: &BindRequest) -> Result<(), BindError>
    where
        D: Destination + ?Sized,
    {
        populate(destination, &request.path_source(), Tag::Param)
    }

    /// Populates `query`-annotated fields from the URL query.
    pub fn bind_query<D>(&self, destination: &mut D, request: &BindRequest) -> Result<(), BindError>
    where
        D: Destination + ?Sized,
    {
        populate(destination, &request.query_source(), Tag::Query)
    }

    /// Populates `header`-annotated fields from the request headers.
    ///
    /// Header names are lowercase, so mixed-case annotations resolve
    /// through the case-insensitive fallback.
    pub fn bind_headers<D>(&self, destination: &mut D, request: &BindRequest) -> Result<(), BindError>
    where
        D: Destination + ?Sized,
    {
        populate(destination, &request.header_source(), Tag::Header)
    }

    /// Decodes the body according to its content type.
    ///
    /// An empty body is a no-op whatever the content type. JSON and XML
    /// merge through [`DecodeBody`]; form bodies run a `form` pass.
    pub fn bind_body<D>(&self, destination: &mut D, request: &BindRequest) -> Result<(), BindError>
    where
        D: Destination + DecodeBody + ?Sized,
    {
        let body = request.body();
        if body.is_empty() {
            return Ok(());
        }
        if body.len() > self.config.max_body_size {
            return Err(BindError::PayloadTooLarge {
                max: self.config.max_body_size,
                actual: body.len(),
            });
        }

        let content_type = request.content_type().unwrap_or_default();
        debug!(content_type, len = body.len(), "binding request body");

        if content_type.starts_with(MIME_APPLICATION_JSON) {
            destination.decode_json(body)
        } else if content_type.starts_with(MIME_APPLICATION_XML)
            || content_type.starts_with(MIME_TEXT_XML)
        {
            destination.decode_xml(body)
        } else if content_type.starts_with(MIME_APPLICATION_FORM) {
            populate(destination, &parse_urlencoded(body), Tag::Form)
        } else if content_type.starts_with(MIME_MULTIPART_FORM) {
            let source = parse_multipart(
                content_type,
                body.clone(),
                self.config.multipart_max_fields,
            )?;
            populate(destination, &source, Tag::Form)
        } else {
            Err(BindError::UnsupportedMediaType {
                content_type: request.content_type().map(str::to_owned),
            })
        }
    }

    /// Returns a fluent binder over the URL query.
    #[must_use]
    pub fn query_values(&self, request: &BindRequest) -> ValueBinder<'static> {
        self.fluent(request.query_source(), Tag::Query)
    }

    /// Returns a fluent binder over the path parameters.
    #[must_use]
    pub fn path_values(&self, request: &BindRequest) -> ValueBinder<'static> {
        self.fluent(request.path_source(), Tag::Param)
    }

    /// Returns a fluent binder over form fields.
    ///
    /// For POST, PUT and PATCH requests with a form content type the body
    /// fields come first; URL query values follow under the same keys.
    pub fn form_values(&self, request: &BindRequest) -> Result<ValueBinder<'static>, BindError> {
        let mut source = self.form_source(request)?;
        source.extend(request.query_source());
        Ok(self.fluent(source, Tag::Form))
    }

    fn fluent(&self, source: SourceMap, tag: Tag) -> ValueBinder<'static> {
        let mut binder = ValueBinder::owned(source, tag);
        binder.fail_fast(self.config.fail_fast);
        binder
    }

    fn form_source(&self, request: &BindRequest) -> Result<SourceMap, BindError> {
        let method = request.method();
        let body = request.body();
        let accepts_body = [Method::POST, Method::PUT, Method::PATCH].contains(method);
        if body.is_empty() || !accepts_body {
            return Ok(SourceMap::new());
        }
        if body.len() > self.config.max_body_size {
            return Err(BindError::PayloadTooLarge {
                max: self.config.max_body_size,
                actual: body.len(),
            });
        }

        let content_type = request.content_type().unwrap_or_default();
        if content_type.starts_with(MIME_APPLICATION_FORM) {
            Ok(parse_urlencoded(body))
        } else if content_type.starts_with(MIME_MULTIPART_FORM) {
            parse_multipart(content_type, body.clone(), self.config.multipart_max_fields)
        } else {
            Ok(SourceMap::new())
        }
    }
}

/// Runs [`Binder::bind`] with the default configuration.
pub fn bind_all<D>(destination: &mut D, request: &BindRequest) -> Result<(), BindError>
where
    D: Destination + DecodeBody + ?Sized,
{
    Binder::default().bind(destination, request)
}

/// Runs [`Binder::bind_path`] with the default configuration.
pub fn bind_path<D>(destination: &mut D, request: &BindRequest) -> Result<(), BindError>
where
    D: Destination + ?Sized,
{
    Binder::default().bind_path(destination, request)
}

/// Runs [`Binder::bind_query`] with the default configuration.
pub fn bind_query<D>(destination: &mut D, request: &BindRequest) -> Result<(), BindError>
where
    D: Destination + ?Sized,
{
    Binder::default().bind_query(destination, request)
}

/// Runs [`Binder::bind_headers`] with the default configuration.
pub fn bind_headers<D>(destination: &mut D, request: &BindRequest) -> Result<(), BindError>
where
    D: Destination + ?Sized,
{
    Binder::default().bind_headers(destination, request)
}

/// Runs [`Binder::bind_body`] with the default configuration.
pub fn bind_body<D>(destination: &mut D, request: &BindRequest) -> Result<(), BindError>
where
    D: Destination + DecodeBody + ?Sized,
{
    Binder::default().bind_body(destination, request)
}
