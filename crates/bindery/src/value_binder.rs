//! Fluent typed binder.
//!
//! [`ValueBinder`] binds values one key at a time from a single
//! [`SourceMap`], without annotations. Getters chain; errors are recorded
//! instead of returned and read back with [`ValueBinder::bind_error`] or
//! [`ValueBinder::bind_errors`].
//!
//! ```rust
//! use bindery::{SourceMap, Tag, ValueBinder};
//!
//! let source = SourceMap::from_query("page=2&ids=1,2&ids=3");
//!
//! let mut page = 1_u32;
//! let mut ids: Vec<i64> = Vec::new();
//! let mut length: Option<u32> = None;
//!
//! let err = ValueBinder::new(&source, Tag::Query)
//!     .must_value("page", &mut page)
//!     .delimited_values("ids", ",", &mut ids)
//!     .value("length", &mut length)
//!     .bind_error();
//!
//! assert!(err.is_none());
//! assert_eq!(page, 2);
//! assert_eq!(ids, vec![1, 2, 3]);
//! assert_eq!(length, None);
//! ```

use std::borrow::Cow;

use tracing::debug;

use crate::binder::Binder;
use crate::context::BindRequest;
use crate::convert::convert_scalar;
use crate::error::{BindError, BoxError};
use crate::field::{DecodeParam, DecodeParams, DecodeText, Field, Sequence};
use crate::source::SourceMap;
use crate::tag::Tag;

/// Stateful binder over one source map.
///
/// Keys resolve by exact match only. With fail-fast enabled (the default)
/// the first recorded error turns every later getter into a no-op until the
/// errors are read back.
#[derive(Debug)]
pub struct ValueBinder<'a> {
    source: Cow<'a, SourceMap>,
    tag: Tag,
    fail_fast: bool,
    errors: Vec<BindError>,
}

impl<'a> ValueBinder<'a> {
    /// Creates a binder borrowing `source`, labelled with `tag` in errors.
    #[must_use]
    pub fn new(source: &'a SourceMap, tag: Tag) -> Self {
        Self {
            source: Cow::Borrowed(source),
            tag,
            fail_fast: true,
            errors: Vec::new(),
        }
    }

    /// Sets fail-fast mode.
    pub fn fail_fast(&mut self, enabled: bool) -> &mut Self {
        self.fail_fast = enabled;
        self
    }

    /// Returns the errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &[BindError] {
        &self.errors
    }

    /// Returns the first recorded error and resets the binder.
    pub fn bind_error(&mut self) -> Option<BindError> {
        let mut errors = std::mem::take(&mut self.errors);
        if errors.is_empty() {
            None
        } else {
            Some(errors.swap_remove(0))
        }
    }

    /// Returns every recorded error, in order, and resets the binder.
    pub fn bind_errors(&mut self) -> Vec<BindError> {
        std::mem::take(&mut self.errors)
    }

    /// Converts the first value of `key` into `dest`, if present.
    pub fn value<T: Field>(&mut self, key: &str, dest: &mut T) -> &mut Self {
        self.bind_with(key, false, |values| convert_scalar(dest, &values[0]))
    }

    /// Converts the first value of `key` into `dest`; records an error if absent.
    pub fn must_value<T: Field>(&mut self, key: &str, dest: &mut T) -> &mut Self {
        self.bind_with(key, true, |values| convert_scalar(dest, &values[0]))
    }

    /// Converts every value of `key` into `dest`, if present.
    pub fn values<T: Field + Default>(&mut self, key: &str, dest: &mut Vec<T>) -> &mut Self {
        self.bind_with(key, false, |values| dest.assign(values))
    }

    /// Converts every value of `key` into `dest`; records an error if absent.
    pub fn must_values<T: Field + Default>(&mut self, key: &str, dest: &mut Vec<T>) -> &mut Self {
        self.bind_with(key, true, |values| dest.assign(values))
    }

    /// Splits the first value of `key` by `delimiter` into a single `dest`.
    ///
    /// More than one token records [`BindError::DelimiterArityMismatch`].
    pub fn delimited_value<T: Field>(&mut self, key: &str, delimiter: &str, dest: &mut T) -> &mut Self {
        let tag = self.tag;
        self.bind_with(key, false, |values| split_one(tag, key, delimiter, &values[0], dest))
    }

    /// Required variant of [`ValueBinder::delimited_value`].
    pub fn must_delimited_value<T: Field>(
        &mut self,
        key: &str,
        delimiter: &str,
        dest: &mut T,
    ) -> &mut Self {
        let tag = self.tag;
        self.bind_with(key, true, |values| split_one(tag, key, delimiter, &values[0], dest))
    }

    /// Splits every value of `key` by `delimiter` and converts all tokens,
    /// in encounter order, into `dest`.
    pub fn delimited_values<T: Field + Default>(
        &mut self,
        key: &str,
        delimiter: &str,
        dest: &mut Vec<T>,
    ) -> &mut Self {
        self.bind_with(key, false, |values| dest.assign(&split_all(values, delimiter)))
    }

    /// Required variant of [`ValueBinder::delimited_values`].
    pub fn must_delimited_values<T: Field + Default>(
        &mut self,
        key: &str,
        delimiter: &str,
        dest: &mut Vec<T>,
    ) -> &mut Self {
        self.bind_with(key, true, |values| dest.assign(&split_all(values, delimiter)))
    }

    /// Hands the first value of `key` to a single-value hook.
    pub fn hook(&mut self, key: &str, dest: &mut dyn DecodeParam) -> &mut Self {
        self.bind_with(key, false, |values| {
            dest.decode_param(&values[0]).map_err(BindError::hook)
        })
    }

    /// Required variant of [`ValueBinder::hook`].
    pub fn must_hook(&mut self, key: &str, dest: &mut dyn DecodeParam) -> &mut Self {
        self.bind_with(key, true, |values| {
            dest.decode_param(&values[0]).map_err(BindError::hook)
        })
    }

    /// Hands the first value of `key` to a text hook.
    pub fn text_hook(&mut self, key: &str, dest: &mut dyn DecodeText) -> &mut Self {
        self.bind_with(key, false, |values| {
            dest.decode_text(values[0].as_bytes()).map_err(BindError::hook)
        })
    }

    /// Required variant of [`ValueBinder::text_hook`].
    pub fn must_text_hook(&mut self, key: &str, dest: &mut dyn DecodeText) -> &mut Self {
        self.bind_with(key, true, |values| {
            dest.decode_text(values[0].as_bytes()).map_err(BindError::hook)
        })
    }

    /// Hands every value of `key` to a multi-value hook.
    pub fn params_hook(&mut self, key: &str, dest: &mut dyn DecodeParams) -> &mut Self {
        self.bind_with(key, false, |values| dest.decode_params(values).map_err(BindError::hook))
    }

    /// Required variant of [`ValueBinder::params_hook`].
    pub fn must_params_hook(&mut self, key: &str, dest: &mut dyn DecodeParams) -> &mut Self {
        self.bind_with(key, true, |values| dest.decode_params(values).map_err(BindError::hook))
    }

    /// Hands every value of `key` to a closure.
    pub fn custom<F>(&mut self, key: &str, f: F) -> &mut Self
    where
        F: FnOnce(&[String]) -> Result<(), BoxError>,
    {
        self.bind_with(key, false, |values| f(values).map_err(BindError::hook))
    }

    /// Required variant of [`ValueBinder::custom`].
    pub fn must_custom<F>(&mut self, key: &str, f: F) -> &mut Self
    where
        F: FnOnce(&[String]) -> Result<(), BoxError>,
    {
        self.bind_with(key, true, |values| f(values).map_err(BindError::hook))
    }

    fn bind_with<F>(&mut self, key: &str, required: bool, apply: F) -> &mut Self
    where
        F: FnOnce(&[String]) -> Result<(), BindError>,
    {
        if self.fail_fast && !self.errors.is_empty() {
            return self;
        }

        let tag = self.tag;
        let outcome = match self.source.get(key) {
            Some(values) if !values.is_empty() => apply(values).map_err(|err| match err {
                err @ BindError::DelimiterArityMismatch { .. } => err,
                err => BindError::InvalidValue {
                    tag,
                    key: key.to_owned(),
                    source: Box::new(err),
                },
            }),
            _ if required => Err(BindError::MissingRequiredValue {
                tag,
                key: key.to_owned(),
            }),
            _ => Ok(()),
        };

        if let Err(err) = outcome {
            debug!(tag = %tag, key, error = %err, "recorded binding error");
            self.errors.push(err);
        }
        self
    }
}

impl ValueBinder<'static> {
    /// Creates a binder owning `source`.
    #[must_use]
    pub fn owned(source: SourceMap, tag: Tag) -> Self {
        Self {
            source: Cow::Owned(source),
            tag,
            fail_fast: true,
            errors: Vec::new(),
        }
    }

    /// Creates a binder over the URL query of `request`.
    #[must_use]
    pub fn query(request: &BindRequest) -> Self {
        Binder::default().query_values(request)
    }

    /// Creates a binder over the path parameters of `request`.
    #[must_use]
    pub fn path(request: &BindRequest) -> Self {
        Binder::default().path_values(request)
    }

    /// Creates a binder over the form fields of `request`.
    ///
    /// See [`Binder::form_values`].
    pub fn form(request: &BindRequest) -> Result<Self, BindError> {
        Binder::default().form_values(request)
    }
}

fn split_one(
    tag: Tag,
    key: &str,
    delimiter: &str,
    raw: &str,
    dest: &mut dyn Field,
) -> Result<(), BindError> {
    let tokens: Vec<&str> = raw.split(delimiter).collect();
    if tokens.len() > 1 {
        return Err(BindError::DelimiterArityMismatch {
            tag,
            key: key.to_owned(),
            tokens: tokens.len(),
        });
    }
    convert_scalar(dest, tokens[0])
}

fn split_all(values: &[String], delimiter: &str) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split(delimiter))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Kind;

    fn source(query: &str) -> SourceMap {
        SourceMap::from_query(query)
    }

    #[test]
    fn test_optional_absent_leaves_destination() {
        let source = source("other=1");
        let mut id = 5_i64;
        let mut binder = ValueBinder::new(&source, Tag::Query);
        binder.value("id", &mut id);
        assert!(binder.bind_error().is_none());
        assert_eq!(id, 5);
    }

    #[test]
    fn test_required_absent_records_missing() {
        for fail_fast in [true, false] {
            let source = source("other=1");
            let mut id = 0_i64;
            let err = ValueBinder::new(&source, Tag::Query)
                .fail_fast(fail_fast)
                .must_value("id", &mut id)
                .bind_error();
            assert!(matches!(
                err,
                Some(BindError::MissingRequiredValue { tag: Tag::Query, ref key }) if key == "id"
            ));
        }
    }

    #[test]
    fn test_exact_match_only() {
        let source = source("ID=7");
        let mut id = 0_i64;
        let err = ValueBinder::new(&source, Tag::Query)
            .must_value("id", &mut id)
            .bind_error();
        assert!(matches!(err, Some(BindError::MissingRequiredValue { .. })));
        assert_eq!(id, 0);
    }

    #[test]
    fn test_fail_fast_suppresses_later_calls() {
        let source = source("a=x&b=2");
        let mut a = 0_i32;
        let mut b = 0_i32;
        let mut binder = ValueBinder::new(&source, Tag::Query);
        binder.value("a", &mut a).value("b", &mut b);

        assert_eq!(b, 0);
        assert_eq!(binder.errors().len(), 1);
        let err = binder.bind_error().unwrap();
        assert!(matches!(
            err,
            BindError::InvalidValue { ref key, .. } if key == "a"
        ));
        assert!(binder.errors().is_empty());

        // reset after reading errors
        binder.value("b", &mut b);
        assert_eq!(b, 2);
    }

    #[test]
    fn test_collect_all_errors() {
        let source = source("a=x&b=y&c=3");
        let mut a = 0_u8;
        let mut b = false;
        let mut c = 0_u8;
        let errors = ValueBinder::new(&source, Tag::Form)
            .fail_fast(false)
            .value("a", &mut a)
            .value("b", &mut b)
            .must_value("missing", &mut c)
            .value("c", &mut c)
            .bind_errors();

        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[2], BindError::MissingRequiredValue { .. }));
        assert_eq!(c, 3);
    }

    #[test]
    fn test_invalid_value_wraps_conversion() {
        let source = source("port=70000");
        let mut port = 0_u16;
        let err = ValueBinder::new(&source, Tag::Param)
            .value("port", &mut port)
            .bind_error()
            .unwrap();
        match err {
            BindError::InvalidValue { tag, key, source } => {
                assert_eq!(tag, Tag::Param);
                assert_eq!(key, "port");
                assert!(matches!(*source, BindError::ConversionFailure { kind: Kind::U16, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_values_and_pointer_values() {
        let source = source("id=1&id=2&id=3&on=");
        let mut ids: Vec<u64> = Vec::new();
        let mut on: Option<bool> = Some(true);
        let err = ValueBinder::new(&source, Tag::Query)
            .must_values("id", &mut ids)
            .value("on", &mut on)
            .bind_error();
        assert!(err.is_none());
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(on, Some(false));
    }

    #[test]
    fn test_delimited_values_flatten_in_order() {
        let source = source("id=1,2,3&id=4");
        let mut ids: Vec<i32> = Vec::new();
        let err = ValueBinder::new(&source, Tag::Query)
            .delimited_values("id", ",", &mut ids)
            .bind_error();
        assert!(err.is_none());
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_delimited_value_arity() {
        let source = source("one=5&many=1;2");
        let mut one = 0_i32;
        let mut many = 0_i32;
        let errors = ValueBinder::new(&source, Tag::Query)
            .fail_fast(false)
            .must_delimited_value("one", ";", &mut one)
            .delimited_value("many", ";", &mut many)
            .bind_errors();

        assert_eq!(one, 5);
        assert_eq!(many, 0);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            BindError::DelimiterArityMismatch { tokens: 2, .. }
        ));
    }

    #[derive(Default)]
    struct Joined(String);

    impl DecodeParams for Joined {
        fn decode_params(&mut self, raw: &[String]) -> Result<(), BoxError> {
            self.0 = raw.join("|");
            Ok(())
        }
    }

    impl DecodeParam for Joined {
        fn decode_param(&mut self, raw: &str) -> Result<(), BoxError> {
            if raw.is_empty() {
                return Err("empty".into());
            }
            self.0 = raw.to_owned();
            Ok(())
        }
    }

    #[test]
    fn test_hooks() {
        let source = source("tag=a&tag=b&name=x&blank=");
        let mut tags = Joined::default();
        let mut name = Joined::default();
        let mut addr = crate::FromText(std::net::Ipv4Addr::UNSPECIFIED);
        let errors = ValueBinder::new(&source, Tag::Query)
            .fail_fast(false)
            .params_hook("tag", &mut tags)
            .must_hook("name", &mut name)
            .hook("blank", &mut Joined::default())
            .text_hook("addr", &mut addr)
            .bind_errors();

        assert_eq!(tags.0, "a|b");
        assert_eq!(name.0, "x");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            BindError::InvalidValue { key, source, .. }
                if key == "blank" && matches!(**source, BindError::Hook { .. })
        ));
    }

    #[test]
    fn test_custom() {
        let source = source("range=1-5");
        let mut bounds = (0_u32, 0_u32);
        let err = ValueBinder::new(&source, Tag::Query)
            .must_custom("range", |values| {
                let (low, high) = values[0].split_once('-').ok_or("missing '-'")?;
                bounds = (low.parse()?, high.parse()?);
                Ok(())
            })
            .bind_error();
        assert!(err.is_none());
        assert_eq!(bounds, (1, 5));
    }

    #[test]
    fn test_request_constructors() {
        let request = BindRequest::builder()
            .uri(http::Uri::from_static("/users/9?verbose=true"))
            .path_param("id", "9")
            .build();

        let mut verbose = false;
        let mut id = 0_u32;
        assert!(ValueBinder::query(&request)
            .must_value("verbose", &mut verbose)
            .bind_error()
            .is_none());
        assert!(ValueBinder::path(&request)
            .must_value("id", &mut id)
            .bind_error()
            .is_none());
        assert!(verbose);
        assert_eq!(id, 9);

        let err = ValueBinder::path(&request)
            .must_value("missing", &mut id)
            .bind_error();
        assert!(matches!(err, Some(BindError::MissingRequiredValue { tag: Tag::Param, .. })));
    }
}
