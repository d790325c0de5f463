//! Normalized key → multi-value sources.
//!
//! Every origin (path, query, headers, form body) is normalized into a
//! [`SourceMap`] before binding. Path parameters arrive from the router as
//! ordered [`PathParams`].

use http::HeaderMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use tracing::trace;

/// Maximum number of path parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Keys mapped to ordered sequences of raw string values.
///
/// Keys are unique; repeated parameters append to the key's sequence.
/// Keys are kept in lexicographic order, which makes the case-insensitive
/// fallback of [`SourceMap::lookup`] deterministic.
///
/// # Example
///
/// ```rust
/// use bindery::SourceMap;
///
/// let source = SourceMap::from_query("id=1&id=2&name=ferris");
///
/// assert_eq!(source.get("id"), Some(&["1".to_string(), "2".to_string()][..]));
/// assert_eq!(source.first("name"), Some("ferris"));
/// assert_eq!(source.lookup("NAME").map(|v| v.len()), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl SourceMap {
    /// Creates an empty source map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string.
    ///
    /// Repeated keys keep their values in encounter order. Malformed
    /// percent-escapes are decoded leniently, so query parsing never fails.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
        pairs.into_iter().collect()
    }

    /// Normalizes request headers.
    ///
    /// Header names are lowercase; repeated header lines append values.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }

    /// Normalizes router path parameters, one value per name.
    #[must_use]
    pub fn from_path(params: &PathParams) -> Self {
        params
            .iter()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect()
    }

    /// Appends a value to the key's sequence.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// Replaces the key's sequence.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.entries.insert(key.into(), values);
    }

    /// Appends every value of `other`, key by key, after the existing values.
    pub fn extend(&mut self, other: SourceMap) {
        for (key, values) in other.entries {
            self.entries.entry(key).or_default().extend(values);
        }
    }

    /// Returns the values stored under exactly `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Returns the first value stored under exactly `key`.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    /// Resolves `key` with exact match first, then case-insensitively.
    ///
    /// When several stored keys differ from `key` only by letter case, the
    /// lexicographically smallest one wins.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&[String]> {
        if let Some(values) = self.get(key) {
            return Some(values);
        }
        let (matched, values) = self
            .entries
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key) || eq_unicode_fold(candidate, key))?;
        trace!(requested = key, matched = matched.as_str(), "case-insensitive key match");
        Some(values.as_slice())
    }

    /// Returns true if the map holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns an iterator over keys and their values, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

fn eq_unicode_fold(left: &str, right: &str) -> bool {
    left.chars().flat_map(char::to_lowercase).eq(right.chars().flat_map(char::to_lowercase))
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SourceMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut source = Self::new();
        for (key, value) in iter {
            source.append(key, value);
        }
        source
    }
}

impl<'a> IntoIterator for &'a SourceMap {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Path parameters extracted by a router, as ordered (name, value) pairs.
///
/// Uses small-vector optimization to avoid heap allocation for common
/// cases with few parameters.
///
/// # Example
///
/// ```rust
/// use bindery::PathParams;
///
/// let mut params = PathParams::new();
/// params.push("userId", "123");
/// params.push("action", "view");
///
/// assert_eq!(params.get("userId"), Some("123"));
/// assert_eq!(params.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParams {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl PathParams {
    /// Creates a new empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter to the set.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}
