//! Structured body decoding.
//!
//! JSON and XML bodies are decoded with serde into a *patch* of the
//! destination: every field optional, so a body only overwrites the keys it
//! carries. `#[derive(Bind)]` generates the patch types; maps, vectors and
//! `serde_json::Value` decode through serde directly.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::error::{BindError, BodyFormat};
use crate::field::FromText;

/// A destination that structured body decoders can merge into.
///
/// Implemented by `#[derive(Bind)]` for structures. Maps extend with the
/// decoded entries; vectors and `serde_json::Value` are replaced.
pub trait DecodeBody {
    /// Merges a JSON body into `self`.
    fn decode_json(&mut self, body: &[u8]) -> Result<(), BindError>;

    /// Merges an XML body into `self`.
    fn decode_xml(&mut self, body: &[u8]) -> Result<(), BindError>;
}

/// Partial update decoded from a body.
#[doc(hidden)]
pub trait BodyPatch<T: ?Sized> {
    /// Returns true if the body carried none of the patch's keys.
    fn is_empty(&self) -> bool;

    /// Writes every present key into `target`.
    fn apply(self, target: &mut T);
}

/// Associates a structure with its generated body patches.
#[doc(hidden)]
pub trait BodyFields {
    /// Patch decoded from JSON.
    type JsonPatch: DeserializeOwned + BodyPatch<Self>;
    /// Patch decoded from XML.
    type XmlPatch: DeserializeOwned + BodyPatch<Self>;
}

/// A field type a structured body can write into.
///
/// A body carries a `Json`/`Xml` representation of the field, which is then
/// applied to the field's current value. Plain values are replaced;
/// `#[derive(Bind)]` structures use their generated patches, so a nested
/// structure keeps every key the body leaves out and honours its own
/// `json`/`xml` keys.
///
/// Types that deserialize as a whole opt in with
/// [`body_value!`](crate::body_value).
pub trait BodyValue {
    /// Representation decoded from JSON.
    type Json: DeserializeOwned;
    /// Representation decoded from XML.
    type Xml: DeserializeOwned;

    /// Writes a decoded JSON value into `self`.
    fn apply_json(&mut self, value: Self::Json);

    /// Writes a decoded XML value into `self`.
    fn apply_xml(&mut self, value: Self::Xml);
}

/// Implements [`BodyValue`] for types a body replaces as a whole.
///
/// # Example
///
/// ```rust
/// use bindery::{body_value, BodyValue};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, PartialEq, Deserialize)]
/// enum Role {
///     #[default]
///     Reader,
///     Admin,
/// }
///
/// body_value!(Role);
///
/// let mut role = Role::Reader;
/// role.apply_json(Role::Admin);
/// assert_eq!(role, Role::Admin);
/// ```
#[macro_export]
macro_rules! body_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::BodyValue for $ty {
                type Json = Self;
                type Xml = Self;

                fn apply_json(&mut self, value: Self::Json) {
                    *self = value;
                }

                fn apply_xml(&mut self, value: Self::Xml) {
                    *self = value;
                }
            }
        )+
    };
}

crate::body_value!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    serde_json::Value,
);

impl<T> BodyValue for FromText<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    type Json = Self;
    type Xml = Self;

    fn apply_json(&mut self, value: Self::Json) {
        *self = value;
    }

    fn apply_xml(&mut self, value: Self::Xml) {
        *self = value;
    }
}

// A body `null` decodes as an absent key, so it never clears the pointer.
impl<T: BodyValue + Default> BodyValue for Option<T> {
    type Json = Option<T::Json>;
    type Xml = Option<T::Xml>;

    fn apply_json(&mut self, value: Self::Json) {
        match value {
            Some(value) => self.get_or_insert_with(T::default).apply_json(value),
            None => *self = None,
        }
    }

    fn apply_xml(&mut self, value: Self::Xml) {
        match value {
            Some(value) => self.get_or_insert_with(T::default).apply_xml(value),
            None => *self = None,
        }
    }
}

impl<T: BodyValue + Default> BodyValue for Vec<T> {
    type Json = Vec<T::Json>;
    type Xml = Vec<T::Xml>;

    fn apply_json(&mut self, value: Self::Json) {
        *self = value
            .into_iter()
            .map(|element| {
                let mut built = T::default();
                built.apply_json(element);
                built
            })
            .collect();
    }

    fn apply_xml(&mut self, value: Self::Xml) {
        *self = value
            .into_iter()
            .map(|element| {
                let mut built = T::default();
                built.apply_xml(element);
                built
            })
            .collect();
    }
}

impl<V, S> BodyValue for HashMap<String, V, S>
where
    V: DeserializeOwned,
    S: BuildHasher + Default,
{
    type Json = Self;
    type Xml = Self;

    fn apply_json(&mut self, value: Self::Json) {
        self.extend(value);
    }

    fn apply_xml(&mut self, value: Self::Xml) {
        self.extend(value);
    }
}

impl<V: DeserializeOwned> BodyValue for BTreeMap<String, V> {
    type Json = Self;
    type Xml = Self;

    fn apply_json(&mut self, value: Self::Json) {
        self.extend(value);
    }

    fn apply_xml(&mut self, value: Self::Xml) {
        self.extend(value);
    }
}

/// Decodes a JSON body, keeping the decoder's line and column on failure.
pub fn json_from_slice<T: DeserializeOwned>(body: &[u8]) -> Result<T, BindError> {
    serde_json::from_slice(body).map_err(|err| {
        let (line, column) = if err.line() == 0 {
            (None, None)
        } else {
            (Some(err.line()), Some(err.column()))
        };
        BindError::MalformedBody {
            format: BodyFormat::Json,
            line,
            column,
            source: Box::new(err),
        }
    })
}

/// Decodes an XML body.
pub fn xml_from_slice<T: DeserializeOwned>(body: &[u8]) -> Result<T, BindError> {
    quick_xml::de::from_reader(body).map_err(|err| BindError::malformed(BodyFormat::Xml, err))
}

#[doc(hidden)]
pub fn merge_json<T: BodyFields>(target: &mut T, body: &[u8]) -> Result<(), BindError> {
    let patch: T::JsonPatch = json_from_slice(body)?;
    patch.apply(target);
    Ok(())
}

#[doc(hidden)]
pub fn merge_xml<T: BodyFields>(target: &mut T, body: &[u8]) -> Result<(), BindError> {
    let patch: T::XmlPatch = xml_from_slice(body)?;
    patch.apply(target);
    Ok(())
}

impl<V: DeserializeOwned, S: BuildHasher> DecodeBody for HashMap<String, V, S> {
    fn decode_json(&mut self, body: &[u8]) -> Result<(), BindError> {
        let decoded: BTreeMap<String, V> = json_from_slice(body)?;
        self.extend(decoded);
        Ok(())
    }

    fn decode_xml(&mut self, body: &[u8]) -> Result<(), BindError> {
        let decoded: BTreeMap<String, V> = xml_from_slice(body)?;
        self.extend(decoded);
        Ok(())
    }
}

impl<V: DeserializeOwned> DecodeBody for BTreeMap<String, V> {
    fn decode_json(&mut self, body: &[u8]) -> Result<(), BindError> {
        let decoded: BTreeMap<String, V> = json_from_slice(body)?;
        self.extend(decoded);
        Ok(())
    }

    fn decode_xml(&mut self, body: &[u8]) -> Result<(), BindError> {
        let decoded: BTreeMap<String, V> = xml_from_slice(body)?;
        self.extend(decoded);
        Ok(())
    }
}

impl<T: DeserializeOwned> DecodeBody for Vec<T> {
    fn decode_json(&mut self, body: &[u8]) -> Result<(), BindError> {
        *self = json_from_slice(body)?;
        Ok(())
    }

    fn decode_xml(&mut self, body: &[u8]) -> Result<(), BindError> {
        *self = xml_from_slice(body)?;
        Ok(())
    }
}

impl DecodeBody for serde_json::Value {
    fn decode_json(&mut self, body: &[u8]) -> Result<(), BindError> {
        *self = json_from_slice(body)?;
        Ok(())
    }

    fn decode_xml(&mut self, body: &[u8]) -> Result<(), BindError> {
        *self = xml_from_slice(body)?;
        Ok(())
    }
}
