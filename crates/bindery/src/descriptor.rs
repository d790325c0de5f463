//! Field-descriptor tables and destination shapes.
//!
//! `#[derive(Bind)]` generates a static [`FieldDescriptor`] table per
//! structure, in declaration order, plus indexed mutable access to each
//! field. Root destinations classify themselves through [`Destination`].

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::field::Field;
use crate::tag::Tag;

/// Per-tag annotation keys of one field.
///
/// An empty key is treated the same as an absent one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Key in the path source.
    pub param: Option<&'static str>,
    /// Key in the query source.
    pub query: Option<&'static str>,
    /// Key in the header source.
    pub header: Option<&'static str>,
    /// Key in a JSON body.
    pub json: Option<&'static str>,
    /// Key in an XML body.
    pub xml: Option<&'static str>,
    /// Key in a form body.
    pub form: Option<&'static str>,
}

impl Annotations {
    /// No annotation on any tag.
    pub const NONE: Self = Self {
        param: None,
        query: None,
        header: None,
        json: None,
        xml: None,
        form: None,
    };

    /// Returns the non-empty key annotated for `tag`.
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&'static str> {
        let key = match tag {
            Tag::Param => self.param,
            Tag::Query => self.query,
            Tag::Header => self.header,
            Tag::Json => self.json,
            Tag::Xml => self.xml,
            Tag::Form => self.form,
        };
        key.filter(|key| !key.is_empty())
    }
}

/// Static description of one structure field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Rust field name.
    pub name: &'static str,
    /// Annotation keys.
    pub annotations: Annotations,
    /// Embedded field whose members are promoted into the parent.
    pub embedded: bool,
    /// Whether binding passes may write the field.
    pub settable: bool,
}

/// A structure with a generated field-descriptor table.
///
/// Implemented by `#[derive(Bind)]`; manual implementations must keep
/// `field_mut(i)` consistent with `descriptors()[i]`.
pub trait Bind {
    /// Returns the descriptor table in declaration order.
    fn descriptors(&self) -> &'static [FieldDescriptor];

    /// Returns the field at `index`, or `None` if it is not settable.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Field>;
}

/// Shape of a root destination.
pub enum Target<'a> {
    /// A structure walked field by field.
    Struct(&'a mut dyn Bind),
    /// A string-keyed map receiving every source entry.
    Map(&'a mut dyn MapTarget),
    /// Anything else; only body decoders can fill it.
    Opaque,
}

/// A root object a binding pass can write into.
pub trait Destination {
    /// Classifies the destination.
    fn target(&mut self) -> Target<'_>;
}

/// A string-keyed map destination.
pub trait MapTarget {
    /// Whether the element type can hold raw values at all.
    fn accepts_values(&self) -> bool;

    /// Writes one source entry.
    fn insert_values(&mut self, key: &str, values: &[String]);
}

/// Element type of a map destination.
///
/// `String` receives the first value, `Vec<String>` the whole sequence and
/// `serde_json::Value` the raw sequence as an array of strings. Scalar
/// element types are incompatible: a map pass into them does nothing.
pub trait MapElement: Sized {
    /// Whether this element type can be built from raw values.
    const COMPATIBLE: bool = true;

    /// Builds an element from the raw values of one key.
    fn from_values(values: &[String]) -> Option<Self>;
}

impl MapElement for String {
    fn from_values(values: &[String]) -> Option<Self> {
        values.first().cloned()
    }
}

impl MapElement for Vec<String> {
    fn from_values(values: &[String]) -> Option<Self> {
        Some(values.to_vec())
    }
}

impl MapElement for serde_json::Value {
    fn from_values(values: &[String]) -> Option<Self> {
        Some(serde_json::Value::Array(
            values.iter().cloned().map(serde_json::Value::String).collect(),
        ))
    }
}

macro_rules! incompatible_element {
    ($($ty:ty),*) => {
        $(
            impl MapElement for $ty {
                const COMPATIBLE: bool = false;

                fn from_values(_values: &[String]) -> Option<Self> {
                    None
                }
            }
        )*
    };
}

incompatible_element!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<V: MapElement, S: BuildHasher> MapTarget for HashMap<String, V, S> {
    fn accepts_values(&self) -> bool {
        V::COMPATIBLE
    }

    fn insert_values(&mut self, key: &str, values: &[String]) {
        if let Some(element) = V::from_values(values) {
            self.insert(key.to_owned(), element);
        }
    }
}

impl<V: MapElement, S: BuildHasher> Destination for HashMap<String, V, S> {
    fn target(&mut self) -> Target<'_> {
        Target::Map(self)
    }
}

impl<V: MapElement> MapTarget for BTreeMap<String, V> {
    fn accepts_values(&self) -> bool {
        V::COMPATIBLE
    }

    fn insert_values(&mut self, key: &str, values: &[String]) {
        if let Some(element) = V::from_values(values) {
            self.insert(key.to_owned(), element);
        }
    }
}

impl<V: MapElement> Destination for BTreeMap<String, V> {
    fn target(&mut self) -> Target<'_> {
        Target::Map(self)
    }
}

impl<T> Destination for Vec<T> {
    fn target(&mut self) -> Target<'_> {
        Target::Opaque
    }
}

impl Destination for serde_json::Value {
    fn target(&mut self) -> Target<'_> {
        Target::Opaque
    }
}
