//! Field capabilities.
//!
//! [`Field`] is the object-safe capability surface every bindable value
//! exposes to the populator: its [`Kind`], the decoding hooks it accepts,
//! and whether it is a pointer, a sequence or a nested structure. Scalar
//! kinds, `Option<T>` (one level of pointer indirection) and `Vec<T>` are
//! implemented here; structures get theirs from `#[derive(Bind)]`, and
//! custom hook types from [`field_hooks!`](crate::field_hooks).

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};

use crate::convert;
use crate::descriptor::Bind;
use crate::error::{BindError, BoxError};

/// The shape of a field as seen by the value converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `bool`
    Bool,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `isize`
    Isize,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `usize`
    Usize,
    /// `String`
    String,
    /// `Option<T>`, one level of indirection.
    Pointer,
    /// `Vec<T>`
    Sequence,
    /// A nested structure deriving `Bind`.
    Struct,
    /// Anything else, typically a hook-only type.
    Other,
}

impl Kind {
    /// Whether the converter can parse raw text into this kind directly.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(self, Self::Pointer | Self::Sequence | Self::Struct | Self::Other)
    }

    /// Returns the kind's name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Usize => "usize",
            Self::String => "string",
            Self::Pointer => "pointer",
            Self::Sequence => "sequence",
            Self::Struct => "struct",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-value custom decoding hook.
///
/// # Example
///
/// ```rust
/// use bindery::{field_hooks, BoxError, DecodeParam};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Celsius(f64);
///
/// impl DecodeParam for Celsius {
///     fn decode_param(&mut self, raw: &str) -> Result<(), BoxError> {
///         let degrees: f64 = raw.trim_end_matches('C').parse()?;
///         self.0 = degrees;
///         Ok(())
///     }
/// }
///
/// field_hooks!(Celsius => param);
/// ```
pub trait DecodeParam {
    /// Decodes one raw value into `self`.
    fn decode_param(&mut self, raw: &str) -> Result<(), BoxError>;
}

/// Multi-value decoding hook; receives every raw value of a key at once.
pub trait DecodeParams {
    /// Decodes the full sequence of raw values into `self`.
    fn decode_params(&mut self, raw: &[String]) -> Result<(), BoxError>;
}

/// Generic text decoding hook, consulted after [`DecodeParam`].
pub trait DecodeText {
    /// Decodes raw text bytes into `self`.
    fn decode_text(&mut self, text: &[u8]) -> Result<(), BoxError>;
}

/// Capability surface of a bindable value.
///
/// Probes return `None` unless the implementor opts in. The populator
/// consults them in a fixed priority order: multi-value hook, single-value
/// hook, text hook, then kind-based conversion.
pub trait Field {
    /// Reports the kind used for dispatch.
    fn kind(&self) -> Kind;

    /// Parses raw text into a scalar kind.
    fn set_scalar(&mut self, raw: &str) -> Result<(), BindError> {
        let _ = raw;
        Err(BindError::UnknownFieldKind { kind: self.kind() })
    }

    /// Multi-value hook probe.
    fn params_hook(&mut self) -> Option<&mut dyn DecodeParams> {
        None
    }

    /// Single-value hook probe.
    fn param_hook(&mut self) -> Option<&mut dyn DecodeParam> {
        None
    }

    /// Text hook probe.
    fn text_hook(&mut self) -> Option<&mut dyn DecodeText> {
        None
    }

    /// Pointer probe; `Some` for [`Kind::Pointer`].
    fn as_pointer(&mut self) -> Option<&mut dyn Pointer> {
        None
    }

    /// Sequence probe; `Some` for [`Kind::Sequence`].
    fn as_sequence(&mut self) -> Option<&mut dyn Sequence> {
        None
    }

    /// Structure probe; `Some` for [`Kind::Struct`].
    fn as_struct(&mut self) -> Option<&mut dyn Bind> {
        None
    }
}

/// One level of nullable indirection.
pub trait Pointer {
    /// Returns the pointee if allocated.
    fn pointee(&mut self) -> Option<&mut dyn Field>;

    /// Returns the pointee, allocating a default one first when absent.
    fn allocate(&mut self) -> &mut dyn Field;
}

/// A growable sequence of converted elements.
pub trait Sequence {
    /// Replaces the sequence with one element per raw value.
    ///
    /// The sequence is only assigned once every element converted.
    fn assign(&mut self, raw: &[String]) -> Result<(), BindError>;
}

macro_rules! number_field {
    ($($ty:ty => $kind:ident, $zero:literal;)*) => {
        $(
            impl Field for $ty {
                fn kind(&self) -> Kind {
                    Kind::$kind
                }

                fn set_scalar(&mut self, raw: &str) -> Result<(), BindError> {
                    *self = convert::parse_or_zero(raw, $zero, Kind::$kind)?;
                    Ok(())
                }
            }
        )*
    };
}

number_field! {
    i8 => I8, "0";
    i16 => I16, "0";
    i32 => I32, "0";
    i64 => I64, "0";
    isize => Isize, "0";
    u8 => U8, "0";
    u16 => U16, "0";
    u32 => U32, "0";
    u64 => U64, "0";
    usize => Usize, "0";
    f32 => F32, "0.0";
    f64 => F64, "0.0";
}

impl Field for bool {
    fn kind(&self) -> Kind {
        Kind::Bool
    }

    fn set_scalar(&mut self, raw: &str) -> Result<(), BindError> {
        *self = convert::parse_bool(raw)?;
        Ok(())
    }
}

impl Field for String {
    fn kind(&self) -> Kind {
        Kind::String
    }

    fn set_scalar(&mut self, raw: &str) -> Result<(), BindError> {
        raw.clone_into(self);
        Ok(())
    }
}

impl<T: Field + Default> Pointer for Option<T> {
    fn pointee(&mut self) -> Option<&mut dyn Field> {
        self.as_mut().map(|value| value as &mut dyn Field)
    }

    fn allocate(&mut self) -> &mut dyn Field {
        self.get_or_insert_with(T::default)
    }
}

impl<T: Field + Default> Field for Option<T> {
    fn kind(&self) -> Kind {
        Kind::Pointer
    }

    fn as_pointer(&mut self) -> Option<&mut dyn Pointer> {
        Some(self)
    }
}

impl<T: Field + Default> Sequence for Vec<T> {
    fn assign(&mut self, raw: &[String]) -> Result<(), BindError> {
        let mut built = Vec::with_capacity(raw.len());
        for value in raw {
            let mut element = T::default();
            convert::convert_scalar(&mut element, value)?;
            built.push(element);
        }
        *self = built;
        Ok(())
    }
}

impl<T: Field + Default> Field for Vec<T> {
    fn kind(&self) -> Kind {
        Kind::Sequence
    }

    fn as_sequence(&mut self) -> Option<&mut dyn Sequence> {
        Some(self)
    }
}

/// Adapts any [`FromStr`] type to the generic text hook.
///
/// Body decoders read it from a string as well.
///
/// # Example
///
/// ```rust
/// use bindery::{convert_scalar, FromText};
/// use std::net::Ipv4Addr;
///
/// let mut ip = FromText(Ipv4Addr::UNSPECIFIED);
/// convert_scalar(&mut ip, "10.0.0.1").unwrap();
/// assert_eq!(ip.0, Ipv4Addr::new(10, 0, 0, 1));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FromText<T>(pub T);

impl<T> FromText<T> {
    /// Consumes the wrapper and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<'de, T> Deserialize<'de> for FromText<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map(FromText).map_err(de::Error::custom)
    }
}

impl<T: FromStr> DecodeText for FromText<T>
where
    T::Err: Into<BoxError>,
{
    fn decode_text(&mut self, text: &[u8]) -> Result<(), BoxError> {
        let text = std::str::from_utf8(text)?;
        match text.parse::<T>() {
            Ok(value) => {
                self.0 = value;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl<T: FromStr> Field for FromText<T>
where
    T::Err: Into<BoxError>,
{
    fn kind(&self) -> Kind {
        Kind::Other
    }

    fn text_hook(&mut self) -> Option<&mut dyn DecodeText> {
        Some(self)
    }
}

/// Implements [`Field`] for a type that decodes itself through hooks.
///
/// List the hooks the type implements: `params` ([`DecodeParams`]),
/// `param` ([`DecodeParam`]) and `text` ([`DecodeText`]).
///
/// # Example
///
/// ```rust
/// use bindery::{field_hooks, BoxError, DecodeParams};
///
/// #[derive(Debug, Default)]
/// struct Tags(Vec<String>);
///
/// impl DecodeParams for Tags {
///     fn decode_params(&mut self, raw: &[String]) -> Result<(), BoxError> {
///         self.0 = raw.iter().map(|tag| tag.to_uppercase()).collect();
///         Ok(())
///     }
/// }
///
/// field_hooks!(Tags => params);
/// ```
#[macro_export]
macro_rules! field_hooks {
    (@probe params) => {
        fn params_hook(&mut self) -> ::core::option::Option<&mut dyn $crate::DecodeParams> {
            ::core::option::Option::Some(self)
        }
    };
    (@probe param) => {
        fn param_hook(&mut self) -> ::core::option::Option<&mut dyn $crate::DecodeParam> {
            ::core::option::Option::Some(self)
        }
    };
    (@probe text) => {
        fn text_hook(&mut self) -> ::core::option::Option<&mut dyn $crate::DecodeText> {
            ::core::option::Option::Some(self)
        }
    };
    ($ty:ty => $($hook:ident),+ $(,)?) => {
        impl $crate::Field for $ty {
            fn kind(&self) -> $crate::Kind {
                $crate::Kind::Other
            }

            $($crate::field_hooks!(@probe $hook);)+
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_kinds() {
        assert_eq!(0_i8.kind(), Kind::I8);
        assert_eq!(0_usize.kind(), Kind::Usize);
        assert_eq!(0.0_f32.kind(), Kind::F32);
        assert_eq!(false.kind(), Kind::Bool);
        assert_eq!(String::new().kind(), Kind::String);
        assert!(Kind::U16.is_scalar());
        assert!(!Kind::Sequence.is_scalar());
    }

    #[test]
    fn test_container_kinds() {
        assert_eq!(None::<i32>.kind(), Kind::Pointer);
        assert_eq!(Vec::<i32>::new().kind(), Kind::Sequence);
        assert_eq!(FromText(0_u8).kind(), Kind::Other);
    }

    #[test]
    fn test_pointer_allocates_default() {
        let mut value: Option<i64> = None;
        let pointer = value.as_pointer().unwrap();
        assert!(pointer.pointee().is_none());
        pointer.allocate().set_scalar("12").unwrap();
        assert_eq!(value, Some(12));
    }

    #[test]
    fn test_pointer_keeps_existing_pointee() {
        let mut value = Some(String::from("kept"));
        let pointer = value.as_pointer().unwrap();
        assert_eq!(pointer.allocate().kind(), Kind::String);
        assert_eq!(value.as_deref(), Some("kept"));
    }

    #[test]
    fn test_sequence_assign_replaces() {
        let mut values = vec![9_u16, 9, 9, 9];
        values
            .assign(&["1".to_string(), "2".to_string()])
            .unwrap();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_sequence_assign_is_all_or_nothing() {
        let mut values = vec![7_i32];
        let err = values
            .assign(&["1".to_string(), "x".to_string()])
            .unwrap_err();
        assert!(matches!(err, BindError::ConversionFailure { kind: Kind::I32, .. }));
        assert_eq!(values, vec![7]);
    }

    #[test]
    fn test_sequence_of_pointers() {
        let mut values: Vec<Option<u8>> = Vec::new();
        values.assign(&["1".to_string(), String::new()]).unwrap();
        assert_eq!(values, vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_from_text_parses() {
        let mut addr = FromText(std::net::Ipv4Addr::UNSPECIFIED);
        addr.text_hook()
            .unwrap()
            .decode_text(b"192.168.1.1")
            .unwrap();
        assert_eq!(addr.into_inner(), std::net::Ipv4Addr::new(192, 168, 1, 1));
    }

    #[test]
    fn test_from_text_deserializes_from_string() {
        let addr: FromText<std::net::Ipv4Addr> = serde_json::from_str(r#""10.1.2.3""#).unwrap();
        assert_eq!(addr.0, std::net::Ipv4Addr::new(10, 1, 2, 3));
        assert!(serde_json::from_str::<FromText<u8>>(r#""300""#).is_err());
    }

    #[test]
    fn test_from_text_reports_parse_error() {
        let mut number = FromText(0_u32);
        let err = number.text_hook().unwrap().decode_text(b"nope");
        assert!(err.is_err());
    }

    #[derive(Debug, Default)]
    struct Upper(String);

    impl DecodeParam for Upper {
        fn decode_param(&mut self, raw: &str) -> Result<(), BoxError> {
            self.0 = raw.to_uppercase();
            Ok(())
        }
    }

    crate::field_hooks!(Upper => param);

    #[test]
    fn test_field_hooks_macro() {
        let mut upper = Upper::default();
        assert_eq!(upper.kind(), Kind::Other);
        assert!(upper.params_hook().is_none());
        assert!(upper.text_hook().is_none());
        upper.param_hook().unwrap().decode_param("abc").unwrap();
        assert_eq!(upper.0, "ABC");
    }
}
