//! Value converter.
//!
//! Converts one raw string into one field. Hooks win over kind-based
//! conversion, nil pointers are allocated before writing, and an empty raw
//! string converts to the kind's zero value instead of failing.

use std::str::FromStr;

use crate::error::{BindError, BoxError};
use crate::field::{Field, Kind};

/// Converts `raw` into `field`.
///
/// Dispatch order: allocate the pointee of a nil pointer, then the
/// single-value hook, then the text hook, then the scalar parser for the
/// field's [`Kind`]. Non-scalar kinds without a hook fail with
/// [`BindError::UnknownFieldKind`].
///
/// # Example
///
/// ```rust
/// use bindery::convert_scalar;
///
/// let mut port: Option<u16> = None;
/// convert_scalar(&mut port, "8080").unwrap();
/// assert_eq!(port, Some(8080));
///
/// let mut count = 5_i32;
/// convert_scalar(&mut count, "").unwrap();
/// assert_eq!(count, 0);
/// ```
pub fn convert_scalar(field: &mut dyn Field, raw: &str) -> Result<(), BindError> {
    let field = deref_pointer(field)?;
    if let Some(hook) = field.param_hook() {
        return hook.decode_param(raw).map_err(BindError::hook);
    }
    if let Some(hook) = field.text_hook() {
        return hook.decode_text(raw.as_bytes()).map_err(BindError::hook);
    }
    let kind = field.kind();
    if kind.is_scalar() {
        field.set_scalar(raw)
    } else {
        Err(BindError::UnknownFieldKind { kind })
    }
}

/// Follows one level of pointer indirection, allocating a nil pointee.
pub(crate) fn deref_pointer(field: &mut dyn Field) -> Result<&mut dyn Field, BindError> {
    if field.kind() == Kind::Pointer {
        field
            .as_pointer()
            .map(|pointer| pointer.allocate())
            .ok_or(BindError::UnknownFieldKind {
                kind: Kind::Pointer,
            })
    } else {
        Ok(field)
    }
}

/// Parses a number, reading an empty string as `zero`.
pub(crate) fn parse_or_zero<T>(raw: &str, zero: &str, kind: Kind) -> Result<T, BindError>
where
    T: FromStr,
    T::Err: Into<BoxError>,
{
    let text = if raw.is_empty() { zero } else { raw };
    text.parse::<T>()
        .map_err(|err| BindError::conversion(kind, raw, err))
}

/// Parses a boolean, reading an empty string as `false`.
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True`, `0`, `f`, `F`, `FALSE`,
/// `false` and `False`.
pub(crate) fn parse_bool(raw: &str) -> Result<bool, BindError> {
    match raw {
        "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        _ => Err(BindError::conversion(
            Kind::Bool,
            raw,
            format!("invalid boolean literal {raw:?}"),
        )),
    }
}
