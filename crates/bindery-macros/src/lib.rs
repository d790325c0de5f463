//! Procedural macros for bindery destinations.
//!
//! This crate provides `#[derive(Bind)]`, which turns a struct with named
//! fields into a binding destination. Use it through the `bindery` crate,
//! which re-exports it next to the runtime traits the expansion refers to.
//!
//! # Example
//!
//! ```rust,ignore
//! use bindery::Bind;
//!
//! #[derive(Bind, Default)]
//! struct ListUsers {
//!     #[bind(param = "org")]
//!     org: String,
//!     #[bind(query = "limit")]
//!     limit: Option<u32>,
//!     #[bind(header = "x-request-id")]
//!     request_id: String,
//! }
//! ```
//!
//! # Macro Expansion
//!
//! The derive generates:
//!
//! 1. A static field-descriptor table (name, per-tag annotation keys,
//!    embedded flag, settability) and indexed mutable field access
//! 2. `Field` and `Destination` impls, so the struct works both as a root
//!    destination and as a nested field
//! 3. JSON and XML patch types, so a body only overwrites the keys it
//!    carries, including inside nested structures

mod derive;
mod parse;

use proc_macro::TokenStream;

/// Derives the binding traits for a struct with named fields.
///
/// # Field Attributes
///
/// - `param`, `query`, `header`, `form`: key read by the matching pass
/// - `json`, `xml`: key used by the body decoders; defaults to the field
///   name, `"-"` excludes the field
/// - `flatten`: embedded struct (or `Option` of one) whose fields are
///   promoted into this one
/// - `skip`: never written by any pass
///
/// # Container Attributes
///
/// - `hooks(param, params, text)`: decoding hooks the struct implements,
///   consulted when it is bound as a field
///
/// # Generated Code
///
/// For a struct `Page` the macro generates approximately:
///
/// ```rust,ignore
/// impl bindery::Bind for Page {
///     fn descriptors(&self) -> &'static [bindery::FieldDescriptor] { /* table */ }
///     fn field_mut(&mut self, index: usize) -> Option<&mut dyn bindery::Field> {
///         match index {
///             0 => Some(&mut self.number),
///             _ => None,
///         }
///     }
/// }
/// impl bindery::Field for Page { /* kind: Struct */ }
/// impl bindery::Destination for Page { /* Target::Struct */ }
/// impl bindery::BodyValue for Page { /* apply JSON / XML patches */ }
/// impl bindery::DecodeBody for Page { /* merge JSON / XML patches */ }
/// ```
#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    derive::expand_bind(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
