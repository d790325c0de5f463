//! Parsing for `#[derive(Bind)]` input.
//!
//! This module validates the derive input and collects the `#[bind(...)]`
//! container and field attributes.

use syn::{
    ext::IdentExt, punctuated::Punctuated, spanned::Spanned, Data, DeriveInput, Expr, ExprLit,
    Fields, GenericArgument, Ident, Lit, Meta, PathArguments, Token, Type,
};

/// Decoding hooks a container exposes when used as a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// `DecodeParams`
    Params,
    /// `DecodeParam`
    Param,
    /// `DecodeText`
    Text,
}

/// Parsed `#[bind(...)]` attributes on a field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    pub param: Option<String>,
    pub query: Option<String>,
    pub header: Option<String>,
    pub json: Option<String>,
    pub xml: Option<String>,
    pub form: Option<String>,
    pub flatten: bool,
    pub skip: bool,
}

/// A parsed named field.
#[derive(Debug)]
pub struct BindField {
    pub ident: Ident,
    pub ty: Type,
    pub attrs: FieldAttrs,
}

impl BindField {
    /// Rust field name without a raw-identifier prefix.
    pub fn name(&self) -> String {
        self.ident.unraw().to_string()
    }

    /// The pointee of an `Option<T>` field, if the field is one.
    pub fn option_inner(&self) -> Option<&Type> {
        option_inner(&self.ty)
    }
}

/// A validated `#[derive(Bind)]` input.
#[derive(Debug)]
pub struct BindStruct {
    pub ident: Ident,
    pub hooks: Vec<Hook>,
    pub fields: Vec<BindField>,
}

impl BindStruct {
    /// Validates the input and parses every attribute.
    pub fn from_derive_input(input: DeriveInput) -> syn::Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new(
                input.generics.span(),
                "Bind cannot be derived for generic structs",
            ));
        }

        let data = match input.data {
            Data::Struct(data) => data,
            Data::Enum(data) => {
                return Err(syn::Error::new(
                    data.enum_token.span(),
                    "Bind can only be derived for structs, not enums",
                ))
            }
            Data::Union(data) => {
                return Err(syn::Error::new(
                    data.union_token.span(),
                    "Bind can only be derived for structs, not unions",
                ))
            }
        };

        let named = match data.fields {
            Fields::Named(named) => named,
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "Bind requires a struct with named fields",
                ))
            }
        };

        let hooks = parse_container_attrs(&input.attrs)?;
        let fields = named
            .named
            .into_iter()
            .map(|field| {
                let attrs = parse_field_attrs(&field.attrs)?;
                let ident = field
                    .ident
                    .ok_or_else(|| syn::Error::new(field.ty.span(), "expected named field"))?;
                Ok(BindField {
                    ident,
                    ty: field.ty,
                    attrs,
                })
            })
            .collect::<syn::Result<Vec<_>>>()?;

        Ok(Self {
            ident: input.ident,
            hooks,
            fields,
        })
    }
}

fn bind_metas(attrs: &[syn::Attribute]) -> syn::Result<Vec<Meta>> {
    let mut metas = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("bind")) {
        let list = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        metas.extend(list);
    }
    Ok(metas)
}

fn parse_container_attrs(attrs: &[syn::Attribute]) -> syn::Result<Vec<Hook>> {
    let mut hooks = Vec::new();

    for meta in bind_metas(attrs)? {
        match meta {
            Meta::List(list) if list.path.is_ident("hooks") => {
                let names = list.parse_args_with(Punctuated::<Ident, Token![,]>::parse_terminated)?;
                for name in names {
                    let hook = match name.to_string().as_str() {
                        "params" => Hook::Params,
                        "param" => Hook::Param,
                        "text" => Hook::Text,
                        other => {
                            return Err(syn::Error::new(
                                name.span(),
                                format!("unknown hook: {other} (expected param, params or text)"),
                            ))
                        }
                    };
                    if hooks.contains(&hook) {
                        return Err(syn::Error::new(name.span(), "duplicate hook"));
                    }
                    hooks.push(hook);
                }
            }
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "expected `hooks(...)` on a struct",
                ))
            }
        }
    }

    Ok(hooks)
}

fn parse_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();

    for meta in bind_metas(attrs)? {
        match meta {
            Meta::Path(path) => {
                let ident = path
                    .get_ident()
                    .ok_or_else(|| syn::Error::new(path.span(), "expected identifier"))?;
                let flag = match ident.to_string().as_str() {
                    "flatten" => &mut parsed.flatten,
                    "skip" => &mut parsed.skip,
                    other => {
                        return Err(syn::Error::new(
                            ident.span(),
                            format!("unknown attribute: {other}"),
                        ))
                    }
                };
                if *flag {
                    return Err(syn::Error::new(ident.span(), "duplicate attribute"));
                }
                *flag = true;
            }
            Meta::NameValue(nv) => {
                let ident = nv
                    .path
                    .get_ident()
                    .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?
                    .to_string();

                let value = match &nv.value {
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(s), ..
                    }) => s.value(),
                    _ => {
                        return Err(syn::Error::new(
                            nv.value.span(),
                            "expected string literal",
                        ))
                    }
                };

                let slot = match ident.as_str() {
                    "param" => &mut parsed.param,
                    "query" => &mut parsed.query,
                    "header" => &mut parsed.header,
                    "json" => &mut parsed.json,
                    "xml" => &mut parsed.xml,
                    "form" => &mut parsed.form,
                    _ => {
                        return Err(syn::Error::new(
                            nv.path.span(),
                            format!("unknown attribute: {ident}"),
                        ))
                    }
                };
                if slot.is_some() {
                    return Err(syn::Error::new(
                        nv.path.span(),
                        format!("duplicate attribute: {ident}"),
                    ));
                }
                *slot = Some(value);
            }
            Meta::List(list) => {
                return Err(syn::Error::new(list.span(), "expected name = value or a flag"))
            }
        }
    }

    if parsed.flatten && parsed.skip {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "`flatten` and `skip` cannot be combined",
        ));
    }

    Ok(parsed)
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}
