//! Code generation for `#[derive(Bind)]`.
//!
//! The derive emits:
//! 1. `Bind`: a static descriptor table and indexed field access
//! 2. `Field` and `Destination`, so the struct nests and binds as a root
//! 3. JSON and XML patch types, `BodyValue` and `DecodeBody`

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{DeriveInput, Ident};

use crate::parse::{BindField, BindStruct, Hook};

/// Expands `#[derive(Bind)]`.
pub fn expand_bind(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let parsed = BindStruct::from_derive_input(input)?;

    let bind_impl = generate_bind(&parsed);
    let field_impl = generate_field(&parsed);
    let body_impl = generate_body(&parsed);

    Ok(quote! {
        #bind_impl
        #field_impl
        #body_impl
    })
}

fn key_tokens(key: Option<&String>) -> TokenStream {
    match key {
        Some(key) => quote! { ::core::option::Option::Some(#key) },
        None => quote! { ::core::option::Option::None },
    }
}

fn generate_bind(parsed: &BindStruct) -> TokenStream {
    let name = &parsed.ident;

    let descriptors = parsed.fields.iter().map(|field| {
        let field_name = field.name();
        let attrs = &field.attrs;
        let param = key_tokens(attrs.param.as_ref());
        let query = key_tokens(attrs.query.as_ref());
        let header = key_tokens(attrs.header.as_ref());
        let json = key_tokens(attrs.json.as_ref());
        let xml = key_tokens(attrs.xml.as_ref());
        let form = key_tokens(attrs.form.as_ref());
        let embedded = attrs.flatten;
        let settable = !attrs.skip;

        quote! {
            ::bindery::FieldDescriptor {
                name: #field_name,
                annotations: ::bindery::Annotations {
                    param: #param,
                    query: #query,
                    header: #header,
                    json: #json,
                    xml: #xml,
                    form: #form,
                },
                embedded: #embedded,
                settable: #settable,
            }
        }
    });

    let arms = parsed
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| !field.attrs.skip)
        .map(|(index, field)| {
            let ident = &field.ident;
            quote! {
                #index => ::core::option::Option::Some(&mut self.#ident as &mut dyn ::bindery::Field),
            }
        });

    quote! {
        impl ::bindery::Bind for #name {
            fn descriptors(&self) -> &'static [::bindery::FieldDescriptor] {
                const DESCRIPTORS: &[::bindery::FieldDescriptor] = &[#(#descriptors),*];
                DESCRIPTORS
            }

            fn field_mut(&mut self, index: usize) -> ::core::option::Option<&mut dyn ::bindery::Field> {
                match index {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    }
}

fn generate_field(parsed: &BindStruct) -> TokenStream {
    let name = &parsed.ident;

    let probes = parsed.hooks.iter().map(|hook| match hook {
        Hook::Params => quote! {
            fn params_hook(&mut self) -> ::core::option::Option<&mut dyn ::bindery::DecodeParams> {
                ::core::option::Option::Some(self)
            }
        },
        Hook::Param => quote! {
            fn param_hook(&mut self) -> ::core::option::Option<&mut dyn ::bindery::DecodeParam> {
                ::core::option::Option::Some(self)
            }
        },
        Hook::Text => quote! {
            fn text_hook(&mut self) -> ::core::option::Option<&mut dyn ::bindery::DecodeText> {
                ::core::option::Option::Some(self)
            }
        },
    });

    quote! {
        impl ::bindery::Field for #name {
            fn kind(&self) -> ::bindery::Kind {
                ::bindery::Kind::Struct
            }

            fn as_struct(&mut self) -> ::core::option::Option<&mut dyn ::bindery::Bind> {
                ::core::option::Option::Some(self)
            }

            #(#probes)*
        }

        impl ::bindery::Destination for #name {
            fn target(&mut self) -> ::bindery::Target<'_> {
                ::bindery::Target::Struct(self)
            }
        }
    }
}

/// Which body decoder a patch is generated for.
#[derive(Clone, Copy)]
enum Format {
    Json,
    Xml,
}

impl Format {
    fn key<'a>(self, field: &'a BindField) -> Option<&'a String> {
        match self {
            Self::Json => field.attrs.json.as_ref(),
            Self::Xml => field.attrs.xml.as_ref(),
        }
    }

    fn patch_assoc(self) -> Ident {
        match self {
            Self::Json => format_ident!("JsonPatch"),
            Self::Xml => format_ident!("XmlPatch"),
        }
    }

    fn value_assoc(self) -> Ident {
        match self {
            Self::Json => format_ident!("Json"),
            Self::Xml => format_ident!("Xml"),
        }
    }

    fn apply_method(self) -> Ident {
        match self {
            Self::Json => format_ident!("apply_json"),
            Self::Xml => format_ident!("apply_xml"),
        }
    }
}

fn generate_body(parsed: &BindStruct) -> TokenStream {
    let name = &parsed.ident;
    let json_patch = format_ident!("__BinderyJsonPatch{}", name);
    let xml_patch = format_ident!("__BinderyXmlPatch{}", name);

    let json = generate_patch(parsed, &json_patch, Format::Json);
    let xml = generate_patch(parsed, &xml_patch, Format::Xml);

    quote! {
        const _: () = {
            #json
            #xml

            impl ::bindery::__private::BodyFields for #name {
                type JsonPatch = #json_patch;
                type XmlPatch = #xml_patch;
            }

            impl ::bindery::BodyValue for #name {
                type Json = #json_patch;
                type Xml = #xml_patch;

                fn apply_json(&mut self, value: Self::Json) {
                    <#json_patch as ::bindery::__private::BodyPatch<#name>>::apply(value, self);
                }

                fn apply_xml(&mut self, value: Self::Xml) {
                    <#xml_patch as ::bindery::__private::BodyPatch<#name>>::apply(value, self);
                }
            }
        };

        impl ::bindery::DecodeBody for #name {
            fn decode_json(&mut self, body: &[u8]) -> ::core::result::Result<(), ::bindery::BindError> {
                ::bindery::__private::merge_json(self, body)
            }

            fn decode_xml(&mut self, body: &[u8]) -> ::core::result::Result<(), ::bindery::BindError> {
                ::bindery::__private::merge_xml(self, body)
            }
        }
    }
}

fn generate_patch(parsed: &BindStruct, patch: &Ident, format: Format) -> TokenStream {
    let name = &parsed.ident;
    let assoc = format.patch_assoc();
    let value_assoc = format.value_assoc();
    let apply_method = format.apply_method();

    let mut members = Vec::new();
    let mut empties = Vec::new();
    let mut applies = Vec::new();

    for field in &parsed.fields {
        if field.attrs.skip {
            continue;
        }
        let key = format.key(field).filter(|key| !key.is_empty());
        if key.is_some_and(|key| key == "-") {
            continue;
        }
        let ident = &field.ident;
        let ty = &field.ty;

        if field.attrs.flatten && key.is_none() {
            let inner = field.option_inner().unwrap_or(ty);
            let inner_patch = quote! { <#inner as ::bindery::__private::BodyFields>::#assoc };
            let body_patch = quote! { ::bindery::__private::BodyPatch<#inner> };

            members.push(quote! {
                #[serde(flatten)]
                #ident: #inner_patch,
            });
            empties.push(quote! { <#inner_patch as #body_patch>::is_empty(&self.#ident) });
            applies.push(if field.option_inner().is_some() {
                quote! {
                    if !<#inner_patch as #body_patch>::is_empty(&self.#ident) {
                        <#inner_patch as #body_patch>::apply(
                            self.#ident,
                            target.#ident.get_or_insert_with(::core::default::Default::default),
                        );
                    }
                }
            } else {
                quote! {
                    <#inner_patch as #body_patch>::apply(self.#ident, &mut target.#ident);
                }
            });
        } else {
            let rename = key.cloned().unwrap_or_else(|| field.name());
            members.push(quote! {
                #[serde(rename = #rename)]
                #ident: ::core::option::Option<<#ty as ::bindery::BodyValue>::#value_assoc>,
            });
            empties.push(quote! { self.#ident.is_none() });
            applies.push(quote! {
                if let ::core::option::Option::Some(value) = self.#ident {
                    <#ty as ::bindery::BodyValue>::#apply_method(&mut target.#ident, value);
                }
            });
        }
    }

    quote! {
        #[doc(hidden)]
        #[allow(non_camel_case_types)]
        #[derive(::bindery::__private::serde::Deserialize, ::core::default::Default)]
        #[serde(crate = "::bindery::__private::serde", default)]
        pub struct #patch {
            #(#members)*
        }

        impl ::bindery::__private::BodyPatch<#name> for #patch {
            fn is_empty(&self) -> bool {
                true #(&& #empties)*
            }

            #[allow(unused_variables)]
            fn apply(self, target: &mut #name) {
                #(#applies)*
            }
        }
    }
}
