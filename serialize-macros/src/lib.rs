// This file is part of upgrade-ledger.
// Copyright (C) 2025 Midnight Foundation
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Derive macros for `upgrade-serialize`.
extern crate proc_macro;
use proc_macro2::{Ident, Span, TokenStream};
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;
use syn::{
    Data, DataEnum, DeriveInput, Expr, ExprLit, Fields, GenericParam, Generics, Index, Lit, Meta,
    parse_macro_input, parse_quote,
};

fn add_trait_bounds(mut generics: Generics, bound: TokenStream) -> Generics {
    for param in &mut generics.params {
        if let GenericParam::Type(ref mut type_param) = *param {
            type_param.bounds.push(parse_quote!(#bound));
        }
    }
    generics
}

/// Implements `Serializable` and `Deserializable` field by field, and
/// `Tagged` when a `#[tag = "..."]` attribute is present.
///
/// Enums are written as a `u8` discriminant followed by the variant's fields.
/// Explicit discriminants (`Variant = 3`) are honoured; the others count up
/// from the previous one, as in Rust.
#[proc_macro_derive(Serializable, attributes(tag))]
pub fn derive_serializable(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let discriminants = match &input.data {
        Data::Enum(data) => match discriminants(data) {
            Ok(discriminants) => discriminants,
            Err(err) => return err.to_compile_error().into(),
        },
        _ => Vec::new(),
    };

    let generics = add_trait_bounds(input.generics.clone(), quote!(Serializable));
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let de_generics = add_trait_bounds(input.generics.clone(), quote!(Deserializable));
    let (de_impl_generics, de_ty_generics, de_where_clause) = de_generics.split_for_impl();

    let serialize = serialize(&input.data, &discriminants);
    let deserialize = deserialize(name, &input.data, &discriminants);
    let size = size(&input.data);

    let mut expanded = quote! {
        impl #impl_generics Serializable for #name #ty_generics #where_clause {
            fn serialize(&self, writer: &mut impl ::std::io::Write) -> Result<(), ::std::io::Error> {
                #serialize
                Ok(())
            }

            fn serialized_size(&self) -> usize {
                #size
            }
        }

        impl #de_impl_generics Deserializable for #name #de_ty_generics #de_where_clause {
            fn deserialize(
                reader: &mut impl ::std::io::Read,
                mut recursion_depth: u32,
            ) -> Result<Self, ::std::io::Error> {
                <Self as Deserializable>::check_rec(&mut recursion_depth)?;
                #deserialize
            }
        }
    };

    let tag = input.attrs.iter().find_map(|attr| match &attr.meta {
        Meta::NameValue(nv) if nv.path.is_ident("tag") => Some(&nv.value),
        _ => None,
    });
    if let Some(tag) = tag {
        let tag_generics = add_trait_bounds(input.generics.clone(), quote!(Tagged));
        let (tag_impl_generics, tag_ty_generics, tag_where_clause) = tag_generics.split_for_impl();
        let params = tag_generics
            .params
            .iter()
            .filter_map(|param| match param {
                GenericParam::Type(ty) => Some(&ty.ident),
                _ => None,
            })
            .collect::<Vec<_>>();

        let tag_expand = if params.is_empty() {
            quote! { ::std::borrow::Cow::Borrowed(#tag) }
        } else {
            let fstring = format!("{{}}({})", vec!["{}"; params.len()].join(","));
            quote! {
                ::std::borrow::Cow::Owned(::std::format!(#fstring, #tag, #( <#params as Tagged>::tag() ),*))
            }
        };
        expanded.extend(quote! {
            impl #tag_impl_generics Tagged for #name #tag_ty_generics #tag_where_clause {
                fn tag() -> ::std::borrow::Cow<'static, ::core::primitive::str> {
                    #tag_expand
                }
            }
        });
    }

    proc_macro::TokenStream::from(expanded)
}

fn discriminants(data: &DataEnum) -> syn::Result<Vec<u8>> {
    let mut next: u16 = 0;
    let mut result = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if let Some((_, expr)) = &variant.discriminant {
            next = match expr {
                Expr::Lit(ExprLit { lit: Lit::Int(int), .. }) => int.base10_parse::<u8>()?.into(),
                _ => {
                    return Err(syn::Error::new(
                        expr.span(),
                        "only integer literal discriminants can be serialized",
                    ));
                }
            };
        }
        let discriminant = u8::try_from(next)
            .map_err(|_| syn::Error::new(variant.span(), "discriminant does not fit in a u8"))?;
        if result.contains(&discriminant) {
            return Err(syn::Error::new(variant.span(), "duplicate discriminant"));
        }
        result.push(discriminant);
        next += 1;
    }
    Ok(result)
}

fn field_name(i: usize) -> Ident {
    Ident::new(&format!("var_{}", i), Span::call_site())
}

fn serialize_fields(fields: &Fields) -> TokenStream {
    // Expands to
    //      <A as Serializable>::serialize(a, writer)?;
    //      <B as Serializable>::serialize(b, writer)?;
    let recurse = fields.iter().enumerate().map(|(i, f)| {
        let name = f.ident.clone().unwrap_or_else(|| field_name(i));
        let ty = &f.ty;
        quote_spanned! {f.span()=>
            <#ty as Serializable>::serialize(#name, writer)?;
        }
    });
    quote! {
        #(#recurse)*
    }
}

fn unpack_struct(fields: &Fields) -> TokenStream {
    // Expands to
    //      let a = &self.a;
    //      let b = &self.b;
    let recurse = fields.iter().enumerate().map(|(i, var)| match &var.ident {
        Some(name) => quote_spanned!(var.span()=> let #name = &self.#name;),
        None => {
            let name = field_name(i);
            let index = Index::from(i);
            quote_spanned!(var.span()=> let #name = &self.#index;)
        }
    });
    quote! {
        #(#recurse)*
    }
}

fn unpack_enum(fields: &Fields) -> TokenStream {
    match fields {
        Fields::Named(fields) => {
            let names = fields.named.iter().map(|var| &var.ident);
            quote! { { #(#names,)* } }
        }
        Fields::Unnamed(fields) => {
            let names = (0..fields.unnamed.len()).map(field_name);
            quote! { ( #(#names,)* ) }
        }
        Fields::Unit => TokenStream::new(),
    }
}

fn serialize(data: &Data, discriminants: &[u8]) -> TokenStream {
    match data {
        Data::Struct(data) => {
            let unpack = unpack_struct(&data.fields);
            let fields = serialize_fields(&data.fields);
            quote! {
                #unpack #fields
            }
        }
        Data::Enum(data) => {
            let recurse = data.variants.iter().zip(discriminants).map(|(var, disc)| {
                let fields = serialize_fields(&var.fields);
                let unpack = unpack_enum(&var.fields);
                let ty = &var.ident;
                quote_spanned! {var.span()=>
                    Self::#ty #unpack => {
                        <u8 as Serializable>::serialize(&#disc, writer)?;
                        #fields
                    },
                }
            });
            quote! {
                match self {
                    #(#recurse)*
                }
            }
        }
        Data::Union(data) => {
            syn::Error::new(data.union_token.span, "unions cannot be serialized")
                .to_compile_error()
        }
    }
}

fn size_fields(fields: &Fields) -> TokenStream {
    // Expands to
    //      0 + <A as Serializable>::serialized_size(a)
    //        + <B as Serializable>::serialized_size(b)
    let recurse = fields.iter().enumerate().map(|(i, f)| {
        let name = f.ident.clone().unwrap_or_else(|| field_name(i));
        let ty = &f.ty;
        quote_spanned! {f.span()=>
            + <#ty as Serializable>::serialized_size(#name)
        }
    });
    quote! {
        0 #(#recurse)*
    }
}

fn size(data: &Data) -> TokenStream {
    match data {
        Data::Struct(data) => {
            let unpack = unpack_struct(&data.fields);
            let fields = size_fields(&data.fields);
            quote! {
                #unpack #fields
            }
        }
        Data::Enum(data) => {
            let recurse = data.variants.iter().map(|var| {
                let unpack = unpack_enum(&var.fields);
                let fields = size_fields(&var.fields);
                let ty = &var.ident;
                quote_spanned! {var.span()=>
                    Self::#ty #unpack => 1 + #fields,
                }
            });
            quote! {
                match self {
                    #(#recurse)*
                }
            }
        }
        Data::Union(_) => quote! { 0 },
    }
}

fn deserialize_fields(fields: &Fields) -> TokenStream {
    match fields {
        Fields::Named(fields) => {
            // Expands to
            //      { a: <A as Deserializable>::deserialize(reader, recursion_depth)?, ... }
            let recurse = fields.named.iter().map(|f| {
                let name = &f.ident;
                let ty = &f.ty;
                quote_spanned! {f.span()=>
                    #name: <#ty as Deserializable>::deserialize(reader, recursion_depth)?,
                }
            });
            quote! {
                {#(#recurse)*}
            }
        }
        Fields::Unnamed(fields) => {
            let recurse = fields.unnamed.iter().map(|f| {
                let ty = &f.ty;
                quote_spanned! {f.span()=>
                    <#ty as Deserializable>::deserialize(reader, recursion_depth)?,
                }
            });
            quote! {
                (#(#recurse)*)
            }
        }
        Fields::Unit => quote! {},
    }
}

fn deserialize(name: &Ident, data: &Data, discriminants: &[u8]) -> TokenStream {
    match data {
        Data::Struct(data) => {
            let fields = deserialize_fields(&data.fields);
            quote! {
                Ok(Self #fields)
            }
        }
        Data::Enum(data) => {
            let recurse = data.variants.iter().zip(discriminants).map(|(var, disc)| {
                let fields = deserialize_fields(&var.fields);
                let variant = &var.ident;
                quote_spanned! {var.span()=>
                    #disc => Ok(Self::#variant #fields),
                }
            });
            let unknown = format!("unknown {name} discriminant: {{}}");
            quote! {
                let discriminant = <u8 as Deserializable>::deserialize(reader, recursion_depth)?;
                match discriminant {
                    #(#recurse)*
                    _ => Err(::std::io::Error::new(
                        ::std::io::ErrorKind::InvalidData,
                        ::std::format!(#unknown, discriminant),
                    )),
                }
            }
        }
        Data::Union(_) => quote! { unreachable!() },
    }
}
