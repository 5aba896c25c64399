//! Procedural macros for SQLScript Rust.
//!
//! `#[derive(ToParams)]` turns a struct with named fields into a named
//! parameter source: every field becomes one entry of a
//! `sqlscript_core::Params`, usable for tag substitution and statement
//! binding. Field enumeration happens at compile time.
//!
//! Generated code refers to `sqlscript_core`, so the deriving crate depends on
//! `sqlscript-core` directly.

use proc_macro::TokenStream;
use quote::quote;

mod parse;

use parse::{ParamsDef, parse_params};

/// Derive macro for the `ToParams` trait.
///
/// Each field value is cloned and converted with `Into<Value>`, so every
/// field type must implement `Clone` and `Into<sqlscript_core::Value>`.
///
/// # Attributes
///
/// - `#[params(rename = "Name")]` - Bind the field under a different name
/// - `#[params(skip)]` - Leave the field out
///
/// Parameter names must be unique ignoring case.
///
/// # Example
///
/// ```ignore
/// use sqlscript::ToParams;
///
/// #[derive(ToParams)]
/// struct FruitFilter {
///     #[params(rename = "TableName")]
///     table: String,
///     min_weight: i32,
///     #[params(skip)]
///     cache_hint: bool,
/// }
/// ```
#[proc_macro_derive(ToParams, attributes(params))]
pub fn derive_to_params(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    let def = match parse_params(&input) {
        Ok(def) => def,
        Err(e) => return e.to_compile_error().into(),
    };

    generate_to_params_impl(&def).into()
}

fn generate_to_params_impl(def: &ParamsDef) -> proc_macro2::TokenStream {
    let name = &def.name;
    let (impl_generics, ty_generics, where_clause) = def.generics.split_for_impl();

    let sets = def.bound_fields().map(|field| {
        let ident = &field.ident;
        let param_name = &field.param_name;
        quote! {
            params.set(
                #param_name,
                ::sqlscript_core::Value::from(::core::clone::Clone::clone(&self.#ident)),
            );
        }
    });

    quote! {
        impl #impl_generics ::sqlscript_core::ToParams for #name #ty_generics #where_clause {
            fn to_params(&self) -> ::sqlscript_core::Params {
                #[allow(unused_mut)]
                let mut params = ::sqlscript_core::Params::new();
                #(#sets)*
                params
            }
        }
    }
}
