//! `#[derive(StatusCode)]` for enums crossing the C boundary.
//!
//! Each variant declares `#[code(N)]`; the derive emits
//! `pub const fn code(&self) -> i32`. Codes must be unique and nonzero since
//! zero is reserved for success on the C side.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use std::collections::HashMap;
use syn::{Data, DeriveInput, LitInt, parse_macro_input};

pub fn derive_status_code(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "StatusCode can only be derived for enums",
        ));
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let mut seen: HashMap<i32, String> = HashMap::new();
    let mut arms = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        let ident = &variant.ident;
        let Some(attr) = variant.attrs.iter().find(|a| a.path().is_ident("code")) else {
            return Err(syn::Error::new_spanned(
                ident,
                format!("missing #[code(N)] on variant `{ident}`"),
            ));
        };
        let lit: LitInt = attr.parse_args()?;
        let code: i32 = lit.base10_parse()?;
        if code == 0 {
            return Err(syn::Error::new_spanned(
                &lit,
                "status code 0 is reserved for success",
            ));
        }
        if let Some(previous) = seen.insert(code, ident.to_string()) {
            return Err(syn::Error::new_spanned(
                &lit,
                format!("status code {code} is already used by `{previous}`"),
            ));
        }
        arms.push(quote! { Self::#ident { .. } => #code, });
    }

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Stable numeric status reported across the C boundary.
            pub const fn code(&self) -> i32 {
                match self {
                    #(#arms)*
                }
            }
        }
    })
}
