//! `#[derive(Error)]` for the VM's error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error`. Every variant (or the
//! struct itself) carries an `#[error("...")]` message; fields are interpolated
//! by position (`{0}`) for tuple shapes and by name (`{ip}`) for named shapes.
//!
//! ```ignore
//! use flowvm_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum LaunchError {
//!     #[error("processor {0} did not stop")]
//!     Hung(usize),
//!
//!     #[error("opcode {opcode} at instruction {ip} is not executable")]
//!     InvalidOpcode { opcode: u32, ip: usize },
//!
//!     #[error("arena allocation failed")]
//!     OutOfMemory,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Lit, Meta, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Enum(data) => {
            let arms = data
                .variants
                .iter()
                .map(|variant| {
                    let ident = &variant.ident;
                    let message = message_of(
                        &variant.attrs,
                        ident,
                        &format!("variant `{}`", ident),
                    )?;
                    Ok(variant_arm(ident, &variant.fields, &message))
                })
                .collect::<syn::Result<Vec<_>>>()?;
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Struct(data) => {
            let message =
                message_of(&input.attrs, &input.ident, &format!("type `{}`", input.ident))?;
            struct_body(&data.fields, &message)
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error cannot be derived for unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

fn variant_arm(ident: &syn::Ident, fields: &Fields, message: &str) -> TokenStream2 {
    match fields {
        Fields::Unit => quote! {
            Self::#ident => write!(f, #message),
        },
        Fields::Unnamed(unnamed) => {
            let bindings: Vec<_> = (0..unnamed.unnamed.len())
                .map(|i| format_ident!("f{}", i))
                .collect();
            let message = positional_to_named(message, bindings.len());
            quote! {
                Self::#ident(#(#bindings),*) => write!(f, #message, #(#bindings = #bindings),*),
            }
        }
        Fields::Named(named) => {
            let names: Vec<_> = named.named.iter().map(|field| &field.ident).collect();
            quote! {
                #[allow(unused_variables)]
                Self::#ident { #(#names),* } => write!(f, #message, #(#names = #names),*),
            }
        }
    }
}

fn struct_body(fields: &Fields, message: &str) -> TokenStream2 {
    match fields {
        Fields::Unit => quote! { write!(f, #message) },
        Fields::Named(named) => {
            let names: Vec<_> = named.named.iter().map(|field| &field.ident).collect();
            quote! { write!(f, #message, #(#names = self.#names),*) }
        }
        Fields::Unnamed(unnamed) => {
            let bindings: Vec<_> = (0..unnamed.unnamed.len())
                .map(|i| format_ident!("f{}", i))
                .collect();
            let indices: Vec<_> = (0..unnamed.unnamed.len()).map(syn::Index::from).collect();
            let message = positional_to_named(message, bindings.len());
            quote! { write!(f, #message, #(#bindings = self.#indices),*) }
        }
    }
}

/// Reads the string literal out of `#[error("...")]`.
fn message_of<T: ToTokens>(attrs: &[Attribute], target: &T, what: &str) -> syn::Result<String> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("error")) else {
        return Err(syn::Error::new_spanned(
            target,
            format!("missing #[error(\"...\")] on {what}; every error needs a display message"),
        ));
    };

    let Meta::List(list) = &attr.meta else {
        return Err(syn::Error::new_spanned(
            &attr.meta,
            "expected #[error(\"message\")]",
        ));
    };

    match syn::parse2::<Lit>(list.tokens.clone()) {
        Ok(Lit::Str(lit)) => Ok(lit.value()),
        _ => Err(syn::Error::new_spanned(
            &attr.meta,
            "#[error] takes a single string literal, e.g. #[error(\"invalid opcode {opcode}\")]",
        )),
    }
}

/// Rewrites `{0}`, `{1}:x`... into `{f0}`, `{f1}:x` so tuple fields bind by name.
fn positional_to_named(message: &str, count: usize) -> String {
    let mut out = message.to_string();
    for i in (0..count).rev() {
        out = out
            .replace(&format!("{{{i}}}"), &format!("{{f{i}}}"))
            .replace(&format!("{{{i}:"), &format!("{{f{i}:"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::positional_to_named;

    #[test]
    fn rewrites_positional_placeholders() {
        assert_eq!(positional_to_named("processor {0}", 1), "processor {f0}");
        assert_eq!(
            positional_to_named("{1} then {0:>4}", 2),
            "{f1} then {f0:>4}"
        );
    }

    #[test]
    fn leaves_named_placeholders_alone() {
        assert_eq!(positional_to_named("ip {ip}", 0), "ip {ip}");
    }
}
