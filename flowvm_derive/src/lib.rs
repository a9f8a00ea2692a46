//! Derive macros for the flowvm crate.
//!
//! Provides:
//! - `#[derive(Error)]` - `Display` and `std::error::Error` from `#[error("...")]` messages
//! - `#[derive(StatusCode)]` - stable numeric status codes from `#[code(N)]` for the C boundary

mod error;
mod status_code;

use proc_macro::TokenStream;

/// Implements `Display` and `Error` for runtime error enums and structs.
#[proc_macro_derive(Error, attributes(error))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}

/// Implements `code(&self) -> i32` mapping every variant to its `#[code(N)]` value.
#[proc_macro_derive(StatusCode, attributes(code))]
pub fn derive_status_code(input: TokenStream) -> TokenStream {
    status_code::derive_status_code(input)
}
