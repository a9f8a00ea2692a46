//! flowvm library.
//!
//! A small word-addressed vector virtual machine: fixed-size instruction
//! records, one shared arena and one OS thread per processor. Exposed to Rust
//! through [`virtual_machine::evaluate`] and to foreign callers through the
//! C entry points in [`ffi`].

pub mod ffi;
pub mod types;
pub mod utils;
pub mod virtual_machine;
