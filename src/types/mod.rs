//! Shared primitive types.
//!
//! - `encoding`: little-endian word encoding used by the program byte stream

pub mod encoding;
