//! Word-addressed vector virtual machine.
//!
//! A program is a flat byte stream of fixed-size instruction records, data
//! words and a trailing start table. Evaluation copies it into one shared
//! arena and runs one processor thread per start-table entry until each
//! fetches a `Stop` record.
//!
//! # Architecture
//!
//! - **Arena**: a single fixed-capacity block of 32-bit words, shared by all
//!   processors and used both as instruction store and data memory
//! - **Instruction format**: 20-byte records (tag, vector size, three operand words)
//! - **Execution model**: each processor fetches the record at its pointer,
//!   applies it element-wise `vector_size` times and advances by one record
//! - **Concurrency**: processors share nothing but the arena; there are no
//!   locks, barriers or ordering guarantees between them
//!
//! # Modules
//!
//! - [`arena`]: Shared word memory with word and record views
//! - [`config`]: Runtime configuration
//! - [`errors`]: Execution error types and status codes
//! - [`evaluate`]: Evaluate entry point and finished-execution access
//! - [`instruction`]: Instruction record layout and encoding
//! - [`isa`]: Opcode table
//! - [`launch`]: Start table and multi-processor launch
//! - [`program`]: Program byte-stream builder
//! - [`vm`]: Per-processor dispatch loop

pub mod arena;
pub mod config;
pub mod errors;
pub mod evaluate;
pub mod instruction;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod launch;
pub mod program;
pub mod vm;
