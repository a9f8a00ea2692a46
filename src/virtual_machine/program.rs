//! Program byte-stream layout.
//!
//! [`AssemblyProgram`] lays out the three sections the runtime expects, back
//! to back and without any header:
//!
//! ```text
//! word 0                data_base()          table_base()        size()/4
//! | instruction records | data words         | start pointers     |
//! ```
//!
//! Every record is a full [`INSTRUCTION_SIZE`] bytes, including `Stop`, so
//! record `i` always starts at byte `i * INSTRUCTION_SIZE`.
//!
//! Older toolchains wrote `Stop` as a two-word record (tag and vector size
//! only), so a program ending in `Stop` had its data three words earlier:
//! `ADD.1 7, 7, 8; STOP` put its data at word 7, where this builder puts it at
//! word 10. The runtime never reads a `Stop` payload and executes either
//! layout, but the bytes produced here are not identical to those streams.
//! Addresses taken from such programs must be shifted by three words for each
//! preceding `Stop`.

use crate::types::encoding::{Encode, EncodeSink};
use crate::virtual_machine::evaluate::EvalRequest;
use crate::virtual_machine::instruction::{INSTRUCTION_SIZE, INSTRUCTION_WORDS, Instruction, WORD_SIZE};

/// An instruction stream with its data region and start table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyProgram {
    /// Instruction records starting at word 0.
    pub instructions: Vec<Instruction>,
    /// Data words following the last record.
    pub data: Vec<i32>,
    /// Starting instruction index for each processor, stored last.
    pub start_pointers: Vec<i32>,
}

impl AssemblyProgram {
    pub fn new(instructions: Vec<Instruction>, data: Vec<i32>, start_pointers: Vec<i32>) -> Self {
        Self {
            instructions,
            data,
            start_pointers,
        }
    }

    /// Word-index of the first data word.
    pub fn data_base(&self) -> usize {
        self.instructions.len() * INSTRUCTION_WORDS
    }

    /// Word-index of the first start pointer.
    pub fn table_base(&self) -> usize {
        self.data_base() + self.data.len()
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        self.instructions.len() * INSTRUCTION_SIZE
            + (self.data.len() + self.start_pointers.len()) * WORD_SIZE
    }

    /// Number of processors the start table launches.
    pub fn processor_count(&self) -> usize {
        self.start_pointers.len()
    }

    /// Builds the evaluation parameters for this program, reading back `result_address`.
    pub fn request(&self, result_address: i64) -> EvalRequest {
        EvalRequest {
            program_size: self.size(),
            processor_count: self.processor_count(),
            result_address,
        }
    }
}

impl Encode for AssemblyProgram {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.instructions.encode(out);
        self.data.encode(out);
        self.start_pointers.encode(out);
    }
}
