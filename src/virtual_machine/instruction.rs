//! Fixed-width instruction records.
//!
//! An [`Instruction`] is a pure reinterpretation of five little-endian words:
//! the opcode tag, the vector size and a three-word operand payload sized to
//! the widest operand shape. Decoding never validates; an unknown tag is kept
//! as-is and only rejected when the dispatch loop tries to execute it.

use crate::types::encoding::{Decode, DecodeError, Encode, EncodeSink};
use crate::virtual_machine::isa::Opcode;

/// Size of one arena word in bytes.
pub const WORD_SIZE: usize = 4;
/// Number of words in the operand payload.
pub const PAYLOAD_WORDS: usize = 3;
/// Number of words in one instruction record.
pub const INSTRUCTION_WORDS: usize = 2 + PAYLOAD_WORDS;
/// Size of one instruction record in bytes.
pub const INSTRUCTION_SIZE: usize = INSTRUCTION_WORDS * WORD_SIZE;

/// One decoded instruction record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Instruction {
    /// Raw opcode tag; see [`Opcode`].
    pub tag: u32,
    /// Number of element-wise repetitions.
    pub vector_size: u32,
    /// Operand payload, interpreted according to the opcode.
    pub payload: [i32; PAYLOAD_WORDS],
}

/// Operands of `Add`, `Subtract` and the reserved three-address opcodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BinaryArgs {
    pub destination: i32,
    pub source1: i32,
    pub source2: i32,
}

impl Instruction {
    /// Builds a record for a three-address vector operation.
    pub const fn binary(op: Opcode, vector_size: u32, args: BinaryArgs) -> Self {
        Self {
            tag: op.tag(),
            vector_size,
            payload: [args.destination, args.source1, args.source2],
        }
    }

    /// `A[destination + i] = A[source1 + i] + A[source2 + i]` for `i in 0..vector_size`.
    pub const fn add(vector_size: u32, destination: i32, source1: i32, source2: i32) -> Self {
        Self::binary(
            Opcode::Add,
            vector_size,
            BinaryArgs {
                destination,
                source1,
                source2,
            },
        )
    }

    /// `A[destination + i] = A[source1 + i] - A[source2 + i]` for `i in 0..vector_size`.
    pub const fn subtract(vector_size: u32, destination: i32, source1: i32, source2: i32) -> Self {
        Self::binary(
            Opcode::Subtract,
            vector_size,
            BinaryArgs {
                destination,
                source1,
                source2,
            },
        )
    }

    /// Terminates the executing processor.
    pub const fn stop() -> Self {
        Self::raw(Opcode::Stop.tag(), 0, [0; PAYLOAD_WORDS])
    }

    /// Builds a record from raw fields, including tags outside the ISA.
    pub const fn raw(tag: u32, vector_size: u32, payload: [i32; PAYLOAD_WORDS]) -> Self {
        Self {
            tag,
            vector_size,
            payload,
        }
    }

    /// Reinterprets the five words of a record.
    pub const fn from_words(words: [i32; INSTRUCTION_WORDS]) -> Self {
        Self {
            tag: words[0] as u32,
            vector_size: words[1] as u32,
            payload: [words[2], words[3], words[4]],
        }
    }

    /// Returns the five words of this record in arena order.
    pub const fn to_words(&self) -> [i32; INSTRUCTION_WORDS] {
        [
            self.tag as i32,
            self.vector_size as i32,
            self.payload[0],
            self.payload[1],
            self.payload[2],
        ]
    }

    /// Resolves the tag into an [`Opcode`], returning the raw tag if it is unknown.
    pub fn opcode(&self) -> Result<Opcode, u32> {
        Opcode::try_from(self.tag)
    }

    /// Views the payload as three-address operands.
    pub const fn binary_args(&self) -> BinaryArgs {
        BinaryArgs {
            destination: self.payload[0],
            source1: self.payload[1],
            source2: self.payload[2],
        }
    }
}

impl Encode for Instruction {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.tag.encode(out);
        self.vector_size.encode(out);
        self.payload.encode(out);
    }
}

impl Decode for Instruction {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            tag: u32::decode(input)?,
            vector_size: u32::decode(input)?,
            payload: <[i32; PAYLOAD_WORDS]>::decode(input)?,
        })
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Ok(op) = self.opcode() else {
            return write!(
                f,
                "<tag {}>.{} {:?}",
                self.tag, self.vector_size, self.payload
            );
        };
        write!(f, "{}", op.mnemonic())?;
        let names = op.operand_names();
        if names.is_empty() {
            return Ok(());
        }
        write!(f, ".{}", self.vector_size)?;
        for (i, value) in self.payload.iter().take(names.len()).enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{value}")?;
        }
        Ok(())
    }
}
