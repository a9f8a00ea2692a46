//! Instruction Set Architecture (ISA) definitions.
//!
//! The [`for_each_opcode!`](crate::for_each_opcode) macro holds the canonical
//! opcode table and invokes a callback macro for code generation, so the
//! opcode enum and the layout stability check are generated from one list.
//!
//! This module generates:
//! - The [`Opcode`] enum with its 32-bit tags
//! - `TryFrom<u32>` for decoding tags
//! - Mnemonics, operand names and the executable flag per opcode
//!
//! # Record Format
//!
//! Every instruction is a fixed 20-byte record (see
//! [`instruction`](super::instruction)):
//! - Opcode tag: 4 bytes (u32, little-endian)
//! - Vector size: 4 bytes (u32, little-endian)
//! - Operand payload: 3 x 4 bytes (i32 word-indices, little-endian)
//!
//! Reserved opcodes occupy tags and payload shapes but have no execution
//! semantics; the dispatch loop rejects them like unknown tags.

/// Invokes a callback macro with the complete opcode definition list.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Vector arithmetic
            // =========================
            /// ADD d, s1, s2 ; A[d+i] = A[s1+i] + A[s2+i] for i in 0..vector_size (wrapping)
            Add = 0, "ADD" => [destination, source1, source2], true,
            /// SUB d, s1, s2 ; A[d+i] = A[s1+i] - A[s2+i] for i in 0..vector_size (wrapping)
            Subtract = 1, "SUB" => [destination, source1, source2], true,
            // =========================
            // Reserved
            // =========================
            /// MUL d, s1, s2 ; reserved
            Multiply = 2, "MUL" => [destination, source1, source2], false,
            /// DIV d, s1, s2 ; reserved
            Divide = 3, "DIV" => [destination, source1, source2], false,
            /// MOD d, s1, s2 ; reserved
            Modulo = 4, "MOD" => [destination, source1, source2], false,
            /// SET d, value ; reserved
            Set = 5, "SET" => [destination, value], false,
            /// COPY d, s ; reserved
            Copy = 6, "COPY" => [destination, source], false,
            // =========================
            // Control
            // =========================
            /// STOP ; terminates the executing processor
            Stop = 7, "STOP" => [], true,
        }
    };
}

#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $tag:literal, $mnemonic:literal => [
                $( $field:ident ),* $(,)?
            ], $executable:literal
        ),* $(,)?
    ) => {
        #[repr(u32)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $tag,
            )*
        }

        impl TryFrom<u32> for Opcode {
            /// The unrecognised tag.
            type Error = u32;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $( $tag => Ok(Opcode::$name), )*
                    _ => Err(value),
                }
            }
        }

        impl Opcode {
            /// Every opcode in tag order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Returns the assembly mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns the names of the payload words this opcode reads, in record order.
            pub const fn operand_names(&self) -> &'static [&'static str] {
                match self {
                    $( Opcode::$name => &[ $( stringify!($field), )* ], )*
                }
            }

            /// Returns whether the dispatch loop can execute this opcode.
            pub const fn is_executable(&self) -> bool {
                match self {
                    $( Opcode::$name => $executable, )*
                }
            }
        }
    };
}

for_each_opcode!(define_opcodes);

impl Opcode {
    /// Returns the 32-bit tag stored in the record's first word.
    pub const fn tag(self) -> u32 {
        self as u32
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
