use flowvm_derive::{Error, StatusCode};

/// Errors that can occur while preparing or running an evaluation.
///
/// Every variant carries a stable status code used by the C entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error, StatusCode)]
pub enum VMError {
    /// Opcode tag is unknown or names a reserved, non-executable operation.
    #[code(1)]
    #[error("invalid opcode {opcode} at instruction {ip} on processor {processor}")]
    InvalidOpcode {
        opcode: u32,
        ip: i64,
        processor: usize,
    },
    /// Operand word-index (after vector offset) falls outside the arena.
    #[code(2)]
    #[error("word address {address} out of bounds (arena holds {capacity} words)")]
    AddressOutOfBounds { address: i64, capacity: usize },
    /// Instruction pointer addresses a record that does not fit in the arena.
    #[code(3)]
    #[error("instruction {ip} out of bounds (arena holds {capacity} instructions)")]
    InstructionOutOfBounds { ip: i64, capacity: usize },
    /// The arena could not be allocated.
    #[code(4)]
    #[error("failed to allocate a {bytes} byte arena")]
    AllocationFailed { bytes: usize },
    /// The program does not fit in the arena.
    #[code(5)]
    #[error("program of {size} bytes exceeds arena capacity of {capacity} bytes")]
    ProgramTooLarge { size: usize, capacity: usize },
    /// Program size is negative or exceeds the supplied input.
    #[code(6)]
    #[error("invalid program size {size}")]
    InvalidProgramSize { size: i64 },
    /// Processor count is zero or larger than the program's word count.
    #[code(7)]
    #[error("invalid processor count {count} (program provides {available} start slots)")]
    InvalidProcessorCount { count: i64, available: usize },
    /// A processor thread panicked or could not be spawned.
    #[code(8)]
    #[error("processor {processor} terminated abnormally")]
    ProcessorPanicked { processor: usize },
}
