//! Evaluate entry point.
//!
//! One evaluation allocates a fresh arena, copies the program into it,
//! launches every processor in the start table, waits for all of them and
//! reads one result word back. Nothing is observable before every processor
//! has stopped, and the arena is released when the evaluation is dropped.

use crate::virtual_machine::arena::Arena;
use crate::virtual_machine::config::RuntimeConfig;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::launch;
use crate::virtual_machine::vm::ProcessorReport;

/// Boundary parameters of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalRequest {
    /// Number of leading input bytes copied into the arena.
    pub program_size: usize,
    /// Number of processors, and of entries in the start table.
    pub processor_count: usize,
    /// Word-index read back once every processor has stopped.
    pub result_address: i64,
}

/// A finished evaluation: the arena in its final state plus per-processor reports.
#[derive(Debug)]
pub struct Execution {
    arena: Arena,
    reports: Vec<ProcessorReport>,
}

impl Execution {
    /// Reads the word at `address` from the final arena.
    pub fn word(&self, address: i64) -> Result<i32, VMError> {
        self.arena.load(address)
    }

    /// Returns the final arena.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Returns one report per processor, in start-table order.
    pub fn reports(&self) -> &[ProcessorReport] {
        &self.reports
    }
}

/// Runs programs against freshly allocated arenas.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluator {
    config: RuntimeConfig,
}

impl Evaluator {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Runs the program and returns the word at `request.result_address`.
    pub fn evaluate(&self, input: &[u8], request: &EvalRequest) -> Result<i32, VMError> {
        self.execute(input, request)?.word(request.result_address)
    }

    /// Runs the program and returns the whole final state.
    pub fn execute(&self, input: &[u8], request: &EvalRequest) -> Result<Execution, VMError> {
        let program = input
            .get(..request.program_size)
            .ok_or(VMError::InvalidProgramSize {
                size: request.program_size as i64,
            })?;

        let arena = Arena::new(self.config.arena_bytes)?;
        arena.copy_from_bytes(program)?;
        let reports = launch::run(&arena, request.program_size, request.processor_count)?;
        Ok(Execution { arena, reports })
    }
}

/// Evaluates with the default configuration.
///
/// `input` holds the program bytes; only the first `program_size` are copied.
pub fn evaluate(
    input: &[u8],
    program_size: usize,
    processor_count: usize,
    result_address: i64,
) -> Result<i32, VMError> {
    Evaluator::default().evaluate(
        input,
        &EvalRequest {
            program_size,
            processor_count,
            result_address,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::encoding::Encode;
    use crate::utils::test_utils::utils::{program, small_evaluator};
    use crate::virtual_machine::instruction::Instruction;

    #[test]
    fn adds_two_numbers() {
        let prog = program(
            vec![Instruction::add(1, 13, 10, 11), Instruction::stop()],
            vec![3, 4],
            vec![0],
        );
        let bytes = prog.to_bytes();
        assert_eq!(evaluate(&bytes, bytes.len(), 1, 13).unwrap(), 7);
    }

    #[test]
    fn only_program_size_bytes_are_copied() {
        let prog = program(
            vec![Instruction::add(1, 14, 10, 11), Instruction::stop()],
            vec![20, 22],
            vec![0],
        );
        let mut bytes = prog.to_bytes();
        let size = bytes.len();
        bytes.extend_from_slice(&99i32.to_le_bytes());

        let exec = small_evaluator()
            .execute(&bytes, &prog.request(14))
            .unwrap();
        assert_eq!(exec.word(14).unwrap(), 42);
        assert_eq!(exec.word((size / 4) as i64).unwrap(), 0);
    }

    #[test]
    fn program_size_beyond_input_is_rejected() {
        assert_eq!(
            evaluate(&[0; 8], 12, 1, 0),
            Err(VMError::InvalidProgramSize { size: 12 })
        );
    }

    #[test]
    fn program_larger_than_arena_is_rejected() {
        let evaluator = Evaluator::new(RuntimeConfig::with_arena_bytes(16));
        let input = [0u8; 20];
        let request = EvalRequest {
            program_size: 20,
            processor_count: 1,
            result_address: 0,
        };
        assert_eq!(
            evaluator.evaluate(&input, &request),
            Err(VMError::ProgramTooLarge {
                size: 20,
                capacity: 16
            })
        );
    }

    #[test]
    fn result_address_out_of_bounds_is_rejected() {
        let prog = program(vec![Instruction::stop()], vec![], vec![0]);
        let bytes = prog.to_bytes();
        let evaluator = small_evaluator();
        let capacity = evaluator.config().arena_bytes / 4;
        assert_eq!(
            evaluator.evaluate(&bytes, &prog.request(capacity as i64)),
            Err(VMError::AddressOutOfBounds {
                address: capacity as i64,
                capacity
            })
        );
    }

    #[test]
    fn execution_exposes_reports() {
        let prog = program(
            vec![Instruction::stop(), Instruction::stop()],
            vec![],
            vec![1, 0],
        );
        let bytes = prog.to_bytes();
        let exec = small_evaluator().execute(&bytes, &prog.request(0)).unwrap();
        let starts: Vec<_> = exec.reports().iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![1, 0]);
        assert_eq!(exec.arena().capacity_bytes(), 4096);
    }
}
