//! Test utilities for VM testing.

#[cfg(test)]
pub mod utils {
    use crate::virtual_machine::arena::Arena;
    use crate::virtual_machine::config::RuntimeConfig;
    use crate::virtual_machine::errors::VMError;
    use crate::virtual_machine::evaluate::{EvalRequest, Evaluator};
    use crate::virtual_machine::instruction::Instruction;
    use crate::virtual_machine::program::AssemblyProgram;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// Arena size used by unit tests; small enough to allocate per test.
    pub const TEST_ARENA_BYTES: usize = 4096;

    pub fn program(
        instructions: Vec<Instruction>,
        data: Vec<i32>,
        start_pointers: Vec<i32>,
    ) -> AssemblyProgram {
        AssemblyProgram::new(instructions, data, start_pointers)
    }

    /// Allocates a test arena and copies `bytes` into it.
    pub fn arena_with(bytes: &[u8]) -> Arena {
        let arena = Arena::new(TEST_ARENA_BYTES).expect("arena allocation failed");
        arena.copy_from_bytes(bytes).expect("program does not fit");
        arena
    }

    pub fn small_evaluator() -> Evaluator {
        Evaluator::new(RuntimeConfig::with_arena_bytes(TEST_ARENA_BYTES))
    }

    /// Evaluates on a background thread, giving up after `timeout`.
    ///
    /// Returns `None` if the evaluation has not finished in time. The worker
    /// is detached and keeps running in that case.
    pub fn run_with_timeout(
        evaluator: Evaluator,
        input: Vec<u8>,
        request: EvalRequest,
        timeout: Duration,
    ) -> Option<Result<i32, VMError>> {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(evaluator.evaluate(&input, &request));
        });
        rx.recv_timeout(timeout).ok()
    }
}
