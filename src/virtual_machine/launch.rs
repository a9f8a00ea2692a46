//! Multi-processor launch and join.
//!
//! The last `processor_count` words of the program hold one starting
//! instruction index per processor:
//!
//! ```text
//! [ instructions ... | data ... | start[0] .. start[n-1] ]
//!                                 ^ word program_size/4 - n
//! ```
//!
//! [`run`] reads that table, spawns one OS thread per entry against the same
//! arena and joins them all. Threads share nothing but the arena; there are no
//! locks or barriers between them, so any coordination a program needs has to
//! be expressed through ordinary arithmetic on shared words.

use crate::virtual_machine::arena::Arena;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::instruction::WORD_SIZE;
use crate::virtual_machine::vm::{Processor, ProcessorReport};
use crate::{error, info};
use std::thread;

/// Reads the start table for a program of `program_size` bytes.
///
/// Returns [`VMError::InvalidProcessorCount`] if `processor_count` is zero or
/// exceeds the number of whole words in the program.
pub fn read_start_table(
    arena: &Arena,
    program_size: usize,
    processor_count: usize,
) -> Result<Vec<i64>, VMError> {
    let available = program_size / WORD_SIZE;
    if processor_count == 0 || processor_count > available {
        return Err(VMError::InvalidProcessorCount {
            count: processor_count as i64,
            available,
        });
    }

    let base = available - processor_count;
    (base..available)
        .map(|word| arena.load(word as i64).map(i64::from))
        .collect()
}

/// Runs every processor listed in the start table to completion.
///
/// Blocks until all threads have finished, including after a failure: a
/// processor that aborts does not cancel its siblings. If any processor fails,
/// the error of the lowest-numbered failing processor is returned.
pub fn run(
    arena: &Arena,
    program_size: usize,
    processor_count: usize,
) -> Result<Vec<ProcessorReport>, VMError> {
    let starts = read_start_table(arena, program_size, processor_count)?;
    info!(
        "launching {} processor(s) at instructions {:?}",
        starts.len(),
        starts
    );

    let outcomes = spawn_and_join(arena, &starts);

    let mut reports = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    for outcome in outcomes {
        match outcome {
            Ok(report) => reports.push(report),
            Err(err) => {
                error!("{err}");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(reports),
    }
}

/// Spawns one scoped thread per start pointer and collects outcomes in processor order.
fn spawn_and_join(arena: &Arena, starts: &[i64]) -> Vec<Result<ProcessorReport, VMError>> {
    thread::scope(|scope| {
        let handles: Vec<_> = starts
            .iter()
            .enumerate()
            .map(|(id, &start)| {
                thread::Builder::new()
                    .name(format!("flowvm-p{id}"))
                    .spawn_scoped(scope, move || Processor::new(id, arena, start).run())
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(id, handle)| {
                let panicked = VMError::ProcessorPanicked { processor: id };
                match handle {
                    Ok(handle) => handle.join().unwrap_or(Err(panicked)),
                    Err(_) => Err(panicked),
                }
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::encoding::Encode;
    use crate::utils::test_utils::utils::{arena_with, program};
    use crate::virtual_machine::instruction::Instruction;
    use crate::virtual_machine::isa::Opcode;

    #[test]
    fn start_table_reads_last_words() {
        let prog = program(
            vec![Instruction::stop()],
            vec![11, 22],
            vec![0, 0, 0],
        );
        let bytes = prog.to_bytes();
        let arena = arena_with(&bytes);
        arena.store(prog.table_base() as i64 + 1, 5).unwrap();
        assert_eq!(
            read_start_table(&arena, bytes.len(), 3).unwrap(),
            vec![0, 5, 0]
        );
        assert_eq!(read_start_table(&arena, bytes.len(), 1).unwrap(), vec![0]);
    }

    #[test]
    fn start_table_rejects_zero_processors() {
        let arena = arena_with(&[0; 8]);
        assert_eq!(
            read_start_table(&arena, 8, 0),
            Err(VMError::InvalidProcessorCount {
                count: 0,
                available: 2
            })
        );
    }

    #[test]
    fn start_table_rejects_more_processors_than_words() {
        let arena = arena_with(&[0; 8]);
        assert!(matches!(
            read_start_table(&arena, 8, 3),
            Err(VMError::InvalidProcessorCount { count: 3, .. })
        ));
    }

    #[test]
    fn run_reports_every_processor_in_order() {
        let prog = program(
            vec![
                Instruction::add(1, 20, 20, 20),
                Instruction::stop(),
                Instruction::stop(),
            ],
            vec![],
            vec![0, 2],
        );
        let bytes = prog.to_bytes();
        let arena = arena_with(&bytes);
        let reports = run(&arena, bytes.len(), 2).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].processor, 0);
        assert_eq!(reports[0].stopped_at, 1);
        assert_eq!(reports[0].instructions, 1);
        assert_eq!(reports[1].start, 2);
        assert_eq!(reports[1].instructions, 0);
    }

    #[test]
    fn failing_processor_does_not_cancel_siblings() {
        let prog = program(
            vec![
                Instruction::raw(Opcode::Divide.tag(), 1, [0, 0, 0]),
                Instruction::add(1, 40, 41, 41),
                Instruction::stop(),
            ],
            vec![],
            vec![0, 1],
        );
        let bytes = prog.to_bytes();
        let arena = arena_with(&bytes);
        arena.store(41, 21).unwrap();

        let err = run(&arena, bytes.len(), 2).unwrap_err();
        assert_eq!(
            err,
            VMError::InvalidOpcode {
                opcode: Opcode::Divide.tag(),
                ip: 0,
                processor: 0
            }
        );
        assert_eq!(arena.load(40).unwrap(), 42);
    }

    #[test]
    fn lowest_failing_processor_wins() {
        let prog = program(
            vec![
                Instruction::stop(),
                Instruction::raw(100, 0, [0; 3]),
                Instruction::raw(200, 0, [0; 3]),
            ],
            vec![],
            vec![2, 0, 1],
        );
        let bytes = prog.to_bytes();
        let arena = arena_with(&bytes);
        assert!(matches!(
            run(&arena, bytes.len(), 3),
            Err(VMError::InvalidOpcode {
                opcode: 200,
                processor: 0,
                ..
            })
        ));
    }
}
