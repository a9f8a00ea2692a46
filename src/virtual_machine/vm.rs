//! Fetch-decode-execute loop for one logical processor.
//!
//! A [`Processor`] owns nothing but its instruction pointer; all reads and
//! writes go to the shared [`Arena`]. Execution is a two-state machine: the
//! processor is RUNNING until it fetches a `Stop` record, which is the only
//! way to finish cleanly. There is no step limit and no timeout. Arithmetic
//! wraps on overflow.

use crate::virtual_machine::arena::Arena;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::instruction::Instruction;
use crate::virtual_machine::isa::Opcode;

/// Execution state of a processor after a step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessorState {
    /// The pointer advanced to the next record.
    Running,
    /// A `Stop` record was fetched; the pointer stays on it.
    Stopped,
}

/// Summary of a processor that reached `Stop`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessorReport {
    /// Index of the processor in the start table.
    pub processor: usize,
    /// Instruction index the processor started at.
    pub start: i64,
    /// Instruction index of the `Stop` record that ended execution.
    pub stopped_at: i64,
    /// Records executed, excluding the final `Stop`.
    pub instructions: u64,
    /// Element operations performed across all vector iterations.
    pub elements: u64,
}

/// One logical processor bound to a shared arena.
pub struct Processor<'a> {
    id: usize,
    arena: &'a Arena,
    start: i64,
    /// Index of the next record to execute.
    ip: i64,
    instructions: u64,
    elements: u64,
}

impl<'a> Processor<'a> {
    /// Creates a processor that will start executing at record `start`.
    pub fn new(id: usize, arena: &'a Arena, start: i64) -> Self {
        Self {
            id,
            arena,
            start,
            ip: start,
            instructions: 0,
            elements: 0,
        }
    }

    /// Returns the index of the next record to execute.
    pub fn ip(&self) -> i64 {
        self.ip
    }

    /// Runs until a `Stop` record is fetched or an instruction fails.
    pub fn run(mut self) -> Result<ProcessorReport, VMError> {
        while self.step()? == ProcessorState::Running {}
        Ok(ProcessorReport {
            processor: self.id,
            start: self.start,
            stopped_at: self.ip,
            instructions: self.instructions,
            elements: self.elements,
        })
    }

    /// Fetches and executes the record at the instruction pointer.
    pub fn step(&mut self) -> Result<ProcessorState, VMError> {
        let instr = self.arena.fetch(self.ip)?;
        let opcode = instr.opcode().map_err(|tag| self.invalid_opcode(tag))?;

        match opcode {
            Opcode::Stop => return Ok(ProcessorState::Stopped),
            Opcode::Add => self.op_add(&instr)?,
            Opcode::Subtract => self.op_sub(&instr)?,
            Opcode::Multiply | Opcode::Divide | Opcode::Modulo | Opcode::Set | Opcode::Copy => {
                return Err(self.invalid_opcode(instr.tag));
            }
        }

        self.instructions += 1;
        self.ip += 1;
        Ok(ProcessorState::Running)
    }

    fn invalid_opcode(&self, opcode: u32) -> VMError {
        VMError::InvalidOpcode {
            opcode,
            ip: self.ip,
            processor: self.id,
        }
    }

    fn op_add(&mut self, instr: &Instruction) -> Result<(), VMError> {
        self.vector_binary(instr, i32::wrapping_add)
    }

    fn op_sub(&mut self, instr: &Instruction) -> Result<(), VMError> {
        self.vector_binary(instr, i32::wrapping_sub)
    }

    /// Applies `f` element-wise for `offset in 0..vector_size`, in increasing order.
    ///
    /// Each element reads both sources before writing the destination, so
    /// overlapping operands behave like the equivalent sequence of scalar ops.
    #[inline(always)]
    fn vector_binary(
        &mut self,
        instr: &Instruction,
        f: impl Fn(i32, i32) -> i32,
    ) -> Result<(), VMError> {
        let args = instr.binary_args();
        let (dst, a, b) = (
            i64::from(args.destination),
            i64::from(args.source1),
            i64::from(args.source2),
        );
        for offset in 0..i64::from(instr.vector_size) {
            let va = self.arena.load(a + offset)?;
            let vb = self.arena.load(b + offset)?;
            self.arena.store(dst + offset, f(va, vb))?;
        }
        self.elements += u64::from(instr.vector_size);
        Ok(())
    }
}
