//! Shared program and data memory.
//!
//! The arena is one fixed-capacity block of 32-bit words that every processor
//! reads and writes concurrently. It is both the instruction store and the
//! operand workspace, viewed two ways over the same storage:
//!
//! - **Word view**: [`Arena::load`] / [`Arena::store`] by word-index.
//! - **Record view**: [`Arena::fetch`] by instruction index, reading the
//!   [`INSTRUCTION_WORDS`] words starting at `index * INSTRUCTION_WORDS`.
//!
//! Ownership is guarded only at allocation and deallocation. Individual
//! accesses are relaxed atomic loads and stores: no locks, no fences and no
//! ordering between processors, so racing writes are permitted and some
//! racing value is always observed whole. Every access is range-checked.

use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::instruction::{INSTRUCTION_WORDS, Instruction, WORD_SIZE};
use std::alloc::{self, Layout};
use std::ops::Range;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicI32, Ordering};

/// Default arena capacity in bytes (10 MiB).
pub const DEFAULT_ARENA_BYTES: usize = 10 * 1024 * 1024;

/// Fixed-capacity word memory shared by all processors of one evaluation.
pub struct Arena {
    words: NonNull<AtomicI32>,
    len: usize,
}

// SAFETY: Arena is Send because:
// - It owns the allocation behind `words` (allocated in `new`, freed in `drop`)
// - Nothing in it is tied to the allocating thread
unsafe impl Send for Arena {}

// SAFETY: Arena is Sync because:
// - Shared access only goes through `&[AtomicI32]`, and atomics are Sync
// - Deallocation requires ownership, so no reference can outlive the buffer
unsafe impl Sync for Arena {}

impl Arena {
    /// Allocates a zeroed arena of `bytes` capacity, rounded down to whole words.
    ///
    /// Returns [`VMError::AllocationFailed`] if the allocator refuses the request.
    pub fn new(bytes: usize) -> Result<Self, VMError> {
        let len = bytes / WORD_SIZE;
        if len == 0 {
            return Ok(Self {
                words: NonNull::dangling(),
                len,
            });
        }

        let layout =
            Layout::array::<AtomicI32>(len).map_err(|_| VMError::AllocationFailed { bytes })?;
        // SAFETY: `layout` has nonzero size because `len > 0`.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        // An all-zero bit pattern is a valid `AtomicI32` holding 0.
        let words = NonNull::new(ptr.cast::<AtomicI32>())
            .ok_or(VMError::AllocationFailed { bytes })?;
        Ok(Self { words, len })
    }

    /// Returns the capacity in words.
    pub fn capacity_words(&self) -> usize {
        self.len
    }

    /// Returns the capacity in bytes.
    pub fn capacity_bytes(&self) -> usize {
        self.len * WORD_SIZE
    }

    /// Returns how many whole instruction records fit in the arena.
    pub fn capacity_instructions(&self) -> usize {
        self.len / INSTRUCTION_WORDS
    }

    #[inline(always)]
    fn words(&self) -> &[AtomicI32] {
        // SAFETY: `words` points to `len` initialized atomics owned by `self`
        // (or is dangling with `len == 0`).
        unsafe { std::slice::from_raw_parts(self.words.as_ptr(), self.len) }
    }

    #[inline(always)]
    fn slot(&self, address: i64) -> Result<&AtomicI32, VMError> {
        usize::try_from(address)
            .ok()
            .and_then(|index| self.words().get(index))
            .ok_or(VMError::AddressOutOfBounds {
                address,
                capacity: self.len,
            })
    }

    /// Reads the word at `address`.
    #[inline(always)]
    pub fn load(&self, address: i64) -> Result<i32, VMError> {
        Ok(self.slot(address)?.load(Ordering::Relaxed))
    }

    /// Writes `value` to the word at `address`.
    #[inline(always)]
    pub fn store(&self, address: i64, value: i32) -> Result<(), VMError> {
        self.slot(address)?.store(value, Ordering::Relaxed);
        Ok(())
    }

    /// Reads the instruction record at index `ip`.
    #[inline(always)]
    pub fn fetch(&self, ip: i64) -> Result<Instruction, VMError> {
        let words = self.record(ip)?;
        let mut raw = [0i32; INSTRUCTION_WORDS];
        for (out, word) in raw.iter_mut().zip(words) {
            *out = word.load(Ordering::Relaxed);
        }
        Ok(Instruction::from_words(raw))
    }

    /// Overwrites the instruction record at index `ip`.
    pub fn write_instruction(&self, ip: i64, instruction: &Instruction) -> Result<(), VMError> {
        let words = self.record(ip)?;
        for (word, value) in words.iter().zip(instruction.to_words()) {
            word.store(value, Ordering::Relaxed);
        }
        Ok(())
    }

    fn record(&self, ip: i64) -> Result<&[AtomicI32], VMError> {
        let out_of_bounds = VMError::InstructionOutOfBounds {
            ip,
            capacity: self.capacity_instructions(),
        };
        usize::try_from(ip)
            .ok()
            .and_then(|ip| ip.checked_mul(INSTRUCTION_WORDS))
            .and_then(|start| self.words().get(start..start.checked_add(INSTRUCTION_WORDS)?))
            .ok_or(out_of_bounds)
    }

    /// Copies `bytes` to the start of the arena, little-endian word by word.
    ///
    /// A trailing partial word is zero-extended. Returns
    /// [`VMError::ProgramTooLarge`] if the bytes do not fit.
    pub fn copy_from_bytes(&self, bytes: &[u8]) -> Result<(), VMError> {
        if bytes.len() > self.capacity_bytes() {
            return Err(VMError::ProgramTooLarge {
                size: bytes.len(),
                capacity: self.capacity_bytes(),
            });
        }

        let chunks = bytes.chunks_exact(WORD_SIZE);
        let tail = chunks.remainder();
        let whole = bytes.len() / WORD_SIZE;
        let words = self.words();
        for (word, chunk) in words.iter().zip(chunks) {
            let mut raw = [0u8; WORD_SIZE];
            raw.copy_from_slice(chunk);
            word.store(i32::from_le_bytes(raw), Ordering::Relaxed);
        }
        if !tail.is_empty() {
            let mut last = [0u8; WORD_SIZE];
            last[..tail.len()].copy_from_slice(tail);
            words[whole].store(i32::from_le_bytes(last), Ordering::Relaxed);
        }
        Ok(())
    }

    /// Returns the little-endian bytes of the word at `address`.
    pub fn read_word_bytes(&self, address: i64) -> Result<[u8; WORD_SIZE], VMError> {
        Ok(self.load(address)?.to_le_bytes())
    }

    /// Copies the words in `range` out of the arena.
    pub fn snapshot(&self, range: Range<usize>) -> Result<Vec<i32>, VMError> {
        let slice = self
            .words()
            .get(range.clone())
            .ok_or(VMError::AddressOutOfBounds {
                address: range.end as i64 - 1,
                capacity: self.len,
            })?;
        Ok(slice.iter().map(|w| w.load(Ordering::Relaxed)).collect())
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        // `new` already validated this layout.
        if let Ok(layout) = Layout::array::<AtomicI32>(self.len) {
            // SAFETY: `words` was allocated in `new` with this exact layout and
            // `drop` runs once, after every borrow of the arena has ended.
            unsafe { alloc::dealloc(self.words.as_ptr().cast(), layout) };
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("words", &self.len)
            .field("bytes", &self.capacity_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::encoding::Encode;

    #[test]
    fn new_rounds_down_to_words_and_zeroes() {
        let arena = Arena::new(4 * 8 + 3).unwrap();
        assert_eq!(arena.capacity_words(), 8);
        assert_eq!(arena.snapshot(0..8).unwrap(), vec![0; 8]);
    }

    #[test]
    fn empty_arena_rejects_every_access() {
        let arena = Arena::new(0).unwrap();
        assert_eq!(arena.capacity_words(), 0);
        assert!(arena.load(0).is_err());
        assert!(arena.fetch(0).is_err());
    }

    #[test]
    fn load_store_round_trip() {
        let arena = Arena::new(64).unwrap();
        arena.store(3, -17).unwrap();
        assert_eq!(arena.load(3).unwrap(), -17);
    }

    #[test]
    fn out_of_range_addresses_are_rejected() {
        let arena = Arena::new(16).unwrap();
        assert_eq!(
            arena.load(4),
            Err(VMError::AddressOutOfBounds {
                address: 4,
                capacity: 4
            })
        );
        assert!(arena.store(-1, 0).is_err());
        assert!(arena.load(i64::MAX).is_err());
    }

    #[test]
    fn record_view_aliases_word_view() {
        let arena = Arena::new(256).unwrap();
        let instr = Instruction::add(2, 30, 31, 32);
        arena.write_instruction(1, &instr).unwrap();
        assert_eq!(arena.fetch(1).unwrap(), instr);
        assert_eq!(
            arena.snapshot(5..10).unwrap(),
            instr.to_words().to_vec()
        );

        arena.store(6, 9).unwrap();
        assert_eq!(arena.fetch(1).unwrap().vector_size, 9);
    }

    #[test]
    fn fetch_past_last_whole_record_fails() {
        // 12 words: two whole records plus two spare words
        let arena = Arena::new(48).unwrap();
        assert_eq!(arena.capacity_instructions(), 2);
        assert!(arena.fetch(1).is_ok());
        assert_eq!(
            arena.fetch(2),
            Err(VMError::InstructionOutOfBounds { ip: 2, capacity: 2 })
        );
        assert!(arena.fetch(-1).is_err());
    }

    #[test]
    fn copy_from_bytes_matches_encoding() {
        let arena = Arena::new(128).unwrap();
        let bytes = Instruction::subtract(1, 4, 5, 6).to_bytes();
        arena.copy_from_bytes(&bytes).unwrap();
        assert_eq!(arena.fetch(0).unwrap(), Instruction::subtract(1, 4, 5, 6));
    }

    #[test]
    fn read_word_bytes_returns_copied_bytes() {
        let arena = Arena::new(64).unwrap();
        let bytes = Instruction::add(2, -3, 70_000, 9).to_bytes();
        arena.copy_from_bytes(&bytes).unwrap();
        for word in 0..INSTRUCTION_WORDS {
            let at = word * WORD_SIZE;
            let read = arena.read_word_bytes(word as i64).unwrap();
            assert_eq!(read.as_slice(), &bytes[at..at + WORD_SIZE]);
        }
        assert_eq!(
            arena.read_word_bytes(16),
            Err(VMError::AddressOutOfBounds {
                address: 16,
                capacity: 16
            })
        );
    }

    #[test]
    fn copy_from_bytes_zero_extends_partial_word() {
        let arena = Arena::new(16).unwrap();
        arena.store(1, -1).unwrap();
        arena.copy_from_bytes(&[1, 0, 0, 0, 2, 1]).unwrap();
        assert_eq!(arena.snapshot(0..2).unwrap(), vec![1, 0x0102]);
    }

    #[test]
    fn copy_from_bytes_rejects_oversized_program() {
        let arena = Arena::new(8).unwrap();
        assert_eq!(
            arena.copy_from_bytes(&[0; 9]),
            Err(VMError::ProgramTooLarge {
                size: 9,
                capacity: 8
            })
        );
    }

    #[test]
    fn concurrent_disjoint_writes_are_all_visible_after_join() {
        let arena = Arena::new(4 * 1024).unwrap();
        std::thread::scope(|scope| {
            for t in 0..4i64 {
                let arena = &arena;
                scope.spawn(move || {
                    for i in 0..256 {
                        arena.store(t * 256 + i, (t * 1000 + i) as i32).unwrap();
                    }
                });
            }
        });
        for t in 0..4i64 {
            assert_eq!(arena.load(t * 256 + 255).unwrap(), (t * 1000 + 255) as i32);
        }
    }
}
