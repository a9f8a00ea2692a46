//! C ABI entry points.
//!
//! The library is built as a `cdylib` and exports two symbols:
//!
//! - `Evaluate` returns the result word, or `-1` if evaluation failed. A
//!   program that legitimately produces `-1` is indistinguishable from a
//!   failure; callers that care use `EvaluateChecked`.
//! - `EvaluateChecked` returns `0` on success and writes the result word
//!   through `out_value`, or returns the [`VMError::code`] of the failure.
//!
//! Both read the arena size from the environment (see
//! [`RuntimeConfig::from_env`]).

use crate::error;
use crate::virtual_machine::config::RuntimeConfig;
use crate::virtual_machine::errors::VMError;
use crate::virtual_machine::evaluate::{EvalRequest, Evaluator};
use std::ffi::c_int;

/// Returned by `Evaluate` when evaluation fails.
pub const EVALUATE_FAILED: c_int = -1;
/// Returned by `EvaluateChecked` on success.
pub const STATUS_OK: c_int = 0;

/// Validates the raw C arguments into an [`EvalRequest`].
fn request(
    program_size: c_int,
    processor_count: c_int,
    result_address: c_int,
) -> Result<EvalRequest, VMError> {
    let program_size = usize::try_from(program_size).map_err(|_| VMError::InvalidProgramSize {
        size: i64::from(program_size),
    })?;
    let processor_count =
        usize::try_from(processor_count).map_err(|_| VMError::InvalidProcessorCount {
            count: i64::from(processor_count),
            available: program_size / 4,
        })?;
    Ok(EvalRequest {
        program_size,
        processor_count,
        result_address: i64::from(result_address),
    })
}

/// # Safety
///
/// `input` must point to at least `program_size` readable bytes, or may be
/// null when `program_size` is zero.
unsafe fn evaluate_raw(
    input: *const u8,
    program_size: c_int,
    processor_count: c_int,
    result_address: c_int,
) -> Result<i32, VMError> {
    let request = request(program_size, processor_count, result_address)?;
    let bytes: &[u8] = if request.program_size == 0 {
        &[]
    } else if input.is_null() {
        return Err(VMError::InvalidProgramSize {
            size: request.program_size as i64,
        });
    } else {
        // SAFETY: the caller guarantees `program_size` readable bytes at `input`.
        unsafe { std::slice::from_raw_parts(input, request.program_size) }
    };
    Evaluator::new(RuntimeConfig::from_env()).evaluate(bytes, &request)
}

/// Evaluates a program and returns the word at `result_address`.
///
/// Returns `-1` on failure after logging the error.
///
/// # Safety
///
/// `input` must point to at least `program_size` readable bytes, or may be
/// null when `program_size` is zero.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Evaluate(
    input: *const u8,
    program_size: c_int,
    processor_count: c_int,
    result_address: c_int,
) -> c_int {
    // SAFETY: forwarded from the caller.
    match unsafe { evaluate_raw(input, program_size, processor_count, result_address) } {
        Ok(value) => value,
        Err(err) => {
            error!("Evaluate failed: {err}");
            EVALUATE_FAILED
        }
    }
}

/// Evaluates a program, writing the word at `result_address` to `out_value`.
///
/// Returns `0` on success or the failure's status code. `out_value` is left
/// untouched on failure.
///
/// # Safety
///
/// `input` must point to at least `program_size` readable bytes, or may be
/// null when `program_size` is zero. `out_value` must be null or valid for a
/// write of one `c_int`.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn EvaluateChecked(
    input: *const u8,
    program_size: c_int,
    processor_count: c_int,
    result_address: c_int,
    out_value: *mut c_int,
) -> c_int {
    // SAFETY: forwarded from the caller.
    match unsafe { evaluate_raw(input, program_size, processor_count, result_address) } {
        Ok(value) => {
            if !out_value.is_null() {
                // SAFETY: non-null and valid for writes per the caller contract.
                unsafe { out_value.write(value) };
            }
            STATUS_OK
        }
        Err(err) => {
            error!("EvaluateChecked failed: {err}");
            err.code()
        }
    }
}
