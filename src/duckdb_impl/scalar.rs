//! Shared `invoke()` plumbing for the VARCHAR scalars.
//!
//! # Safety
//! Only call these from a DuckDB scalar `invoke()` while its vectors are alive.
//! Column types are checked against the helper before any row is read.

use std::error::Error;
use std::ffi::CString;

use duckdb::{
    Result,
    core::{DataChunkHandle, FlatVector, Inserter, LogicalTypeId},
    vtab::arrow::WritableVector,
};
use libduckdb_sys::duckdb_string_t;

use super::string::decode_duckdb_string;
use super::without_interior_nul;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarcharOutput {
    Null,
    Value(String),
}

impl From<Option<String>> for VarcharOutput {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

fn ensure_type(
    vec: &FlatVector,
    expected: LogicalTypeId,
    label: &str,
) -> Result<(), Box<dyn Error>> {
    let actual = vec.logical_type().id();
    if actual != expected {
        return Err(format!(
            "scalar helper type mismatch: {label} expected {expected:?}, got {actual:?}"
        )
        .into());
    }
    Ok(())
}

fn write_output(
    output_vec: &mut FlatVector,
    row: usize,
    value: VarcharOutput,
) -> Result<(), Box<dyn Error>> {
    match value {
        VarcharOutput::Null => output_vec.set_null(row),
        VarcharOutput::Value(v) => {
            output_vec.insert(row, CString::new(without_interior_nul(&v).as_ref())?)
        }
    }
    Ok(())
}

/// `VARCHAR -> VARCHAR`; NULL in, NULL out.
pub fn invoke_unary_varchar_to_varchar<F>(
    input: &DataChunkHandle,
    output: &mut dyn WritableVector,
    mut f: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnMut(&str) -> VarcharOutput,
{
    let len = input.len();
    let input_vec = input.flat_vector(0);
    ensure_type(&input_vec, LogicalTypeId::Varchar, "input[0]")?;
    let input_slice = input_vec.as_slice::<duckdb_string_t>();
    let mut output_vec = output.flat_vector();
    ensure_type(&output_vec, LogicalTypeId::Varchar, "output")?;

    for (i, s) in input_slice.iter().take(len).enumerate() {
        if input_vec.row_is_null(i as u64) {
            output_vec.set_null(i);
            continue;
        }

        // SAFETY: Row nullability is checked above.
        let val = unsafe { decode_duckdb_string(s) };
        write_output(&mut output_vec, i, f(&val))?;
    }

    Ok(())
}

/// `VARCHAR, VARCHAR -> VARCHAR`; NULL when either input is NULL.
pub fn invoke_binary_varchar_to_varchar<F>(
    input: &DataChunkHandle,
    output: &mut dyn WritableVector,
    mut f: F,
) -> Result<(), Box<dyn Error>>
where
    F: FnMut(&str, &str) -> VarcharOutput,
{
    let len = input.len();
    let left_vec = input.flat_vector(0);
    let right_vec = input.flat_vector(1);
    ensure_type(&left_vec, LogicalTypeId::Varchar, "input[0]")?;
    ensure_type(&right_vec, LogicalTypeId::Varchar, "input[1]")?;
    let left_slice = left_vec.as_slice::<duckdb_string_t>();
    let right_slice = right_vec.as_slice::<duckdb_string_t>();
    let mut output_vec = output.flat_vector();
    ensure_type(&output_vec, LogicalTypeId::Varchar, "output")?;

    for (i, (left, right)) in left_slice
        .iter()
        .take(len)
        .zip(right_slice.iter().take(len))
        .enumerate()
    {
        if left_vec.row_is_null(i as u64) || right_vec.row_is_null(i as u64) {
            output_vec.set_null(i);
            continue;
        }

        // SAFETY: Both input rows are checked non-NULL above.
        let left = unsafe { decode_duckdb_string(left) };
        // SAFETY: Both input rows are checked non-NULL above.
        let right = unsafe { decode_duckdb_string(right) };
        write_output(&mut output_vec, i, f(&left, &right))?;
    }

    Ok(())
}
