use std::error::Error;
use std::ffi::{CStr, CString};
use std::os::raw::c_void;

use duckdb::vtab::BindInfo;
use libduckdb_sys::{
    duckdb_bind_get_named_parameter, duckdb_bind_info, duckdb_destroy_value, duckdb_free,
    duckdb_get_varchar, duckdb_is_null_value, duckdb_value,
};

/// A VARCHAR named parameter as the caller wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NamedVarchar {
    Missing,
    Null,
    Value(String),
}

impl NamedVarchar {
    /// Omitted, SQL NULL and the literal string `null` all read as absent.
    pub(crate) fn into_value(self) -> Option<String> {
        match self {
            Self::Value(text) if !text.trim().eq_ignore_ascii_case("null") => Some(text),
            _ => None,
        }
    }
}

/// Destroys the wrapped value exactly once.
struct OwnedValue(duckdb_value);

impl Drop for OwnedValue {
    fn drop(&mut self) {
        // SAFETY: the handle came from DuckDB and is not used after this.
        unsafe { duckdb_destroy_value(&mut self.0) };
    }
}

pub(crate) fn named_varchar(bind: &BindInfo, name: &str) -> Result<NamedVarchar, Box<dyn Error>> {
    let name_cstr = CString::new(name)?;

    // SAFETY: the bind handle is valid for the duration of the bind callback.
    let raw = unsafe { duckdb_bind_get_named_parameter(bind_info_ptr(bind), name_cstr.as_ptr()) };
    if raw.is_null() {
        return Ok(NamedVarchar::Missing);
    }
    let value = OwnedValue(raw);

    // SAFETY: `value` wraps a live handle.
    if unsafe { duckdb_is_null_value(value.0) } {
        return Ok(NamedVarchar::Null);
    }

    // SAFETY: `value` wraps a live handle; the returned buffer is ours to free.
    let varchar = unsafe { duckdb_get_varchar(value.0) };
    if varchar.is_null() {
        return Err(format!("Failed to read named parameter '{name}' as VARCHAR").into());
    }
    // SAFETY: DuckDB returns a NUL-terminated buffer.
    let text = unsafe { CStr::from_ptr(varchar) }.to_string_lossy().into_owned();
    // SAFETY: allocated by DuckDB and freed once here.
    unsafe { duckdb_free(varchar.cast::<c_void>()) };

    Ok(NamedVarchar::Value(text))
}

fn bind_info_ptr(bind: &BindInfo) -> duckdb_bind_info {
    // SAFETY: `duckdb::vtab::BindInfo` holds the raw `duckdb_bind_info` as its only
    // field and exposes no accessor for it. Re-check this layout on duckdb upgrades.
    unsafe { *(bind as *const BindInfo as *const duckdb_bind_info) }
}
