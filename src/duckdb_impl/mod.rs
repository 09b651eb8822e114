pub mod bind_info_ffi;
pub mod scalar;
pub mod string;

use std::borrow::Cow;

/// DuckDB hands strings over as C strings, so interior NULs become spaces.
pub(crate) fn without_interior_nul(value: &str) -> Cow<'_, str> {
    if value.contains('\0') {
        Cow::Owned(value.replace('\0', " "))
    } else {
        Cow::Borrowed(value)
    }
}
