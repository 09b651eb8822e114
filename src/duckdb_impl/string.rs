use libduckdb_sys::duckdb_string_t;

const INLINE_CAPACITY: usize = 12;

/// Raw bytes of a DuckDB string row.
///
/// # Safety
///
/// `s` must be a non-NULL row of a `VARCHAR` vector that stays alive for the
/// returned lifetime.
unsafe fn duckdb_string_bytes(s: &duckdb_string_t) -> &[u8] {
    // SAFETY: both union variants start with the length.
    let len = unsafe { s.value.inlined.length } as usize;
    if len == 0 {
        return &[];
    }

    if len <= INLINE_CAPACITY {
        // SAFETY: short strings are stored inline with `len` initialized bytes.
        let inlined = unsafe { &s.value.inlined.inlined };
        // SAFETY: `len` is within the inline buffer.
        unsafe { std::slice::from_raw_parts(inlined.as_ptr().cast::<u8>(), len) }
    } else {
        // SAFETY: long strings point at `len` bytes owned by the vector.
        let ptr = unsafe { s.value.pointer.ptr };
        // SAFETY: see above.
        unsafe { std::slice::from_raw_parts(ptr.cast::<u8>(), len) }
    }
}

/// Copies a DuckDB string row into an owned `String`, replacing invalid UTF-8.
///
/// # Safety
///
/// Same contract as the vector row: callers check the row is not NULL first.
pub unsafe fn decode_duckdb_string(s: &duckdb_string_t) -> String {
    // SAFETY: forwarded caller contract.
    let bytes = unsafe { duckdb_string_bytes(s) };
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use libduckdb_sys::{
        duckdb_string_t__bindgen_ty_1, duckdb_string_t__bindgen_ty_1__bindgen_ty_1,
        duckdb_string_t__bindgen_ty_1__bindgen_ty_2,
    };
    use std::os::raw::c_char;

    fn inlined(bytes: &[u8]) -> duckdb_string_t {
        let mut buffer = [0 as c_char; INLINE_CAPACITY];
        for (dst, src) in buffer.iter_mut().zip(bytes) {
            *dst = *src as c_char;
        }

        duckdb_string_t {
            value: duckdb_string_t__bindgen_ty_1 {
                inlined: duckdb_string_t__bindgen_ty_1__bindgen_ty_2 {
                    length: bytes.len() as u32,
                    inlined: buffer,
                },
            },
        }
    }

    fn pointed(bytes: &mut [u8]) -> duckdb_string_t {
        let mut prefix = [0 as c_char; 4];
        for (dst, src) in prefix.iter_mut().zip(bytes.iter()) {
            *dst = *src as c_char;
        }

        duckdb_string_t {
            value: duckdb_string_t__bindgen_ty_1 {
                pointer: duckdb_string_t__bindgen_ty_1__bindgen_ty_1 {
                    length: bytes.len() as u32,
                    prefix,
                    ptr: bytes.as_mut_ptr().cast::<c_char>(),
                },
            },
        }
    }

    #[test]
    fn test_decode_inlined() {
        // SAFETY: fixture is a valid inline string.
        assert_eq!(unsafe { decode_duckdb_string(&inlined(b"1. e4 e5")) }, "1. e4 e5");
        // SAFETY: fixture is a valid empty string.
        assert_eq!(unsafe { decode_duckdb_string(&inlined(b"")) }, "");
    }

    #[test]
    fn test_decode_exactly_inline_capacity() {
        // SAFETY: fixture is a valid inline string.
        let decoded = unsafe { decode_duckdb_string(&inlined(b"1. d4 d5 c4!")) };
        assert_eq!(decoded, "1. d4 d5 c4!");
    }

    #[test]
    fn test_decode_pointer() {
        let mut backing = b"Carlsen vs Nakamura\n1. e4 e5".to_vec();
        // SAFETY: backing outlives the decode.
        let decoded = unsafe { decode_duckdb_string(&pointed(&mut backing)) };
        assert_eq!(decoded, "Carlsen vs Nakamura\n1. e4 e5");
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut backing = b"Played 2021-03-05".to_vec();
        backing[0] = 0xff;
        let expected = String::from_utf8_lossy(&backing).into_owned();
        // SAFETY: backing outlives the decode.
        let decoded = unsafe { decode_duckdb_string(&pointed(&mut backing)) };
        assert_eq!(decoded, expected);
    }
}
