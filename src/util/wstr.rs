//! Wide string conversion utilities for the ProjFS boundary.

use smallvec::SmallVec;
use windows::core::PCWSTR;

use crate::error::ProjectionError;

/// Convert PCWSTR to a Rust String with stack allocation for common sizes.
///
/// Paths under 256 chars use stack allocation, longer paths heap allocate.
pub fn pcwstr_to_string(s: PCWSTR) -> Result<String, ProjectionError> {
    if s.is_null() {
        return Ok(String::new());
    }

    unsafe {
        let mut len: usize = 0;
        let mut ptr: *const u16 = s.as_ptr();
        while *ptr != 0 {
            len += 1;
            ptr = ptr.add(1);
        }

        if len == 0 {
            return Ok(String::new());
        }

        // Stack buffer for common path lengths (512 bytes = 256 UTF-16 chars)
        let mut buffer: SmallVec<[u8; 512]> = SmallVec::new();

        let wide_slice: &[u16] = std::slice::from_raw_parts(s.as_ptr(), len);
        for c in char::decode_utf16(wide_slice.iter().copied()) {
            match c {
                Ok(ch) => {
                    let mut buf: [u8; 4] = [0; 4];
                    let encoded: &str = ch.encode_utf8(&mut buf);
                    buffer.extend_from_slice(encoded.as_bytes());
                }
                Err(_) => buffer.push(b'?'),
            }
        }

        String::from_utf8(buffer.to_vec())
            .map_err(|e| ProjectionError::PathConversion(e.to_string()))
    }
}

/// Convert a Rust string to a null-terminated wide string.
pub fn string_to_wide(s: &str) -> Vec<u16> {
    let mut wide: Vec<u16> = s.encode_utf16().collect();
    wide.push(0);
    wide
}
