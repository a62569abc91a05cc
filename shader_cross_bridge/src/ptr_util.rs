//! Reading caller-owned boundary outputs back into Rust values

use std::ffi::CStr;
use std::os::raw::c_char;

use crate::ErrorCode;

/// Copy a NUL-terminated boundary string
///
/// # Safety
/// `pointer` must be NULL or point to a NUL-terminated string.
pub(crate) unsafe fn read_string_from_ptr(pointer: *const c_char) -> Result<String, ErrorCode> {
    if pointer.is_null() {
        return Ok(String::new());
    }
    // SAFETY: non-NULL and NUL-terminated per the caller
    let text = unsafe { CStr::from_ptr(pointer) };
    text.to_str()
        .map(str::to_owned)
        .map_err(|_| ErrorCode::CompilationError(String::from("Boundary string is not valid UTF-8")))
}

/// Copy a `(pointer, count)` boundary array; NULL or 0 reads as empty
///
/// # Safety
/// `pointer` must be valid for `len` reads when non-NULL.
pub(crate) unsafe fn read_into_vec_from_ptr<T: Clone>(pointer: *const T, len: usize) -> Vec<T> {
    if pointer.is_null() || len == 0 {
        return Vec::new();
    }
    // SAFETY: non-NULL and `len` readable elements per the caller
    unsafe { std::slice::from_raw_parts(pointer, len) }.to_vec()
}
