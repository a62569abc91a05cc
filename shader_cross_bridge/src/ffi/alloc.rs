//! Caller-owned allocations
//!
//! Every buffer handed across the boundary is prefixed by a hidden header
//! holding its total size, so [`sc_internal_free_pointer`] can rebuild the
//! layout without knowing what the buffer holds.

use std::alloc::{self, Layout};
#[cfg(test)]
use std::cell::Cell;
use std::ffi::c_void;
use std::mem;
use std::os::raw::c_char;
use std::ptr;

use shader_cross::Result;

use super::types::ScInternalResult;

const SOURCE: &str = "shader_cross_bridge::ffi::alloc";

/// Header size; also the alignment of every allocation
const HEADER: usize = 16;

#[cfg(test)]
thread_local! {
    /// Buffers allocated and not yet freed on this thread
    static OUTSTANDING: Cell<isize> = const { Cell::new(0) };
}

#[cfg(test)]
fn track(delta: isize) {
    OUTSTANDING.with(|count| count.set(count.get() + delta));
}

#[cfg(test)]
pub(super) fn outstanding() -> isize {
    OUTSTANDING.with(Cell::get)
}

fn layout_for(total: usize) -> Result<Layout> {
    Layout::from_size_align(total, HEADER)
        .map_err(|_| shader_cross::cross_err!(SOURCE, Internal, "Allocation of {} bytes is too large", total))
}

/// Allocate `size` bytes behind a header
fn allocate(size: usize) -> Result<*mut u8> {
    let Some(total) = size.checked_add(HEADER) else {
        shader_cross::cross_bail!(SOURCE, Internal, "Allocation of {} bytes overflows", size);
    };
    let layout = layout_for(total)?;
    // SAFETY: `layout` has a non-zero size
    let base = unsafe { alloc::alloc(layout) };
    if base.is_null() {
        shader_cross::cross_bail!(SOURCE, Internal, "Out of memory allocating {} bytes", total);
    }
    #[cfg(test)]
    track(1);
    // SAFETY: `base` is aligned to HEADER and at least HEADER bytes long
    unsafe {
        (base as *mut usize).write(total);
        Ok(base.add(HEADER))
    }
}

/// Copy `items` into a caller-owned array; NULL when empty
pub(super) fn alloc_slice<T: Copy>(items: &[T]) -> Result<*mut T> {
    debug_assert!(mem::align_of::<T>() <= HEADER);
    if items.is_empty() {
        return Ok(ptr::null_mut());
    }
    let bytes = mem::size_of_val(items);
    let data = allocate(bytes)? as *mut T;
    // SAFETY: `data` has room for `items.len()` elements and does not overlap
    unsafe { ptr::copy_nonoverlapping(items.as_ptr(), data, items.len()) };
    Ok(data)
}

/// Copy `text` into a caller-owned NUL-terminated string
pub(super) fn alloc_string(text: &str) -> Result<*mut c_char> {
    if text.contains('\0') {
        shader_cross::cross_bail!(SOURCE, InvalidArgument, "String {:?} contains an interior NUL", text);
    }
    let data = allocate(text.len() + 1)?;
    // SAFETY: `data` has room for the bytes plus the terminator
    unsafe {
        ptr::copy_nonoverlapping(text.as_ptr(), data, text.len());
        data.add(text.len()).write(0);
    }
    Ok(data as *mut c_char)
}

/// Buffers built for one boundary call
///
/// Everything allocated through it is released on drop unless
/// [`Pending::commit`] hands it to the caller, so a failure halfway through
/// building a nested output leaks nothing.
#[derive(Default)]
pub(super) struct Pending {
    pointers: Vec<*mut c_void>,
}

impl Pending {
    pub fn slice<T: Copy>(&mut self, items: &[T]) -> Result<*mut T> {
        let data = alloc_slice(items)?;
        if !data.is_null() {
            self.pointers.push(data as *mut c_void);
        }
        Ok(data)
    }

    pub fn string(&mut self, text: &str) -> Result<*mut c_char> {
        let data = alloc_string(text)?;
        self.pointers.push(data as *mut c_void);
        Ok(data)
    }

    /// The caller owns every buffer from here on
    pub fn commit(mut self) {
        self.pointers.clear();
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        for pointer in self.pointers.drain(..) {
            // SAFETY: allocated by `allocate` and never handed out
            unsafe { sc_internal_free_pointer(pointer) };
        }
    }
}

/// Release a buffer produced by this library; NULL is ignored
///
/// # Safety
///
/// `pointer` must be NULL or a buffer this library handed to the caller that
/// has not been released yet.
#[no_mangle]
pub unsafe extern "C" fn sc_internal_free_pointer(pointer: *mut c_void) -> ScInternalResult {
    if pointer.is_null() {
        return ScInternalResult::Success;
    }
    // SAFETY: the caller passes a pointer returned by `allocate`
    unsafe {
        let base = (pointer as *mut u8).sub(HEADER);
        let total = (base as *const usize).read();
        match Layout::from_size_align(total, HEADER) {
            Ok(layout) => {
                alloc::dealloc(base, layout);
                #[cfg(test)]
                track(-1);
                ScInternalResult::Success
            }
            Err(_) => {
                shader_cross::cross_error!(SOURCE, "Freed pointer has a corrupt header ({} bytes)", total);
                ScInternalResult::Unhandled
            }
        }
    }
}

#[cfg(test)]
#[path = "alloc_tests.rs"]
mod tests;
