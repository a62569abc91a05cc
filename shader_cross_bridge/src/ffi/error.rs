//! Error channel of the flat boundary
//!
//! Every boundary body runs inside [`guard`]. A recognised engine error
//! becomes `CompilationError` and its message is kept in a thread-local slot
//! until the next failing call on the same thread. Panics and engine faults
//! become `Unhandled` and are only logged.

use std::any::Any;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};

use shader_cross::{cross_error, cross_warn};

use super::types::ScInternalResult;

const SOURCE: &str = "shader_cross_bridge::ffi";

thread_local! {
    static LATEST_EXCEPTION: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn store_message(message: &str) {
    let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
    LATEST_EXCEPTION.with(|slot| *slot.borrow_mut() = Some(message));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Run `body`, translating its outcome into a result code
pub(super) fn guard<F>(body: F) -> ScInternalResult
where
    F: FnOnce() -> shader_cross::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => ScInternalResult::Success,
        Ok(Err(error)) if error.is_compilation_error() => {
            store_message(error.message());
            ScInternalResult::CompilationError
        }
        Ok(Err(error)) => {
            cross_error!(SOURCE, "Unhandled engine fault: {}", error);
            ScInternalResult::Unhandled
        }
        Err(payload) => {
            cross_error!(SOURCE, "Panic caught at the boundary: {}", panic_message(payload.as_ref()));
            ScInternalResult::Unhandled
        }
    }
}

/// Copy of the calling thread's latest error message
pub(crate) fn latest_exception_message() -> Option<String> {
    LATEST_EXCEPTION.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|message| message.to_string_lossy().into_owned())
    })
}

/// Message of the calling thread's latest `CompilationError`
///
/// The pointer stays valid until the next failing call on this thread and
/// must not be freed. It is NULL when no call on this thread has failed.
///
/// # Safety
///
/// `message` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn sc_internal_get_latest_exception_message(message: *mut *const c_char) -> ScInternalResult {
    if message.is_null() {
        cross_warn!(SOURCE, "sc_internal_get_latest_exception_message called with a NULL out pointer");
        return ScInternalResult::Unhandled;
    }
    let pointer = LATEST_EXCEPTION.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(std::ptr::null(), |message| message.as_ptr())
    });
    // SAFETY: checked for NULL above; validity is the caller's contract
    unsafe { *message = pointer };
    ScInternalResult::Success
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
