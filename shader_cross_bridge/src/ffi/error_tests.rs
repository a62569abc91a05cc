//! Unit tests for the boundary error channel
//!
//! The message slot is thread-local and every test runs on its own thread, so
//! these need no serialization.

use super::*;
use shader_cross::Error;

fn fail_with(message: &str) -> ScInternalResult {
    guard(|| Err(Error::InvalidArgument(message.to_string())))
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[test]
fn test_success_leaves_slot_empty() {
    assert_eq!(guard(|| Ok(())), ScInternalResult::Success);
    assert_eq!(latest_exception_message(), None);
}

#[test]
fn test_compilation_error_stores_message() {
    assert_eq!(fail_with("id 42 is not a type"), ScInternalResult::CompilationError);
    let message = latest_exception_message().unwrap();
    assert!(!message.is_empty());
    assert_eq!(message, "id 42 is not a type");
}

#[test]
fn test_panic_becomes_unhandled() {
    fail_with("earlier failure");
    let result = guard(|| panic!("index out of bounds"));
    assert_eq!(result, ScInternalResult::Unhandled);
    assert_eq!(latest_exception_message().as_deref(), Some("earlier failure"));
}

#[test]
fn test_internal_error_becomes_unhandled() {
    fail_with("earlier failure");
    let result = guard(|| Err(Error::Internal("registry lock poisoned".to_string())));
    assert_eq!(result, ScInternalResult::Unhandled);
    assert_eq!(latest_exception_message().as_deref(), Some("earlier failure"));
}

#[test]
fn test_later_failure_replaces_message() {
    fail_with("first");
    fail_with("second");
    assert_eq!(latest_exception_message().as_deref(), Some("second"));
}

#[test]
fn test_interior_nul_is_replaced() {
    fail_with("bad\0name");
    assert_eq!(latest_exception_message().as_deref(), Some("bad name"));
}

// ============================================================================
// MESSAGE ACCESSOR
// ============================================================================

#[test]
fn test_message_pointer_tracks_slot() {
    let mut message = std::ptr::null();
    let result = unsafe { sc_internal_get_latest_exception_message(&mut message) };
    assert_eq!(result, ScInternalResult::Success);
    assert!(message.is_null());

    fail_with("unknown entry point");
    let result = unsafe { sc_internal_get_latest_exception_message(&mut message) };
    assert_eq!(result, ScInternalResult::Success);
    let text = unsafe { std::ffi::CStr::from_ptr(message) }.to_str().unwrap();
    assert_eq!(text, "unknown entry point");
}
