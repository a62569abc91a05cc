//! Flat C ABI
//!
//! Every function returns [`ScInternalResult`] and writes its outputs through
//! caller-supplied pointers. Compilers are addressed by opaque 64-bit handles;
//! 0 is never a valid handle. Strings and arrays handed to the caller are
//! owned by the caller and released with [`sc_internal_free_pointer`], one
//! call per allocation (an array of structs holding strings needs one call per
//! string plus one for the array). The combined image sampler table is the
//! only borrowed output: it belongs to the compiler and must not be freed.
//!
//! Pointer arguments must be NULL or valid for the reads and writes the call
//! performs; NULL is reported as a `CompilationError` wherever a value is
//! required.

#![allow(clippy::missing_safety_doc)]

mod alloc;
mod compiler;
mod error;
mod glsl;
mod hlsl;
mod msl;
mod registry;
mod types;

pub use alloc::sc_internal_free_pointer;
pub use compiler::*;
pub use error::sc_internal_get_latest_exception_message;
pub use glsl::*;
pub use hlsl::*;
pub use msl::*;
pub use types::*;

pub(crate) use error::latest_exception_message;

/// Number of live compiler handles in this process
pub fn live_compiler_count() -> usize {
    registry::live_count()
}
