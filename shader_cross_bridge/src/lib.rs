/*!
# shader_cross_bridge

Flat, C-callable boundary over the `shader_cross` engine, plus a safe Rust
API that drives the engine through that same boundary.

## Architecture

- **ffi**: `extern "C"` surface. Opaque 64-bit compiler handles, a result code
  per call, a thread-local error message, and a single deallocator
  (`sc_internal_free_pointer`) for every buffer handed to the caller.
- **spirv**: [`spirv::Module`], [`spirv::Ast`] and the reflection types
- **glsl** / **hlsl** / **msl**: per-target options and compile entry points

```no_run
use shader_cross_bridge::spirv::{Compile, Parse};
use shader_cross_bridge::{glsl, spirv};

# fn words() -> Vec<u32> { Vec::new() }
let words = words();
let module = spirv::Module::from_words(&words);
let mut ast = spirv::Ast::<glsl::Target>::parse(&module)?;
ast.set_compiler_options(&glsl::CompilerOptions::default())?;
let source = ast.compile()?;
# Ok::<(), shader_cross_bridge::ErrorCode>(())
```
*/

#![deny(unsafe_op_in_unsafe_fn)]

/// Turn a non-success result code into an early `Err`
///
/// A compilation error carries the message the boundary stored for the
/// calling thread.
macro_rules! check {
    ($check:expr) => {{
        let result = $check;
        if $crate::ffi::ScInternalResult::Success != result {
            return Err($crate::ErrorCode::from_result(result));
        }
    }};
}

pub mod ffi;
pub mod glsl;
pub mod hlsl;
pub mod msl;
pub mod spirv;

mod compiler;
mod ptr_util;

use std::fmt;

/// Failure reported by the safe API
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum ErrorCode {
    /// The boundary caught a panic or an engine fault
    Unhandled,
    /// The engine rejected the input or the request
    CompilationError(String),
}

impl ErrorCode {
    pub(crate) fn from_result(result: ffi::ScInternalResult) -> Self {
        match result {
            ffi::ScInternalResult::CompilationError => {
                ErrorCode::CompilationError(ffi::latest_exception_message().unwrap_or_default())
            }
            _ => ErrorCode::Unhandled,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Unhandled => write!(f, "Unhandled error in shader compiler"),
            ErrorCode::CompilationError(msg) => write!(f, "Shader compilation failed: {}", msg),
        }
    }
}

impl std::error::Error for ErrorCode {}
