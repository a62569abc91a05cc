//! Error types for the shader_cross engine
//!
//! Every fallible engine operation returns [`Result`]. The variant decides how
//! the flat boundary reports the failure: everything except [`Error::Internal`]
//! is a recognised compilation failure whose message is handed to the host.

use std::fmt;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input is not a well-formed SPIR-V module
    Parse(String),

    /// An id, index, option value or pointer argument was rejected
    InvalidArgument(String),

    /// The module uses something the selected backend cannot express
    Unsupported(String),

    /// The code generator or the module validator failed
    Codegen(String),

    /// A compiler handle is unknown, deleted, or of the wrong backend
    InvalidHandle(String),

    /// Broken invariant inside the engine (poisoned lock, failed allocation)
    Internal(String),
}

impl Error {
    /// Raw message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            Error::Parse(msg)
            | Error::InvalidArgument(msg)
            | Error::Unsupported(msg)
            | Error::Codegen(msg)
            | Error::InvalidHandle(msg)
            | Error::Internal(msg) => msg,
        }
    }

    /// Whether the failure is a recognised compilation error (as opposed to
    /// an engine fault)
    pub fn is_compilation_error(&self) -> bool {
        !matches!(self, Error::Internal(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            Error::Codegen(msg) => write!(f, "Code generation failed: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Build an [`Error`] and log it at ERROR severity
///
/// # Example
///
/// ```no_run
/// # use shader_cross::cross_err;
/// let id = 7;
/// let error = cross_err!("shader_cross::ir", InvalidArgument, "id {} is not a type", id);
/// ```
#[macro_export]
macro_rules! cross_err {
    ($source:expr, $variant:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::cross_error!($source, "{}", message);
        $crate::Error::$variant(message)
    }};
}

/// Log and return an [`Error`] from the enclosing function
#[macro_export]
macro_rules! cross_bail {
    ($source:expr, $variant:ident, $($arg:tt)*) => {
        return Err($crate::cross_err!($source, $variant, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
