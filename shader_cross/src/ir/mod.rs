//! In-memory form of a SPIR-V module
//!
//! Loading goes through rspirv; everything reflection and code generation
//! need is indexed once at load time and re-indexed after constant edits.

pub mod annotations;
pub mod module;
pub mod types;

pub use annotations::{decoration_operands, decoration_value, Annotations, DecorationSet};
pub use module::{Constant, ConstantValue, EntryPointInfo, ParsedModule, Variable};
pub use types::{BaseType, ImageInfo, SpirType};
