/*!
# shader_cross

SPIR-V reflection and cross-compilation engine.

A [`Compiler`] parses a SPIR-V module, answers reflection queries over it,
accepts edits to decorations, names and scalar constants, and generates
GLSL, HLSL or MSL source for the edited module.

## Architecture

- **ir**: rspirv data representation plus type, constant and variable indexes
- **reflect**: entry points, resource categories, specialization constants
- **layout**: declared buffer block sizes from explicit layout decorations
- **backend**: code generation through naga's writers
- **compiler**: the object tying a module to one backend configuration
- **log**: pluggable logger used by every module
*/

// Internal modules
mod error;
pub mod backend;
pub mod compiler;
pub mod ir;
pub mod layout;
pub mod log;
pub mod reflect;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

// Error types
pub use error::{Error, Result};

// Compiler and backend configuration
pub use backend::glsl::GlslOptions;
pub use backend::hlsl::{HlslOptions, RootConstants};
pub use backend::msl::{MslOptions, MslPlatform, MslResourceBinding, MslVertexAttribute, MslVertexFormat};
pub use backend::{Backend, VertexOptions};
pub use compiler::Compiler;

// Reflection results
pub use ir::{BaseType, SpirType};
pub use reflect::{
    BufferRange, CombinedImageSampler, EntryPoint, Resource, ShaderResources, SpecializationConstant,
    WorkGroupSize,
};

// SPIR-V enumerations used throughout the API
pub use spirv;
