//! Code generation backends
//!
//! Every compile re-assembles the edited module, lowers it through naga's
//! SPIR-V frontend, validates it, and hands it to one of naga's writers.

pub mod glsl;
pub mod hlsl;
pub mod msl;

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};
use spirv::ExecutionModel;
use std::fmt;

use crate::error::Result;

const SOURCE: &str = "shader_cross::backend";

/// Target language a compiler was created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Reflection only; compiling fails
    Base,
    Glsl,
    Hlsl,
    Msl,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Base => write!(f, "base"),
            Backend::Glsl => write!(f, "GLSL"),
            Backend::Hlsl => write!(f, "HLSL"),
            Backend::Msl => write!(f, "MSL"),
        }
    }
}

/// Vertex stage clip-space handling shared by all backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexOptions {
    /// Remap depth from [0, w] to [-w, w]
    pub fixup_clipspace: bool,
    /// Negate the Y component of the output position
    pub flip_vert_y: bool,
}

/// Generated source plus the name each entry point received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub source: String,
    /// (declared name, execution model, emitted name)
    pub entry_point_names: Vec<(String, ExecutionModel, String)>,
}

/// A validated naga module
pub(crate) struct Lowered {
    pub module: naga::Module,
    pub info: ModuleInfo,
}

/// Parse `words` with naga and validate the result
///
/// `flip_vertex_y` makes the frontend negate the Y of vertex position outputs.
pub(crate) fn lower(words: &[u32], flip_vertex_y: bool) -> Result<Lowered> {
    let options = naga::front::spv::Options {
        adjust_coordinate_space: flip_vertex_y,
        ..Default::default()
    };
    let module = naga::front::spv::parse_u8_slice(bytemuck::cast_slice(words), &options)
        .map_err(|error| crate::cross_err!(SOURCE, Codegen, "SPIR-V frontend rejected the module: {}", error))?;

    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|error| crate::cross_err!(SOURCE, Codegen, "Module failed validation: {}", error))?;

    crate::cross_trace!(
        SOURCE,
        "Lowered module: {} entry points, {} globals",
        module.entry_points.len(),
        module.global_variables.len()
    );
    Ok(Lowered { module, info })
}

pub(crate) fn naga_stage(model: ExecutionModel) -> Result<naga::ShaderStage> {
    match model {
        ExecutionModel::Vertex => Ok(naga::ShaderStage::Vertex),
        ExecutionModel::Fragment => Ok(naga::ShaderStage::Fragment),
        ExecutionModel::GLCompute => Ok(naga::ShaderStage::Compute),
        other => crate::cross_bail!(SOURCE, Unsupported, "Execution model {:?} has no code generator", other),
    }
}

pub(crate) fn execution_model(stage: naga::ShaderStage) -> ExecutionModel {
    match stage {
        naga::ShaderStage::Vertex => ExecutionModel::Vertex,
        naga::ShaderStage::Fragment => ExecutionModel::Fragment,
        naga::ShaderStage::Compute => ExecutionModel::GLCompute,
    }
}

/// Pair naga's entry points with the names a writer reported for them
pub(crate) fn collect_entry_point_names<E: fmt::Display>(
    module: &naga::Module,
    names: Vec<std::result::Result<String, E>>,
) -> Result<Vec<(String, ExecutionModel, String)>> {
    module
        .entry_points
        .iter()
        .zip(names)
        .map(|(entry, emitted)| match emitted {
            Ok(emitted) => Ok((entry.name.clone(), execution_model(entry.stage), emitted)),
            Err(error) => crate::cross_bail!(
                SOURCE,
                Codegen,
                "Entry point {} could not be written: {}",
                entry.name,
                error
            ),
        })
        .collect()
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
