//! HLSL output

use naga::back::hlsl::{self, ShaderModel};
use spirv::{BuiltIn, Decoration, ExecutionModel, StorageClass};

use super::{Emitted, VertexOptions};
use crate::error::Result;
use crate::ir::ParsedModule;
use crate::reflect;

const SOURCE: &str = "shader_cross::backend::hlsl";

/// A byte range of the push constant block mapped to a root constant buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootConstants {
    pub start: u32,
    pub end: u32,
    pub binding: u32,
    pub space: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlslOptions {
    /// Shader model as `major * 10 + minor`
    pub shader_model: u32,
    pub vertex: VertexOptions,
    /// Accept vertex shaders writing `PointSize` (the write is dropped)
    pub point_size_compat: bool,
    /// Accept fragment shaders reading `PointCoord`
    pub point_coord_compat: bool,
    pub root_constants: Vec<RootConstants>,
    /// Derive registers from bindings when no explicit mapping exists
    pub fake_missing_bindings: bool,
    pub zero_initialize_workgroup_memory: bool,
}

impl Default for HlslOptions {
    fn default() -> Self {
        Self {
            shader_model: 50,
            vertex: VertexOptions::default(),
            point_size_compat: false,
            point_coord_compat: false,
            root_constants: Vec::new(),
            fake_missing_bindings: true,
            zero_initialize_workgroup_memory: true,
        }
    }
}

impl HlslOptions {
    /// Reject values no compile could accept
    pub fn validate(&self) -> Result<()> {
        naga_shader_model(self.shader_model)?;
        for range in &self.root_constants {
            if range.start > range.end {
                crate::cross_bail!(
                    SOURCE,
                    InvalidArgument,
                    "Root constant range {}..{} ends before it starts",
                    range.start,
                    range.end
                );
            }
            if u8::try_from(range.space).is_err() {
                crate::cross_bail!(SOURCE, InvalidArgument, "Register space {} is out of range", range.space);
            }
        }
        Ok(())
    }
}

fn naga_shader_model(raw: u32) -> Result<ShaderModel> {
    match raw {
        50 => Ok(ShaderModel::V5_0),
        51 => Ok(ShaderModel::V5_1),
        60 => Ok(ShaderModel::V6_0),
        other if other < 50 => crate::cross_bail!(
            SOURCE,
            Unsupported,
            "HLSL shader model {}.{} is not supported, the minimum is 5.0",
            other / 10,
            other % 10
        ),
        other => crate::cross_bail!(SOURCE, Unsupported, "Unknown HLSL shader model {}", other),
    }
}

fn has_stage(module: &ParsedModule, model: ExecutionModel) -> bool {
    module.entry_points().iter().any(|entry| entry.model == model)
}

/// Every push constant member must fall into one of the root constant ranges
fn check_root_constant_coverage(module: &ParsedModule, ranges: &[RootConstants]) -> Result<()> {
    if ranges.is_empty() {
        return Ok(());
    }
    let annotations = module.annotations();
    for variable in module
        .variables()
        .iter()
        .filter(|variable| variable.storage == StorageClass::PushConstant)
    {
        let Some(block) = module
            .try_type(variable.type_id)
            .and_then(|pointer| module.try_type(pointer.self_id))
        else {
            continue;
        };
        for member in 0..block.member_types.len() as u32 {
            let offset = annotations.member_decoration(block.id, member, Decoration::Offset);
            if !ranges.iter().any(|range| offset >= range.start && offset < range.end) {
                crate::cross_bail!(
                    SOURCE,
                    Unsupported,
                    "Push constant member {} at offset {} is not covered by any root constant range",
                    member,
                    offset
                );
            }
        }
    }
    Ok(())
}

/// Register b0 of the first space no descriptor set occupies
fn default_push_constants_target(module: &ParsedModule) -> Option<hlsl::BindTarget> {
    let variables = module.variables();
    if !variables.iter().any(|variable| variable.storage == StorageClass::PushConstant) {
        return None;
    }
    let annotations = module.annotations();
    let space = variables
        .iter()
        .filter(|variable| annotations.has_decoration(variable.id, Decoration::Binding))
        .map(|variable| annotations.decoration(variable.id, Decoration::DescriptorSet) + 1)
        .max()
        .unwrap_or(0);
    Some(hlsl::BindTarget {
        space: u8::try_from(space).unwrap_or(u8::MAX),
        register: 0,
        binding_array_size: None,
    })
}

/// Write every entry point of `module` as HLSL
pub(crate) fn compile(module: &mut ParsedModule, options: &HlslOptions) -> Result<Emitted> {
    let shader_model = naga_shader_model(options.shader_model)?;

    if has_stage(module, ExecutionModel::Vertex)
        && reflect::writes_builtin(module, BuiltIn::PointSize)
        && !options.point_size_compat
    {
        crate::cross_bail!(SOURCE, Unsupported, "Sizing points (PointSize) is not supported in HLSL.");
    }
    if has_stage(module, ExecutionModel::Fragment)
        && reflect::reads_builtin(module, BuiltIn::PointCoord)
        && !options.point_coord_compat
    {
        crate::cross_bail!(SOURCE, Unsupported, "Point coordinates (PointCoord) are not supported in HLSL.");
    }
    check_root_constant_coverage(module, &options.root_constants)?;
    if options.vertex.fixup_clipspace {
        crate::cross_warn!(SOURCE, "fixup_clipspace is ignored, HLSL clip space already spans [0, w]");
    }

    let push_constants_target = match options.root_constants.first() {
        Some(range) => {
            let Ok(space) = u8::try_from(range.space) else {
                crate::cross_bail!(SOURCE, InvalidArgument, "Register space {} is out of range", range.space);
            };
            Some(hlsl::BindTarget { space, register: range.binding, binding_array_size: None })
        }
        None => default_push_constants_target(module),
    };

    let lowered = super::lower(&module.assemble(), options.vertex.flip_vert_y)?;
    let naga_options = hlsl::Options {
        shader_model,
        push_constants_target,
        fake_missing_bindings: options.fake_missing_bindings,
        zero_initialize_workgroup_memory: options.zero_initialize_workgroup_memory,
        ..Default::default()
    };

    let mut source = String::new();
    let reflection = {
        let mut writer = hlsl::Writer::new(&mut source, &naga_options);
        writer
            .write(&lowered.module, &lowered.info)
            .map_err(|error| crate::cross_err!(SOURCE, Codegen, "HLSL generation failed: {}", error))?
    };
    let entry_point_names = super::collect_entry_point_names(&lowered.module, reflection.entry_point_names)?;

    crate::cross_debug!(SOURCE, "Generated {} bytes of HLSL", source.len());
    Ok(Emitted { source, entry_point_names })
}
