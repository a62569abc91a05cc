//! Metal Shading Language output

use naga::back::msl;
use spirv::{BuiltIn, Decoration, ExecutionModel, StorageClass};

use super::{Emitted, VertexOptions};
use crate::error::Result;
use crate::ir::ParsedModule;
use crate::reflect;

const SOURCE: &str = "shader_cross::backend::msl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MslPlatform {
    Ios = 0,
    MacOs = 1,
}

impl MslPlatform {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(MslPlatform::Ios),
            1 => Some(MslPlatform::MacOs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MslOptions {
    pub platform: MslPlatform,
    /// Language version as `major * 10000 + minor * 100 + patch`
    pub version: u32,
    pub vertex: VertexOptions,
    /// Emit `[[point_size]]` when the vertex stage writes PointSize
    pub enable_point_size_builtin: bool,
    /// Treat vertex stages as having no rasterized output
    pub disable_rasterization: bool,
    pub fake_missing_bindings: bool,
    pub zero_initialize_workgroup_memory: bool,
}

impl Default for MslOptions {
    fn default() -> Self {
        Self {
            platform: MslPlatform::MacOs,
            version: 10200,
            vertex: VertexOptions::default(),
            enable_point_size_builtin: true,
            disable_rasterization: false,
            fake_missing_bindings: true,
            zero_initialize_workgroup_memory: true,
        }
    }
}

impl MslOptions {
    fn lang_version(&self) -> Result<(u8, u8)> {
        let major = u8::try_from(self.version / 10000);
        let minor = u8::try_from((self.version / 100) % 100);
        match (major, minor) {
            (Ok(major), Ok(minor)) => Ok((major, minor)),
            _ => crate::cross_bail!(SOURCE, InvalidArgument, "MSL version {} is out of range", self.version),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u32)]
pub enum MslVertexFormat {
    #[default]
    Other = 0,
    UInt8 = 1,
    UInt16 = 2,
}

impl MslVertexFormat {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(MslVertexFormat::Other),
            1 => Some(MslVertexFormat::UInt8),
            2 => Some(MslVertexFormat::UInt16),
            _ => None,
        }
    }
}

/// Where a vertex input lives in Metal's vertex buffers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MslVertexAttribute {
    pub location: u32,
    pub msl_buffer: u32,
    pub msl_offset: u32,
    pub msl_stride: u32,
    pub per_instance: bool,
    pub format: MslVertexFormat,
    /// Written back by compile
    pub used_by_shader: bool,
}

/// Metal argument slots for one Vulkan-style (set, binding) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MslResourceBinding {
    pub stage: ExecutionModel,
    pub desc_set: u32,
    pub binding: u32,
    pub msl_buffer: u32,
    pub msl_texture: u32,
    pub msl_sampler: u32,
    /// Written back by compile
    pub used_by_shader: bool,
}

fn slot(index: u32) -> Result<u8> {
    match u8::try_from(index) {
        Ok(slot) => Ok(slot),
        Err(_) => crate::cross_bail!(SOURCE, InvalidArgument, "Metal argument index {} is out of range", index),
    }
}

fn has_stage(module: &ParsedModule, model: ExecutionModel) -> bool {
    module.entry_points().iter().any(|entry| entry.model == model)
}

/// Whether a vertex stage produces anything to rasterize
pub(crate) fn rasterization_enabled(module: &ParsedModule, options: &MslOptions) -> bool {
    if options.disable_rasterization {
        return false;
    }
    if !has_stage(module, ExecutionModel::Vertex) {
        return true;
    }
    reflect::writes_builtin(module, BuiltIn::Position) || !reflect::shader_resources(module).stage_outputs.is_empty()
}

fn mark_used_attributes(module: &ParsedModule, attributes: &mut [MslVertexAttribute]) {
    let has_vertex = has_stage(module, ExecutionModel::Vertex);
    let annotations = module.annotations();
    let inputs = reflect::shader_resources(module).stage_inputs;
    for attribute in attributes.iter_mut() {
        attribute.used_by_shader = has_vertex
            && inputs.iter().any(|input| {
                annotations.has_decoration(input.id, Decoration::Location)
                    && annotations.decoration(input.id, Decoration::Location) == attribute.location
            });
    }
}

fn mark_used_bindings(module: &ParsedModule, bindings: &mut [MslResourceBinding]) {
    let annotations = module.annotations();
    for binding in bindings.iter_mut() {
        binding.used_by_shader = has_stage(module, binding.stage)
            && module.variables().iter().any(|variable| {
                variable.storage != StorageClass::Input
                    && variable.storage != StorageClass::Output
                    && annotations.has_decoration(variable.id, Decoration::Binding)
                    && annotations.decoration(variable.id, Decoration::Binding) == binding.binding
                    && annotations.decoration(variable.id, Decoration::DescriptorSet) == binding.desc_set
            });
    }
}

fn entry_point_resources(
    stage: ExecutionModel,
    bindings: &[MslResourceBinding],
) -> Result<msl::EntryPointResources> {
    let mut resources = msl::EntryPointResources::default();
    for binding in bindings.iter().filter(|binding| binding.stage == stage) {
        let target = msl::BindTarget {
            buffer: Some(slot(binding.msl_buffer)?),
            texture: Some(slot(binding.msl_texture)?),
            sampler: Some(msl::BindSamplerTarget::Resource(slot(binding.msl_sampler)?)),
            ..Default::default()
        };
        resources.resources.insert(
            naga::ResourceBinding { group: binding.desc_set, binding: binding.binding },
            target,
        );
    }
    Ok(resources)
}

/// Write every entry point of `module` as MSL
///
/// `used_by_shader` of every attribute and binding is updated in place.
pub(crate) fn compile(
    module: &mut ParsedModule,
    options: &MslOptions,
    vertex_attributes: &mut [MslVertexAttribute],
    resource_bindings: &mut [MslResourceBinding],
) -> Result<Emitted> {
    let lang_version = options.lang_version()?;
    if options.vertex.fixup_clipspace {
        crate::cross_warn!(SOURCE, "fixup_clipspace is ignored, Metal clip space already spans [0, w]");
    }
    if options.platform == MslPlatform::Ios {
        crate::cross_debug!(SOURCE, "Targeting iOS with MSL {}.{}", lang_version.0, lang_version.1);
    }

    mark_used_attributes(module, vertex_attributes);
    mark_used_bindings(module, resource_bindings);
    let point_size = options.enable_point_size_builtin
        && has_stage(module, ExecutionModel::Vertex)
        && reflect::writes_builtin(module, BuiltIn::PointSize);

    let lowered = super::lower(&module.assemble(), options.vertex.flip_vert_y)?;

    let mut per_entry_point_map = msl::EntryPointResourceMap::default();
    for entry in &lowered.module.entry_points {
        let resources = entry_point_resources(super::execution_model(entry.stage), resource_bindings)?;
        per_entry_point_map.insert(entry.name.clone(), resources);
    }

    let naga_options = msl::Options {
        lang_version,
        per_entry_point_map,
        fake_missing_bindings: options.fake_missing_bindings,
        zero_initialize_workgroup_memory: options.zero_initialize_workgroup_memory,
        ..Default::default()
    };
    let pipeline = msl::PipelineOptions {
        allow_and_force_point_size: point_size,
        ..Default::default()
    };

    let (source, translation) = msl::write_string(&lowered.module, &lowered.info, &naga_options, &pipeline)
        .map_err(|error| crate::cross_err!(SOURCE, Codegen, "MSL generation failed: {}", error))?;
    let entry_point_names = super::collect_entry_point_names(&lowered.module, translation.entry_point_names)?;

    crate::cross_debug!(
        SOURCE,
        "Generated {} bytes of MSL, {} of {} vertex attributes used",
        source.len(),
        vertex_attributes.iter().filter(|attribute| attribute.used_by_shader).count(),
        vertex_attributes.len()
    );
    Ok(Emitted { source, entry_point_names })
}
