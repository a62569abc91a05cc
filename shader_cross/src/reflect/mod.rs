//! Reflection over a parsed module
//!
//! Free functions over [`ParsedModule`]: entry points, the eleven resource
//! categories, specialization constants, combined image samplers, active
//! buffer ranges and built-in usage.

mod constants;
mod resources;
mod usage;

pub use constants::{specialization_constants, work_group_size_specialization_constants};
pub use resources::{rename_interface_variable, shader_resources};
pub use usage::{active_buffer_ranges, build_combined_image_samplers, reads_builtin, writes_builtin};

use spirv::{ExecutionModel, Word};

use crate::ir::ParsedModule;

/// Compute workgroup size; all zero for non-compute stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkGroupSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub execution_model: ExecutionModel,
    pub work_group_size: WorkGroupSize,
}

/// One reflected resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Variable id
    pub id: Word,
    /// Pointer type of the variable
    pub type_id: Word,
    /// Type with pointer and array wrappers stripped
    pub base_type_id: Word,
    pub name: String,
}

/// Resources partitioned into fixed categories, each in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderResources {
    pub uniform_buffers: Vec<Resource>,
    pub storage_buffers: Vec<Resource>,
    pub stage_inputs: Vec<Resource>,
    pub stage_outputs: Vec<Resource>,
    pub subpass_inputs: Vec<Resource>,
    pub storage_images: Vec<Resource>,
    pub sampled_images: Vec<Resource>,
    pub atomic_counters: Vec<Resource>,
    pub push_constant_buffers: Vec<Resource>,
    pub separate_images: Vec<Resource>,
    pub separate_samplers: Vec<Resource>,
}

/// `id == 0` means "not a specialization constant"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecializationConstant {
    pub id: Word,
    pub constant_id: u32,
}

/// A separate image/sampler pair used together through OpSampledImage
///
/// Laid out for direct exposure across the flat boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct CombinedImageSampler {
    /// Fresh id standing for the combined resource
    pub combined_id: Word,
    pub image_id: Word,
    pub sampler_id: Word,
}

/// A statically accessed member of a buffer block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRange {
    pub index: u32,
    pub offset: usize,
    pub range: usize,
}

/// Entry points in declaration order
pub fn entry_points(module: &ParsedModule) -> Vec<EntryPoint> {
    module
        .entry_points()
        .iter()
        .map(|entry| EntryPoint {
            name: entry.name.clone(),
            execution_model: entry.model,
            work_group_size: WorkGroupSize {
                x: entry.workgroup_size[0],
                y: entry.workgroup_size[1],
                z: entry.workgroup_size[2],
            },
        })
        .collect()
}

#[cfg(test)]
#[path = "reflect_tests.rs"]
mod tests;
