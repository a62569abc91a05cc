//! MSL-only boundary calls

use std::os::raw::c_char;

use shader_cross::{MslPlatform, MslResourceBinding, MslVertexAttribute, MslVertexFormat, Result};

use super::alloc::alloc_string;
use super::compiler::{execution_model_from_raw, in_ref, in_slice_mut, require_out, write_out};
use super::error::guard;
use super::registry;
use super::types::{
    ScInternalCompilerHandle, ScInternalResult, ScMslCompilerOptions, ScMslResourceBinding, ScMslVertexAttribute,
};

const SOURCE: &str = "shader_cross_bridge::ffi::msl";

fn vertex_attribute(flat: &ScMslVertexAttribute) -> Result<MslVertexAttribute> {
    let Some(format) = MslVertexFormat::from_raw(flat.format) else {
        shader_cross::cross_bail!(SOURCE, InvalidArgument, "{} is not an MSL vertex format", flat.format);
    };
    Ok(MslVertexAttribute {
        location: flat.location,
        msl_buffer: flat.msl_buffer,
        msl_offset: flat.msl_offset,
        msl_stride: flat.msl_stride,
        per_instance: flat.per_instance,
        format,
        used_by_shader: flat.used_by_shader,
    })
}

fn resource_binding(flat: &ScMslResourceBinding) -> Result<MslResourceBinding> {
    Ok(MslResourceBinding {
        stage: execution_model_from_raw(flat.stage)?,
        desc_set: flat.desc_set,
        binding: flat.binding,
        msl_buffer: flat.msl_buffer,
        msl_texture: flat.msl_texture,
        msl_sampler: flat.msl_sampler,
        used_by_shader: flat.used_by_shader,
    })
}

/// Merge the flat options into the compiler's current MSL options
#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_msl_set_options(
    compiler: ScInternalCompilerHandle,
    options: *const ScMslCompilerOptions,
) -> ScInternalResult {
    guard(|| {
        let flat = *unsafe { in_ref(options, "options") }?;
        let Some(platform) = MslPlatform::from_raw(flat.platform) else {
            shader_cross::cross_bail!(SOURCE, InvalidArgument, "{} is not an MSL platform", flat.platform);
        };
        registry::with_compiler(compiler, |compiler| {
            let mut merged = compiler.msl_options()?.clone();
            merged.platform = platform;
            merged.version = flat.version;
            merged.vertex.flip_vert_y = flat.vertex_invert_y;
            merged.vertex.fixup_clipspace = flat.vertex_transform_clip_space;
            merged.enable_point_size_builtin = flat.enable_point_size_builtin;
            merged.disable_rasterization = flat.disable_rasterization;
            compiler.set_msl_options(merged)
        })
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_msl_get_options(
    compiler: ScInternalCompilerHandle,
    options: *mut ScMslCompilerOptions,
) -> ScInternalResult {
    guard(|| {
        let current = registry::with_compiler(compiler, |compiler| compiler.msl_options().cloned())?;
        let flat = ScMslCompilerOptions {
            vertex_invert_y: current.vertex.flip_vert_y,
            vertex_transform_clip_space: current.vertex.fixup_clipspace,
            platform: current.platform as u8,
            version: current.version,
            enable_point_size_builtin: current.enable_point_size_builtin,
            disable_rasterization: current.disable_rasterization,
        };
        unsafe { write_out(options, flat, "options") }
    })
}

/// Compile with vertex attribute and resource binding overrides
///
/// Both arrays stay owned by the caller; only their `used_by_shader` fields
/// are written.
#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_msl_compile(
    compiler: ScInternalCompilerHandle,
    shader: *mut *const c_char,
    vertex_attributes: *mut ScMslVertexAttribute,
    vertex_attributes_size: usize,
    resource_bindings: *mut ScMslResourceBinding,
    resource_bindings_size: usize,
) -> ScInternalResult {
    guard(|| {
        require_out(shader, "shader")?;
        let flat_attributes = unsafe { in_slice_mut(vertex_attributes, vertex_attributes_size, "vertex_attributes") }?;
        let flat_bindings = unsafe { in_slice_mut(resource_bindings, resource_bindings_size, "resource_bindings") }?;
        let mut attributes = flat_attributes
            .iter()
            .map(vertex_attribute)
            .collect::<Result<Vec<_>>>()?;
        let mut bindings = flat_bindings
            .iter()
            .map(resource_binding)
            .collect::<Result<Vec<_>>>()?;

        let source = registry::with_compiler(compiler, |compiler| {
            compiler.msl_options()?;
            compiler.compile_msl(&mut attributes, &mut bindings)
        })?;

        for (flat, attribute) in flat_attributes.iter_mut().zip(&attributes) {
            flat.used_by_shader = attribute.used_by_shader;
        }
        for (flat, binding) in flat_bindings.iter_mut().zip(&bindings) {
            flat.used_by_shader = binding.used_by_shader;
        }
        let source = alloc_string(&source)?;
        unsafe { write_out(shader, source as *const c_char, "shader") }
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_msl_get_is_rasterization_disabled(
    compiler: ScInternalCompilerHandle,
    is_rasterization_disabled: *mut bool,
) -> ScInternalResult {
    guard(|| {
        let enabled = registry::with_compiler(compiler, |compiler| compiler.is_rasterization_enabled())?;
        unsafe { write_out(is_rasterization_disabled, !enabled, "is_rasterization_disabled") }
    })
}
