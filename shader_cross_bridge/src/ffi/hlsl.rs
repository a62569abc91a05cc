//! HLSL-only boundary calls

use shader_cross::RootConstants;

use super::alloc::alloc_slice;
use super::compiler::{in_ref, in_slice, require_out, write_out};
use super::error::guard;
use super::registry;
use super::types::{ScHlslCompilerOptions, ScHlslRootConstant, ScInternalCompilerHandle, ScInternalResult};

const SOURCE: &str = "shader_cross_bridge::ffi::hlsl";

/// Merge the flat options into the compiler's current HLSL options
///
/// The root constant ranges are copied; the caller keeps its array.
#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_hlsl_set_options(
    compiler: ScInternalCompilerHandle,
    options: *const ScHlslCompilerOptions,
) -> ScInternalResult {
    guard(|| {
        let flat = unsafe { in_ref(options, "options") }?;
        let Ok(shader_model) = u32::try_from(flat.shader_model) else {
            shader_cross::cross_bail!(SOURCE, InvalidArgument, "Shader model {} is negative", flat.shader_model);
        };
        let ranges = unsafe { in_slice(flat.root_constants, flat.root_constants_size, "root_constants") }?;
        let root_constants: Vec<RootConstants> = ranges
            .iter()
            .map(|range| RootConstants {
                start: range.start,
                end: range.end,
                binding: range.binding,
                space: range.space,
            })
            .collect();

        registry::with_compiler(compiler, |compiler| {
            let mut merged = compiler.hlsl_options()?.clone();
            merged.shader_model = shader_model;
            merged.vertex.flip_vert_y = flat.vertex_invert_y;
            merged.vertex.fixup_clipspace = flat.vertex_transform_clip_space;
            merged.point_size_compat = flat.point_size_compat;
            merged.point_coord_compat = flat.point_coord_compat;
            merged.root_constants = root_constants;
            compiler.set_hlsl_options(merged)
        })
    })
}

/// `root_constants` of the result is caller-owned (NULL when empty)
#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_hlsl_get_options(
    compiler: ScInternalCompilerHandle,
    options: *mut ScHlslCompilerOptions,
) -> ScInternalResult {
    guard(|| {
        require_out(options, "options")?;
        let current = registry::with_compiler(compiler, |compiler| compiler.hlsl_options().cloned())?;
        let ranges: Vec<ScHlslRootConstant> = current
            .root_constants
            .iter()
            .map(|range| ScHlslRootConstant {
                start: range.start,
                end: range.end,
                binding: range.binding,
                space: range.space,
            })
            .collect();
        let flat = ScHlslCompilerOptions {
            shader_model: current.shader_model as i32,
            vertex_invert_y: current.vertex.flip_vert_y,
            vertex_transform_clip_space: current.vertex.fixup_clipspace,
            point_size_compat: current.point_size_compat,
            point_coord_compat: current.point_coord_compat,
            root_constants: alloc_slice(&ranges)?,
            root_constants_size: ranges.len(),
        };
        unsafe { write_out(options, flat, "options") }
    })
}
