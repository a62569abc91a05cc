//! GLSL-only boundary calls

use std::os::raw::c_char;

use super::compiler::{execution_model_from_raw, in_ref, in_str, write_out};
use super::error::guard;
use super::registry;
use super::types::{ScGlslCompilerOptions, ScInternalCompilerHandle, ScInternalResult};

/// Merge the flat options into the compiler's current GLSL options
#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_glsl_set_options(
    compiler: ScInternalCompilerHandle,
    options: *const ScGlslCompilerOptions,
) -> ScInternalResult {
    guard(|| {
        let flat = *unsafe { in_ref(options, "options") }?;
        registry::with_compiler(compiler, |compiler| {
            let mut merged = compiler.glsl_options()?.clone();
            merged.version = flat.version;
            merged.es = flat.es;
            merged.vertex.flip_vert_y = flat.vertex_invert_y;
            merged.vertex.fixup_clipspace = flat.vertex_transform_clip_space;
            merged.support_nonzero_base_instance = flat.vertex_support_nonzero_base_instance;
            merged.force_zero_initialized_variables = flat.force_zero_initialized_variables;
            compiler.set_glsl_options(merged)
        })
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_glsl_get_options(
    compiler: ScInternalCompilerHandle,
    options: *mut ScGlslCompilerOptions,
) -> ScInternalResult {
    guard(|| {
        let current = registry::with_compiler(compiler, |compiler| compiler.glsl_options().cloned())?;
        let flat = ScGlslCompilerOptions {
            vertex_invert_y: current.vertex.flip_vert_y,
            vertex_transform_clip_space: current.vertex.fixup_clipspace,
            version: current.version,
            es: current.es,
            vertex_support_nonzero_base_instance: current.support_nonzero_base_instance,
            force_zero_initialized_variables: current.force_zero_initialized_variables,
        };
        unsafe { write_out(options, flat, "options") }
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_glsl_add_header_line(
    compiler: ScInternalCompilerHandle,
    line: *const c_char,
) -> ScInternalResult {
    guard(|| {
        let line = unsafe { in_str(line, "line") }?;
        registry::with_compiler(compiler, |compiler| compiler.add_header_line(line))
    })
}

/// Choose which entry point the next compile emits
#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_glsl_set_entry_point(
    compiler: ScInternalCompilerHandle,
    entry_point_name: *const c_char,
    execution_model: u32,
) -> ScInternalResult {
    guard(|| {
        let name = unsafe { in_str(entry_point_name, "entry_point_name") }?;
        let model = execution_model_from_raw(execution_model)?;
        registry::with_compiler(compiler, |compiler| compiler.set_entry_point(name, model))
    })
}
