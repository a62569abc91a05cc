//! Boundary calls shared by every backend tag

use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;

use shader_cross::spirv::{Decoration, ExecutionModel};
use shader_cross::{Backend, Compiler, Resource, Result};

use super::alloc::{alloc_slice, alloc_string, Pending};
use super::error::guard;
use super::registry;
use super::types::*;

const SOURCE: &str = "shader_cross_bridge::ffi";

// ===== ARGUMENT HELPERS =====

pub(super) fn require_out<T>(pointer: *mut T, what: &str) -> Result<()> {
    if pointer.is_null() {
        shader_cross::cross_bail!(SOURCE, InvalidArgument, "Out pointer `{}` is NULL", what);
    }
    Ok(())
}

/// Store `value` through a caller-supplied out pointer
pub(super) unsafe fn write_out<T>(pointer: *mut T, value: T, what: &str) -> Result<()> {
    if pointer.is_null() {
        shader_cross::cross_bail!(SOURCE, InvalidArgument, "Out pointer `{}` is NULL", what);
    }
    // SAFETY: non-NULL; validity for writes is the caller's contract
    unsafe { pointer.write(value) };
    Ok(())
}

pub(super) unsafe fn in_ref<'a, T>(pointer: *const T, what: &str) -> Result<&'a T> {
    // SAFETY: NULL is handled by `as_ref`; validity is the caller's contract
    match unsafe { pointer.as_ref() } {
        Some(value) => Ok(value),
        None => shader_cross::cross_bail!(SOURCE, InvalidArgument, "Argument `{}` is NULL", what),
    }
}

/// `(pointer, count)` input array; NULL is accepted only with a count of 0
pub(super) unsafe fn in_slice<'a, T>(pointer: *const T, len: usize, what: &str) -> Result<&'a [T]> {
    if len == 0 {
        return Ok(&[]);
    }
    if pointer.is_null() {
        shader_cross::cross_bail!(SOURCE, InvalidArgument, "Array `{}` is NULL but has {} elements", what, len);
    }
    // SAFETY: non-NULL; the caller guarantees `len` readable elements
    Ok(unsafe { std::slice::from_raw_parts(pointer, len) })
}

pub(super) unsafe fn in_slice_mut<'a, T>(pointer: *mut T, len: usize, what: &str) -> Result<&'a mut [T]> {
    if len == 0 {
        return Ok(&mut []);
    }
    if pointer.is_null() {
        shader_cross::cross_bail!(SOURCE, InvalidArgument, "Array `{}` is NULL but has {} elements", what, len);
    }
    // SAFETY: non-NULL; the caller guarantees `len` writable elements
    Ok(unsafe { std::slice::from_raw_parts_mut(pointer, len) })
}

pub(super) unsafe fn in_str<'a>(pointer: *const c_char, what: &str) -> Result<&'a str> {
    if pointer.is_null() {
        shader_cross::cross_bail!(SOURCE, InvalidArgument, "String `{}` is NULL", what);
    }
    // SAFETY: non-NULL; the caller guarantees a NUL-terminated string
    let text = unsafe { CStr::from_ptr(pointer) };
    text.to_str()
        .map_err(|_| shader_cross::cross_err!(SOURCE, InvalidArgument, "String `{}` is not valid UTF-8", what))
}

pub(super) fn decoration_from_raw(raw: u32) -> Result<Decoration> {
    match Decoration::from_u32(raw) {
        Some(decoration) => Ok(decoration),
        None => shader_cross::cross_bail!(SOURCE, InvalidArgument, "{} is not a SPIR-V decoration", raw),
    }
}

pub(super) fn execution_model_from_raw(raw: u32) -> Result<ExecutionModel> {
    match ExecutionModel::from_u32(raw) {
        Some(model) => Ok(model),
        None => shader_cross::cross_bail!(SOURCE, InvalidArgument, "{} is not a SPIR-V execution model", raw),
    }
}

// ===== FLATTENING =====

fn flatten_resources(pending: &mut Pending, resources: &[Resource]) -> Result<ScResourceArray> {
    let flat = resources
        .iter()
        .map(|resource| {
            Ok(ScResource {
                id: resource.id,
                type_id: resource.type_id,
                base_type_id: resource.base_type_id,
                name: pending.string(&resource.name)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ScResourceArray {
        data: pending.slice(&flat)?,
        num: flat.len(),
    })
}

// ===== LIFECYCLE =====

unsafe fn new_compiler(
    backend: Backend,
    compiler: *mut ScInternalCompilerHandle,
    ir: *const u32,
    size: usize,
) -> ScInternalResult {
    guard(|| {
        // SAFETY: forwarded caller contract
        let words = unsafe { in_slice(ir, size, "ir") }?;
        let handle = registry::insert(Compiler::new(words, backend)?)?;
        // SAFETY: forwarded caller contract
        if let Err(error) = unsafe { write_out(compiler, handle, "compiler") } {
            registry::remove(handle)?;
            return Err(error);
        }
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_base_new(
    compiler: *mut ScInternalCompilerHandle,
    ir: *const u32,
    size: usize,
) -> ScInternalResult {
    unsafe { new_compiler(Backend::Base, compiler, ir, size) }
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_glsl_new(
    compiler: *mut ScInternalCompilerHandle,
    ir: *const u32,
    size: usize,
) -> ScInternalResult {
    unsafe { new_compiler(Backend::Glsl, compiler, ir, size) }
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_hlsl_new(
    compiler: *mut ScInternalCompilerHandle,
    ir: *const u32,
    size: usize,
) -> ScInternalResult {
    unsafe { new_compiler(Backend::Hlsl, compiler, ir, size) }
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_msl_new(
    compiler: *mut ScInternalCompilerHandle,
    ir: *const u32,
    size: usize,
) -> ScInternalResult {
    unsafe { new_compiler(Backend::Msl, compiler, ir, size) }
}

#[no_mangle]
pub extern "C" fn sc_internal_compiler_delete(compiler: ScInternalCompilerHandle) -> ScInternalResult {
    guard(|| registry::remove(compiler))
}

// ===== DECORATIONS & NAMES =====

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_decoration(
    compiler: ScInternalCompilerHandle,
    result: *mut u32,
    id: u32,
    decoration: u32,
) -> ScInternalResult {
    guard(|| {
        let decoration = decoration_from_raw(decoration)?;
        let value = registry::with_compiler(compiler, |compiler| Ok(compiler.decoration(id, decoration)))?;
        unsafe { write_out(result, value, "result") }
    })
}

#[no_mangle]
pub extern "C" fn sc_internal_compiler_set_decoration(
    compiler: ScInternalCompilerHandle,
    id: u32,
    decoration: u32,
    argument: u32,
) -> ScInternalResult {
    guard(|| {
        let decoration = decoration_from_raw(decoration)?;
        registry::with_compiler(compiler, |compiler| compiler.set_decoration(id, decoration, argument))
    })
}

#[no_mangle]
pub extern "C" fn sc_internal_compiler_unset_decoration(
    compiler: ScInternalCompilerHandle,
    id: u32,
    decoration: u32,
) -> ScInternalResult {
    guard(|| {
        let decoration = decoration_from_raw(decoration)?;
        registry::with_compiler(compiler, |compiler| {
            compiler.unset_decoration(id, decoration);
            Ok(())
        })
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_name(
    compiler: ScInternalCompilerHandle,
    id: u32,
    name: *mut *const c_char,
) -> ScInternalResult {
    guard(|| {
        require_out(name, "name")?;
        let value = registry::with_compiler(compiler, |compiler| Ok(compiler.name(id)))?;
        let value = alloc_string(&value)?;
        unsafe { write_out(name, value as *const c_char, "name") }
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_set_name(
    compiler: ScInternalCompilerHandle,
    id: u32,
    name: *const c_char,
) -> ScInternalResult {
    guard(|| {
        let name = unsafe { in_str(name, "name") }?;
        registry::with_compiler(compiler, |compiler| {
            compiler.set_name(id, name);
            Ok(())
        })
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_member_name(
    compiler: ScInternalCompilerHandle,
    id: u32,
    index: u32,
    name: *mut *const c_char,
) -> ScInternalResult {
    guard(|| {
        require_out(name, "name")?;
        let value = registry::with_compiler(compiler, |compiler| Ok(compiler.member_name(id, index)))?;
        let value = alloc_string(&value)?;
        unsafe { write_out(name, value as *const c_char, "name") }
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_member_decoration(
    compiler: ScInternalCompilerHandle,
    id: u32,
    index: u32,
    decoration: u32,
    result: *mut u32,
) -> ScInternalResult {
    guard(|| {
        let decoration = decoration_from_raw(decoration)?;
        let value =
            registry::with_compiler(compiler, |compiler| Ok(compiler.member_decoration(id, index, decoration)))?;
        unsafe { write_out(result, value, "result") }
    })
}

#[no_mangle]
pub extern "C" fn sc_internal_compiler_set_member_decoration(
    compiler: ScInternalCompilerHandle,
    id: u32,
    index: u32,
    decoration: u32,
    argument: u32,
) -> ScInternalResult {
    guard(|| {
        let decoration = decoration_from_raw(decoration)?;
        registry::with_compiler(compiler, |compiler| {
            compiler.set_member_decoration(id, index, decoration, argument)
        })
    })
}

// ===== ENTRY POINTS =====

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_entry_points(
    compiler: ScInternalCompilerHandle,
    entry_points: *mut *mut ScEntryPoint,
    size: *mut usize,
) -> ScInternalResult {
    guard(|| {
        require_out(entry_points, "entry_points")?;
        require_out(size, "size")?;
        let found = registry::with_compiler(compiler, |compiler| Ok(compiler.entry_points()))?;
        let mut pending = Pending::default();
        let flat = found
            .iter()
            .map(|entry| {
                Ok(ScEntryPoint {
                    name: pending.string(&entry.name)?,
                    execution_model: entry.execution_model as u32,
                    work_group_size_x: entry.work_group_size.x,
                    work_group_size_y: entry.work_group_size.y,
                    work_group_size_z: entry.work_group_size.z,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let data = pending.slice(&flat)?;
        unsafe {
            write_out(entry_points, data, "entry_points")?;
            write_out(size, flat.len(), "size")?;
        }
        pending.commit();
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_cleansed_entry_point_name(
    compiler: ScInternalCompilerHandle,
    original_entry_point_name: *const c_char,
    execution_model: u32,
    compiled_entry_point_name: *mut *const c_char,
) -> ScInternalResult {
    guard(|| {
        require_out(compiled_entry_point_name, "compiled_entry_point_name")?;
        let original = unsafe { in_str(original_entry_point_name, "original_entry_point_name") }?;
        let model = execution_model_from_raw(execution_model)?;
        let cleansed =
            registry::with_compiler(compiler, |compiler| compiler.cleansed_entry_point_name(original, model))?;
        let cleansed = alloc_string(&cleansed)?;
        unsafe { write_out(compiled_entry_point_name, cleansed as *const c_char, "compiled_entry_point_name") }
    })
}

// ===== RESOURCES & CONSTANTS =====

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_shader_resources(
    compiler: ScInternalCompilerHandle,
    shader_resources: *mut ScShaderResources,
) -> ScInternalResult {
    guard(|| {
        require_out(shader_resources, "shader_resources")?;
        let resources = registry::with_compiler(compiler, |compiler| Ok(compiler.shader_resources()))?;
        let mut pending = Pending::default();
        let flat = ScShaderResources {
            uniform_buffers: flatten_resources(&mut pending, &resources.uniform_buffers)?,
            storage_buffers: flatten_resources(&mut pending, &resources.storage_buffers)?,
            stage_inputs: flatten_resources(&mut pending, &resources.stage_inputs)?,
            stage_outputs: flatten_resources(&mut pending, &resources.stage_outputs)?,
            subpass_inputs: flatten_resources(&mut pending, &resources.subpass_inputs)?,
            storage_images: flatten_resources(&mut pending, &resources.storage_images)?,
            sampled_images: flatten_resources(&mut pending, &resources.sampled_images)?,
            atomic_counters: flatten_resources(&mut pending, &resources.atomic_counters)?,
            push_constant_buffers: flatten_resources(&mut pending, &resources.push_constant_buffers)?,
            separate_images: flatten_resources(&mut pending, &resources.separate_images)?,
            separate_samplers: flatten_resources(&mut pending, &resources.separate_samplers)?,
        };
        unsafe { write_out(shader_resources, flat, "shader_resources") }?;
        pending.commit();
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_specialization_constants(
    compiler: ScInternalCompilerHandle,
    constants: *mut *mut ScSpecializationConstant,
    size: *mut usize,
) -> ScInternalResult {
    guard(|| {
        require_out(constants, "constants")?;
        require_out(size, "size")?;
        let found = registry::with_compiler(compiler, |compiler| Ok(compiler.specialization_constants()))?;
        let flat: Vec<ScSpecializationConstant> = found
            .iter()
            .map(|constant| ScSpecializationConstant {
                id: constant.id,
                constant_id: constant.constant_id,
            })
            .collect();
        let data = alloc_slice(&flat)?;
        unsafe {
            write_out(constants, data, "constants")?;
            write_out(size, flat.len(), "size")
        }
    })
}

/// Writes exactly three elements (x, y, z) to `constants`
#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_work_group_size_specialization_constants(
    compiler: ScInternalCompilerHandle,
    constants: *mut ScSpecializationConstant,
) -> ScInternalResult {
    guard(|| {
        let found =
            registry::with_compiler(compiler, |compiler| Ok(compiler.work_group_size_specialization_constants()))?;
        let out = unsafe { in_slice_mut(constants, 3, "constants") }?;
        for (slot, constant) in out.iter_mut().zip(found) {
            *slot = ScSpecializationConstant {
                id: constant.id,
                constant_id: constant.constant_id,
            };
        }
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn sc_internal_compiler_set_scalar_constant(
    compiler: ScInternalCompilerHandle,
    id: u32,
    constant: u64,
) -> ScInternalResult {
    guard(|| registry::with_compiler(compiler, |compiler| compiler.set_scalar_constant(id, constant)))
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_type(
    compiler: ScInternalCompilerHandle,
    id: u32,
    spirv_type: *mut ScType,
) -> ScInternalResult {
    guard(|| {
        require_out(spirv_type, "spirv_type")?;
        let found = registry::with_compiler(compiler, |compiler| compiler.spirv_type(id).cloned())?;
        let mut pending = Pending::default();
        let flat = ScType {
            type_: found.base_type as u32,
            width: found.width,
            vecsize: found.vecsize,
            columns: found.columns,
            member_types: pending.slice(&found.member_types)?,
            member_types_size: found.member_types.len(),
            array: pending.slice(&found.array)?,
            array_size: found.array.len(),
            pointer: found.pointer,
            storage: found.storage.map_or(u32::MAX, |storage| storage as u32),
        };
        unsafe { write_out(spirv_type, flat, "spirv_type") }?;
        pending.commit();
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_declared_struct_size(
    compiler: ScInternalCompilerHandle,
    id: u32,
    result: *mut u32,
) -> ScInternalResult {
    guard(|| {
        let size = registry::with_compiler(compiler, |compiler| compiler.declared_struct_size(id))?;
        unsafe { write_out(result, size, "result") }
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_declared_struct_member_size(
    compiler: ScInternalCompilerHandle,
    id: u32,
    index: u32,
    result: *mut u32,
) -> ScInternalResult {
    guard(|| {
        let size = registry::with_compiler(compiler, |compiler| compiler.declared_struct_member_size(id, index))?;
        unsafe { write_out(result, size, "result") }
    })
}

/// Resource names in `resources` are ignored and may be NULL
#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_rename_interface_variable(
    compiler: ScInternalCompilerHandle,
    resources: *const ScResource,
    resources_size: usize,
    location: u32,
    name: *const c_char,
) -> ScInternalResult {
    guard(|| {
        let flat = unsafe { in_slice(resources, resources_size, "resources") }?;
        let name = unsafe { in_str(name, "name") }?;
        let resources: Vec<Resource> = flat
            .iter()
            .map(|resource| Resource {
                id: resource.id,
                type_id: resource.type_id,
                base_type_id: resource.base_type_id,
                name: String::new(),
            })
            .collect();
        registry::with_compiler(compiler, |compiler| {
            compiler.rename_interface_variable(&resources, location, name);
            Ok(())
        })
    })
}

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_active_buffer_ranges(
    compiler: ScInternalCompilerHandle,
    id: u32,
    active_buffer_ranges: *mut *mut ScBufferRange,
    size: *mut usize,
) -> ScInternalResult {
    guard(|| {
        require_out(active_buffer_ranges, "active_buffer_ranges")?;
        require_out(size, "size")?;
        let ranges = registry::with_compiler(compiler, |compiler| compiler.active_buffer_ranges(id))?;
        let flat: Vec<ScBufferRange> = ranges
            .iter()
            .map(|range| ScBufferRange {
                index: range.index,
                offset: range.offset,
                range: range.range,
            })
            .collect();
        let data = alloc_slice(&flat)?;
        unsafe {
            write_out(active_buffer_ranges, data, "active_buffer_ranges")?;
            write_out(size, flat.len(), "size")
        }
    })
}

// ===== COMBINED IMAGE SAMPLERS =====

#[no_mangle]
pub extern "C" fn sc_internal_compiler_build_combined_image_samplers(
    compiler: ScInternalCompilerHandle,
) -> ScInternalResult {
    guard(|| registry::with_compiler(compiler, |compiler| compiler.build_combined_image_samplers()))
}

/// Borrowed view into the compiler's table; valid until the next build or
/// the deletion of the handle. Must not be freed.
#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_get_combined_image_samplers(
    compiler: ScInternalCompilerHandle,
    samplers: *mut *const ScCombinedImageSampler,
    size: *mut usize,
) -> ScInternalResult {
    guard(|| {
        let (data, len) = registry::with_compiler(compiler, |compiler| {
            let table = compiler.combined_image_samplers()?;
            let data = if table.is_empty() { ptr::null() } else { table.as_ptr() };
            Ok((data, table.len()))
        })?;
        unsafe {
            write_out(size, len, "size")?;
            write_out(samplers, data, "samplers")
        }
    })
}

// ===== COMPILE =====

#[no_mangle]
pub unsafe extern "C" fn sc_internal_compiler_compile(
    compiler: ScInternalCompilerHandle,
    shader: *mut *const c_char,
) -> ScInternalResult {
    guard(|| {
        require_out(shader, "shader")?;
        let source = registry::with_compiler(compiler, |compiler| compiler.compile())?;
        let source = alloc_string(&source)?;
        unsafe { write_out(shader, source as *const c_char, "shader") }
    })
}
