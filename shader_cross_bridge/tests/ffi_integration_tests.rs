//! Integration tests for the flat C boundary
//!
//! These tests drive the `sc_internal_*` functions exactly as a foreign host
//! would: raw pointers, result codes and explicit frees.
//!
//! Run with: cargo test --test ffi_integration_tests

use serial_test::serial;
use shader_cross::fixtures;
use shader_cross::spirv::{Decoration, ExecutionModel};
use shader_cross_bridge::ffi::*;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::ptr;

// ============================================================================
// HELPERS
// ============================================================================

fn latest_message() -> Option<String> {
    let mut message = ptr::null();
    let result = unsafe { sc_internal_get_latest_exception_message(&mut message) };
    assert_eq!(result, ScInternalResult::Success);
    if message.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(message) }.to_str().unwrap().to_string())
    }
}

fn new_compiler(
    constructor: unsafe extern "C" fn(*mut ScInternalCompilerHandle, *const u32, usize) -> ScInternalResult,
    words: &[u32],
) -> ScInternalCompilerHandle {
    let mut handle = 0;
    let result = unsafe { constructor(&mut handle, words.as_ptr(), words.len()) };
    assert_eq!(result, ScInternalResult::Success, "{:?}", latest_message());
    assert_ne!(handle, 0);
    handle
}

/// Copy a caller-owned string and free it
fn take_string(pointer: *const c_char) -> String {
    assert!(!pointer.is_null());
    let text = unsafe { CStr::from_ptr(pointer) }.to_str().unwrap().to_string();
    assert_eq!(unsafe { sc_internal_free_pointer(pointer as *mut c_void) }, ScInternalResult::Success);
    text
}

fn take_resources(array: ScResourceArray) -> Vec<(u32, String)> {
    if array.num == 0 {
        assert!(array.data.is_null());
        return Vec::new();
    }
    let flat = unsafe { std::slice::from_raw_parts(array.data, array.num) }.to_vec();
    let resources = flat
        .iter()
        .map(|resource| (resource.id, take_string(resource.name)))
        .collect();
    assert_eq!(unsafe { sc_internal_free_pointer(array.data as *mut c_void) }, ScInternalResult::Success);
    resources
}

fn delete(handle: ScInternalCompilerHandle) {
    assert_eq!(sc_internal_compiler_delete(handle), ScInternalResult::Success);
}

// ============================================================================
// LIFECYCLE & HANDLES
// ============================================================================

#[test]
#[serial]
fn test_integration_ffi_glsl_end_to_end() {
    let words = fixtures::uniform_fragment();
    let live_before = live_compiler_count();
    let handle = new_compiler(sc_internal_compiler_glsl_new, &words);
    assert_eq!(live_compiler_count(), live_before + 1);

    let mut resources = ScShaderResources::default();
    let result = unsafe { sc_internal_compiler_get_shader_resources(handle, &mut resources) };
    assert_eq!(result, ScInternalResult::Success);
    let uniform_buffers = take_resources(resources.uniform_buffers);
    let stage_outputs = take_resources(resources.stage_outputs);
    assert_eq!(uniform_buffers.len(), 1);
    assert_eq!(uniform_buffers[0].1, "UniformBufferObject");
    assert_eq!(stage_outputs.len(), 1);
    assert!(take_resources(resources.storage_buffers).is_empty());

    let mut shader = ptr::null();
    let result = unsafe { sc_internal_compiler_compile(handle, &mut shader) };
    assert_eq!(result, ScInternalResult::Success, "{:?}", latest_message());
    let source = take_string(shader);
    assert!(source.starts_with("#version 450"));
    assert!(source
        .lines()
        .any(|line| line.starts_with("layout(") && line.contains(") uniform ")));

    delete(handle);
    assert_eq!(live_compiler_count(), live_before);
}

#[test]
#[serial]
fn test_integration_ffi_zero_handle_is_invalid() {
    let mut shader = ptr::null();
    let result = unsafe { sc_internal_compiler_compile(0, &mut shader) };
    assert_eq!(result, ScInternalResult::CompilationError);
    assert!(shader.is_null());
    assert!(latest_message().unwrap().contains("Invalid compiler handle"));
}

#[test]
#[serial]
fn test_integration_ffi_deleted_handle_stays_invalid() {
    let words = fixtures::uniform_fragment();
    let handle = new_compiler(sc_internal_compiler_base_new, &words);
    delete(handle);

    assert_eq!(sc_internal_compiler_delete(handle), ScInternalResult::CompilationError);

    // A new compiler may reuse the slot but never the handle
    let replacement = new_compiler(sc_internal_compiler_base_new, &words);
    assert_ne!(replacement, handle);
    let mut value = 0;
    let result = unsafe { sc_internal_compiler_get_decoration(handle, &mut value, 1, Decoration::Binding as u32) };
    assert_eq!(result, ScInternalResult::CompilationError);
    delete(replacement);
}

#[test]
#[serial]
fn test_integration_ffi_rejects_bad_module() {
    let mut handle = 0;
    let result = unsafe { sc_internal_compiler_glsl_new(&mut handle, ptr::null(), 16) };
    assert_eq!(result, ScInternalResult::CompilationError);
    assert_eq!(handle, 0);

    let garbage = [0xdead_beefu32; 8];
    let result = unsafe { sc_internal_compiler_msl_new(&mut handle, garbage.as_ptr(), garbage.len()) };
    assert_eq!(result, ScInternalResult::CompilationError);
    assert_eq!(handle, 0);
    assert!(latest_message().is_some());
}

// ============================================================================
// ERROR REPORTING & MEMORY
// ============================================================================

#[test]
#[serial]
fn test_integration_ffi_message_is_per_thread() {
    assert_eq!(sc_internal_compiler_delete(0), ScInternalResult::CompilationError);
    let failing_thread = latest_message().unwrap();

    let other_thread = std::thread::spawn(latest_message).join().unwrap();
    assert!(other_thread.is_none());

    // Still intact after the other thread ran
    assert_eq!(latest_message().unwrap(), failing_thread);
}

#[test]
#[serial]
fn test_integration_ffi_null_message_out_pointer() {
    let result = unsafe { sc_internal_get_latest_exception_message(ptr::null_mut()) };
    assert_eq!(result, ScInternalResult::Unhandled);
}

#[test]
#[serial]
fn test_integration_ffi_free_null_is_noop() {
    assert_eq!(unsafe { sc_internal_free_pointer(ptr::null_mut()) }, ScInternalResult::Success);
}

#[test]
#[serial]
fn test_integration_ffi_null_out_pointer_is_reported() {
    let words = fixtures::uniform_fragment();
    let handle = new_compiler(sc_internal_compiler_glsl_new, &words);
    let result = unsafe { sc_internal_compiler_compile(handle, ptr::null_mut()) };
    assert_eq!(result, ScInternalResult::CompilationError);
    assert!(latest_message().unwrap().contains("shader"));
    delete(handle);
}

// ============================================================================
// REFLECTION
// ============================================================================

#[test]
#[serial]
fn test_integration_ffi_entry_points() {
    let words = fixtures::compute_spec_workgroup();
    let handle = new_compiler(sc_internal_compiler_base_new, &words);

    let mut data = ptr::null_mut();
    let mut size = 0;
    let result = unsafe { sc_internal_compiler_get_entry_points(handle, &mut data, &mut size) };
    assert_eq!(result, ScInternalResult::Success);
    assert_eq!(size, 1);
    let entry = unsafe { *data };
    assert_eq!(entry.execution_model, ExecutionModel::GLCompute as u32);
    assert_eq!((entry.work_group_size_x, entry.work_group_size_y, entry.work_group_size_z), (1, 1, 1));
    assert_eq!(take_string(entry.name), "main");
    assert_eq!(unsafe { sc_internal_free_pointer(data as *mut c_void) }, ScInternalResult::Success);

    delete(handle);
}

#[test]
#[serial]
fn test_integration_ffi_specialization_constants() {
    let words = fixtures::compute_spec_workgroup();
    let handle = new_compiler(sc_internal_compiler_base_new, &words);

    let mut data = ptr::null_mut();
    let mut size = 0;
    let result = unsafe { sc_internal_compiler_get_specialization_constants(handle, &mut data, &mut size) };
    assert_eq!(result, ScInternalResult::Success);
    let constants = unsafe { std::slice::from_raw_parts(data, size) }.to_vec();
    let ids: Vec<u32> = constants.iter().map(|constant| constant.constant_id).collect();
    assert_eq!(ids, vec![0, 1, 5]);
    assert_eq!(unsafe { sc_internal_free_pointer(data as *mut c_void) }, ScInternalResult::Success);

    let mut work_group = [ScSpecializationConstant::default(); 3];
    let result =
        unsafe { sc_internal_compiler_get_work_group_size_specialization_constants(handle, work_group.as_mut_ptr()) };
    assert_eq!(result, ScInternalResult::Success);
    assert_eq!(work_group[0], constants[0]);
    assert_eq!(work_group[1], constants[1]);
    assert_eq!(work_group[2], ScSpecializationConstant::default());

    delete(handle);
}

#[test]
#[serial]
fn test_integration_ffi_decoration_round_trip() {
    let words = fixtures::uniform_fragment();
    let handle = new_compiler(sc_internal_compiler_base_new, &words);

    let mut resources = ScShaderResources::default();
    assert_eq!(
        unsafe { sc_internal_compiler_get_shader_resources(handle, &mut resources) },
        ScInternalResult::Success
    );
    let ubo = take_resources(resources.uniform_buffers)[0].0;
    take_resources(resources.stage_outputs);

    let binding = Decoration::Binding as u32;
    assert_eq!(sc_internal_compiler_set_decoration(handle, ubo, binding, 7), ScInternalResult::Success);
    let mut value = 0;
    assert_eq!(
        unsafe { sc_internal_compiler_get_decoration(handle, &mut value, ubo, binding) },
        ScInternalResult::Success
    );
    assert_eq!(value, 7);

    assert_eq!(sc_internal_compiler_unset_decoration(handle, ubo, binding), ScInternalResult::Success);
    assert_eq!(
        unsafe { sc_internal_compiler_get_decoration(handle, &mut value, ubo, binding) },
        ScInternalResult::Success
    );
    assert_eq!(value, 0);

    let name = CString::new("material").unwrap();
    assert_eq!(unsafe { sc_internal_compiler_set_name(handle, ubo, name.as_ptr()) }, ScInternalResult::Success);
    let mut read_back = ptr::null();
    assert_eq!(unsafe { sc_internal_compiler_get_name(handle, ubo, &mut read_back) }, ScInternalResult::Success);
    assert_eq!(take_string(read_back), "material");

    delete(handle);
}

#[test]
#[serial]
fn test_integration_ffi_type_arrays_are_caller_owned() {
    let words = fixtures::uniform_fragment();
    let handle = new_compiler(sc_internal_compiler_base_new, &words);

    let mut resources = ScShaderResources::default();
    assert_eq!(
        unsafe { sc_internal_compiler_get_shader_resources(handle, &mut resources) },
        ScInternalResult::Success
    );
    let ubo = unsafe { *resources.uniform_buffers.data };
    let block_type = ubo.base_type_id;
    take_resources(resources.uniform_buffers);
    take_resources(resources.stage_outputs);

    let mut flat = ScType::default();
    assert_eq!(
        unsafe { sc_internal_compiler_get_type(handle, block_type, &mut flat) },
        ScInternalResult::Success
    );
    assert_eq!(flat.type_, shader_cross::BaseType::Struct as u32);
    assert_eq!(flat.member_types_size, 1);
    assert!(!flat.member_types.is_null());
    assert!(flat.array.is_null());
    assert_eq!(flat.storage, u32::MAX);
    assert_eq!(
        unsafe { sc_internal_free_pointer(flat.member_types as *mut c_void) },
        ScInternalResult::Success
    );

    let mut size = 0;
    assert_eq!(
        unsafe { sc_internal_compiler_get_declared_struct_size(handle, block_type, &mut size) },
        ScInternalResult::Success
    );
    assert_eq!(size, 16);

    delete(handle);
}

// ============================================================================
// BACKEND OPTIONS
// ============================================================================

#[test]
#[serial]
fn test_integration_ffi_glsl_set_entry_point() {
    let words = fixtures::two_fragment_entry_points();
    let handle = new_compiler(sc_internal_compiler_glsl_new, &words);

    let tint = CString::new("tint").unwrap();
    assert_eq!(
        unsafe { sc_internal_compiler_glsl_set_entry_point(handle, tint.as_ptr(), ExecutionModel::Fragment as u32) },
        ScInternalResult::Success
    );
    let mut shader = ptr::null();
    assert_eq!(unsafe { sc_internal_compiler_compile(handle, &mut shader) }, ScInternalResult::Success);
    assert!(!take_string(shader).contains(") uniform "));

    let missing = CString::new("missing").unwrap();
    assert_eq!(
        unsafe {
            sc_internal_compiler_glsl_set_entry_point(handle, missing.as_ptr(), ExecutionModel::Fragment as u32)
        },
        ScInternalResult::CompilationError
    );
    assert_eq!(latest_message().as_deref(), Some("Entry point does not exist."));

    delete(handle);

    let hlsl = new_compiler(sc_internal_compiler_hlsl_new, &words);
    assert_eq!(
        unsafe { sc_internal_compiler_glsl_set_entry_point(hlsl, tint.as_ptr(), ExecutionModel::Fragment as u32) },
        ScInternalResult::CompilationError
    );
    delete(hlsl);
}

#[test]
#[serial]
fn test_integration_ffi_glsl_options_round_trip() {
    let words = fixtures::uniform_fragment();
    let handle = new_compiler(sc_internal_compiler_glsl_new, &words);

    let mut options = ScGlslCompilerOptions::default();
    assert_eq!(
        unsafe { sc_internal_compiler_glsl_get_options(handle, &mut options) },
        ScInternalResult::Success
    );
    assert_eq!(options.version, 450);
    assert!(!options.es);
    assert!(options.vertex_support_nonzero_base_instance);
    assert!(!options.force_zero_initialized_variables);

    options.version = 310;
    options.es = true;
    options.vertex_invert_y = true;
    options.force_zero_initialized_variables = true;
    assert_eq!(
        unsafe { sc_internal_compiler_glsl_set_options(handle, &options) },
        ScInternalResult::Success
    );

    let mut read_back = ScGlslCompilerOptions::default();
    assert_eq!(
        unsafe { sc_internal_compiler_glsl_get_options(handle, &mut read_back) },
        ScInternalResult::Success
    );
    assert_eq!(read_back.version, 310);
    assert!(read_back.es);
    assert!(read_back.vertex_invert_y);
    assert!(!read_back.vertex_transform_clip_space);
    assert!(read_back.vertex_support_nonzero_base_instance);
    assert!(read_back.force_zero_initialized_variables);

    let mut shader = ptr::null();
    assert_eq!(unsafe { sc_internal_compiler_compile(handle, &mut shader) }, ScInternalResult::Success);
    assert!(take_string(shader).starts_with("#version 310 es"));

    delete(handle);
}

#[test]
#[serial]
fn test_integration_ffi_hlsl_root_constants() {
    let words = fixtures::vertex_passthrough();
    let handle = new_compiler(sc_internal_compiler_hlsl_new, &words);

    let mut options = ScHlslCompilerOptions::default();
    assert_eq!(
        unsafe { sc_internal_compiler_hlsl_get_options(handle, &mut options) },
        ScInternalResult::Success
    );
    assert_eq!(options.shader_model, 50);
    assert!(options.root_constants.is_null());
    assert_eq!(options.root_constants_size, 0);

    let mut ranges = [ScHlslRootConstant {
        start: 0,
        end: 16,
        binding: 2,
        space: 1,
    }];
    options.shader_model = 51;
    options.root_constants = ranges.as_mut_ptr();
    options.root_constants_size = ranges.len();
    assert_eq!(
        unsafe { sc_internal_compiler_hlsl_set_options(handle, &options) },
        ScInternalResult::Success
    );

    let mut read_back = ScHlslCompilerOptions::default();
    assert_eq!(
        unsafe { sc_internal_compiler_hlsl_get_options(handle, &mut read_back) },
        ScInternalResult::Success
    );
    assert_eq!(read_back.shader_model, 51);
    assert_eq!(read_back.root_constants_size, 1);
    assert_ne!(read_back.root_constants, ranges.as_mut_ptr());
    assert_eq!(unsafe { *read_back.root_constants }, ranges[0]);
    assert_eq!(
        unsafe { sc_internal_free_pointer(read_back.root_constants as *mut c_void) },
        ScInternalResult::Success
    );

    let mut shader = ptr::null();
    assert_eq!(
        unsafe { sc_internal_compiler_compile(handle, &mut shader) },
        ScInternalResult::Success,
        "{:?}",
        latest_message()
    );
    assert!(!take_string(shader).is_empty());

    delete(handle);
}

#[test]
#[serial]
fn test_integration_ffi_hlsl_rejects_negative_shader_model() {
    let words = fixtures::uniform_fragment();
    let handle = new_compiler(sc_internal_compiler_hlsl_new, &words);
    let options = ScHlslCompilerOptions {
        shader_model: -1,
        ..Default::default()
    };
    assert_eq!(
        unsafe { sc_internal_compiler_hlsl_set_options(handle, &options) },
        ScInternalResult::CompilationError
    );
    delete(handle);
}

#[test]
#[serial]
fn test_integration_ffi_wrong_backend_options() {
    let words = fixtures::uniform_fragment();
    let handle = new_compiler(sc_internal_compiler_hlsl_new, &words);

    let options = ScGlslCompilerOptions::default();
    assert_eq!(
        unsafe { sc_internal_compiler_glsl_set_options(handle, &options) },
        ScInternalResult::CompilationError
    );
    assert!(latest_message().unwrap().contains("GLSL"));

    let mut disabled = false;
    assert_eq!(
        unsafe { sc_internal_compiler_msl_get_is_rasterization_disabled(handle, &mut disabled) },
        ScInternalResult::CompilationError
    );

    delete(handle);
}

#[test]
#[serial]
fn test_integration_ffi_base_compile_fails() {
    let words = fixtures::uniform_fragment();
    let handle = new_compiler(sc_internal_compiler_base_new, &words);
    let mut shader = ptr::null();
    assert_eq!(
        unsafe { sc_internal_compiler_compile(handle, &mut shader) },
        ScInternalResult::CompilationError
    );
    assert!(shader.is_null());
    delete(handle);
}

// ============================================================================
// MSL
// ============================================================================

#[test]
#[serial]
fn test_integration_ffi_msl_used_by_shader_write_back() {
    let words = fixtures::vertex_passthrough();
    let handle = new_compiler(sc_internal_compiler_msl_new, &words);

    let mut attributes = [0u32, 1, 5].map(|location| ScMslVertexAttribute {
        location,
        msl_buffer: location,
        msl_stride: 16,
        ..Default::default()
    });
    let mut bindings = [
        ScMslResourceBinding {
            stage: ExecutionModel::Vertex as u32,
            desc_set: 0,
            binding: 0,
            msl_buffer: 3,
            ..Default::default()
        },
        ScMslResourceBinding {
            stage: ExecutionModel::Fragment as u32,
            desc_set: 0,
            binding: 0,
            msl_buffer: 4,
            ..Default::default()
        },
    ];

    let mut shader = ptr::null();
    let result = unsafe {
        sc_internal_compiler_msl_compile(
            handle,
            &mut shader,
            attributes.as_mut_ptr(),
            attributes.len(),
            bindings.as_mut_ptr(),
            bindings.len(),
        )
    };
    assert_eq!(result, ScInternalResult::Success, "{:?}", latest_message());
    assert!(take_string(shader).contains("metal_stdlib"));

    let used: Vec<bool> = attributes.iter().map(|attribute| attribute.used_by_shader).collect();
    assert_eq!(used, vec![true, true, false]);
    assert!(bindings[0].used_by_shader);
    assert!(!bindings[1].used_by_shader);

    delete(handle);
}

#[test]
#[serial]
fn test_integration_ffi_msl_options_and_rasterization() {
    let words = fixtures::vertex_passthrough();
    let handle = new_compiler(sc_internal_compiler_msl_new, &words);

    let mut options = ScMslCompilerOptions::default();
    assert_eq!(
        unsafe { sc_internal_compiler_msl_get_options(handle, &mut options) },
        ScInternalResult::Success
    );
    assert_eq!(options.platform, 1);
    assert_eq!(options.version, 10200);

    let mut disabled = true;
    assert_eq!(
        unsafe { sc_internal_compiler_msl_get_is_rasterization_disabled(handle, &mut disabled) },
        ScInternalResult::Success
    );
    assert!(!disabled);

    options.disable_rasterization = true;
    assert_eq!(
        unsafe { sc_internal_compiler_msl_set_options(handle, &options) },
        ScInternalResult::Success
    );
    assert_eq!(
        unsafe { sc_internal_compiler_msl_get_is_rasterization_disabled(handle, &mut disabled) },
        ScInternalResult::Success
    );
    assert!(disabled);

    options.platform = 9;
    assert_eq!(
        unsafe { sc_internal_compiler_msl_set_options(handle, &options) },
        ScInternalResult::CompilationError
    );

    delete(handle);
}
