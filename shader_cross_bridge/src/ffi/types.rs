//! `#[repr(C)]` types of the flat boundary

use std::os::raw::c_char;
use std::ptr;

pub use shader_cross::CombinedImageSampler as ScCombinedImageSampler;

/// Result code of every boundary call
#[repr(C)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum ScInternalResult {
    Success = 0,
    /// Panic or engine fault; no message is stored
    Unhandled = 1,
    /// Rejected input or request; see `sc_internal_get_latest_exception_message`
    CompilationError = 2,
}

/// Opaque compiler handle
pub type ScInternalCompilerHandle = u64;

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct ScEntryPoint {
    pub name: *mut c_char,
    pub execution_model: u32,
    pub work_group_size_x: u32,
    pub work_group_size_y: u32,
    pub work_group_size_z: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct ScResource {
    pub id: u32,
    pub type_id: u32,
    pub base_type_id: u32,
    pub name: *mut c_char,
}

/// `data` is NULL exactly when `num` is 0
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct ScResourceArray {
    pub data: *mut ScResource,
    pub num: usize,
}

impl Default for ScResourceArray {
    fn default() -> Self {
        Self {
            data: ptr::null_mut(),
            num: 0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ScShaderResources {
    pub uniform_buffers: ScResourceArray,
    pub storage_buffers: ScResourceArray,
    pub stage_inputs: ScResourceArray,
    pub stage_outputs: ScResourceArray,
    pub subpass_inputs: ScResourceArray,
    pub storage_images: ScResourceArray,
    pub sampled_images: ScResourceArray,
    pub atomic_counters: ScResourceArray,
    pub push_constant_buffers: ScResourceArray,
    pub separate_images: ScResourceArray,
    pub separate_samplers: ScResourceArray,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ScSpecializationConstant {
    pub id: u32,
    pub constant_id: u32,
}

/// Type descriptor; `member_types` and `array` are owned by the caller
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct ScType {
    pub type_: u32,
    pub width: u32,
    pub vecsize: u32,
    pub columns: u32,
    pub member_types: *mut u32,
    pub member_types_size: usize,
    pub array: *mut u32,
    pub array_size: usize,
    pub pointer: bool,
    /// Storage class of a pointer type, `u32::MAX` otherwise
    pub storage: u32,
}

impl Default for ScType {
    fn default() -> Self {
        Self {
            type_: 0,
            width: 0,
            vecsize: 0,
            columns: 0,
            member_types: ptr::null_mut(),
            member_types_size: 0,
            array: ptr::null_mut(),
            array_size: 0,
            pointer: false,
            storage: u32::MAX,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ScBufferRange {
    pub index: u32,
    pub offset: usize,
    pub range: usize,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ScGlslCompilerOptions {
    pub vertex_invert_y: bool,
    pub vertex_transform_clip_space: bool,
    pub version: u32,
    pub es: bool,
    pub vertex_support_nonzero_base_instance: bool,
    pub force_zero_initialized_variables: bool,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ScHlslRootConstant {
    pub start: u32,
    pub end: u32,
    pub binding: u32,
    pub space: u32,
}

/// `root_constants` is read during `set_options` only. From `get_options`
/// it is a caller-owned copy (NULL when empty).
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct ScHlslCompilerOptions {
    pub shader_model: i32,
    pub vertex_invert_y: bool,
    pub vertex_transform_clip_space: bool,
    pub point_size_compat: bool,
    pub point_coord_compat: bool,
    pub root_constants: *mut ScHlslRootConstant,
    pub root_constants_size: usize,
}

impl Default for ScHlslCompilerOptions {
    fn default() -> Self {
        Self {
            shader_model: 0,
            vertex_invert_y: false,
            vertex_transform_clip_space: false,
            point_size_compat: false,
            point_coord_compat: false,
            root_constants: ptr::null_mut(),
            root_constants_size: 0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default)]
pub struct ScMslCompilerOptions {
    pub vertex_invert_y: bool,
    pub vertex_transform_clip_space: bool,
    /// 0 = iOS, 1 = macOS
    pub platform: u8,
    pub version: u32,
    pub enable_point_size_builtin: bool,
    pub disable_rasterization: bool,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ScMslVertexAttribute {
    pub location: u32,
    pub msl_buffer: u32,
    pub msl_offset: u32,
    pub msl_stride: u32,
    pub per_instance: bool,
    /// 0 = other, 1 = uint8, 2 = uint16
    pub format: u32,
    pub used_by_shader: bool,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ScMslResourceBinding {
    pub stage: u32,
    pub desc_set: u32,
    pub binding: u32,
    pub msl_buffer: u32,
    pub msl_texture: u32,
    pub msl_sampler: u32,
    pub used_by_shader: bool,
}
