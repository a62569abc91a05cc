//! Metal Shading Language target

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::ptr;

use crate::compiler;
use crate::ffi;
use crate::ptr_util::read_string_from_ptr;
use crate::spirv::{self, ExecutionModel};
use crate::ErrorCode;

/// MSL target
pub enum Target {}

/// Overrides of the last `set_compiler_options`, in boundary layout
///
/// Compile writes `used_by_shader` back into these.
pub struct TargetData {
    vertex_attribute_overrides: Vec<ffi::ScMslVertexAttribute>,
    resource_binding_overrides: Vec<ffi::ScMslResourceBinding>,
}

impl spirv::Target for Target {
    type Data = TargetData;
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum Platform {
    iOS = 0,
    macOS = 1,
}

/// Metal Shading Language version
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum Version {
    V1_0,
    V1_1,
    V1_2,
    V2_0,
    V2_1,
    V2_2,
    V2_3,
    V2_4,
}

impl Version {
    fn as_raw(self) -> u32 {
        match self {
            Version::V1_0 => 10000,
            Version::V1_1 => 10100,
            Version::V1_2 => 10200,
            Version::V2_0 => 20000,
            Version::V2_1 => 20100,
            Version::V2_2 => 20200,
            Version::V2_3 => 20300,
            Version::V2_4 => 20400,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub enum Format {
    #[default]
    Other,
    Uint8,
    Uint16,
}

impl Format {
    fn as_raw(self) -> u32 {
        match self {
            Format::Other => 0,
            Format::Uint8 => 1,
            Format::Uint16 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub enum VertexAttributeStep {
    #[default]
    Vertex,
    Instance,
}

/// Vertex input location
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct VertexAttributeLocation(pub u32);

/// Where a vertex attribute is fetched from
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct VertexAttribute {
    pub buffer_id: u32,
    pub offset: u32,
    pub stride: u32,
    pub step: VertexAttributeStep,
    pub format: Format,
}

/// A Vulkan-style resource slot as seen by one stage
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ResourceBindingLocation {
    pub stage: ExecutionModel,
    pub desc_set: u32,
    pub binding: u32,
}

/// Metal argument indices for a resource slot
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct ResourceBinding {
    pub buffer_id: u32,
    pub texture_id: u32,
    pub sampler_id: u32,
}

#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct CompilerVertexOptions {
    pub invert_y: bool,
    /// Accepted for symmetry with GLSL; Metal clip space needs no fixup
    pub transform_clip_space: bool,
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CompilerOptions {
    pub platform: Platform,
    pub version: Version,
    pub vertex: CompilerVertexOptions,
    /// Emit `[[point_size]]` when the vertex stage writes it
    pub enable_point_size_builtin: bool,
    /// `false` treats vertex stages as producing nothing to rasterize
    pub enable_rasterization: bool,
    pub vertex_attribute_overrides: BTreeMap<VertexAttributeLocation, VertexAttribute>,
    pub resource_binding_overrides: BTreeMap<ResourceBindingLocation, ResourceBinding>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            platform: Platform::macOS,
            version: Version::V1_2,
            vertex: CompilerVertexOptions::default(),
            enable_point_size_builtin: true,
            enable_rasterization: true,
            vertex_attribute_overrides: BTreeMap::new(),
            resource_binding_overrides: BTreeMap::new(),
        }
    }
}

impl CompilerOptions {
    fn as_raw(&self) -> ffi::ScMslCompilerOptions {
        ffi::ScMslCompilerOptions {
            vertex_invert_y: self.vertex.invert_y,
            vertex_transform_clip_space: self.vertex.transform_clip_space,
            platform: self.platform as u8,
            version: self.version.as_raw(),
            enable_point_size_builtin: self.enable_point_size_builtin,
            disable_rasterization: !self.enable_rasterization,
        }
    }
}

impl spirv::Parse<Target> for spirv::Ast<Target> {
    fn parse(module: &spirv::Module) -> Result<Self, ErrorCode> {
        let mut sc_compiler = 0;
        check!(unsafe {
            ffi::sc_internal_compiler_msl_new(&mut sc_compiler, module.words.as_ptr(), module.words.len())
        });
        Ok(spirv::Ast {
            compiler: compiler::Compiler::new(
                sc_compiler,
                TargetData {
                    vertex_attribute_overrides: Vec::new(),
                    resource_binding_overrides: Vec::new(),
                },
            ),
            target_type: PhantomData,
        })
    }
}

impl spirv::Compile<Target> for spirv::Ast<Target> {
    type CompilerOptions = CompilerOptions;

    fn set_compiler_options(&mut self, options: &CompilerOptions) -> Result<(), ErrorCode> {
        let raw = options.as_raw();
        check!(unsafe { ffi::sc_internal_compiler_msl_set_options(self.compiler.sc_compiler, &raw) });

        self.compiler.target_data.vertex_attribute_overrides = options
            .vertex_attribute_overrides
            .iter()
            .map(|(location, attribute)| ffi::ScMslVertexAttribute {
                location: location.0,
                msl_buffer: attribute.buffer_id,
                msl_offset: attribute.offset,
                msl_stride: attribute.stride,
                per_instance: attribute.step == VertexAttributeStep::Instance,
                format: attribute.format.as_raw(),
                used_by_shader: false,
            })
            .collect();
        self.compiler.target_data.resource_binding_overrides = options
            .resource_binding_overrides
            .iter()
            .map(|(location, binding)| ffi::ScMslResourceBinding {
                stage: location.stage as u32,
                desc_set: location.desc_set,
                binding: location.binding,
                msl_buffer: binding.buffer_id,
                msl_texture: binding.texture_id,
                msl_sampler: binding.sampler_id,
                used_by_shader: false,
            })
            .collect();
        Ok(())
    }

    fn compile(&mut self) -> Result<String, ErrorCode> {
        let sc_compiler = self.compiler.sc_compiler;
        let data = &mut self.compiler.target_data;
        let mut shader = ptr::null();
        check!(unsafe {
            ffi::sc_internal_compiler_msl_compile(
                sc_compiler,
                &mut shader,
                data.vertex_attribute_overrides.as_mut_ptr(),
                data.vertex_attribute_overrides.len(),
                data.resource_binding_overrides.as_mut_ptr(),
                data.resource_binding_overrides.len(),
            )
        });
        // SAFETY: the boundary hands out a NUL-terminated string
        let source = unsafe { read_string_from_ptr(shader) };
        check!(unsafe { ffi::sc_internal_free_pointer(shader as *mut std::ffi::c_void) });
        self.compiler.has_been_compiled = true;
        source
    }
}

impl spirv::Ast<Target> {
    pub fn is_rasterization_enabled(&self) -> Result<bool, ErrorCode> {
        let mut is_disabled = false;
        check!(unsafe {
            ffi::sc_internal_compiler_msl_get_is_rasterization_disabled(self.compiler.sc_compiler, &mut is_disabled)
        });
        Ok(!is_disabled)
    }

    /// Whether the last compile read the attribute overridden at `location`
    ///
    /// `false` for locations without an override.
    pub fn is_vertex_attribute_used(&self, location: VertexAttributeLocation) -> bool {
        self.compiler
            .target_data
            .vertex_attribute_overrides
            .iter()
            .any(|attribute| attribute.location == location.0 && attribute.used_by_shader)
    }

    /// Whether the last compile accessed the resource overridden at `location`
    pub fn is_resource_binding_used(&self, location: ResourceBindingLocation) -> bool {
        self.compiler
            .target_data
            .resource_binding_overrides
            .iter()
            .any(|binding| {
                binding.stage == location.stage as u32
                    && binding.desc_set == location.desc_set
                    && binding.binding == location.binding
                    && binding.used_by_shader
            })
    }
}
