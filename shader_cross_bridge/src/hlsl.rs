//! HLSL target

use std::marker::PhantomData;

use crate::compiler;
use crate::ffi;
use crate::spirv;
use crate::ErrorCode;

/// HLSL target
pub enum Target {}

impl spirv::Target for Target {
    type Data = ();
}

/// Shader model the generated source targets
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum ShaderModel {
    V5_0,
    V5_1,
    V6_0,
}

impl ShaderModel {
    fn as_raw(self) -> i32 {
        match self {
            ShaderModel::V5_0 => 50,
            ShaderModel::V5_1 => 51,
            ShaderModel::V6_0 => 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct CompilerVertexOptions {
    pub invert_y: bool,
    /// Accepted for symmetry with the other targets; HLSL clip space needs no fixup
    pub transform_clip_space: bool,
}

/// A byte range of the push constant block bound as root constants
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct RootConstant {
    /// First byte, inclusive
    pub start: u32,
    /// Last byte, exclusive
    pub end: u32,
    pub binding: u32,
    pub space: u32,
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CompilerOptions {
    pub shader_model: ShaderModel,
    pub vertex: CompilerVertexOptions,
    /// Accept vertex shaders writing `PointSize`
    pub point_size_compat: bool,
    /// Accept fragment shaders reading `PointCoord`
    pub point_coord_compat: bool,
    pub root_constants: Vec<RootConstant>,
}

impl Default for CompilerOptions {
    fn default() -> CompilerOptions {
        CompilerOptions {
            shader_model: ShaderModel::V5_0,
            vertex: CompilerVertexOptions::default(),
            point_size_compat: false,
            point_coord_compat: false,
            root_constants: Vec::new(),
        }
    }
}

impl spirv::Parse<Target> for spirv::Ast<Target> {
    fn parse(module: &spirv::Module) -> Result<Self, ErrorCode> {
        let mut sc_compiler = 0;
        check!(unsafe {
            ffi::sc_internal_compiler_hlsl_new(&mut sc_compiler, module.words.as_ptr(), module.words.len())
        });
        Ok(spirv::Ast {
            compiler: compiler::Compiler::new(sc_compiler, ()),
            target_type: PhantomData,
        })
    }
}

impl spirv::Compile<Target> for spirv::Ast<Target> {
    type CompilerOptions = CompilerOptions;

    fn set_compiler_options(&mut self, options: &CompilerOptions) -> Result<(), ErrorCode> {
        let mut root_constants: Vec<ffi::ScHlslRootConstant> = options
            .root_constants
            .iter()
            .map(|range| ffi::ScHlslRootConstant {
                start: range.start,
                end: range.end,
                binding: range.binding,
                space: range.space,
            })
            .collect();
        let raw = ffi::ScHlslCompilerOptions {
            shader_model: options.shader_model.as_raw(),
            vertex_invert_y: options.vertex.invert_y,
            vertex_transform_clip_space: options.vertex.transform_clip_space,
            point_size_compat: options.point_size_compat,
            point_coord_compat: options.point_coord_compat,
            root_constants: root_constants.as_mut_ptr(),
            root_constants_size: root_constants.len(),
        };
        check!(unsafe { ffi::sc_internal_compiler_hlsl_set_options(self.compiler.sc_compiler, &raw) });
        Ok(())
    }

    fn compile(&mut self) -> Result<String, ErrorCode> {
        self.compiler.compile()
    }
}
