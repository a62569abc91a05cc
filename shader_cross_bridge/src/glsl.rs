//! GLSL / ESSL target

use std::ffi::CString;
use std::marker::PhantomData;

use crate::compiler;
use crate::ffi;
use crate::spirv::{self, CombinedImageSampler, ExecutionModel};
use crate::ErrorCode;

/// GLSL target
pub enum Target {}

pub struct TargetData {
    combined_image_samplers_built: bool,
}

impl spirv::Target for Target {
    type Data = TargetData;
}

/// `#version` the generated source declares
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum Version {
    V3_30,
    V4_00,
    V4_10,
    V4_20,
    V4_30,
    V4_40,
    V4_50,
    V4_60,
    V3_00Es,
    V3_10Es,
    V3_20Es,
}

impl Version {
    /// `(version number, is ES)`
    fn as_raw(self) -> (u32, bool) {
        match self {
            Version::V3_30 => (330, false),
            Version::V4_00 => (400, false),
            Version::V4_10 => (410, false),
            Version::V4_20 => (420, false),
            Version::V4_30 => (430, false),
            Version::V4_40 => (440, false),
            Version::V4_50 => (450, false),
            Version::V4_60 => (460, false),
            Version::V3_00Es => (300, true),
            Version::V3_10Es => (310, true),
            Version::V3_20Es => (320, true),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct CompilerVertexOptions {
    /// Negate `gl_Position.y`
    pub invert_y: bool,
    /// Remap clip-space depth from [0, 1] to [-1, 1]
    pub transform_clip_space: bool,
    /// Rely on `ARB_shader_draw_parameters` for the base instance
    pub support_nonzero_base_instance: bool,
}

impl Default for CompilerVertexOptions {
    fn default() -> CompilerVertexOptions {
        CompilerVertexOptions {
            invert_y: false,
            transform_clip_space: false,
            support_nonzero_base_instance: true,
        }
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CompilerOptions {
    pub version: Version,
    pub vertex: CompilerVertexOptions,
    /// Zero-fill workgroup variables before first use
    pub force_zero_initialized_variables: bool,
}

impl CompilerOptions {
    fn as_raw(&self) -> ffi::ScGlslCompilerOptions {
        let (version, es) = self.version.as_raw();
        ffi::ScGlslCompilerOptions {
            vertex_invert_y: self.vertex.invert_y,
            vertex_transform_clip_space: self.vertex.transform_clip_space,
            version,
            es,
            vertex_support_nonzero_base_instance: self.vertex.support_nonzero_base_instance,
            force_zero_initialized_variables: self.force_zero_initialized_variables,
        }
    }
}

impl Default for CompilerOptions {
    fn default() -> CompilerOptions {
        CompilerOptions {
            version: Version::V4_50,
            vertex: CompilerVertexOptions::default(),
            force_zero_initialized_variables: false,
        }
    }
}

impl spirv::Parse<Target> for spirv::Ast<Target> {
    fn parse(module: &spirv::Module) -> Result<Self, ErrorCode> {
        let mut sc_compiler = 0;
        check!(unsafe {
            ffi::sc_internal_compiler_glsl_new(&mut sc_compiler, module.words.as_ptr(), module.words.len())
        });
        Ok(spirv::Ast {
            compiler: compiler::Compiler::new(
                sc_compiler,
                TargetData {
                    combined_image_samplers_built: false,
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
        check!(unsafe { ffi::sc_internal_compiler_glsl_set_options(self.compiler.sc_compiler, &raw) });
        Ok(())
    }

    fn compile(&mut self) -> Result<String, ErrorCode> {
        self.compiler.compile()
    }
}

impl spirv::Ast<Target> {
    /// Pair every separate image with the samplers it is used with
    pub fn build_combined_image_samplers(&mut self) -> Result<(), ErrorCode> {
        self.compiler.build_combined_image_samplers()?;
        self.compiler.target_data.combined_image_samplers_built = true;
        Ok(())
    }

    /// Table built by the last `build_combined_image_samplers`, borrowed from the compiler
    pub fn get_combined_image_samplers(&self) -> Result<&[CombinedImageSampler], ErrorCode> {
        if !self.compiler.target_data.combined_image_samplers_built {
            return Err(ErrorCode::CompilationError(String::from(
                "`build_combined_image_samplers` must be called first",
            )));
        }
        self.compiler.get_combined_image_samplers()
    }

    /// Compile `name` instead of the first declared entry point
    pub fn set_entry_point(&mut self, name: &str, execution_model: ExecutionModel) -> Result<(), ErrorCode> {
        let name = CString::new(name)
            .map_err(|_| ErrorCode::CompilationError(String::from("Entry point name contains a NUL byte")))?;
        check!(unsafe {
            ffi::sc_internal_compiler_glsl_set_entry_point(
                self.compiler.sc_compiler,
                name.as_ptr(),
                execution_model as u32,
            )
        });
        Ok(())
    }

    /// Insert `line` right after `#version` in the generated source
    pub fn add_header_line(&mut self, line: &str) -> Result<(), ErrorCode> {
        let line = CString::new(line)
            .map_err(|_| ErrorCode::CompilationError(String::from("Header line contains a NUL byte")))?;
        check!(unsafe { ffi::sc_internal_compiler_glsl_add_header_line(self.compiler.sc_compiler, line.as_ptr()) });
        Ok(())
    }
}
