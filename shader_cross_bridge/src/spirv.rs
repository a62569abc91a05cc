//! SPIR-V module input, the generic [`Ast`] and the reflection types

use std::marker::PhantomData;

use crate::compiler;
use crate::ffi;
use crate::ErrorCode;

pub use shader_cross::spirv::{Decoration, ExecutionModel, StorageClass};
pub use shader_cross::{BaseType, CombinedImageSampler};

/// A borrowed SPIR-V word stream
#[derive(Debug, Clone, Copy)]
pub struct Module<'a> {
    pub(crate) words: &'a [u32],
}

impl<'a> Module<'a> {
    pub fn from_words(words: &'a [u32]) -> Self {
        Module { words }
    }
}

/// A compilation target; `Data` is the per-handle state the target keeps
pub trait Target {
    type Data;
}

/// Reflection-only target: parses and reflects, never compiles
pub enum Base {}

impl Target for Base {
    type Data = ();
}

/// A parsed module bound to a target
pub struct Ast<TTarget>
where
    TTarget: Target,
{
    pub(crate) compiler: compiler::Compiler<TTarget::Data>,
    pub(crate) target_type: PhantomData<TTarget>,
}

pub trait Parse<TTarget>: Sized {
    fn parse(module: &Module) -> Result<Self, ErrorCode>;
}

pub trait Compile<TTarget> {
    type CompilerOptions;

    /// Replace the target options; later calls overwrite earlier ones
    fn set_compiler_options(&mut self, options: &Self::CompilerOptions) -> Result<(), ErrorCode>;
    fn compile(&mut self) -> Result<String, ErrorCode>;
}

impl Parse<Base> for Ast<Base> {
    fn parse(module: &Module) -> Result<Self, ErrorCode> {
        let mut sc_compiler = 0;
        check!(unsafe {
            ffi::sc_internal_compiler_base_new(&mut sc_compiler, module.words.as_ptr(), module.words.len())
        });
        Ok(Ast {
            compiler: compiler::Compiler::new(sc_compiler, ()),
            target_type: PhantomData,
        })
    }
}

// ===== REFLECTION TYPES =====

#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct WorkGroupSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct EntryPoint {
    pub name: String,
    pub execution_model: ExecutionModel,
    pub work_group_size: WorkGroupSize,
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Resource {
    pub id: u32,
    pub type_id: u32,
    pub base_type_id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, Hash, Eq, PartialEq)]
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

/// `id == 0` marks a dimension with no specialization constant
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct SpecializationConstant {
    pub id: u32,
    pub constant_id: u32,
}

#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct WorkGroupSizeSpecializationConstants {
    pub x: SpecializationConstant,
    pub y: SpecializationConstant,
    pub z: SpecializationConstant,
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct BufferRange {
    /// Member index within the block
    pub index: u32,
    pub offset: usize,
    pub range: usize,
}

/// Type descriptor returned by [`Ast::get_type`]
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Type {
    pub base_type: BaseType,
    pub width: u32,
    pub vecsize: u32,
    pub columns: u32,
    pub member_types: Vec<u32>,
    /// Array dimensions, outermost last; 0 for a runtime array
    pub array: Vec<u32>,
    pub pointer: bool,
    pub storage: Option<StorageClass>,
}

// ===== AST =====

impl<TTarget> Ast<TTarget>
where
    TTarget: Target,
{
    /// Argument of `decoration` on `id`, 0 when absent
    pub fn get_decoration(&self, id: u32, decoration: Decoration) -> Result<u32, ErrorCode> {
        self.compiler.get_decoration(id, decoration)
    }

    pub fn set_decoration(&mut self, id: u32, decoration: Decoration, argument: u32) -> Result<(), ErrorCode> {
        self.compiler.set_decoration(id, decoration, argument)
    }

    pub fn unset_decoration(&mut self, id: u32, decoration: Decoration) -> Result<(), ErrorCode> {
        self.compiler.unset_decoration(id, decoration)
    }

    pub fn get_name(&self, id: u32) -> Result<String, ErrorCode> {
        self.compiler.get_name(id)
    }

    pub fn set_name(&mut self, id: u32, name: &str) -> Result<(), ErrorCode> {
        self.compiler.set_name(id, name)
    }

    pub fn get_member_name(&self, id: u32, index: u32) -> Result<String, ErrorCode> {
        self.compiler.get_member_name(id, index)
    }

    pub fn get_member_decoration(&self, id: u32, index: u32, decoration: Decoration) -> Result<u32, ErrorCode> {
        self.compiler.get_member_decoration(id, index, decoration)
    }

    pub fn set_member_decoration(
        &mut self,
        id: u32,
        index: u32,
        decoration: Decoration,
        argument: u32,
    ) -> Result<(), ErrorCode> {
        self.compiler.set_member_decoration(id, index, decoration, argument)
    }

    pub fn get_entry_points(&self) -> Result<Vec<EntryPoint>, ErrorCode> {
        self.compiler.get_entry_points()
    }

    /// Name the entry point carries in the generated source
    ///
    /// Only meaningful after a successful compile.
    pub fn get_cleansed_entry_point_name(
        &self,
        entry_point_name: &str,
        execution_model: ExecutionModel,
    ) -> Result<String, ErrorCode> {
        if !self.compiler.has_been_compiled {
            return Err(ErrorCode::CompilationError(String::from(
                "`compile` must be called first to get the cleansed entry point name",
            )));
        }
        self.compiler.get_cleansed_entry_point_name(entry_point_name, execution_model)
    }

    pub fn get_shader_resources(&self) -> Result<ShaderResources, ErrorCode> {
        self.compiler.get_shader_resources()
    }

    pub fn get_specialization_constants(&self) -> Result<Vec<SpecializationConstant>, ErrorCode> {
        self.compiler.get_specialization_constants()
    }

    pub fn get_work_group_size_specialization_constants(
        &self,
    ) -> Result<WorkGroupSizeSpecializationConstants, ErrorCode> {
        self.compiler.get_work_group_size_specialization_constants()
    }

    /// Override the default of a scalar specialization constant
    pub fn set_scalar_constant(&mut self, id: u32, value: u64) -> Result<(), ErrorCode> {
        self.compiler.set_scalar_constant(id, value)
    }

    pub fn get_type(&self, id: u32) -> Result<Type, ErrorCode> {
        self.compiler.get_type(id)
    }

    pub fn get_declared_struct_size(&self, id: u32) -> Result<u32, ErrorCode> {
        self.compiler.get_declared_struct_size(id)
    }

    pub fn get_declared_struct_member_size(&self, id: u32, index: u32) -> Result<u32, ErrorCode> {
        self.compiler.get_declared_struct_member_size(id, index)
    }

    /// Rename whichever of `resources` sits at `location`
    pub fn rename_interface_variable(
        &mut self,
        resources: &[Resource],
        location: u32,
        new_name: &str,
    ) -> Result<(), ErrorCode> {
        self.compiler.rename_interface_variable(resources, location, new_name)
    }

    pub fn get_active_buffer_ranges(&self, id: u32) -> Result<Vec<BufferRange>, ErrorCode> {
        self.compiler.get_active_buffer_ranges(id)
    }
}
