//! Compiler object
//!
//! A [`Compiler`] owns one parsed module and the configuration of the backend
//! it was created for. The backend is fixed at construction; calls that only
//! make sense for another backend fail with [`Error::InvalidArgument`].
//!
//! [`Error::InvalidArgument`]: crate::Error::InvalidArgument

use spirv::{Decoration, ExecutionModel, Word};

use crate::backend::glsl::{self, GlslOptions};
use crate::backend::hlsl::{self, HlslOptions};
use crate::backend::msl::{self, MslOptions, MslResourceBinding, MslVertexAttribute};
use crate::backend::{Backend, Emitted};
use crate::error::Result;
use crate::ir::{decoration_operands, ParsedModule, SpirType};
use crate::layout;
use crate::reflect::{
    self, BufferRange, CombinedImageSampler, EntryPoint, Resource, ShaderResources, SpecializationConstant,
};

const SOURCE: &str = "shader_cross::compiler";

/// Per-backend configuration
#[derive(Debug, Clone)]
enum Target {
    Base,
    Glsl {
        options: GlslOptions,
        header_lines: Vec<String>,
    },
    Hlsl(HlslOptions),
    Msl(MslOptions),
}

impl Target {
    fn for_backend(backend: Backend) -> Self {
        match backend {
            Backend::Base => Target::Base,
            Backend::Glsl => Target::Glsl {
                options: GlslOptions::default(),
                header_lines: Vec::new(),
            },
            Backend::Hlsl => Target::Hlsl(HlslOptions::default()),
            Backend::Msl => Target::Msl(MslOptions::default()),
        }
    }

    fn backend(&self) -> Backend {
        match self {
            Target::Base => Backend::Base,
            Target::Glsl { .. } => Backend::Glsl,
            Target::Hlsl(_) => Backend::Hlsl,
            Target::Msl(_) => Backend::Msl,
        }
    }
}

fn wrong_backend(expected: Backend) -> crate::Error {
    crate::cross_err!(SOURCE, InvalidArgument, "Compiler is not a {} compiler", expected)
}

/// A parsed module plus the state of one target backend
#[derive(Debug)]
pub struct Compiler {
    module: ParsedModule,
    target: Target,
    /// Entry point compiled by single-entry backends (GLSL)
    entry_point: Option<(String, ExecutionModel)>,
    /// (declared name, model, emitted name) from the last compile
    cleansed_names: Vec<(String, ExecutionModel, String)>,
    combined_image_samplers: Vec<CombinedImageSampler>,
}

impl Compiler {
    /// Parse `words` and create a compiler for `backend`
    pub fn new(words: &[u32], backend: Backend) -> Result<Self> {
        let module = ParsedModule::parse(words)?;
        crate::cross_info!(
            SOURCE,
            "Created {} compiler ({} words, {} entry points)",
            backend,
            words.len(),
            module.entry_points().len()
        );
        Ok(Self {
            module,
            target: Target::for_backend(backend),
            entry_point: None,
            cleansed_names: Vec::new(),
            combined_image_samplers: Vec::new(),
        })
    }

    pub fn backend(&self) -> Backend {
        self.target.backend()
    }

    pub fn module(&self) -> &ParsedModule {
        &self.module
    }

    // ===== DECORATIONS & NAMES =====

    /// Literal argument of `decoration` on `id`; 1 for a flag, 0 when absent
    pub fn decoration(&self, id: Word, decoration: Decoration) -> u32 {
        self.module.annotations().decoration(id, decoration)
    }

    pub fn set_decoration(&mut self, id: Word, decoration: Decoration, value: u32) -> Result<()> {
        let operands = decoration_operands(decoration, value)?;
        self.module.annotations_mut().set_decoration(id, decoration, operands);
        Ok(())
    }

    pub fn unset_decoration(&mut self, id: Word, decoration: Decoration) {
        self.module.annotations_mut().unset_decoration(id, decoration);
    }

    /// Debug name of `id`, empty when it has none
    pub fn name(&self, id: Word) -> String {
        self.module.annotations().name(id).unwrap_or_default().to_string()
    }

    pub fn set_name(&mut self, id: Word, name: &str) {
        self.module.annotations_mut().set_name(id, name);
    }

    pub fn member_name(&self, id: Word, index: u32) -> String {
        self.module
            .annotations()
            .member_name(id, index)
            .unwrap_or_default()
            .to_string()
    }

    pub fn member_decoration(&self, id: Word, index: u32, decoration: Decoration) -> u32 {
        self.module.annotations().member_decoration(id, index, decoration)
    }

    pub fn set_member_decoration(&mut self, id: Word, index: u32, decoration: Decoration, value: u32) -> Result<()> {
        let operands = decoration_operands(decoration, value)?;
        self.module
            .annotations_mut()
            .set_member_decoration(id, index, decoration, operands);
        Ok(())
    }

    // ===== ENTRY POINTS =====

    pub fn entry_points(&self) -> Vec<EntryPoint> {
        reflect::entry_points(&self.module)
    }

    /// Select the entry point GLSL output is generated for
    ///
    /// Without a selection the first declared entry point is compiled.
    pub fn set_entry_point(&mut self, name: &str, model: ExecutionModel) -> Result<()> {
        self.glsl_options()?;
        if !self.has_entry_point(name, model) {
            crate::cross_bail!(SOURCE, InvalidArgument, "Entry point does not exist.");
        }
        self.entry_point = Some((name.to_string(), model));
        Ok(())
    }

    fn has_entry_point(&self, name: &str, model: ExecutionModel) -> bool {
        self.module
            .entry_points()
            .iter()
            .any(|entry| entry.name == name && entry.model == model)
    }

    /// Name the entry point received in the last generated source
    ///
    /// Before the first compile (or for entry points the last compile did
    /// not emit) this is the declared name.
    pub fn cleansed_entry_point_name(&self, name: &str, model: ExecutionModel) -> Result<String> {
        if let Some((_, _, emitted)) = self
            .cleansed_names
            .iter()
            .find(|(declared, declared_model, _)| declared == name && *declared_model == model)
        {
            return Ok(emitted.clone());
        }
        if self.has_entry_point(name, model) {
            return Ok(name.to_string());
        }
        crate::cross_bail!(SOURCE, InvalidArgument, "Entry point does not exist.")
    }

    // ===== RESOURCES & CONSTANTS =====

    pub fn shader_resources(&self) -> ShaderResources {
        reflect::shader_resources(&self.module)
    }

    pub fn specialization_constants(&self) -> Vec<SpecializationConstant> {
        reflect::specialization_constants(&self.module)
    }

    pub fn work_group_size_specialization_constants(&self) -> [SpecializationConstant; 3] {
        reflect::work_group_size_specialization_constants(&self.module)
    }

    pub fn set_scalar_constant(&mut self, id: Word, value: u64) -> Result<()> {
        self.module.set_scalar_constant(id, value)
    }

    pub fn spirv_type(&self, id: Word) -> Result<&SpirType> {
        self.module.type_of(id)
    }

    pub fn declared_struct_size(&self, id: Word) -> Result<u32> {
        layout::declared_struct_size(&self.module, id)
    }

    pub fn declared_struct_member_size(&self, id: Word, index: u32) -> Result<u32> {
        layout::declared_struct_member_size(&self.module, id, index)
    }

    pub fn rename_interface_variable(&mut self, resources: &[Resource], location: u32, name: &str) {
        reflect::rename_interface_variable(&mut self.module, resources, location, name);
    }

    pub fn active_buffer_ranges(&self, id: Word) -> Result<Vec<BufferRange>> {
        reflect::active_buffer_ranges(&self.module, id)
    }

    // ===== COMBINED IMAGE SAMPLERS =====

    fn require_combining_backend(&self) -> Result<()> {
        match self.target {
            Target::Glsl { .. } | Target::Msl(_) => Ok(()),
            Target::Base | Target::Hlsl(_) => crate::cross_bail!(
                SOURCE,
                InvalidArgument,
                "Combined image samplers are only tracked by GLSL and MSL compilers"
            ),
        }
    }

    /// Scan for separate image/sampler pairs; ids of known pairs are kept
    pub fn build_combined_image_samplers(&mut self) -> Result<()> {
        self.require_combining_backend()?;
        self.combined_image_samplers =
            reflect::build_combined_image_samplers(&mut self.module, &self.combined_image_samplers);
        crate::cross_debug!(
            SOURCE,
            "Found {} combined image samplers",
            self.combined_image_samplers.len()
        );
        Ok(())
    }

    pub fn combined_image_samplers(&self) -> Result<&[CombinedImageSampler]> {
        self.require_combining_backend()?;
        Ok(&self.combined_image_samplers)
    }

    // ===== BACKEND OPTIONS =====

    pub fn glsl_options(&self) -> Result<&GlslOptions> {
        match &self.target {
            Target::Glsl { options, .. } => Ok(options),
            _ => Err(wrong_backend(Backend::Glsl)),
        }
    }

    pub fn set_glsl_options(&mut self, new_options: GlslOptions) -> Result<()> {
        match &mut self.target {
            Target::Glsl { options, .. } => {
                *options = new_options;
                Ok(())
            }
            _ => Err(wrong_backend(Backend::Glsl)),
        }
    }

    /// Line inserted right after `#version` in generated GLSL
    pub fn add_header_line(&mut self, line: &str) -> Result<()> {
        match &mut self.target {
            Target::Glsl { header_lines, .. } => {
                header_lines.push(line.to_string());
                Ok(())
            }
            _ => Err(wrong_backend(Backend::Glsl)),
        }
    }

    pub fn hlsl_options(&self) -> Result<&HlslOptions> {
        match &self.target {
            Target::Hlsl(options) => Ok(options),
            _ => Err(wrong_backend(Backend::Hlsl)),
        }
    }

    pub fn set_hlsl_options(&mut self, new_options: HlslOptions) -> Result<()> {
        match &mut self.target {
            Target::Hlsl(options) => {
                new_options.validate()?;
                *options = new_options;
                Ok(())
            }
            _ => Err(wrong_backend(Backend::Hlsl)),
        }
    }

    pub fn msl_options(&self) -> Result<&MslOptions> {
        match &self.target {
            Target::Msl(options) => Ok(options),
            _ => Err(wrong_backend(Backend::Msl)),
        }
    }

    pub fn set_msl_options(&mut self, new_options: MslOptions) -> Result<()> {
        match &mut self.target {
            Target::Msl(options) => {
                *options = new_options;
                Ok(())
            }
            _ => Err(wrong_backend(Backend::Msl)),
        }
    }

    pub fn is_rasterization_enabled(&self) -> Result<bool> {
        let options = self.msl_options()?;
        Ok(msl::rasterization_enabled(&self.module, options))
    }

    // ===== COMPILE =====

    fn glsl_entry_point(&self) -> Result<(String, ExecutionModel)> {
        if let Some(selected) = &self.entry_point {
            return Ok(selected.clone());
        }
        match self.module.entry_points().first() {
            Some(entry) => Ok((entry.name.clone(), entry.model)),
            None => crate::cross_bail!(SOURCE, InvalidArgument, "Module has no entry point to compile"),
        }
    }

    /// Generate source for the configured backend
    pub fn compile(&mut self) -> Result<String> {
        self.compile_msl(&mut [], &mut [])
    }

    /// Generate source, with Metal vertex attribute and resource binding
    /// overrides
    ///
    /// The overrides only apply to MSL compilers; their `used_by_shader`
    /// fields are updated in place.
    pub fn compile_msl(
        &mut self,
        vertex_attributes: &mut [MslVertexAttribute],
        resource_bindings: &mut [MslResourceBinding],
    ) -> Result<String> {
        let emitted: Emitted = match &self.target {
            Target::Base => crate::cross_bail!(
                SOURCE,
                Unsupported,
                "A base compiler only reflects; create a GLSL, HLSL or MSL compiler to generate source"
            ),
            Target::Glsl { options, header_lines } => {
                let (name, model) = self.glsl_entry_point()?;
                glsl::compile(&mut self.module, &name, model, options, header_lines)?
            }
            Target::Hlsl(options) => hlsl::compile(&mut self.module, options)?,
            Target::Msl(options) => msl::compile(&mut self.module, options, vertex_attributes, resource_bindings)?,
        };
        crate::cross_info!(
            SOURCE,
            "Compiled {} ({} bytes, {} entry points)",
            self.backend(),
            emitted.source.len(),
            emitted.entry_point_names.len()
        );
        self.cleansed_names = emitted.entry_point_names;
        Ok(emitted.source)
    }
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
