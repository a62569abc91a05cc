//! GLSL / ESSL output

use naga::back::glsl::{self, Version, WriterFlags};
use naga::proc::BoundsCheckPolicies;
use spirv::{Decoration, ExecutionModel};
use std::collections::BTreeMap;

use super::{Emitted, VertexOptions};
use crate::error::Result;
use crate::ir::ParsedModule;

const SOURCE: &str = "shader_cross::backend::glsl";

/// Name every GLSL entry point is emitted as
pub const GLSL_ENTRY_POINT_NAME: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlslOptions {
    /// `#version` number, e.g. 330, 450, 310 with `es`
    pub version: u32,
    pub es: bool,
    pub vertex: VertexOptions,
    /// Host supports `ARB_shader_draw_parameters`, so `gl_BaseInstance` and
    /// `gl_BaseVertex` may be nonzero
    pub support_nonzero_base_instance: bool,
    /// Zero-fill workgroup variables before first use
    pub force_zero_initialized_variables: bool,
}

impl Default for GlslOptions {
    fn default() -> Self {
        Self {
            version: 450,
            es: false,
            vertex: VertexOptions::default(),
            support_nonzero_base_instance: true,
            force_zero_initialized_variables: false,
        }
    }
}

impl GlslOptions {
    fn naga_version(&self) -> Result<Version> {
        let Ok(version) = u16::try_from(self.version) else {
            crate::cross_bail!(SOURCE, InvalidArgument, "GLSL version {} is out of range", self.version);
        };
        Ok(if self.es {
            Version::Embedded { version, is_webgl: false }
        } else {
            Version::Desktop(version)
        })
    }

    fn writer_flags(&self) -> WriterFlags {
        let mut flags = WriterFlags::empty();
        // The writer's adjustment also negates Y; see `flip_in_frontend`
        if self.vertex.fixup_clipspace {
            flags |= WriterFlags::ADJUST_COORDINATE_SPACE;
        }
        if self.support_nonzero_base_instance {
            flags |= WriterFlags::DRAW_PARAMETERS;
        }
        flags
    }

    /// Y is negated exactly once when `flip_vert_y` is set
    fn flip_in_frontend(&self) -> bool {
        self.vertex.flip_vert_y != self.vertex.fixup_clipspace
    }
}

/// `(set, binding) -> binding` for every decorated resource
fn binding_map(module: &ParsedModule) -> Result<glsl::BindingMap> {
    let annotations = module.annotations();
    let mut map = BTreeMap::new();
    for variable in module.variables() {
        if !annotations.has_decoration(variable.id, Decoration::Binding) {
            continue;
        }
        let binding = annotations.decoration(variable.id, Decoration::Binding);
        let group = annotations.decoration(variable.id, Decoration::DescriptorSet);
        let Ok(slot) = u8::try_from(binding) else {
            crate::cross_bail!(SOURCE, Unsupported, "Binding {} does not fit a GLSL binding slot", binding);
        };
        map.insert(naga::ResourceBinding { group, binding }, slot);
    }
    Ok(map)
}

fn insert_header_lines(source: &mut String, header_lines: &[String]) {
    if header_lines.is_empty() {
        return;
    }
    let at = source.find('\n').map_or(source.len(), |newline| newline + 1);
    let mut block = String::new();
    for line in header_lines {
        block.push_str(line);
        block.push('\n');
    }
    source.insert_str(at, &block);
}

/// Write `entry_point` of `module` as GLSL
pub(crate) fn compile(
    module: &mut ParsedModule,
    entry_point: &str,
    model: ExecutionModel,
    options: &GlslOptions,
    header_lines: &[String],
) -> Result<Emitted> {
    let version = options.naga_version()?;
    let binding_map = binding_map(module)?;
    let lowered = super::lower(&module.assemble(), options.flip_in_frontend())?;

    let naga_options = glsl::Options {
        version,
        writer_flags: options.writer_flags(),
        binding_map,
        zero_initialize_workgroup_memory: options.force_zero_initialized_variables,
    };
    let pipeline = glsl::PipelineOptions {
        shader_stage: super::naga_stage(model)?,
        entry_point: entry_point.to_string(),
        multiview: None,
    };

    let mut source = String::new();
    {
        let mut writer = glsl::Writer::new(
            &mut source,
            &lowered.module,
            &lowered.info,
            &naga_options,
            &pipeline,
            BoundsCheckPolicies::default(),
        )
        .map_err(|error| crate::cross_err!(SOURCE, Codegen, "GLSL writer setup failed: {}", error))?;
        writer
            .write()
            .map_err(|error| crate::cross_err!(SOURCE, Codegen, "GLSL generation failed: {}", error))?;
    }
    insert_header_lines(&mut source, header_lines);

    crate::cross_debug!(SOURCE, "Generated {} bytes of GLSL for {}", source.len(), entry_point);
    Ok(Emitted {
        source,
        entry_point_names: vec![(entry_point.to_string(), model, GLSL_ENTRY_POINT_NAME.to_string())],
    })
}
