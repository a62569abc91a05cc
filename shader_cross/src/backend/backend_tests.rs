//! Unit tests for the code generation backends

use super::glsl::{self, GlslOptions};
use super::hlsl::{self, HlslOptions, RootConstants};
use super::msl::{self, MslOptions, MslResourceBinding, MslVertexAttribute};
use super::*;
use crate::error::Error;
use crate::fixtures;
use crate::ir::ParsedModule;

fn parse(words: Vec<u32>) -> ParsedModule {
    ParsedModule::parse(&words).unwrap()
}

// ============================================================================
// LOWERING
// ============================================================================

#[test]
fn test_lower_uniform_fragment() {
    let lowered = lower(&fixtures::uniform_fragment(), false).unwrap();
    assert_eq!(lowered.module.entry_points.len(), 1);
    assert_eq!(lowered.module.entry_points[0].name, "main");
    assert_eq!(lowered.module.entry_points[0].stage, naga::ShaderStage::Fragment);
}

#[test]
fn test_lower_rejects_garbage() {
    let words = [0x0723_0203, 0x0001_0000, 0, 1, 0, 0xdead_beef];
    assert!(matches!(lower(&words, false), Err(Error::Codegen(_))));
}

#[test]
fn test_stage_mapping() {
    assert_eq!(naga_stage(ExecutionModel::Vertex).unwrap(), naga::ShaderStage::Vertex);
    assert_eq!(naga_stage(ExecutionModel::GLCompute).unwrap(), naga::ShaderStage::Compute);
    assert_eq!(execution_model(naga::ShaderStage::Fragment), ExecutionModel::Fragment);
    assert!(matches!(naga_stage(ExecutionModel::Geometry), Err(Error::Unsupported(_))));
}

#[test]
fn test_backend_display() {
    assert_eq!(Backend::Glsl.to_string(), "GLSL");
    assert_eq!(Backend::Base.to_string(), "base");
}

// ============================================================================
// GLSL
// ============================================================================

#[test]
fn test_glsl_default_version() {
    let mut module = parse(fixtures::uniform_fragment());
    let emitted = glsl::compile(&mut module, "main", ExecutionModel::Fragment, &GlslOptions::default(), &[]).unwrap();

    assert!(emitted.source.starts_with("#version 450"));
    assert_eq!(
        emitted.entry_point_names,
        vec![("main".to_string(), ExecutionModel::Fragment, "main".to_string())]
    );
}

#[test]
fn test_glsl_es_version() {
    let mut module = parse(fixtures::uniform_fragment());
    let options = GlslOptions { version: 310, es: true, ..Default::default() };
    let emitted = glsl::compile(&mut module, "main", ExecutionModel::Fragment, &options, &[]).unwrap();
    assert!(emitted.source.starts_with("#version 310 es"));
}

#[test]
fn test_glsl_header_lines_follow_version() {
    let mut module = parse(fixtures::uniform_fragment());
    let header = vec!["// first".to_string(), "#define SHADOWS 1".to_string()];
    let emitted =
        glsl::compile(&mut module, "main", ExecutionModel::Fragment, &GlslOptions::default(), &header).unwrap();

    let lines: Vec<&str> = emitted.source.lines().take(3).collect();
    assert!(lines[0].starts_with("#version"));
    assert_eq!(lines[1], "// first");
    assert_eq!(lines[2], "#define SHADOWS 1");
}

#[test]
fn test_glsl_vertex_stage() {
    let mut module = parse(fixtures::vertex_passthrough());
    let emitted = glsl::compile(&mut module, "main", ExecutionModel::Vertex, &GlslOptions::default(), &[]).unwrap();
    assert!(emitted.source.contains("gl_Position"));
}

#[test]
fn test_glsl_wrong_stage_fails() {
    let mut module = parse(fixtures::uniform_fragment());
    let result = glsl::compile(&mut module, "main", ExecutionModel::Vertex, &GlslOptions::default(), &[]);
    assert!(matches!(result, Err(Error::Codegen(_))));
}

fn has_uniform_block(source: &str) -> bool {
    source
        .lines()
        .any(|line| line.starts_with("layout(") && line.contains(") uniform "))
}

#[test]
fn test_glsl_compiles_the_requested_entry_point() {
    let mut module = parse(fixtures::two_fragment_entry_points());
    let options = GlslOptions::default();

    let main = glsl::compile(&mut module, "main", ExecutionModel::Fragment, &options, &[]).unwrap();
    assert!(has_uniform_block(&main.source));

    let tint = glsl::compile(&mut module, "tint", ExecutionModel::Fragment, &options, &[]).unwrap();
    assert!(!has_uniform_block(&tint.source));
    assert_eq!(
        tint.entry_point_names,
        vec![("tint".to_string(), ExecutionModel::Fragment, "main".to_string())]
    );
}

#[test]
fn test_glsl_zero_initialized_workgroup_memory() {
    let mut module = parse(fixtures::workgroup_counter());
    let plain = glsl::compile(&mut module, "main", ExecutionModel::GLCompute, &GlslOptions::default(), &[]).unwrap();
    assert!(!plain.source.contains("gl_LocalInvocationID == uvec3(0u)"));

    let options = GlslOptions { force_zero_initialized_variables: true, ..Default::default() };
    let zeroed = glsl::compile(&mut module, "main", ExecutionModel::GLCompute, &options, &[]).unwrap();
    assert!(zeroed.source.contains("gl_LocalInvocationID == uvec3(0u)"));
    assert!(zeroed.source.contains("barrier();"));
}

// ============================================================================
// HLSL
// ============================================================================

#[test]
fn test_hlsl_default_options() {
    let mut module = parse(fixtures::uniform_fragment());
    let emitted = hlsl::compile(&mut module, &HlslOptions::default()).unwrap();

    assert_eq!(emitted.entry_point_names.len(), 1);
    let (declared, model, cleansed) = &emitted.entry_point_names[0];
    assert_eq!(declared, "main");
    assert_eq!(*model, ExecutionModel::Fragment);
    assert!(!cleansed.is_empty());
    assert!(emitted.source.contains(cleansed.as_str()));
}

#[test]
fn test_hlsl_vertex_with_push_constants() {
    let mut module = parse(fixtures::vertex_passthrough());
    let options = HlslOptions { shader_model: 51, ..Default::default() };
    assert!(hlsl::compile(&mut module, &options).is_ok());
}

#[test]
fn test_hlsl_shader_model_validation() {
    let old = HlslOptions { shader_model: 30, ..Default::default() };
    assert!(matches!(old.validate(), Err(Error::Unsupported(_))));

    let unknown = HlslOptions { shader_model: 55, ..Default::default() };
    assert!(matches!(unknown.validate(), Err(Error::Unsupported(_))));

    assert!(HlslOptions { shader_model: 60, ..Default::default() }.validate().is_ok());
}

#[test]
fn test_hlsl_root_constant_validation() {
    let reversed = HlslOptions {
        root_constants: vec![RootConstants { start: 16, end: 0, binding: 0, space: 0 }],
        ..Default::default()
    };
    assert!(matches!(reversed.validate(), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_hlsl_root_constants_must_cover_push_block() {
    let mut module = parse(fixtures::vertex_passthrough());
    let options = HlslOptions {
        root_constants: vec![RootConstants { start: 16, end: 32, binding: 0, space: 0 }],
        ..Default::default()
    };
    assert!(matches!(hlsl::compile(&mut module, &options), Err(Error::Unsupported(_))));

    let covering = HlslOptions {
        root_constants: vec![RootConstants { start: 0, end: 16, binding: 2, space: 1 }],
        ..Default::default()
    };
    assert!(hlsl::compile(&mut module, &covering).is_ok());
}

// ============================================================================
// MSL
// ============================================================================

#[test]
fn test_msl_default_options() {
    let mut module = parse(fixtures::uniform_fragment());
    let emitted = msl::compile(&mut module, &MslOptions::default(), &mut [], &mut []).unwrap();

    let (declared, _, cleansed) = &emitted.entry_point_names[0];
    assert_eq!(declared, "main");
    assert!(!cleansed.is_empty());
    assert!(emitted.source.contains(cleansed.as_str()));
    assert!(emitted.source.contains("metal_stdlib"));
}

#[test]
fn test_msl_marks_used_vertex_attributes() {
    let mut module = parse(fixtures::vertex_passthrough());
    let mut attributes = [
        MslVertexAttribute { location: 0, msl_stride: 32, ..Default::default() },
        MslVertexAttribute { location: 1, msl_offset: 16, msl_stride: 32, ..Default::default() },
        MslVertexAttribute { location: 5, used_by_shader: true, ..Default::default() },
    ];
    msl::compile(&mut module, &MslOptions::default(), &mut attributes, &mut []).unwrap();

    let used: Vec<bool> = attributes.iter().map(|attribute| attribute.used_by_shader).collect();
    assert_eq!(used, vec![true, true, false]);
}

#[test]
fn test_msl_marks_used_resource_bindings() {
    let mut module = parse(fixtures::vertex_passthrough());
    let binding = |stage, desc_set, binding| MslResourceBinding {
        stage,
        desc_set,
        binding,
        msl_buffer: 1,
        msl_texture: 0,
        msl_sampler: 0,
        used_by_shader: false,
    };
    let mut bindings = [
        binding(ExecutionModel::Vertex, 0, 0),
        binding(ExecutionModel::Fragment, 0, 0),
        binding(ExecutionModel::Vertex, 3, 7),
    ];
    msl::compile(&mut module, &MslOptions::default(), &mut [], &mut bindings).unwrap();

    let used: Vec<bool> = bindings.iter().map(|binding| binding.used_by_shader).collect();
    assert_eq!(used, vec![true, false, false]);
}

#[test]
fn test_msl_version_out_of_range() {
    let mut module = parse(fixtures::uniform_fragment());
    let options = MslOptions { version: 3_000_000, ..Default::default() };
    assert!(matches!(
        msl::compile(&mut module, &options, &mut [], &mut []),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_rasterization() {
    let vertex = parse(fixtures::vertex_passthrough());
    assert!(msl::rasterization_enabled(&vertex, &MslOptions::default()));

    let disabled = MslOptions { disable_rasterization: true, ..Default::default() };
    assert!(!msl::rasterization_enabled(&vertex, &disabled));

    let fragment = parse(fixtures::uniform_fragment());
    assert!(msl::rasterization_enabled(&fragment, &MslOptions::default()));
}
