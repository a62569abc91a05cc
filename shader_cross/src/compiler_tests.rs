//! Unit tests for Compiler

use super::*;
use crate::error::Error;
use crate::fixtures;

fn id_named(compiler: &Compiler, name: &str) -> Word {
    (1..512)
        .find(|id| compiler.name(*id) == name)
        .unwrap_or_else(|| panic!("no id named {}", name))
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_new_rejects_short_input() {
    let result = Compiler::new(&[0x0723_0203, 0x0001_0000], Backend::Glsl);
    assert!(matches!(result, Err(Error::Parse(_))));
}

#[test]
fn test_new_rejects_bad_magic() {
    let mut words = fixtures::uniform_fragment();
    words[0] = 0x1234_5678;
    assert!(matches!(Compiler::new(&words, Backend::Base), Err(Error::Parse(_))));
}

#[test]
fn test_backend_is_fixed() {
    let compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Hlsl).unwrap();
    assert_eq!(compiler.backend(), Backend::Hlsl);
}

// ============================================================================
// DECORATIONS & NAMES
// ============================================================================

#[test]
fn test_decoration_round_trip() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Glsl).unwrap();
    let ubo = id_named(&compiler, "ubo");

    assert_eq!(compiler.decoration(ubo, Decoration::Binding), 0);
    compiler.set_decoration(ubo, Decoration::Binding, 3).unwrap();
    assert_eq!(compiler.decoration(ubo, Decoration::Binding), 3);

    compiler.unset_decoration(ubo, Decoration::Binding);
    assert_eq!(compiler.decoration(ubo, Decoration::Binding), 0);
}

#[test]
fn test_flag_decoration_reads_one() {
    let compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Base).unwrap();
    let block = id_named(&compiler, "UniformBufferObject");
    assert_eq!(compiler.decoration(block, Decoration::Block), 1);
    assert_eq!(compiler.decoration(block, Decoration::BufferBlock), 0);
}

#[test]
fn test_set_decoration_rejects_unknown_builtin() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Base).unwrap();
    let out_color = id_named(&compiler, "out_color");
    assert!(matches!(
        compiler.set_decoration(out_color, Decoration::BuiltIn, 0xffff),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_rounding_mode_decoration_round_trip() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Base).unwrap();
    let out_color = id_named(&compiler, "out_color");
    compiler.set_decoration(out_color, Decoration::FPRoundingMode, 2).unwrap();
    assert_eq!(compiler.decoration(out_color, Decoration::FPRoundingMode), 2);
}

#[test]
fn test_set_decoration_rejects_string_decorations() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Base).unwrap();
    let out_color = id_named(&compiler, "out_color");
    assert!(matches!(
        compiler.set_decoration(out_color, Decoration::UserSemantic, 1),
        Err(Error::InvalidArgument(_))
    ));
    assert!(!compiler.module().annotations().has_decoration(out_color, Decoration::UserSemantic));
}

#[test]
fn test_names() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Base).unwrap();
    let block = id_named(&compiler, "UniformBufferObject");
    assert_eq!(compiler.member_name(block, 0), "color");
    assert_eq!(compiler.member_name(block, 9), "");

    compiler.set_name(block, "Renamed");
    assert_eq!(compiler.name(block), "Renamed");
}

#[test]
fn test_member_decoration() {
    let mut compiler = Compiler::new(&fixtures::vertex_passthrough(), Backend::Base).unwrap();
    let block = id_named(&compiler, "uniform_buffer_object");
    assert_eq!(compiler.member_decoration(block, 1, Decoration::Offset), 64);

    compiler.set_member_decoration(block, 1, Decoration::Offset, 80).unwrap();
    assert_eq!(compiler.member_decoration(block, 1, Decoration::Offset), 80);
    assert_eq!(compiler.declared_struct_size(block).unwrap(), 84);
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

#[test]
fn test_cleansed_name_before_compile() {
    let compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Msl).unwrap();
    assert_eq!(
        compiler.cleansed_entry_point_name("main", ExecutionModel::Fragment).unwrap(),
        "main"
    );
}

#[test]
fn test_cleansed_name_unknown_entry_point() {
    let compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Glsl).unwrap();
    let error = compiler
        .cleansed_entry_point_name("main", ExecutionModel::Vertex)
        .unwrap_err();
    assert_eq!(error.message(), "Entry point does not exist.");
}

#[test]
fn test_cleansed_name_after_compile() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Msl).unwrap();
    let source = compiler.compile().unwrap();
    let cleansed = compiler
        .cleansed_entry_point_name("main", ExecutionModel::Fragment)
        .unwrap();
    assert!(!cleansed.is_empty());
    assert!(source.contains(cleansed.as_str()));
}

#[test]
fn test_set_entry_point() {
    let mut compiler = Compiler::new(&fixtures::vertex_passthrough(), Backend::Glsl).unwrap();
    assert!(compiler.set_entry_point("main", ExecutionModel::Vertex).is_ok());
    assert!(matches!(
        compiler.set_entry_point("other", ExecutionModel::Vertex),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_set_entry_point_selects_glsl_output() {
    let mut compiler = Compiler::new(&fixtures::two_fragment_entry_points(), Backend::Glsl).unwrap();
    let first = compiler.compile().unwrap();
    assert!(first.contains(") uniform "));

    compiler.set_entry_point("tint", ExecutionModel::Fragment).unwrap();
    let second = compiler.compile().unwrap();
    assert!(!second.contains(") uniform "));
    assert_eq!(
        compiler
            .cleansed_entry_point_name("tint", ExecutionModel::Fragment)
            .unwrap(),
        "main"
    );
}

#[test]
fn test_set_entry_point_needs_glsl() {
    let mut compiler = Compiler::new(&fixtures::vertex_passthrough(), Backend::Hlsl).unwrap();
    assert!(matches!(
        compiler.set_entry_point("main", ExecutionModel::Vertex),
        Err(Error::InvalidArgument(_))
    ));
}

// ============================================================================
// BACKEND DISPATCH
// ============================================================================

#[test]
fn test_wrong_backend_options() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Glsl).unwrap();
    assert!(compiler.glsl_options().is_ok());
    assert!(matches!(compiler.hlsl_options(), Err(Error::InvalidArgument(_))));
    assert!(matches!(
        compiler.set_msl_options(MslOptions::default()),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(compiler.is_rasterization_enabled(), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_combined_image_samplers_need_combining_backend() {
    let mut hlsl = Compiler::new(&fixtures::textured_fragment(), Backend::Hlsl).unwrap();
    assert!(hlsl.build_combined_image_samplers().is_err());
    assert!(hlsl.combined_image_samplers().is_err());

    let mut glsl = Compiler::new(&fixtures::textured_fragment(), Backend::Glsl).unwrap();
    assert!(glsl.combined_image_samplers().unwrap().is_empty());
    glsl.build_combined_image_samplers().unwrap();
    assert_eq!(glsl.combined_image_samplers().unwrap().len(), 1);
}

#[test]
fn test_base_compile_fails() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Base).unwrap();
    assert!(matches!(compiler.compile(), Err(Error::Unsupported(_))));
}

#[test]
fn test_hlsl_options_are_validated() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Hlsl).unwrap();
    let rejected = HlslOptions { shader_model: 40, ..Default::default() };
    assert!(compiler.set_hlsl_options(rejected).is_err());
    assert_eq!(compiler.hlsl_options().unwrap().shader_model, 50);
}

// ============================================================================
// COMPILE
// ============================================================================

#[test]
fn test_glsl_compile_is_deterministic() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Glsl).unwrap();
    let first = compiler.compile().unwrap();
    let second = compiler.compile().unwrap();
    assert_eq!(first, second);
    assert!(first.contains("uniform"));
}

#[test]
fn test_renamed_block_reaches_output() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Glsl).unwrap();
    let block = id_named(&compiler, "UniformBufferObject");
    compiler.set_name(block, "MaterialParams");

    let source = compiler.compile().unwrap();
    assert!(source.contains("MaterialParams"));
    assert!(!source.contains("UniformBufferObject"));
}

#[test]
fn test_header_lines() {
    let mut compiler = Compiler::new(&fixtures::uniform_fragment(), Backend::Glsl).unwrap();
    compiler.add_header_line("// generated").unwrap();
    let source = compiler.compile().unwrap();
    assert_eq!(source.lines().nth(1), Some("// generated"));
}

#[test]
fn test_msl_rasterization_query() {
    let mut compiler = Compiler::new(&fixtures::vertex_passthrough(), Backend::Msl).unwrap();
    assert!(compiler.is_rasterization_enabled().unwrap());

    let options = MslOptions {
        disable_rasterization: true,
        ..compiler.msl_options().unwrap().clone()
    };
    compiler.set_msl_options(options).unwrap();
    assert!(!compiler.is_rasterization_enabled().unwrap());
}
