//! Unit tests for layout.rs

use crate::error::Error;
use crate::fixtures;
use crate::ir::ParsedModule;
use crate::layout::{declared_struct_member_size, declared_struct_size};
use rspirv::dr::Operand;
use spirv::{Decoration, Word};

fn block_named(module: &ParsedModule, name: &str) -> Word {
    (1..512)
        .find(|id| module.annotations().name(*id) == Some(name))
        .unwrap()
}

#[test]
fn test_vector_block_size() {
    let module = ParsedModule::parse(&fixtures::uniform_fragment()).unwrap();
    let block = block_named(&module, "UniformBufferObject");
    assert_eq!(declared_struct_member_size(&module, block, 0).unwrap(), 16);
    assert_eq!(declared_struct_size(&module, block).unwrap(), 16);
}

#[test]
fn test_matrix_and_scalar_members() {
    let module = ParsedModule::parse(&fixtures::vertex_passthrough()).unwrap();
    let block = block_named(&module, "uniform_buffer_object");
    // mat4, column major, MatrixStride 16
    assert_eq!(declared_struct_member_size(&module, block, 0).unwrap(), 64);
    assert_eq!(declared_struct_member_size(&module, block, 1).unwrap(), 4);
    assert_eq!(declared_struct_size(&module, block).unwrap(), 68);
}

#[test]
fn test_array_member_uses_array_stride() {
    let module = ParsedModule::parse(&fixtures::compute_spec_workgroup()).unwrap();
    let params = block_named(&module, "Params");
    assert_eq!(declared_struct_member_size(&module, params, 0).unwrap(), 12);
    assert_eq!(declared_struct_member_size(&module, params, 1).unwrap(), 64);
    assert_eq!(declared_struct_size(&module, params).unwrap(), 144);
}

#[test]
fn test_runtime_array_contributes_nothing() {
    let module = ParsedModule::parse(&fixtures::compute_spec_workgroup()).unwrap();
    let data = block_named(&module, "Data");
    assert_eq!(declared_struct_member_size(&module, data, 0).unwrap(), 0);
    assert_eq!(declared_struct_size(&module, data).unwrap(), 0);
}

#[test]
fn test_row_major_matrix_uses_vecsize() {
    let mut module = ParsedModule::parse(&fixtures::vertex_passthrough()).unwrap();
    let block = block_named(&module, "uniform_buffer_object");
    module.annotations_mut().set_member_decoration(block, 0, Decoration::RowMajor, Vec::new());
    assert_eq!(declared_struct_member_size(&module, block, 0).unwrap(), 64);
}

#[test]
fn test_missing_offset_is_reported() {
    let mut module = ParsedModule::parse(&fixtures::uniform_fragment()).unwrap();
    let block = block_named(&module, "UniformBufferObject");
    module.annotations_mut().unset_member_decoration(block, 0, Decoration::Offset);

    assert_eq!(
        declared_struct_size(&module, block),
        Err(Error::InvalidArgument("Struct member does not have Offset set.".to_string()))
    );
}

#[test]
fn test_offset_edit_moves_struct_end() {
    let mut module = ParsedModule::parse(&fixtures::uniform_fragment()).unwrap();
    let block = block_named(&module, "UniformBufferObject");
    module
        .annotations_mut()
        .set_member_decoration(block, 0, Decoration::Offset, vec![Operand::LiteralBit32(16)]);
    assert_eq!(declared_struct_size(&module, block).unwrap(), 32);
}

#[test]
fn test_errors_for_non_struct_and_bad_index() {
    let module = ParsedModule::parse(&fixtures::uniform_fragment()).unwrap();
    let block = block_named(&module, "UniformBufferObject");
    let ubo = block_named(&module, "ubo");
    let vec4 = module.type_of(block).unwrap().member_types[0];

    assert!(matches!(
        declared_struct_member_size(&module, block, 3),
        Err(Error::InvalidArgument(msg)) if msg.contains("out of range")
    ));
    assert!(matches!(declared_struct_size(&module, vec4), Err(Error::InvalidArgument(_))));
    assert!(declared_struct_size(&module, ubo).is_err());
}

#[test]
fn test_oversized_array_is_rejected() {
    let mut module = ParsedModule::parse(&fixtures::compute_spec_workgroup()).unwrap();
    let params = block_named(&module, "Params");
    let weights = module.type_of(params).unwrap().member_types[1];
    module
        .annotations_mut()
        .set_decoration(weights, Decoration::ArrayStride, vec![Operand::LiteralBit32(0x4000_0000)]);

    assert!(matches!(
        declared_struct_member_size(&module, params, 1),
        Err(Error::InvalidArgument(msg)) if msg.contains("32 bits")
    ));
}

#[test]
fn test_offset_past_u32_is_rejected() {
    let mut module = ParsedModule::parse(&fixtures::uniform_fragment()).unwrap();
    let block = block_named(&module, "UniformBufferObject");
    module
        .annotations_mut()
        .set_member_decoration(block, 0, Decoration::Offset, vec![Operand::LiteralBit32(u32::MAX - 4)]);

    assert!(matches!(declared_struct_size(&module, block), Err(Error::InvalidArgument(_))));
}
