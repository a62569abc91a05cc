//! Unit tests for the reflection functions

use crate::error::Error;
use crate::fixtures;
use crate::ir::ParsedModule;
use crate::reflect::{self, BufferRange, SpecializationConstant, WorkGroupSize};
use spirv::{BuiltIn, Decoration, ExecutionModel, Word};

fn id_named(module: &ParsedModule, name: &str) -> Word {
    (1..512)
        .find(|id| module.annotations().name(*id) == Some(name))
        .unwrap_or_else(|| panic!("no id named {}", name))
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

#[test]
fn test_entry_points() {
    let module = ParsedModule::parse(&fixtures::compute_spec_workgroup()).unwrap();
    let entries = reflect::entry_points(&module);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "main");
    assert_eq!(entries[0].execution_model, ExecutionModel::GLCompute);
    assert_eq!(entries[0].work_group_size, WorkGroupSize { x: 1, y: 1, z: 1 });
}

// ============================================================================
// SHADER RESOURCES
// ============================================================================

#[test]
fn test_uniform_fragment_resources() {
    let module = ParsedModule::parse(&fixtures::uniform_fragment()).unwrap();
    let resources = reflect::shader_resources(&module);

    assert_eq!(resources.uniform_buffers.len(), 1);
    assert_eq!(resources.stage_outputs.len(), 1);
    assert!(resources.stage_inputs.is_empty());
    assert!(resources.storage_buffers.is_empty());
    assert!(resources.sampled_images.is_empty());
    assert!(resources.push_constant_buffers.is_empty());

    let ubo = &resources.uniform_buffers[0];
    assert_eq!(ubo.name, "UniformBufferObject");
    assert_eq!(ubo.id, id_named(&module, "ubo"));
    assert_eq!(ubo.base_type_id, id_named(&module, "UniformBufferObject"));
    assert_ne!(ubo.type_id, ubo.base_type_id);
    assert_eq!(resources.stage_outputs[0].name, "out_color");
}

#[test]
fn test_builtins_are_not_stage_interface() {
    let module = ParsedModule::parse(&fixtures::vertex_passthrough()).unwrap();
    let resources = reflect::shader_resources(&module);

    let inputs: Vec<_> = resources.stage_inputs.iter().map(|r| r.name.as_str()).collect();
    let outputs: Vec<_> = resources.stage_outputs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(inputs, vec!["a_position", "a_normal"]);
    assert_eq!(outputs, vec!["v_normal"]);
    assert_eq!(resources.uniform_buffers[0].name, "uniform_buffer_object");
    assert_eq!(resources.push_constant_buffers[0].name, "push");
}

#[test]
fn test_storage_buffer_from_buffer_block() {
    let module = ParsedModule::parse(&fixtures::compute_spec_workgroup()).unwrap();
    let resources = reflect::shader_resources(&module);
    assert_eq!(resources.storage_buffers.len(), 1);
    assert_eq!(resources.storage_buffers[0].name, "Data");
    assert_eq!(resources.uniform_buffers.len(), 1);
    assert_eq!(resources.uniform_buffers[0].name, "Params");
}

#[test]
fn test_image_and_sampler_categories() {
    let module = ParsedModule::parse(&fixtures::textured_fragment()).unwrap();
    let resources = reflect::shader_resources(&module);

    assert_eq!(resources.separate_images[0].name, "albedo_texture");
    assert_eq!(resources.separate_samplers[0].name, "albedo_sampler");
    assert_eq!(resources.sampled_images[0].name, "shadow_map");
    assert_eq!(resources.storage_images[0].name, "output_image");
    assert_eq!(resources.subpass_inputs[0].name, "gbuffer");
    assert_eq!(resources.stage_outputs.len(), 1);
    assert!(resources.stage_inputs.is_empty());
    assert!(resources.atomic_counters.is_empty());
}

#[test]
fn test_rename_interface_variable() {
    let mut module = ParsedModule::parse(&fixtures::vertex_passthrough()).unwrap();
    let resources = reflect::shader_resources(&module);

    reflect::rename_interface_variable(&mut module, &resources.stage_inputs, 1, "in_normal");

    let renamed = reflect::shader_resources(&module);
    assert_eq!(renamed.stage_inputs[0].name, "a_position");
    assert_eq!(renamed.stage_inputs[1].name, "in_normal");
    // Same location, other list: untouched
    assert_eq!(renamed.stage_outputs[0].name, "v_normal");
}

// ============================================================================
// SPECIALIZATION CONSTANTS
// ============================================================================

#[test]
fn test_specialization_constants() {
    let module = ParsedModule::parse(&fixtures::compute_spec_workgroup()).unwrap();
    let constants = reflect::specialization_constants(&module);
    let ids: Vec<u32> = constants.iter().map(|c| c.constant_id).collect();
    assert_eq!(ids, vec![0, 1, 5]);
    assert_eq!(constants[2].id, id_named(&module, "enable_feature"));
}

#[test]
fn test_work_group_size_specialization_constants() {
    let module = ParsedModule::parse(&fixtures::compute_spec_workgroup()).unwrap();
    let [x, y, z] = reflect::work_group_size_specialization_constants(&module);
    assert_ne!(x.id, 0);
    assert_eq!(x.constant_id, 0);
    assert_ne!(y.id, 0);
    assert_eq!(y.constant_id, 1);
    assert_eq!(z, SpecializationConstant { id: 0, constant_id: 0 });
}

#[test]
fn test_work_group_size_without_specialization() {
    let module = ParsedModule::parse(&fixtures::uniform_fragment()).unwrap();
    let sizes = reflect::work_group_size_specialization_constants(&module);
    assert_eq!(sizes, [SpecializationConstant::default(); 3]);
}

// ============================================================================
// COMBINED IMAGE SAMPLERS
// ============================================================================

#[test]
fn test_combined_image_samplers() {
    let mut module = ParsedModule::parse(&fixtures::textured_fragment()).unwrap();
    let image = id_named(&module, "albedo_texture");
    let sampler = id_named(&module, "albedo_sampler");

    let table = reflect::build_combined_image_samplers(&mut module, &[]);
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].image_id, image);
    assert_eq!(table[0].sampler_id, sampler);
    assert!(module.try_type(table[0].combined_id).is_none());

    // Rebuilding keeps the combined id
    let again = reflect::build_combined_image_samplers(&mut module, &table);
    assert_eq!(again, table);
}

#[test]
fn test_no_combined_image_samplers_without_sampling() {
    let mut module = ParsedModule::parse(&fixtures::uniform_fragment()).unwrap();
    assert!(reflect::build_combined_image_samplers(&mut module, &[]).is_empty());
}

// ============================================================================
// BUFFER RANGES AND BUILT-IN USAGE
// ============================================================================

#[test]
fn test_active_buffer_ranges() {
    let module = ParsedModule::parse(&fixtures::compute_spec_workgroup()).unwrap();
    let params = id_named(&module, "params");
    let ranges = reflect::active_buffer_ranges(&module, params).unwrap();
    assert_eq!(
        ranges,
        vec![
            BufferRange { index: 0, offset: 0, range: 12 },
            BufferRange { index: 2, offset: 80, range: 64 },
        ]
    );

    let data = id_named(&module, "data");
    assert!(reflect::active_buffer_ranges(&module, data).unwrap().is_empty());
}

#[test]
fn test_active_buffer_ranges_rejects_non_variable() {
    let module = ParsedModule::parse(&fixtures::compute_spec_workgroup()).unwrap();
    let block = id_named(&module, "Params");
    assert!(matches!(
        reflect::active_buffer_ranges(&module, block),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_builtin_usage() {
    let vertex = ParsedModule::parse(&fixtures::vertex_passthrough()).unwrap();
    assert!(reflect::writes_builtin(&vertex, BuiltIn::Position));
    assert!(!reflect::writes_builtin(&vertex, BuiltIn::PointSize));

    let fragment = ParsedModule::parse(&fixtures::textured_fragment()).unwrap();
    assert!(!reflect::reads_builtin(&fragment, BuiltIn::FragCoord));
    assert!(fragment.annotations().has_decoration(id_named(&fragment, "gl_FragCoord"), Decoration::BuiltIn));
}
