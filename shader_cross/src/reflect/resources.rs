use spirv::{Decoration, Dim, StorageClass, Word};

use super::{Resource, ShaderResources};
use crate::ir::{BaseType, ParsedModule, SpirType, Variable};

const SOURCE: &str = "shader_cross::reflect";

/// Built-in interface variables, including blocks whose members are built-ins
fn is_builtin(module: &ParsedModule, variable: &Variable, base: &SpirType) -> bool {
    let annotations = module.annotations();
    if annotations.has_decoration(variable.id, Decoration::BuiltIn) {
        return true;
    }
    base.is_struct()
        && (0..base.member_types.len() as u32)
            .any(|member| annotations.has_member_decoration(base.id, member, Decoration::BuiltIn))
}

fn variable_name(module: &ParsedModule, id: Word) -> String {
    module.annotations().name(id).unwrap_or_default().to_string()
}

/// Block name, falling back to the variable's own name
fn block_name(module: &ParsedModule, variable: &Variable, base: &SpirType) -> String {
    match module.annotations().name(base.id) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => variable_name(module, variable.id),
    }
}

/// Partition module-scope variables into the resource categories
pub fn shader_resources(module: &ParsedModule) -> ShaderResources {
    let annotations = module.annotations();
    let mut resources = ShaderResources::default();

    for variable in module.variables() {
        let Some(pointer) = module.try_type(variable.type_id) else { continue };
        let Some(base) = module.try_type(pointer.self_id) else { continue };

        let resource = |name: String| Resource {
            id: variable.id,
            type_id: variable.type_id,
            base_type_id: base.id,
            name,
        };
        let plain = || resource(variable_name(module, variable.id));

        match variable.storage {
            StorageClass::Input if !is_builtin(module, variable, base) => resources.stage_inputs.push(plain()),
            StorageClass::Output if !is_builtin(module, variable, base) => resources.stage_outputs.push(plain()),
            StorageClass::Uniform if annotations.has_decoration(base.id, Decoration::Block) => {
                resources
                    .uniform_buffers
                    .push(resource(block_name(module, variable, base)));
            }
            StorageClass::Uniform if annotations.has_decoration(base.id, Decoration::BufferBlock) => {
                resources
                    .storage_buffers
                    .push(resource(block_name(module, variable, base)));
            }
            StorageClass::StorageBuffer => {
                resources
                    .storage_buffers
                    .push(resource(block_name(module, variable, base)));
            }
            StorageClass::PushConstant => resources.push_constant_buffers.push(plain()),
            StorageClass::AtomicCounter => resources.atomic_counters.push(plain()),
            StorageClass::UniformConstant => match (base.base_type, base.image) {
                (BaseType::Image, Some(image)) if image.dim == Dim::DimSubpassData => {
                    resources.subpass_inputs.push(plain())
                }
                (BaseType::Image, Some(image)) if image.sampled == 2 => resources.storage_images.push(plain()),
                (BaseType::Image, _) => resources.separate_images.push(plain()),
                (BaseType::SampledImage, _) => resources.sampled_images.push(plain()),
                (BaseType::Sampler, _) => resources.separate_samplers.push(plain()),
                (BaseType::AtomicCounter, _) => resources.atomic_counters.push(plain()),
                _ => {}
            },
            _ => {}
        }
    }

    crate::cross_trace!(
        SOURCE,
        "Reflected {} uniform buffers, {} stage inputs, {} stage outputs",
        resources.uniform_buffers.len(),
        resources.stage_inputs.len(),
        resources.stage_outputs.len()
    );
    resources
}

/// Rename every resource of `resources` located at `location`
///
/// Struct-typed interface blocks also get their type and member names
/// normalised so that separately compiled stages agree on them.
pub fn rename_interface_variable(module: &mut ParsedModule, resources: &[Resource], location: u32, name: &str) {
    for resource in resources {
        let annotations = module.annotations();
        if !annotations.has_decoration(resource.id, Decoration::Location)
            || annotations.decoration(resource.id, Decoration::Location) != location
        {
            continue;
        }

        let members = module
            .try_type(resource.base_type_id)
            .filter(|ty| ty.is_struct())
            .map(|ty| ty.member_types.len() as u32);

        let annotations = module.annotations_mut();
        if let Some(count) = members {
            annotations.set_name(resource.base_type_id, &format!("SPIRV_Cross_Interface_Location{}", location));
            for member in 0..count {
                annotations.set_member_name(resource.base_type_id, member, &format!("InterfaceMember{}", member));
            }
        }
        annotations.set_name(resource.id, name);
        crate::cross_debug!(SOURCE, "Renamed interface variable {} at location {} to {}", resource.id, location, name);
    }
}
