use spirv::{BuiltIn, Decoration, Word};

use super::SpecializationConstant;
use crate::ir::{ConstantValue, ParsedModule};

/// Every specialization constant carrying a SpecId, in declaration order
pub fn specialization_constants(module: &ParsedModule) -> Vec<SpecializationConstant> {
    let annotations = module.annotations();
    module
        .constants()
        .filter(|constant| constant.specialization)
        .filter(|constant| annotations.has_decoration(constant.id, Decoration::SpecId))
        .map(|constant| SpecializationConstant {
            id: constant.id,
            constant_id: annotations.decoration(constant.id, Decoration::SpecId),
        })
        .collect()
}

fn as_specialization(module: &ParsedModule, id: Word) -> SpecializationConstant {
    let annotations = module.annotations();
    let specialized = module.constant(id).is_some_and(|constant| constant.specialization);
    if specialized && annotations.has_decoration(id, Decoration::SpecId) {
        SpecializationConstant { id, constant_id: annotations.decoration(id, Decoration::SpecId) }
    } else {
        SpecializationConstant::default()
    }
}

/// The constants driving the compute workgroup size as `[x, y, z]`
///
/// Looks at the `WorkgroupSize` built-in composite first, then at
/// `LocalSizeId` operands. Dimensions that are not specialization constants
/// are reported with id 0.
pub fn work_group_size_specialization_constants(module: &ParsedModule) -> [SpecializationConstant; 3] {
    let annotations = module.annotations();
    let builtin_composite = module.constants().find_map(|constant| match &constant.value {
        ConstantValue::Composite(parts)
            if parts.len() == 3
                && annotations.has_decoration(constant.id, Decoration::BuiltIn)
                && annotations.decoration(constant.id, Decoration::BuiltIn) == BuiltIn::WorkgroupSize as u32 =>
        {
            Some([parts[0], parts[1], parts[2]])
        }
        _ => None,
    });

    let ids = builtin_composite.or_else(|| {
        module
            .entry_points()
            .iter()
            .find_map(|entry| entry.workgroup_size_ids)
    });

    match ids {
        Some(ids) => ids.map(|id| as_specialization(module, id)),
        None => [SpecializationConstant::default(); 3],
    }
}
