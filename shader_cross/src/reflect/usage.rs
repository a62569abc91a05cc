use rspirv::dr::Operand;
use rustc_hash::{FxHashMap, FxHashSet};
use spirv::{BuiltIn, Decoration, Op, StorageClass, Word};
use std::collections::BTreeSet;

use super::{BufferRange, CombinedImageSampler};
use crate::error::Result;
use crate::ir::{BaseType, ParsedModule};
use crate::layout;

const SOURCE: &str = "shader_cross::reflect";

fn first_id(operands: &[Operand]) -> Option<Word> {
    match operands.first() {
        Some(Operand::IdRef(id)) => Some(*id),
        _ => None,
    }
}

fn is_access_chain(op: Op) -> bool {
    matches!(op, Op::AccessChain | Op::InBoundsAccessChain)
}

/// Index operand of an access chain as a literal, if it is a known constant
fn constant_index(module: &ParsedModule, id: Word) -> Option<u32> {
    module.constant(id).and_then(|constant| constant.scalar()).map(|value| value as u32)
}

fn is_separate(module: &ParsedModule, variable: Word, wanted: BaseType) -> bool {
    let Some(variable) = module.variable(variable) else { return false };
    if variable.storage != StorageClass::UniformConstant {
        return false;
    }
    module
        .try_type(variable.type_id)
        .and_then(|pointer| module.try_type(pointer.self_id))
        .is_some_and(|base| {
            base.base_type == wanted && base.image.map_or(true, |image| image.sampled != 2)
        })
}

/// Pair up separate images and samplers combined with OpSampledImage
///
/// Pairs already present in `previous` keep their combined id; new pairs get
/// a fresh id from the module's bound.
pub fn build_combined_image_samplers(
    module: &mut ParsedModule,
    previous: &[CombinedImageSampler],
) -> Vec<CombinedImageSampler> {
    // pointer or loaded value -> module-scope variable it comes from
    let mut roots: FxHashMap<Word, Word> = FxHashMap::default();
    let mut pairs: Vec<(Word, Word)> = Vec::new();

    for inst in module.function_instructions() {
        let Some(result) = inst.result_id else { continue };
        let op = inst.class.opcode;
        if op == Op::Load || is_access_chain(op) {
            if let Some(pointer) = first_id(&inst.operands) {
                let root = roots.get(&pointer).copied().unwrap_or(pointer);
                roots.insert(result, root);
            }
        } else if op == Op::SampledImage {
            let [Operand::IdRef(image), Operand::IdRef(sampler), ..] = inst.operands.as_slice() else {
                continue;
            };
            let (Some(image), Some(sampler)) = (roots.get(image).copied(), roots.get(sampler).copied()) else {
                continue;
            };
            if is_separate(module, image, BaseType::Image)
                && is_separate(module, sampler, BaseType::Sampler)
                && !pairs.contains(&(image, sampler))
            {
                pairs.push((image, sampler));
            }
        }
    }

    let table: Vec<CombinedImageSampler> = pairs
        .into_iter()
        .map(|(image_id, sampler_id)| {
            let combined_id = previous
                .iter()
                .find(|entry| entry.image_id == image_id && entry.sampler_id == sampler_id)
                .map(|entry| entry.combined_id)
                .unwrap_or_else(|| module.allocate_id());
            CombinedImageSampler { combined_id, image_id, sampler_id }
        })
        .collect();

    crate::cross_debug!(SOURCE, "Built {} combined image samplers", table.len());
    table
}

/// Members of the buffer block `id` that function bodies address statically
pub fn active_buffer_ranges(module: &ParsedModule, id: Word) -> Result<Vec<BufferRange>> {
    let Some(variable) = module.variable(id) else {
        crate::cross_bail!(SOURCE, InvalidArgument, "Id {} is not a module-scope variable", id);
    };
    let pointer = module.type_of(variable.type_id)?;
    let block = module.type_of(pointer.self_id)?;
    if !block.is_struct() {
        return Ok(Vec::new());
    }

    // Arrays of blocks spend the first index on the array element
    let member_operand = if pointer.is_array() { 2 } else { 1 };
    let mut members = BTreeSet::new();
    let mut whole_block = false;

    for inst in module.function_instructions() {
        let op = inst.class.opcode;
        if first_id(&inst.operands) != Some(id) {
            continue;
        }
        if is_access_chain(op) {
            match inst.operands.get(member_operand) {
                Some(Operand::IdRef(index)) => match constant_index(module, *index) {
                    Some(member) => {
                        members.insert(member);
                    }
                    None => whole_block = true,
                },
                _ => whole_block = true,
            }
        } else if matches!(op, Op::Load | Op::CopyMemory) {
            whole_block = true;
        }
    }

    if whole_block {
        members.extend(0..block.member_types.len() as u32);
    }

    members
        .into_iter()
        .filter(|member| (*member as usize) < block.member_types.len())
        .map(|member| {
            let offset = module.annotations().member_decoration(block.id, member, Decoration::Offset);
            let range = layout::declared_struct_member_size(module, block.id, member)?;
            Ok(BufferRange { index: member, offset: offset as usize, range: range as usize })
        })
        .collect()
}

/// Pointers (variables and access chains) that designate `builtin`
fn builtin_access(module: &ParsedModule, builtin: BuiltIn, access: Op) -> bool {
    let annotations = module.annotations();
    let is_builtin = |id: Word| {
        annotations.has_decoration(id, Decoration::BuiltIn)
            && annotations.decoration(id, Decoration::BuiltIn) == builtin as u32
    };
    let mut pointers: FxHashSet<Word> = module
        .variables()
        .iter()
        .filter(|variable| is_builtin(variable.id))
        .map(|variable| variable.id)
        .collect();

    for inst in module.function_instructions() {
        let op = inst.class.opcode;
        if is_access_chain(op) {
            let (Some(result), [Operand::IdRef(base), Operand::IdRef(index), ..]) =
                (inst.result_id, inst.operands.as_slice())
            else {
                continue;
            };
            if pointers.contains(base) {
                pointers.insert(result);
                continue;
            }
            let member_is_builtin = module
                .variable(*base)
                .and_then(|variable| module.try_type(variable.type_id))
                .and_then(|pointer| module.try_type(pointer.self_id))
                .filter(|block| block.is_struct())
                .zip(constant_index(module, *index))
                .is_some_and(|(block, member)| {
                    annotations.has_member_decoration(block.id, member, Decoration::BuiltIn)
                        && annotations.member_decoration(block.id, member, Decoration::BuiltIn) == builtin as u32
                });
            if member_is_builtin {
                pointers.insert(result);
            }
        } else if op == access && first_id(&inst.operands).is_some_and(|pointer| pointers.contains(&pointer)) {
            return true;
        }
    }
    false
}

/// Whether any function stores to `builtin`
pub fn writes_builtin(module: &ParsedModule, builtin: BuiltIn) -> bool {
    builtin_access(module, builtin, Op::Store)
}

/// Whether any function loads from `builtin`
pub fn reads_builtin(module: &ParsedModule, builtin: BuiltIn) -> bool {
    builtin_access(module, builtin, Op::Load)
}
