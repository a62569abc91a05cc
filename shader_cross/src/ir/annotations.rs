//! Decoration and name stores
//!
//! Decorations and debug names are pulled out of the instruction stream at
//! load time and written back when the module is re-assembled, so edits made
//! through the compiler show up in the generated code.

use rspirv::dr::{Instruction, Operand};
use spirv::{BuiltIn, Decoration, FPFastMathMode, FPRoundingMode, FunctionParameterAttribute, Op, Word};
use std::collections::BTreeMap;

use crate::error::Result;

const SOURCE: &str = "shader_cross::ir";

/// Decorations applied to one id or one struct member, in application order
#[derive(Debug, Clone, Default)]
pub struct DecorationSet {
    entries: Vec<(Decoration, Vec<Operand>)>,
}

impl DecorationSet {
    pub fn get(&self, decoration: Decoration) -> Option<&[Operand]> {
        self.entries
            .iter()
            .find(|(kind, _)| *kind == decoration)
            .map(|(_, operands)| operands.as_slice())
    }

    pub fn has(&self, decoration: Decoration) -> bool {
        self.get(decoration).is_some()
    }

    /// Replace the arguments of `decoration`, keeping its position if present
    pub fn set(&mut self, decoration: Decoration, operands: Vec<Operand>) {
        match self.entries.iter_mut().find(|(kind, _)| *kind == decoration) {
            Some(entry) => entry.1 = operands,
            None => self.entries.push((decoration, operands)),
        }
    }

    pub fn unset(&mut self, decoration: Decoration) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(kind, _)| *kind != decoration);
        before != self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Decoration, Vec<Operand>)> {
        self.entries.iter()
    }
}

/// Integer view of a decoration's arguments: the first literal, 1 for a flag
pub fn decoration_value(operands: &[Operand]) -> u32 {
    match operands.first() {
        None => 1,
        Some(Operand::LiteralBit32(value)) => *value,
        Some(Operand::IdRef(id)) => *id,
        Some(Operand::BuiltIn(builtin)) => *builtin as u32,
        Some(Operand::FPRoundingMode(mode)) => *mode as u32,
        Some(Operand::FPFastMathMode(mode)) => mode.bits(),
        Some(Operand::FunctionParameterAttribute(attribute)) => *attribute as u32,
        Some(_) => 1,
    }
}

/// Arguments to store for `decoration` set to `value`
///
/// Decorations taking a string, an id, or several operands cannot be
/// expressed as one integer and are rejected.
pub fn decoration_operands(decoration: Decoration, value: u32) -> Result<Vec<Operand>> {
    let operands = match decoration {
        Decoration::BuiltIn => match BuiltIn::from_u32(value) {
            Some(builtin) => vec![Operand::BuiltIn(builtin)],
            None => crate::cross_bail!(SOURCE, InvalidArgument, "{} is not a SPIR-V built-in", value),
        },
        Decoration::FPRoundingMode => match FPRoundingMode::from_u32(value) {
            Some(mode) => vec![Operand::FPRoundingMode(mode)],
            None => crate::cross_bail!(SOURCE, InvalidArgument, "{} is not a floating-point rounding mode", value),
        },
        Decoration::FPFastMathMode => match FPFastMathMode::from_bits(value) {
            Some(mode) => vec![Operand::FPFastMathMode(mode)],
            None => crate::cross_bail!(SOURCE, InvalidArgument, "{:#x} is not a fast-math mode mask", value),
        },
        Decoration::FuncParamAttr => match FunctionParameterAttribute::from_u32(value) {
            Some(attribute) => vec![Operand::FunctionParameterAttribute(attribute)],
            None => crate::cross_bail!(SOURCE, InvalidArgument, "{} is not a function parameter attribute", value),
        },
        Decoration::SpecId
        | Decoration::ArrayStride
        | Decoration::MatrixStride
        | Decoration::Stream
        | Decoration::Location
        | Decoration::Component
        | Decoration::Index
        | Decoration::Binding
        | Decoration::DescriptorSet
        | Decoration::Offset
        | Decoration::XfbBuffer
        | Decoration::XfbStride
        | Decoration::InputAttachmentIndex
        | Decoration::Alignment
        | Decoration::MaxByteOffset
        | Decoration::SecondaryViewportRelativeNV => vec![Operand::LiteralBit32(value)],
        Decoration::RelaxedPrecision
        | Decoration::Block
        | Decoration::BufferBlock
        | Decoration::RowMajor
        | Decoration::ColMajor
        | Decoration::GLSLShared
        | Decoration::GLSLPacked
        | Decoration::CPacked
        | Decoration::NoPerspective
        | Decoration::Flat
        | Decoration::Patch
        | Decoration::Centroid
        | Decoration::Sample
        | Decoration::Invariant
        | Decoration::Restrict
        | Decoration::Aliased
        | Decoration::Volatile
        | Decoration::Constant
        | Decoration::Coherent
        | Decoration::NonWritable
        | Decoration::NonReadable
        | Decoration::Uniform
        | Decoration::SaturatedConversion
        | Decoration::NoContraction
        | Decoration::NoSignedWrap
        | Decoration::NoUnsignedWrap
        | Decoration::ExplicitInterpAMD
        | Decoration::OverrideCoverageNV
        | Decoration::PassthroughNV
        | Decoration::ViewportRelativeNV
        | Decoration::PerPrimitiveNV
        | Decoration::PerViewNV
        | Decoration::PerTaskNV
        | Decoration::PerVertexKHR
        | Decoration::NonUniform
        | Decoration::RestrictPointer
        | Decoration::AliasedPointer => Vec::new(),
        other => crate::cross_bail!(
            SOURCE,
            InvalidArgument,
            "Decoration {:?} does not take a single integer argument",
            other
        ),
    };
    Ok(operands)
}

/// Every annotation and debug name of a module
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    decorations: BTreeMap<Word, DecorationSet>,
    member_decorations: BTreeMap<(Word, u32), DecorationSet>,
    names: BTreeMap<Word, String>,
    member_names: BTreeMap<(Word, u32), String>,
    /// Id/string decorations the stores do not model; re-emitted untouched
    passthrough: Vec<Instruction>,
}

impl Annotations {
    pub fn decorations(&self, id: Word) -> Option<&DecorationSet> {
        self.decorations.get(&id)
    }

    pub fn member_decorations(&self, id: Word, member: u32) -> Option<&DecorationSet> {
        self.member_decorations.get(&(id, member))
    }

    pub fn has_decoration(&self, id: Word, decoration: Decoration) -> bool {
        self.decorations(id).is_some_and(|set| set.has(decoration))
    }

    pub fn has_member_decoration(&self, id: Word, member: u32, decoration: Decoration) -> bool {
        self.member_decorations(id, member).is_some_and(|set| set.has(decoration))
    }

    /// Literal argument, 1 for a flag, 0 when absent
    pub fn decoration(&self, id: Word, decoration: Decoration) -> u32 {
        self.decorations(id)
            .and_then(|set| set.get(decoration))
            .map_or(0, decoration_value)
    }

    pub fn member_decoration(&self, id: Word, member: u32, decoration: Decoration) -> u32 {
        self.member_decorations(id, member)
            .and_then(|set| set.get(decoration))
            .map_or(0, decoration_value)
    }

    pub fn set_decoration(&mut self, id: Word, decoration: Decoration, operands: Vec<Operand>) {
        self.decorations.entry(id).or_default().set(decoration, operands);
    }

    pub fn set_member_decoration(&mut self, id: Word, member: u32, decoration: Decoration, operands: Vec<Operand>) {
        self.member_decorations
            .entry((id, member))
            .or_default()
            .set(decoration, operands);
    }

    pub fn unset_decoration(&mut self, id: Word, decoration: Decoration) {
        if let Some(set) = self.decorations.get_mut(&id) {
            set.unset(decoration);
            if set.is_empty() {
                self.decorations.remove(&id);
            }
        }
    }

    pub fn unset_member_decoration(&mut self, id: Word, member: u32, decoration: Decoration) {
        if let Some(set) = self.member_decorations.get_mut(&(id, member)) {
            set.unset(decoration);
            if set.is_empty() {
                self.member_decorations.remove(&(id, member));
            }
        }
    }

    pub fn name(&self, id: Word) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn set_name(&mut self, id: Word, name: &str) {
        self.names.insert(id, name.to_string());
    }

    pub fn member_name(&self, id: Word, member: u32) -> Option<&str> {
        self.member_names.get(&(id, member)).map(String::as_str)
    }

    pub fn set_member_name(&mut self, id: Word, member: u32, name: &str) {
        self.member_names.insert((id, member), name.to_string());
    }

    /// Ids carrying `decoration`, ascending
    pub fn ids_with(&self, decoration: Decoration) -> impl Iterator<Item = Word> + '_ {
        self.decorations
            .iter()
            .filter(move |(_, set)| set.has(decoration))
            .map(|(id, _)| *id)
    }

    /// Collect names from the debug section
    pub(crate) fn load_names(&mut self, debug_names: &[Instruction]) {
        for inst in debug_names {
            match (inst.class.opcode, inst.operands.as_slice()) {
                (Op::Name, [Operand::IdRef(id), Operand::LiteralString(name)]) => {
                    self.names.insert(*id, name.clone());
                }
                (
                    Op::MemberName,
                    [Operand::IdRef(id), Operand::LiteralBit32(member), Operand::LiteralString(name)],
                ) => {
                    self.member_names.insert((*id, *member), name.clone());
                }
                _ => {}
            }
        }
    }

    /// Collect decorations, flattening decoration groups onto their targets
    pub(crate) fn load_decorations(&mut self, annotations: &[Instruction]) {
        let mut groups: BTreeMap<Word, DecorationSet> = BTreeMap::new();
        let group_ids: Vec<Word> = annotations
            .iter()
            .filter(|inst| inst.class.opcode == Op::DecorationGroup)
            .filter_map(|inst| inst.result_id)
            .collect();

        for inst in annotations {
            match (inst.class.opcode, inst.operands.as_slice()) {
                (Op::Decorate, [Operand::IdRef(id), Operand::Decoration(decoration), rest @ ..]) => {
                    if group_ids.contains(id) {
                        groups.entry(*id).or_default().set(*decoration, rest.to_vec());
                    } else {
                        self.set_decoration(*id, *decoration, rest.to_vec());
                    }
                }
                (
                    Op::MemberDecorate,
                    [Operand::IdRef(id), Operand::LiteralBit32(member), Operand::Decoration(decoration), rest @ ..],
                ) => {
                    self.set_member_decoration(*id, *member, *decoration, rest.to_vec());
                }
                (Op::GroupDecorate, [Operand::IdRef(group), targets @ ..]) => {
                    let Some(set) = groups.get(group).cloned() else { continue };
                    for target in targets {
                        if let Operand::IdRef(target) = target {
                            for (decoration, operands) in set.iter() {
                                self.set_decoration(*target, *decoration, operands.clone());
                            }
                        }
                    }
                }
                (Op::GroupMemberDecorate, [Operand::IdRef(group), pairs @ ..]) => {
                    let Some(set) = groups.get(group).cloned() else { continue };
                    for pair in pairs.chunks(2) {
                        if let [Operand::IdRef(target), Operand::LiteralBit32(member)] = pair {
                            for (decoration, operands) in set.iter() {
                                self.set_member_decoration(*target, *member, *decoration, operands.clone());
                            }
                        }
                    }
                }
                (Op::DecorationGroup, _) => {}
                _ => self.passthrough.push(inst.clone()),
            }
        }
    }

    /// OpName/OpMemberName instructions for the current stores
    pub(crate) fn emit_names(&self) -> Vec<Instruction> {
        let names = self.names.iter().map(|(id, name)| {
            Instruction::new(
                Op::Name,
                None,
                None,
                vec![Operand::IdRef(*id), Operand::LiteralString(name.clone())],
            )
        });
        let member_names = self.member_names.iter().map(|((id, member), name)| {
            Instruction::new(
                Op::MemberName,
                None,
                None,
                vec![
                    Operand::IdRef(*id),
                    Operand::LiteralBit32(*member),
                    Operand::LiteralString(name.clone()),
                ],
            )
        });
        names.chain(member_names).collect()
    }

    /// Annotation instructions for the current stores (groups already flattened)
    pub(crate) fn emit_decorations(&self) -> Vec<Instruction> {
        let mut instructions = Vec::new();
        for (id, set) in &self.decorations {
            for (decoration, operands) in set.iter() {
                let mut all = vec![Operand::IdRef(*id), Operand::Decoration(*decoration)];
                all.extend(operands.iter().cloned());
                instructions.push(Instruction::new(Op::Decorate, None, None, all));
            }
        }
        for ((id, member), set) in &self.member_decorations {
            for (decoration, operands) in set.iter() {
                let mut all = vec![
                    Operand::IdRef(*id),
                    Operand::LiteralBit32(*member),
                    Operand::Decoration(*decoration),
                ];
                all.extend(operands.iter().cloned());
                instructions.push(Instruction::new(Op::MemberDecorate, None, None, all));
            }
        }
        instructions.extend(self.passthrough.iter().cloned());
        instructions
    }
}

#[cfg(test)]
#[path = "annotations_tests.rs"]
mod tests;
