//! Parsed SPIR-V module
//!
//! [`ParsedModule`] owns the rspirv data representation plus indexes built
//! from it: type descriptors, constants, global variables and entry points.
//! Decorations and names live in [`Annotations`] and are merged back into the
//! instruction stream by [`ParsedModule::assemble`].

use rspirv::binary::Assemble;
use rspirv::dr::{self, Instruction, Operand};
use rustc_hash::FxHashMap;
use spirv::{ExecutionMode, ExecutionModel, Op, StorageClass, Word};

use crate::error::Result;
use crate::ir::annotations::Annotations;
use crate::ir::types::{BaseType, ImageInfo, SpirType};

const SOURCE: &str = "shader_cross::ir";

/// Magic, version, generator, bound, schema
const HEADER_WORDS: usize = 5;

/// A module-scope OpVariable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable {
    pub id: Word,
    /// Pointer type of the variable
    pub type_id: Word,
    pub storage: StorageClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantValue {
    /// Raw bits of a 32- or 64-bit scalar
    Scalar(u64),
    Bool(bool),
    Composite(Vec<Word>),
    Null,
    /// OpSpecConstantOp and friends; value known only after specialization
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub id: Word,
    pub type_id: Word,
    pub value: ConstantValue,
    pub specialization: bool,
}

impl Constant {
    pub fn scalar(&self) -> Option<u64> {
        match self.value {
            ConstantValue::Scalar(bits) => Some(bits),
            ConstantValue::Bool(flag) => Some(u64::from(flag)),
            ConstantValue::Null => Some(0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointInfo {
    pub name: String,
    pub model: ExecutionModel,
    pub function: Word,
    pub interface: Vec<Word>,
    /// From LocalSize, or the current values behind LocalSizeId
    pub workgroup_size: [u32; 3],
    /// Ids named by LocalSizeId
    pub workgroup_size_ids: Option<[Word; 3]>,
}

/// A loaded module and its indexes
#[derive(Debug)]
pub struct ParsedModule {
    module: dr::Module,
    annotations: Annotations,
    types: FxHashMap<Word, SpirType>,
    constants: FxHashMap<Word, Constant>,
    constant_order: Vec<Word>,
    variables: Vec<Variable>,
    entry_points: Vec<EntryPointInfo>,
    bound: Word,
}

fn literal(operand: Option<&Operand>) -> Option<u32> {
    match operand {
        Some(Operand::LiteralBit32(value)) => Some(*value),
        _ => None,
    }
}

fn id_ref(operand: Option<&Operand>) -> Option<Word> {
    match operand {
        Some(Operand::IdRef(id)) => Some(*id),
        _ => None,
    }
}

fn malformed(inst: &Instruction) -> crate::Error {
    crate::cross_err!(
        SOURCE,
        Parse,
        "Malformed {:?} instruction (result id {:?})",
        inst.class.opcode,
        inst.result_id
    )
}

impl ParsedModule {
    /// Load `words` (a complete module, header included)
    pub fn parse(words: &[u32]) -> Result<Self> {
        if words.len() < HEADER_WORDS {
            crate::cross_bail!(
                SOURCE,
                Parse,
                "SPIR-V module is too small: {} words, the header alone needs {}",
                words.len(),
                HEADER_WORDS
            );
        }
        if words[0] != spirv::MAGIC_NUMBER {
            crate::cross_bail!(SOURCE, Parse, "Invalid SPIR-V magic number: 0x{:08x}", words[0]);
        }

        let module = dr::load_words(words)
            .map_err(|state| crate::cross_err!(SOURCE, Parse, "Failed to parse SPIR-V module: {:?}", state))?;

        let bound = module.header.as_ref().map_or(words[3], |header| header.bound);
        let mut annotations = Annotations::default();
        annotations.load_names(&module.debug_names);
        annotations.load_decorations(&module.annotations);

        let mut parsed = Self {
            module,
            annotations,
            types: FxHashMap::default(),
            constants: FxHashMap::default(),
            constant_order: Vec::new(),
            variables: Vec::new(),
            entry_points: Vec::new(),
            bound,
        };
        parsed.index_globals()?;
        parsed.index_entry_points()?;

        crate::cross_debug!(
            SOURCE,
            "Loaded module: {} types, {} variables, {} entry points",
            parsed.types.len(),
            parsed.variables.len(),
            parsed.entry_points.len()
        );
        Ok(parsed)
    }

    fn index_globals(&mut self) -> Result<()> {
        let mut types: FxHashMap<Word, SpirType> = FxHashMap::default();
        let mut constants: FxHashMap<Word, Constant> = FxHashMap::default();
        let mut constant_order = Vec::new();
        let mut variables = Vec::new();

        for inst in &self.module.types_global_values {
            let Some(id) = inst.result_id else { continue };
            let ops = &inst.operands;
            let lookup = |types: &FxHashMap<Word, SpirType>, index: usize| -> Result<SpirType> {
                let element = id_ref(ops.get(index)).ok_or_else(|| malformed(inst))?;
                types.get(&element).cloned().ok_or_else(|| {
                    crate::cross_err!(SOURCE, Parse, "Type {} is used before it is declared", element)
                })
            };

            let ty = match inst.class.opcode {
                Op::TypeVoid => SpirType::new(id, BaseType::Void),
                Op::TypeBool => SpirType::scalar(id, BaseType::Boolean, 1),
                Op::TypeInt => {
                    let width = literal(ops.first()).ok_or_else(|| malformed(inst))?;
                    let signed = literal(ops.get(1)).ok_or_else(|| malformed(inst))? != 0;
                    SpirType::scalar(id, BaseType::integer(width, signed), width)
                }
                Op::TypeFloat => {
                    let width = literal(ops.first()).ok_or_else(|| malformed(inst))?;
                    SpirType::scalar(id, BaseType::float(width), width)
                }
                Op::TypeVector => {
                    let component = lookup(&types, 0)?;
                    let count = literal(ops.get(1)).ok_or_else(|| malformed(inst))?;
                    SpirType { vecsize: count, self_id: id, ..SpirType::derived(id, &component) }
                }
                Op::TypeMatrix => {
                    let column = lookup(&types, 0)?;
                    let count = literal(ops.get(1)).ok_or_else(|| malformed(inst))?;
                    SpirType { columns: count, self_id: id, ..SpirType::derived(id, &column) }
                }
                Op::TypeArray => {
                    let element = lookup(&types, 0)?;
                    let length_id = id_ref(ops.get(1)).ok_or_else(|| malformed(inst))?;
                    let length = constants
                        .get(&length_id)
                        .and_then(Constant::scalar)
                        .unwrap_or(0) as u32;
                    let mut ty = SpirType::derived(id, &element);
                    ty.array.push(length);
                    ty
                }
                Op::TypeRuntimeArray => {
                    let element = lookup(&types, 0)?;
                    let mut ty = SpirType::derived(id, &element);
                    ty.array.push(0);
                    ty
                }
                Op::TypeStruct => {
                    let members = ops
                        .iter()
                        .map(|operand| id_ref(Some(operand)).ok_or_else(|| malformed(inst)))
                        .collect::<Result<Vec<_>>>()?;
                    SpirType { member_types: members, ..SpirType::new(id, BaseType::Struct) }
                }
                Op::TypeImage => {
                    let info = match ops.as_slice() {
                        [
                            Operand::IdRef(sampled_type),
                            Operand::Dim(dim),
                            Operand::LiteralBit32(depth),
                            Operand::LiteralBit32(arrayed),
                            Operand::LiteralBit32(multisampled),
                            Operand::LiteralBit32(sampled),
                            Operand::ImageFormat(format),
                            ..
                        ] => ImageInfo {
                            sampled_type: *sampled_type,
                            dim: *dim,
                            depth: *depth,
                            arrayed: *arrayed != 0,
                            multisampled: *multisampled != 0,
                            sampled: *sampled,
                            format: *format,
                        },
                        _ => return Err(malformed(inst)),
                    };
                    SpirType { image: Some(info), ..SpirType::new(id, BaseType::Image) }
                }
                Op::TypeSampledImage => {
                    let image = lookup(&types, 0)?;
                    SpirType {
                        image: image.image,
                        parent: Some(image.id),
                        ..SpirType::new(id, BaseType::SampledImage)
                    }
                }
                Op::TypeSampler => SpirType::new(id, BaseType::Sampler),
                Op::TypeAccelerationStructureKHR => SpirType::new(id, BaseType::AccelerationStructure),
                Op::TypePointer => {
                    let storage = match ops.first() {
                        Some(Operand::StorageClass(storage)) => *storage,
                        _ => return Err(malformed(inst)),
                    };
                    let pointee_id = id_ref(ops.get(1)).ok_or_else(|| malformed(inst))?;
                    let mut ty = match types.get(&pointee_id) {
                        Some(pointee) => SpirType::derived(id, pointee),
                        // Forward-declared pointee (physical storage buffers)
                        None => SpirType {
                            parent: Some(pointee_id),
                            ..SpirType::new(id, BaseType::Unknown)
                        },
                    };
                    ty.pointer = true;
                    ty.storage = Some(storage);
                    ty
                }
                Op::Constant | Op::SpecConstant => {
                    let value = match ops.first() {
                        Some(Operand::LiteralBit32(bits)) => u64::from(*bits),
                        Some(Operand::LiteralBit64(bits)) => *bits,
                        _ => return Err(malformed(inst)),
                    };
                    Self::record_constant(
                        &mut constants,
                        &mut constant_order,
                        inst,
                        ConstantValue::Scalar(value),
                    )?;
                    continue;
                }
                Op::ConstantTrue | Op::ConstantFalse | Op::SpecConstantTrue | Op::SpecConstantFalse => {
                    let flag = matches!(inst.class.opcode, Op::ConstantTrue | Op::SpecConstantTrue);
                    Self::record_constant(&mut constants, &mut constant_order, inst, ConstantValue::Bool(flag))?;
                    continue;
                }
                Op::ConstantComposite | Op::SpecConstantComposite => {
                    let parts = ops.iter().filter_map(|operand| id_ref(Some(operand))).collect();
                    Self::record_constant(
                        &mut constants,
                        &mut constant_order,
                        inst,
                        ConstantValue::Composite(parts),
                    )?;
                    continue;
                }
                Op::ConstantNull => {
                    Self::record_constant(&mut constants, &mut constant_order, inst, ConstantValue::Null)?;
                    continue;
                }
                Op::SpecConstantOp => {
                    Self::record_constant(&mut constants, &mut constant_order, inst, ConstantValue::Deferred)?;
                    continue;
                }
                Op::Variable => {
                    let type_id = inst.result_type.ok_or_else(|| malformed(inst))?;
                    let storage = match ops.first() {
                        Some(Operand::StorageClass(storage)) => *storage,
                        _ => return Err(malformed(inst)),
                    };
                    variables.push(Variable { id, type_id, storage });
                    continue;
                }
                _ => continue,
            };
            types.insert(id, ty);
        }

        self.types = types;
        self.constants = constants;
        self.constant_order = constant_order;
        self.variables = variables;
        Ok(())
    }

    fn record_constant(
        constants: &mut FxHashMap<Word, Constant>,
        order: &mut Vec<Word>,
        inst: &Instruction,
        value: ConstantValue,
    ) -> Result<()> {
        let (Some(id), Some(type_id)) = (inst.result_id, inst.result_type) else {
            return Err(malformed(inst));
        };
        let specialization = matches!(
            inst.class.opcode,
            Op::SpecConstant
                | Op::SpecConstantTrue
                | Op::SpecConstantFalse
                | Op::SpecConstantComposite
                | Op::SpecConstantOp
        );
        constants.insert(id, Constant { id, type_id, value, specialization });
        order.push(id);
        Ok(())
    }

    fn index_entry_points(&mut self) -> Result<()> {
        let mut entry_points = Vec::with_capacity(self.module.entry_points.len());
        for inst in &self.module.entry_points {
            let (model, function, name, interface) = match inst.operands.as_slice() {
                [
                    Operand::ExecutionModel(model),
                    Operand::IdRef(function),
                    Operand::LiteralString(name),
                    interface @ ..,
                ] => (*model, *function, name.clone(), interface),
                _ => return Err(malformed(inst)),
            };
            let interface = interface.iter().filter_map(|operand| id_ref(Some(operand))).collect();
            entry_points.push(EntryPointInfo {
                name,
                model,
                function,
                interface,
                workgroup_size: [0; 3],
                workgroup_size_ids: None,
            });
        }

        for inst in &self.module.execution_modes {
            let (function, mode, rest) = match inst.operands.as_slice() {
                [Operand::IdRef(function), Operand::ExecutionMode(mode), rest @ ..] => (*function, *mode, rest),
                _ => continue,
            };
            for entry in entry_points.iter_mut().filter(|entry| entry.function == function) {
                match (mode, rest) {
                    (
                        ExecutionMode::LocalSize,
                        [Operand::LiteralBit32(x), Operand::LiteralBit32(y), Operand::LiteralBit32(z)],
                    ) => entry.workgroup_size = [*x, *y, *z],
                    (ExecutionMode::LocalSizeId, [Operand::IdRef(x), Operand::IdRef(y), Operand::IdRef(z)]) => {
                        let ids = [*x, *y, *z];
                        entry.workgroup_size = ids.map(|id| {
                            self.constants.get(&id).and_then(Constant::scalar).unwrap_or(0) as u32
                        });
                        entry.workgroup_size_ids = Some(ids);
                    }
                    _ => {}
                }
            }
        }

        self.entry_points = entry_points;
        Ok(())
    }

    /// Binary form of the module with every edit applied
    ///
    /// The debug-name and annotation sections are regenerated from the
    /// stores; the stores stay the source of truth.
    pub fn assemble(&mut self) -> Vec<u32> {
        self.module.debug_names = self.annotations.emit_names();
        self.module.annotations = self.annotations.emit_decorations();
        if let Some(header) = self.module.header.as_mut() {
            header.bound = self.bound;
        }
        self.module.assemble()
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut Annotations {
        &mut self.annotations
    }

    pub fn try_type(&self, id: Word) -> Option<&SpirType> {
        self.types.get(&id)
    }

    pub fn type_of(&self, id: Word) -> Result<&SpirType> {
        match self.types.get(&id) {
            Some(ty) => Ok(ty),
            None => crate::cross_bail!(SOURCE, InvalidArgument, "Id {} is not a type", id),
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: Word) -> Option<&Variable> {
        self.variables.iter().find(|variable| variable.id == id)
    }

    pub fn constant(&self, id: Word) -> Option<&Constant> {
        self.constants.get(&id)
    }

    /// Constants in declaration order
    pub fn constants(&self) -> impl Iterator<Item = &Constant> {
        self.constant_order.iter().filter_map(|id| self.constants.get(id))
    }

    pub fn entry_points(&self) -> &[EntryPointInfo] {
        &self.entry_points
    }

    /// Every instruction inside a function body, in module order
    pub fn function_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.module
            .functions
            .iter()
            .flat_map(|function| function.blocks.iter())
            .flat_map(|block| block.instructions.iter())
    }

    /// Reserve an id no instruction uses yet
    pub fn allocate_id(&mut self) -> Word {
        let id = self.bound;
        self.bound += 1;
        id
    }

    /// Overwrite a scalar or boolean constant (regular or specialization)
    pub fn set_scalar_constant(&mut self, id: Word, value: u64) -> Result<()> {
        let Some(index) = self
            .module
            .types_global_values
            .iter()
            .position(|inst| inst.result_id == Some(id))
        else {
            crate::cross_bail!(SOURCE, InvalidArgument, "Id {} is not a constant", id);
        };

        let inst = &mut self.module.types_global_values[index];
        match inst.class.opcode {
            Op::Constant | Op::SpecConstant => match inst.operands.first_mut() {
                Some(Operand::LiteralBit32(bits)) => *bits = value as u32,
                Some(Operand::LiteralBit64(bits)) => *bits = value,
                _ => crate::cross_bail!(SOURCE, InvalidArgument, "Constant {} has no scalar literal", id),
            },
            Op::ConstantTrue | Op::ConstantFalse => {
                let op = if value != 0 { Op::ConstantTrue } else { Op::ConstantFalse };
                *inst = Instruction::new(op, inst.result_type, inst.result_id, Vec::new());
            }
            Op::SpecConstantTrue | Op::SpecConstantFalse => {
                let op = if value != 0 { Op::SpecConstantTrue } else { Op::SpecConstantFalse };
                *inst = Instruction::new(op, inst.result_type, inst.result_id, Vec::new());
            }
            other => crate::cross_bail!(SOURCE, InvalidArgument, "Id {} ({:?}) is not a scalar constant", id, other),
        }

        // Array extents and LocalSizeId values may depend on the constant
        self.index_globals()?;
        self.index_entry_points()
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
