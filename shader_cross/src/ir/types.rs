//! Type descriptors derived from the module's type declarations

use spirv::{Dim, ImageFormat, StorageClass, Word};

/// Base type tag of a [`SpirType`]
///
/// The discriminants are the values carried across the flat boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BaseType {
    Unknown = 0,
    Void = 1,
    Boolean = 2,
    SByte = 3,
    UByte = 4,
    Short = 5,
    UShort = 6,
    Int = 7,
    UInt = 8,
    Int64 = 9,
    UInt64 = 10,
    AtomicCounter = 11,
    Half = 12,
    Float = 13,
    Double = 14,
    Struct = 15,
    Image = 16,
    SampledImage = 17,
    Sampler = 18,
    AccelerationStructure = 19,
}

impl BaseType {
    pub fn from_raw(raw: u32) -> Option<Self> {
        const ALL: [BaseType; 20] = [
            BaseType::Unknown,
            BaseType::Void,
            BaseType::Boolean,
            BaseType::SByte,
            BaseType::UByte,
            BaseType::Short,
            BaseType::UShort,
            BaseType::Int,
            BaseType::UInt,
            BaseType::Int64,
            BaseType::UInt64,
            BaseType::AtomicCounter,
            BaseType::Half,
            BaseType::Float,
            BaseType::Double,
            BaseType::Struct,
            BaseType::Image,
            BaseType::SampledImage,
            BaseType::Sampler,
            BaseType::AccelerationStructure,
        ];
        ALL.get(raw as usize).copied()
    }

    /// Integer type tag for a width/signedness pair
    pub(crate) fn integer(width: u32, signed: bool) -> Self {
        match (width, signed) {
            (8, true) => BaseType::SByte,
            (8, false) => BaseType::UByte,
            (16, true) => BaseType::Short,
            (16, false) => BaseType::UShort,
            (64, true) => BaseType::Int64,
            (64, false) => BaseType::UInt64,
            (_, true) => BaseType::Int,
            (_, false) => BaseType::UInt,
        }
    }

    /// Float type tag for a width
    pub(crate) fn float(width: u32) -> Self {
        match width {
            16 => BaseType::Half,
            64 => BaseType::Double,
            _ => BaseType::Float,
        }
    }

    /// Images, samplers and acceleration structures have no byte size
    pub fn is_opaque(self) -> bool {
        matches!(
            self,
            BaseType::Image
                | BaseType::SampledImage
                | BaseType::Sampler
                | BaseType::AtomicCounter
                | BaseType::AccelerationStructure
        )
    }
}

/// OpTypeImage operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub sampled_type: Word,
    pub dim: Dim,
    pub depth: u32,
    pub arrayed: bool,
    pub multisampled: bool,
    /// 1 = sampled, 2 = storage, 0 = known at runtime only
    pub sampled: u32,
    pub format: ImageFormat,
}

/// A type as the reflection layer sees it
///
/// Arrays and pointers are flattened onto their element type: `array` holds
/// the extents innermost first (a runtime array is 0) and `pointer`/`storage`
/// describe an OpTypePointer wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct SpirType {
    /// Id of the declaration this descriptor was built from
    pub id: Word,
    /// Id of the innermost non-array, non-pointer type
    pub self_id: Word,
    /// Id of the type this one wraps (array element or pointee)
    pub parent: Option<Word>,
    pub base_type: BaseType,
    pub width: u32,
    pub vecsize: u32,
    pub columns: u32,
    pub member_types: Vec<Word>,
    pub array: Vec<u32>,
    pub pointer: bool,
    pub storage: Option<StorageClass>,
    pub image: Option<ImageInfo>,
}

impl SpirType {
    pub(crate) fn new(id: Word, base_type: BaseType) -> Self {
        Self {
            id,
            self_id: id,
            parent: None,
            base_type,
            width: 0,
            vecsize: 1,
            columns: 1,
            member_types: Vec::new(),
            array: Vec::new(),
            pointer: false,
            storage: None,
            image: None,
        }
    }

    pub(crate) fn scalar(id: Word, base_type: BaseType, width: u32) -> Self {
        Self { width, ..Self::new(id, base_type) }
    }

    /// Descriptor for `id` deriving from `element` (vector, matrix, array or pointer)
    pub(crate) fn derived(id: Word, element: &SpirType) -> Self {
        Self {
            id,
            parent: Some(element.id),
            ..element.clone()
        }
    }

    pub fn is_struct(&self) -> bool {
        self.base_type == BaseType::Struct
    }

    pub fn is_array(&self) -> bool {
        !self.array.is_empty()
    }

    pub fn is_matrix(&self) -> bool {
        self.columns > 1
    }
}
