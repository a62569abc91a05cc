//! Declared sizes of buffer block structs
//!
//! Sizes come from the explicit layout decorations (`Offset`, `ArrayStride`,
//! `MatrixStride`) rather than from any packing rule, so they match what the
//! module's producer laid out.

use spirv::{Decoration, Word};

use crate::error::Result;
use crate::ir::{ParsedModule, SpirType};

const SOURCE: &str = "shader_cross::layout";

fn overflow(id: Word) -> crate::Error {
    crate::cross_err!(SOURCE, InvalidArgument, "Declared size of type {} does not fit in 32 bits", id)
}

fn struct_type(module: &ParsedModule, id: Word) -> Result<&SpirType> {
    let ty = module.type_of(id)?;
    if !ty.is_struct() {
        crate::cross_bail!(SOURCE, InvalidArgument, "Type {} is not a struct", id);
    }
    Ok(ty)
}

/// Offset of the last member plus its size
///
/// A trailing runtime array contributes nothing.
pub fn declared_struct_size(module: &ParsedModule, id: Word) -> Result<u32> {
    let ty = struct_type(module, id)?;
    let Some(last) = ty.member_types.len().checked_sub(1) else {
        crate::cross_bail!(SOURCE, InvalidArgument, "Declared struct in block cannot be size 0.");
    };
    let last = last as u32;

    let annotations = module.annotations();
    if !annotations.has_member_decoration(ty.id, last, Decoration::Offset) {
        crate::cross_bail!(SOURCE, InvalidArgument, "Struct member does not have Offset set.");
    }
    let offset = annotations.member_decoration(ty.id, last, Decoration::Offset);
    let size = declared_struct_member_size(module, ty.id, last)?;
    offset.checked_add(size).ok_or_else(|| overflow(ty.id))
}

/// Size in bytes of member `index` of struct `id`
pub fn declared_struct_member_size(module: &ParsedModule, id: Word, index: u32) -> Result<u32> {
    let ty = struct_type(module, id)?;
    let Some(member_id) = ty.member_types.get(index as usize).copied() else {
        crate::cross_bail!(
            SOURCE,
            InvalidArgument,
            "Member index {} is out of range for struct {} with {} members",
            index,
            id,
            ty.member_types.len()
        );
    };
    let member = module.type_of(member_id)?;
    let annotations = module.annotations();

    if let Some(outermost) = member.array.last().copied() {
        if outermost == 0 {
            return Ok(0);
        }
        if !annotations.has_decoration(member.id, Decoration::ArrayStride) {
            crate::cross_bail!(SOURCE, InvalidArgument, "Type does not have ArrayStride set.");
        }
        let stride = annotations.decoration(member.id, Decoration::ArrayStride);
        return stride.checked_mul(outermost).ok_or_else(|| overflow(member.id));
    }

    if member.pointer {
        // Physical storage buffer pointers
        return Ok(8);
    }
    if member.is_struct() {
        return declared_struct_size(module, member.id);
    }
    if member.base_type.is_opaque() {
        crate::cross_bail!(SOURCE, InvalidArgument, "Opaque type {} has no declared size.", member.id);
    }

    let component_size = member.width / 8;
    if !member.is_matrix() {
        return component_size.checked_mul(member.vecsize).ok_or_else(|| overflow(member.id));
    }

    if !annotations.has_member_decoration(ty.id, index, Decoration::MatrixStride) {
        crate::cross_bail!(SOURCE, InvalidArgument, "Struct member does not have MatrixStride set.");
    }
    let stride = annotations.member_decoration(ty.id, index, Decoration::MatrixStride);
    let count = if annotations.has_member_decoration(ty.id, index, Decoration::RowMajor) {
        member.vecsize
    } else {
        member.columns
    };
    stride.checked_mul(count).ok_or_else(|| overflow(member.id))
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
