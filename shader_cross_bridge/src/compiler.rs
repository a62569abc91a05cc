//! Safe wrapper around one boundary compiler handle
//!
//! Every call goes through the flat ABI exactly as a foreign caller would, and
//! every caller-owned output is copied and released before returning.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::ptr;

use shader_cross::spirv::{ExecutionModel, StorageClass};
use shader_cross::BaseType;

use crate::ffi::{self, ScInternalCompilerHandle, ScInternalResult};
use crate::ptr_util::{read_into_vec_from_ptr, read_string_from_ptr};
use crate::spirv::{
    BufferRange, CombinedImageSampler, Decoration, EntryPoint, Resource, ShaderResources, SpecializationConstant,
    Type, WorkGroupSize, WorkGroupSizeSpecializationConstants,
};
use crate::ErrorCode;

fn to_c_string(text: &str) -> Result<CString, ErrorCode> {
    CString::new(text).map_err(|_| ErrorCode::CompilationError(format!("String {:?} contains a NUL byte", text)))
}

/// Release one caller-owned boundary allocation
fn free<T>(pointer: *const T) -> Result<(), ErrorCode> {
    // SAFETY: `pointer` came from the boundary allocator and is released once
    check!(unsafe { ffi::sc_internal_free_pointer(pointer as *mut c_void) });
    Ok(())
}

/// Copy a caller-owned string and release it
fn take_string(pointer: *const c_char) -> Result<String, ErrorCode> {
    // SAFETY: the boundary hands out NUL-terminated strings
    let text = unsafe { read_string_from_ptr(pointer) }?;
    free(pointer)?;
    Ok(text)
}

fn take_resources(array: ffi::ScResourceArray) -> Result<Vec<Resource>, ErrorCode> {
    // SAFETY: `data` holds `num` elements, or is NULL when `num` is 0
    let flat = unsafe { read_into_vec_from_ptr(array.data, array.num) };
    let mut resources = Vec::with_capacity(flat.len());
    for resource in &flat {
        resources.push(Resource {
            id: resource.id,
            type_id: resource.type_id,
            base_type_id: resource.base_type_id,
            name: take_string(resource.name)?,
        });
    }
    free(array.data)?;
    Ok(resources)
}

pub(crate) struct Compiler<TTargetData> {
    pub(crate) sc_compiler: ScInternalCompilerHandle,
    pub(crate) target_data: TTargetData,
    pub(crate) has_been_compiled: bool,
}

impl<TTargetData> Compiler<TTargetData> {
    pub(crate) fn new(sc_compiler: ScInternalCompilerHandle, target_data: TTargetData) -> Self {
        Self {
            sc_compiler,
            target_data,
            has_been_compiled: false,
        }
    }

    // ===== DECORATIONS & NAMES =====

    pub(crate) fn get_decoration(&self, id: u32, decoration: Decoration) -> Result<u32, ErrorCode> {
        let mut result = 0;
        check!(unsafe {
            ffi::sc_internal_compiler_get_decoration(self.sc_compiler, &mut result, id, decoration as u32)
        });
        Ok(result)
    }

    pub(crate) fn set_decoration(&mut self, id: u32, decoration: Decoration, argument: u32) -> Result<(), ErrorCode> {
        check!(ffi::sc_internal_compiler_set_decoration(
            self.sc_compiler,
            id,
            decoration as u32,
            argument
        ));
        Ok(())
    }

    pub(crate) fn unset_decoration(&mut self, id: u32, decoration: Decoration) -> Result<(), ErrorCode> {
        check!(ffi::sc_internal_compiler_unset_decoration(self.sc_compiler, id, decoration as u32));
        Ok(())
    }

    pub(crate) fn get_name(&self, id: u32) -> Result<String, ErrorCode> {
        let mut name = ptr::null();
        check!(unsafe { ffi::sc_internal_compiler_get_name(self.sc_compiler, id, &mut name) });
        take_string(name)
    }

    pub(crate) fn set_name(&mut self, id: u32, name: &str) -> Result<(), ErrorCode> {
        let name = to_c_string(name)?;
        check!(unsafe { ffi::sc_internal_compiler_set_name(self.sc_compiler, id, name.as_ptr()) });
        Ok(())
    }

    pub(crate) fn get_member_name(&self, id: u32, index: u32) -> Result<String, ErrorCode> {
        let mut name = ptr::null();
        check!(unsafe { ffi::sc_internal_compiler_get_member_name(self.sc_compiler, id, index, &mut name) });
        take_string(name)
    }

    pub(crate) fn get_member_decoration(&self, id: u32, index: u32, decoration: Decoration) -> Result<u32, ErrorCode> {
        let mut result = 0;
        check!(unsafe {
            ffi::sc_internal_compiler_get_member_decoration(
                self.sc_compiler,
                id,
                index,
                decoration as u32,
                &mut result,
            )
        });
        Ok(result)
    }

    pub(crate) fn set_member_decoration(
        &mut self,
        id: u32,
        index: u32,
        decoration: Decoration,
        argument: u32,
    ) -> Result<(), ErrorCode> {
        check!(ffi::sc_internal_compiler_set_member_decoration(
            self.sc_compiler,
            id,
            index,
            decoration as u32,
            argument
        ));
        Ok(())
    }

    // ===== ENTRY POINTS =====

    pub(crate) fn get_entry_points(&self) -> Result<Vec<EntryPoint>, ErrorCode> {
        let mut data = ptr::null_mut();
        let mut size = 0;
        check!(unsafe { ffi::sc_internal_compiler_get_entry_points(self.sc_compiler, &mut data, &mut size) });
        // SAFETY: `data` holds `size` entries, or is NULL when `size` is 0
        let flat = unsafe { read_into_vec_from_ptr(data, size) };
        let mut entry_points = Vec::with_capacity(flat.len());
        for entry in &flat {
            let name = take_string(entry.name)?;
            let Some(execution_model) = ExecutionModel::from_u32(entry.execution_model) else {
                return Err(ErrorCode::Unhandled);
            };
            entry_points.push(EntryPoint {
                name,
                execution_model,
                work_group_size: WorkGroupSize {
                    x: entry.work_group_size_x,
                    y: entry.work_group_size_y,
                    z: entry.work_group_size_z,
                },
            });
        }
        free(data)?;
        Ok(entry_points)
    }

    pub(crate) fn get_cleansed_entry_point_name(
        &self,
        entry_point_name: &str,
        execution_model: ExecutionModel,
    ) -> Result<String, ErrorCode> {
        let original = to_c_string(entry_point_name)?;
        let mut cleansed = ptr::null();
        check!(unsafe {
            ffi::sc_internal_compiler_get_cleansed_entry_point_name(
                self.sc_compiler,
                original.as_ptr(),
                execution_model as u32,
                &mut cleansed,
            )
        });
        take_string(cleansed)
    }

    // ===== RESOURCES & CONSTANTS =====

    pub(crate) fn get_shader_resources(&self) -> Result<ShaderResources, ErrorCode> {
        let mut flat = ffi::ScShaderResources::default();
        check!(unsafe { ffi::sc_internal_compiler_get_shader_resources(self.sc_compiler, &mut flat) });
        Ok(ShaderResources {
            uniform_buffers: take_resources(flat.uniform_buffers)?,
            storage_buffers: take_resources(flat.storage_buffers)?,
            stage_inputs: take_resources(flat.stage_inputs)?,
            stage_outputs: take_resources(flat.stage_outputs)?,
            subpass_inputs: take_resources(flat.subpass_inputs)?,
            storage_images: take_resources(flat.storage_images)?,
            sampled_images: take_resources(flat.sampled_images)?,
            atomic_counters: take_resources(flat.atomic_counters)?,
            push_constant_buffers: take_resources(flat.push_constant_buffers)?,
            separate_images: take_resources(flat.separate_images)?,
            separate_samplers: take_resources(flat.separate_samplers)?,
        })
    }

    pub(crate) fn get_specialization_constants(&self) -> Result<Vec<SpecializationConstant>, ErrorCode> {
        let mut data = ptr::null_mut();
        let mut size = 0;
        check!(unsafe {
            ffi::sc_internal_compiler_get_specialization_constants(self.sc_compiler, &mut data, &mut size)
        });
        // SAFETY: `data` holds `size` constants, or is NULL when `size` is 0
        let constants = unsafe { read_into_vec_from_ptr(data, size) }
            .into_iter()
            .map(|constant| SpecializationConstant {
                id: constant.id,
                constant_id: constant.constant_id,
            })
            .collect();
        free(data)?;
        Ok(constants)
    }

    pub(crate) fn get_work_group_size_specialization_constants(
        &self,
    ) -> Result<WorkGroupSizeSpecializationConstants, ErrorCode> {
        let mut flat = [ffi::ScSpecializationConstant::default(); 3];
        check!(unsafe {
            ffi::sc_internal_compiler_get_work_group_size_specialization_constants(
                self.sc_compiler,
                flat.as_mut_ptr(),
            )
        });
        let [x, y, z] = flat.map(|constant| SpecializationConstant {
            id: constant.id,
            constant_id: constant.constant_id,
        });
        Ok(WorkGroupSizeSpecializationConstants { x, y, z })
    }

    pub(crate) fn set_scalar_constant(&mut self, id: u32, value: u64) -> Result<(), ErrorCode> {
        check!(ffi::sc_internal_compiler_set_scalar_constant(self.sc_compiler, id, value));
        Ok(())
    }

    pub(crate) fn get_type(&self, id: u32) -> Result<Type, ErrorCode> {
        let mut flat = ffi::ScType::default();
        check!(unsafe { ffi::sc_internal_compiler_get_type(self.sc_compiler, id, &mut flat) });
        // SAFETY: both arrays hold their advertised sizes, or are NULL when empty
        let member_types = unsafe { read_into_vec_from_ptr(flat.member_types, flat.member_types_size) };
        let array = unsafe { read_into_vec_from_ptr(flat.array, flat.array_size) };
        free(flat.member_types)?;
        free(flat.array)?;

        let Some(base_type) = BaseType::from_raw(flat.type_) else {
            return Err(ErrorCode::Unhandled);
        };
        let storage = match flat.storage {
            u32::MAX => None,
            raw => StorageClass::from_u32(raw),
        };
        Ok(Type {
            base_type,
            width: flat.width,
            vecsize: flat.vecsize,
            columns: flat.columns,
            member_types,
            array,
            pointer: flat.pointer,
            storage,
        })
    }

    pub(crate) fn get_declared_struct_size(&self, id: u32) -> Result<u32, ErrorCode> {
        let mut result = 0;
        check!(unsafe { ffi::sc_internal_compiler_get_declared_struct_size(self.sc_compiler, id, &mut result) });
        Ok(result)
    }

    pub(crate) fn get_declared_struct_member_size(&self, id: u32, index: u32) -> Result<u32, ErrorCode> {
        let mut result = 0;
        check!(unsafe {
            ffi::sc_internal_compiler_get_declared_struct_member_size(self.sc_compiler, id, index, &mut result)
        });
        Ok(result)
    }

    pub(crate) fn rename_interface_variable(
        &mut self,
        resources: &[Resource],
        location: u32,
        new_name: &str,
    ) -> Result<(), ErrorCode> {
        let flat: Vec<ffi::ScResource> = resources
            .iter()
            .map(|resource| ffi::ScResource {
                id: resource.id,
                type_id: resource.type_id,
                base_type_id: resource.base_type_id,
                name: ptr::null_mut(),
            })
            .collect();
        let new_name = to_c_string(new_name)?;
        check!(unsafe {
            ffi::sc_internal_compiler_rename_interface_variable(
                self.sc_compiler,
                flat.as_ptr(),
                flat.len(),
                location,
                new_name.as_ptr(),
            )
        });
        Ok(())
    }

    pub(crate) fn get_active_buffer_ranges(&self, id: u32) -> Result<Vec<BufferRange>, ErrorCode> {
        let mut data = ptr::null_mut();
        let mut size = 0;
        check!(unsafe {
            ffi::sc_internal_compiler_get_active_buffer_ranges(self.sc_compiler, id, &mut data, &mut size)
        });
        // SAFETY: `data` holds `size` ranges, or is NULL when `size` is 0
        let ranges = unsafe { read_into_vec_from_ptr(data, size) }
            .into_iter()
            .map(|range| BufferRange {
                index: range.index,
                offset: range.offset,
                range: range.range,
            })
            .collect();
        free(data)?;
        Ok(ranges)
    }

    // ===== COMBINED IMAGE SAMPLERS =====

    pub(crate) fn build_combined_image_samplers(&mut self) -> Result<(), ErrorCode> {
        check!(ffi::sc_internal_compiler_build_combined_image_samplers(self.sc_compiler));
        Ok(())
    }

    /// The table belongs to the handle; it is neither copied nor freed
    pub(crate) fn get_combined_image_samplers(&self) -> Result<&[CombinedImageSampler], ErrorCode> {
        let mut data = ptr::null();
        let mut size = 0;
        check!(unsafe {
            ffi::sc_internal_compiler_get_combined_image_samplers(self.sc_compiler, &mut data, &mut size)
        });
        if data.is_null() || size == 0 {
            return Ok(&[]);
        }
        // SAFETY: the table lives until the handle is deleted in `Drop` or
        // rebuilt through `build_combined_image_samplers`, which takes `&mut self`
        Ok(unsafe { std::slice::from_raw_parts(data, size) })
    }

    // ===== COMPILE =====

    pub(crate) fn compile(&mut self) -> Result<String, ErrorCode> {
        let mut shader = ptr::null();
        check!(unsafe { ffi::sc_internal_compiler_compile(self.sc_compiler, &mut shader) });
        let shader = take_string(shader)?;
        self.has_been_compiled = true;
        Ok(shader)
    }
}

impl<TTargetData> Drop for Compiler<TTargetData> {
    fn drop(&mut self) {
        let result = ffi::sc_internal_compiler_delete(self.sc_compiler);
        debug_assert_eq!(result, ScInternalResult::Success);
    }
}
