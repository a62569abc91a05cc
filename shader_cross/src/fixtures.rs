//! In-memory SPIR-V modules for tests
//!
//! [`ModuleWriter`] emits raw words section by section so that fixtures do not
//! depend on the loader they are meant to exercise. The canned modules cover
//! every resource category the reflection layer reports.

use spirv::{
    AddressingModel, BuiltIn, Capability, Decoration, Dim, ExecutionMode, ExecutionModel,
    ImageFormat, MemoryModel, Op, StorageClass, Word,
};

/// SPIR-V 1.0
const VERSION_1_0: Word = 0x0001_0000;

/// Word-level SPIR-V module writer
#[derive(Debug, Default)]
pub struct ModuleWriter {
    next_id: Word,
    capabilities: Vec<Word>,
    memory_model: Vec<Word>,
    entry_points: Vec<Word>,
    execution_modes: Vec<Word>,
    debug: Vec<Word>,
    annotations: Vec<Word>,
    globals: Vec<Word>,
    functions: Vec<Word>,
}

/// Encode a literal string: UTF-8, NUL terminated, zero padded to a word
pub fn encode_string(text: &str) -> Vec<Word> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn emit(section: &mut Vec<Word>, op: Op, operands: &[Word]) {
    section.push(((operands.len() as Word + 1) << 16) | op as Word);
    section.extend_from_slice(operands);
}

impl ModuleWriter {
    pub fn new() -> Self {
        Self { next_id: 1, ..Default::default() }
    }

    /// Reserve a fresh result id
    pub fn id(&mut self) -> Word {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn capability(&mut self, capability: Capability) {
        emit(&mut self.capabilities, Op::Capability, &[capability as Word]);
    }

    /// OpMemoryModel Logical GLSL450
    pub fn logical_glsl450(&mut self) {
        self.memory_model.clear();
        emit(
            &mut self.memory_model,
            Op::MemoryModel,
            &[AddressingModel::Logical as Word, MemoryModel::GLSL450 as Word],
        );
    }

    pub fn entry_point(&mut self, model: ExecutionModel, function: Word, name: &str, interface: &[Word]) {
        let mut operands = vec![model as Word, function];
        operands.extend(encode_string(name));
        operands.extend_from_slice(interface);
        emit(&mut self.entry_points, Op::EntryPoint, &operands);
    }

    pub fn execution_mode(&mut self, function: Word, mode: ExecutionMode, literals: &[Word]) {
        let mut operands = vec![function, mode as Word];
        operands.extend_from_slice(literals);
        emit(&mut self.execution_modes, Op::ExecutionMode, &operands);
    }

    pub fn name(&mut self, target: Word, name: &str) {
        let mut operands = vec![target];
        operands.extend(encode_string(name));
        emit(&mut self.debug, Op::Name, &operands);
    }

    pub fn member_name(&mut self, target: Word, member: u32, name: &str) {
        let mut operands = vec![target, member];
        operands.extend(encode_string(name));
        emit(&mut self.debug, Op::MemberName, &operands);
    }

    pub fn decorate(&mut self, target: Word, decoration: Decoration, literals: &[Word]) {
        let mut operands = vec![target, decoration as Word];
        operands.extend_from_slice(literals);
        emit(&mut self.annotations, Op::Decorate, &operands);
    }

    pub fn member_decorate(&mut self, target: Word, member: u32, decoration: Decoration, literals: &[Word]) {
        let mut operands = vec![target, member, decoration as Word];
        operands.extend_from_slice(literals);
        emit(&mut self.annotations, Op::MemberDecorate, &operands);
    }

    /// Group `decorations` on a fresh OpDecorationGroup and apply it to `targets`
    pub fn decoration_group(&mut self, decorations: &[(Decoration, &[Word])], targets: &[Word]) -> Word {
        let group = self.id();
        for (decoration, literals) in decorations {
            self.decorate(group, *decoration, literals);
        }
        emit(&mut self.annotations, Op::DecorationGroup, &[group]);
        let mut operands = vec![group];
        operands.extend_from_slice(targets);
        emit(&mut self.annotations, Op::GroupDecorate, &operands);
        group
    }

    /// Type declaration: `%id = op operands...`
    pub fn type_decl(&mut self, op: Op, operands: &[Word]) -> Word {
        let id = self.id();
        let mut words = vec![id];
        words.extend_from_slice(operands);
        emit(&mut self.globals, op, &words);
        id
    }

    /// Value in the global section: `%id = op %result_type operands...`
    pub fn global_value(&mut self, op: Op, result_type: Word, operands: &[Word]) -> Word {
        let id = self.id();
        let mut words = vec![result_type, id];
        words.extend_from_slice(operands);
        emit(&mut self.globals, op, &words);
        id
    }

    pub fn variable(&mut self, pointer_type: Word, storage: StorageClass) -> Word {
        self.global_value(Op::Variable, pointer_type, &[storage as Word])
    }

    /// Open a function (no parameters, default control) and its first block
    pub fn begin_function(&mut self, return_type: Word, function_type: Word) -> Word {
        let function = self.id();
        emit(
            &mut self.functions,
            Op::Function,
            &[return_type, function, 0, function_type],
        );
        let label = self.id();
        emit(&mut self.functions, Op::Label, &[label]);
        function
    }

    /// Instruction with a result inside the current block
    pub fn body_value(&mut self, op: Op, result_type: Word, operands: &[Word]) -> Word {
        let id = self.id();
        let mut words = vec![result_type, id];
        words.extend_from_slice(operands);
        emit(&mut self.functions, op, &words);
        id
    }

    /// Instruction without a result inside the current block
    pub fn body(&mut self, op: Op, operands: &[Word]) {
        emit(&mut self.functions, op, operands);
    }

    /// OpReturn + OpFunctionEnd
    pub fn end_function(&mut self) {
        emit(&mut self.functions, Op::Return, &[]);
        emit(&mut self.functions, Op::FunctionEnd, &[]);
    }

    /// Header plus every section in the order the binary format requires
    pub fn finish(self) -> Vec<Word> {
        let mut words = vec![spirv::MAGIC_NUMBER, VERSION_1_0, 0, self.next_id, 0];
        words.extend(self.capabilities);
        words.extend(self.memory_model);
        words.extend(self.entry_points);
        words.extend(self.execution_modes);
        words.extend(self.debug);
        words.extend(self.annotations);
        words.extend(self.globals);
        words.extend(self.functions);
        words
    }
}

// ============================================================================
// CANNED MODULES
// ============================================================================

/// Fragment shader: one uniform block `UniformBufferObject { vec4 color; }`
/// (set 0, binding 0) copied into one `vec4` output at location 0.
pub fn uniform_fragment() -> Vec<Word> {
    let mut w = ModuleWriter::new();
    w.capability(Capability::Shader);
    w.logical_glsl450();

    let void = w.type_decl(Op::TypeVoid, &[]);
    let fn_void = w.type_decl(Op::TypeFunction, &[void]);
    let float = w.type_decl(Op::TypeFloat, &[32]);
    let vec4 = w.type_decl(Op::TypeVector, &[float, 4]);
    let int = w.type_decl(Op::TypeInt, &[32, 1]);
    let int_0 = w.global_value(Op::Constant, int, &[0]);
    let block = w.type_decl(Op::TypeStruct, &[vec4]);
    let ptr_uniform_block = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, block]);
    let ubo = w.variable(ptr_uniform_block, StorageClass::Uniform);
    let ptr_uniform_vec4 = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, vec4]);
    let ptr_output_vec4 = w.type_decl(Op::TypePointer, &[StorageClass::Output as Word, vec4]);
    let out_color = w.variable(ptr_output_vec4, StorageClass::Output);

    let main = w.begin_function(void, fn_void);
    let color_ptr = w.body_value(Op::AccessChain, ptr_uniform_vec4, &[ubo, int_0]);
    let color = w.body_value(Op::Load, vec4, &[color_ptr]);
    w.body(Op::Store, &[out_color, color]);
    w.end_function();

    w.entry_point(ExecutionModel::Fragment, main, "main", &[out_color]);
    w.execution_mode(main, ExecutionMode::OriginUpperLeft, &[]);

    w.name(main, "main");
    w.name(block, "UniformBufferObject");
    w.member_name(block, 0, "color");
    w.name(ubo, "ubo");
    w.name(out_color, "out_color");

    w.decorate(block, Decoration::Block, &[]);
    w.member_decorate(block, 0, Decoration::Offset, &[0]);
    w.decorate(ubo, Decoration::DescriptorSet, &[0]);
    w.decorate(ubo, Decoration::Binding, &[0]);
    w.decorate(out_color, Decoration::Location, &[0]);

    w.finish()
}

/// Vertex shader: two inputs, one user output, `gl_Position`, a uniform block
/// `uniform_buffer_object { mat4 u_model_view_projection; float u_scale; }`
/// and an unused push constant block.
pub fn vertex_passthrough() -> Vec<Word> {
    let mut w = ModuleWriter::new();
    w.capability(Capability::Shader);
    w.logical_glsl450();

    let void = w.type_decl(Op::TypeVoid, &[]);
    let fn_void = w.type_decl(Op::TypeFunction, &[void]);
    let float = w.type_decl(Op::TypeFloat, &[32]);
    let vec4 = w.type_decl(Op::TypeVector, &[float, 4]);
    let mat4 = w.type_decl(Op::TypeMatrix, &[vec4, 4]);
    let int = w.type_decl(Op::TypeInt, &[32, 1]);
    let int_0 = w.global_value(Op::Constant, int, &[0]);
    let int_1 = w.global_value(Op::Constant, int, &[1]);

    let block = w.type_decl(Op::TypeStruct, &[mat4, float]);
    let ptr_uniform_block = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, block]);
    let ubo = w.variable(ptr_uniform_block, StorageClass::Uniform);
    let ptr_uniform_mat4 = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, mat4]);
    let ptr_uniform_float = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, float]);

    let push_block = w.type_decl(Op::TypeStruct, &[vec4]);
    let ptr_push_block = w.type_decl(Op::TypePointer, &[StorageClass::PushConstant as Word, push_block]);
    let push = w.variable(ptr_push_block, StorageClass::PushConstant);

    let ptr_input_vec4 = w.type_decl(Op::TypePointer, &[StorageClass::Input as Word, vec4]);
    let a_position = w.variable(ptr_input_vec4, StorageClass::Input);
    let a_normal = w.variable(ptr_input_vec4, StorageClass::Input);
    let ptr_output_vec4 = w.type_decl(Op::TypePointer, &[StorageClass::Output as Word, vec4]);
    let v_normal = w.variable(ptr_output_vec4, StorageClass::Output);
    let position = w.variable(ptr_output_vec4, StorageClass::Output);

    let main = w.begin_function(void, fn_void);
    let normal = w.body_value(Op::Load, vec4, &[a_normal]);
    w.body(Op::Store, &[v_normal, normal]);
    let mvp_ptr = w.body_value(Op::AccessChain, ptr_uniform_mat4, &[ubo, int_0]);
    let mvp = w.body_value(Op::Load, mat4, &[mvp_ptr]);
    let vertex = w.body_value(Op::Load, vec4, &[a_position]);
    let transformed = w.body_value(Op::MatrixTimesVector, vec4, &[mvp, vertex]);
    let scale_ptr = w.body_value(Op::AccessChain, ptr_uniform_float, &[ubo, int_1]);
    let scale = w.body_value(Op::Load, float, &[scale_ptr]);
    let scaled = w.body_value(Op::VectorTimesScalar, vec4, &[transformed, scale]);
    w.body(Op::Store, &[position, scaled]);
    w.end_function();

    w.entry_point(
        ExecutionModel::Vertex,
        main,
        "main",
        &[a_position, a_normal, v_normal, position],
    );

    w.name(main, "main");
    w.name(block, "uniform_buffer_object");
    w.member_name(block, 0, "u_model_view_projection");
    w.member_name(block, 1, "u_scale");
    w.name(push_block, "PushConstants");
    w.member_name(push_block, 0, "tint");
    w.name(push, "push");
    w.name(a_position, "a_position");
    w.name(a_normal, "a_normal");
    w.name(v_normal, "v_normal");
    w.name(position, "gl_Position");

    w.decorate(block, Decoration::Block, &[]);
    w.member_decorate(block, 0, Decoration::ColMajor, &[]);
    w.member_decorate(block, 0, Decoration::Offset, &[0]);
    w.member_decorate(block, 0, Decoration::MatrixStride, &[16]);
    w.member_decorate(block, 1, Decoration::Offset, &[64]);
    w.decorate(ubo, Decoration::DescriptorSet, &[0]);
    w.decorate(ubo, Decoration::Binding, &[0]);
    w.decorate(push_block, Decoration::Block, &[]);
    w.member_decorate(push_block, 0, Decoration::Offset, &[0]);
    w.decorate(a_position, Decoration::Location, &[0]);
    w.decorate(a_normal, Decoration::Location, &[1]);
    w.decorate(v_normal, Decoration::Location, &[0]);
    w.decorate(position, Decoration::BuiltIn, &[BuiltIn::Position as Word]);

    w.finish()
}

/// Compute shader: workgroup size `(SpecId 0 = 8, SpecId 1 = 4, 1)` through
/// the `WorkgroupSize` built-in, a boolean spec constant (SpecId 5), a
/// `BufferBlock` storage buffer with a runtime array and a `Params` uniform
/// block `{ vec3 offset; float weights[4]; mat4 transform; }`.
pub fn compute_spec_workgroup() -> Vec<Word> {
    let mut w = ModuleWriter::new();
    w.capability(Capability::Shader);
    w.logical_glsl450();

    let void = w.type_decl(Op::TypeVoid, &[]);
    let fn_void = w.type_decl(Op::TypeFunction, &[void]);
    let bool_ty = w.type_decl(Op::TypeBool, &[]);
    let uint = w.type_decl(Op::TypeInt, &[32, 0]);
    let int = w.type_decl(Op::TypeInt, &[32, 1]);
    let float = w.type_decl(Op::TypeFloat, &[32]);
    let vec3 = w.type_decl(Op::TypeVector, &[float, 3]);
    let vec4 = w.type_decl(Op::TypeVector, &[float, 4]);
    let mat4 = w.type_decl(Op::TypeMatrix, &[vec4, 4]);
    let uvec3 = w.type_decl(Op::TypeVector, &[uint, 3]);

    let size_x = w.global_value(Op::SpecConstant, uint, &[8]);
    let size_y = w.global_value(Op::SpecConstant, uint, &[4]);
    let size_z = w.global_value(Op::Constant, uint, &[1]);
    let workgroup = w.global_value(Op::SpecConstantComposite, uvec3, &[size_x, size_y, size_z]);
    let feature = w.global_value(Op::SpecConstantTrue, bool_ty, &[]);
    let uint_4 = w.global_value(Op::Constant, uint, &[4]);
    let int_0 = w.global_value(Op::Constant, int, &[0]);
    let int_2 = w.global_value(Op::Constant, int, &[2]);

    let values = w.type_decl(Op::TypeRuntimeArray, &[uint]);
    let data_block = w.type_decl(Op::TypeStruct, &[values]);
    let ptr_uniform_data = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, data_block]);
    let data = w.variable(ptr_uniform_data, StorageClass::Uniform);

    let weights = w.type_decl(Op::TypeArray, &[float, uint_4]);
    let params_block = w.type_decl(Op::TypeStruct, &[vec3, weights, mat4]);
    let ptr_uniform_params = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, params_block]);
    let params = w.variable(ptr_uniform_params, StorageClass::Uniform);
    let ptr_uniform_vec3 = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, vec3]);
    let ptr_uniform_mat4 = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, mat4]);

    let main = w.begin_function(void, fn_void);
    let offset_ptr = w.body_value(Op::AccessChain, ptr_uniform_vec3, &[params, int_0]);
    w.body_value(Op::Load, vec3, &[offset_ptr]);
    let transform_ptr = w.body_value(Op::AccessChain, ptr_uniform_mat4, &[params, int_2]);
    w.body_value(Op::Load, mat4, &[transform_ptr]);
    w.end_function();

    w.entry_point(ExecutionModel::GLCompute, main, "main", &[]);
    w.execution_mode(main, ExecutionMode::LocalSize, &[1, 1, 1]);

    w.name(main, "main");
    w.name(feature, "enable_feature");
    w.name(data_block, "Data");
    w.member_name(data_block, 0, "values");
    w.name(data, "data");
    w.name(params_block, "Params");
    w.member_name(params_block, 0, "offset");
    w.member_name(params_block, 1, "weights");
    w.member_name(params_block, 2, "transform");
    w.name(params, "params");

    w.decorate(size_x, Decoration::SpecId, &[0]);
    w.decorate(size_y, Decoration::SpecId, &[1]);
    w.decorate(workgroup, Decoration::BuiltIn, &[BuiltIn::WorkgroupSize as Word]);
    w.decorate(feature, Decoration::SpecId, &[5]);
    w.decorate(values, Decoration::ArrayStride, &[4]);
    w.decorate(data_block, Decoration::BufferBlock, &[]);
    w.member_decorate(data_block, 0, Decoration::Offset, &[0]);
    w.decorate(weights, Decoration::ArrayStride, &[16]);
    w.decorate(params_block, Decoration::Block, &[]);
    w.member_decorate(params_block, 0, Decoration::Offset, &[0]);
    w.member_decorate(params_block, 1, Decoration::Offset, &[16]);
    w.member_decorate(params_block, 2, Decoration::ColMajor, &[]);
    w.member_decorate(params_block, 2, Decoration::Offset, &[80]);
    w.member_decorate(params_block, 2, Decoration::MatrixStride, &[16]);
    w.decoration_group(&[(Decoration::DescriptorSet, &[0])], &[data, params]);
    w.decorate(data, Decoration::Binding, &[0]);
    w.decorate(params, Decoration::Binding, &[1]);

    w.finish()
}

/// Fragment shader: a separate image and sampler combined with
/// OpSampledImage, a combined sampler, a storage image, a subpass input and
/// `gl_FragCoord` (a built-in input).
pub fn textured_fragment() -> Vec<Word> {
    let mut w = ModuleWriter::new();
    w.capability(Capability::Shader);
    w.capability(Capability::InputAttachment);
    w.logical_glsl450();

    let void = w.type_decl(Op::TypeVoid, &[]);
    let fn_void = w.type_decl(Op::TypeFunction, &[void]);
    let float = w.type_decl(Op::TypeFloat, &[32]);
    let vec2 = w.type_decl(Op::TypeVector, &[float, 2]);
    let vec4 = w.type_decl(Op::TypeVector, &[float, 4]);
    let half = w.global_value(Op::Constant, float, &[0.5f32.to_bits()]);
    let uv = w.global_value(Op::ConstantComposite, vec2, &[half, half]);

    let image_2d = w.type_decl(
        Op::TypeImage,
        &[float, Dim::Dim2D as Word, 0, 0, 0, 1, ImageFormat::Unknown as Word],
    );
    let storage_2d = w.type_decl(
        Op::TypeImage,
        &[float, Dim::Dim2D as Word, 0, 0, 0, 2, ImageFormat::Rgba8 as Word],
    );
    let subpass = w.type_decl(
        Op::TypeImage,
        &[float, Dim::DimSubpassData as Word, 0, 0, 0, 2, ImageFormat::Unknown as Word],
    );
    let sampler = w.type_decl(Op::TypeSampler, &[]);
    let sampled_image = w.type_decl(Op::TypeSampledImage, &[image_2d]);

    let uc = StorageClass::UniformConstant as Word;
    let ptr_image = w.type_decl(Op::TypePointer, &[uc, image_2d]);
    let ptr_storage = w.type_decl(Op::TypePointer, &[uc, storage_2d]);
    let ptr_subpass = w.type_decl(Op::TypePointer, &[uc, subpass]);
    let ptr_sampler = w.type_decl(Op::TypePointer, &[uc, sampler]);
    let ptr_sampled = w.type_decl(Op::TypePointer, &[uc, sampled_image]);

    let albedo_texture = w.variable(ptr_image, StorageClass::UniformConstant);
    let albedo_sampler = w.variable(ptr_sampler, StorageClass::UniformConstant);
    let shadow_map = w.variable(ptr_sampled, StorageClass::UniformConstant);
    let output_image = w.variable(ptr_storage, StorageClass::UniformConstant);
    let gbuffer = w.variable(ptr_subpass, StorageClass::UniformConstant);

    let ptr_input_vec4 = w.type_decl(Op::TypePointer, &[StorageClass::Input as Word, vec4]);
    let frag_coord = w.variable(ptr_input_vec4, StorageClass::Input);
    let ptr_output_vec4 = w.type_decl(Op::TypePointer, &[StorageClass::Output as Word, vec4]);
    let frag_color = w.variable(ptr_output_vec4, StorageClass::Output);

    let main = w.begin_function(void, fn_void);
    let image = w.body_value(Op::Load, image_2d, &[albedo_texture]);
    let smp = w.body_value(Op::Load, sampler, &[albedo_sampler]);
    let combined = w.body_value(Op::SampledImage, sampled_image, &[image, smp]);
    let color = w.body_value(Op::ImageSampleImplicitLod, vec4, &[combined, uv]);
    w.body(Op::Store, &[frag_color, color]);
    w.end_function();

    w.entry_point(ExecutionModel::Fragment, main, "main", &[frag_coord, frag_color]);
    w.execution_mode(main, ExecutionMode::OriginUpperLeft, &[]);

    w.name(main, "main");
    w.name(albedo_texture, "albedo_texture");
    w.name(albedo_sampler, "albedo_sampler");
    w.name(shadow_map, "shadow_map");
    w.name(output_image, "output_image");
    w.name(gbuffer, "gbuffer");
    w.name(frag_coord, "gl_FragCoord");
    w.name(frag_color, "frag_color");

    for (variable, binding) in [
        (albedo_texture, 1),
        (albedo_sampler, 2),
        (shadow_map, 3),
        (output_image, 4),
        (gbuffer, 5),
    ] {
        w.decorate(variable, Decoration::DescriptorSet, &[0]);
        w.decorate(variable, Decoration::Binding, &[binding]);
    }
    w.decorate(gbuffer, Decoration::InputAttachmentIndex, &[0]);
    w.decorate(frag_coord, Decoration::BuiltIn, &[BuiltIn::FragCoord as Word]);
    w.decorate(frag_color, Decoration::Location, &[0]);

    w.finish()
}

/// Fragment module with two entry points writing the same output: `main`
/// copies `UniformBufferObject.color` (set 0, binding 0), `tint` writes
/// constant red and touches no resource.
pub fn two_fragment_entry_points() -> Vec<Word> {
    let mut w = ModuleWriter::new();
    w.capability(Capability::Shader);
    w.logical_glsl450();

    let void = w.type_decl(Op::TypeVoid, &[]);
    let fn_void = w.type_decl(Op::TypeFunction, &[void]);
    let float = w.type_decl(Op::TypeFloat, &[32]);
    let vec4 = w.type_decl(Op::TypeVector, &[float, 4]);
    let int = w.type_decl(Op::TypeInt, &[32, 1]);
    let int_0 = w.global_value(Op::Constant, int, &[0]);
    let float_0 = w.global_value(Op::Constant, float, &[0.0f32.to_bits()]);
    let float_1 = w.global_value(Op::Constant, float, &[1.0f32.to_bits()]);
    let red = w.global_value(Op::ConstantComposite, vec4, &[float_1, float_0, float_0, float_1]);
    let block = w.type_decl(Op::TypeStruct, &[vec4]);
    let ptr_uniform_block = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, block]);
    let ubo = w.variable(ptr_uniform_block, StorageClass::Uniform);
    let ptr_uniform_vec4 = w.type_decl(Op::TypePointer, &[StorageClass::Uniform as Word, vec4]);
    let ptr_output_vec4 = w.type_decl(Op::TypePointer, &[StorageClass::Output as Word, vec4]);
    let out_color = w.variable(ptr_output_vec4, StorageClass::Output);

    let main = w.begin_function(void, fn_void);
    let color_ptr = w.body_value(Op::AccessChain, ptr_uniform_vec4, &[ubo, int_0]);
    let color = w.body_value(Op::Load, vec4, &[color_ptr]);
    w.body(Op::Store, &[out_color, color]);
    w.end_function();

    let tint = w.begin_function(void, fn_void);
    w.body(Op::Store, &[out_color, red]);
    w.end_function();

    w.entry_point(ExecutionModel::Fragment, main, "main", &[out_color]);
    w.entry_point(ExecutionModel::Fragment, tint, "tint", &[out_color]);
    w.execution_mode(main, ExecutionMode::OriginUpperLeft, &[]);
    w.execution_mode(tint, ExecutionMode::OriginUpperLeft, &[]);

    w.name(main, "main");
    w.name(tint, "tint");
    w.name(block, "UniformBufferObject");
    w.member_name(block, 0, "color");
    w.name(ubo, "ubo");
    w.name(out_color, "out_color");

    w.decorate(block, Decoration::Block, &[]);
    w.member_decorate(block, 0, Decoration::Offset, &[0]);
    w.decorate(ubo, Decoration::DescriptorSet, &[0]);
    w.decorate(ubo, Decoration::Binding, &[0]);
    w.decorate(out_color, Decoration::Location, &[0]);

    w.finish()
}

/// Compute shader storing 1 into a workgroup `uint counter`.
pub fn workgroup_counter() -> Vec<Word> {
    let mut w = ModuleWriter::new();
    w.capability(Capability::Shader);
    w.logical_glsl450();

    let void = w.type_decl(Op::TypeVoid, &[]);
    let fn_void = w.type_decl(Op::TypeFunction, &[void]);
    let uint = w.type_decl(Op::TypeInt, &[32, 0]);
    let uint_1 = w.global_value(Op::Constant, uint, &[1]);
    let ptr_workgroup_uint = w.type_decl(Op::TypePointer, &[StorageClass::Workgroup as Word, uint]);
    let counter = w.variable(ptr_workgroup_uint, StorageClass::Workgroup);

    let main = w.begin_function(void, fn_void);
    w.body(Op::Store, &[counter, uint_1]);
    w.end_function();

    w.entry_point(ExecutionModel::GLCompute, main, "main", &[]);
    w.execution_mode(main, ExecutionMode::LocalSize, &[64, 1, 1]);

    w.name(main, "main");
    w.name(counter, "counter");

    w.finish()
}
