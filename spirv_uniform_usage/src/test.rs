use super::*;
use indoc::indoc;
use pretty_assertions::assert_eq;
use rspirv::{
    binary::Assemble,
    dr::{Block, Function, Instruction, ModuleHeader, Operand},
    spirv::{
        AddressingModel, Capability, Decoration, ExecutionModel, FunctionControl, MemoryModel, Op,
        StorageClass,
    },
};

// Type ids shared by all test modules.
// Variable and function ids in tests should avoid these.
const TYPE_VOID: Word = 1;
const TYPE_FUNCTION: Word = 2;
const TYPE_FLOAT: Word = 3;
const TYPE_POINTER: Word = 90;

// Labels don't affect the analysis, so they use a separate range.
const FIRST_LABEL: Word = 1_000_000;

/// Builds a module with explicit ids for testing.
pub struct TestModule {
    module: rspirv::dr::Module,
    next_label: Word,
}

impl TestModule {
    pub fn new() -> Self {
        let mut module = rspirv::dr::Module::new();
        module.capabilities.push(Instruction::new(
            Op::Capability,
            None,
            None,
            vec![Operand::Capability(Capability::Shader)],
        ));
        module.memory_model = Some(Instruction::new(
            Op::MemoryModel,
            None,
            None,
            vec![
                Operand::AddressingModel(AddressingModel::Logical),
                Operand::MemoryModel(MemoryModel::GLSL450),
            ],
        ));
        module.types_global_values.extend([
            Instruction::new(Op::TypeVoid, None, Some(TYPE_VOID), Vec::new()),
            Instruction::new(
                Op::TypeFunction,
                None,
                Some(TYPE_FUNCTION),
                vec![Operand::IdRef(TYPE_VOID)],
            ),
            Instruction::new(
                Op::TypeFloat,
                None,
                Some(TYPE_FLOAT),
                vec![Operand::LiteralBit32(32)],
            ),
        ]);

        Self {
            module,
            next_label: FIRST_LABEL,
        }
    }

    pub fn variable(mut self, id: Word, storage_class: StorageClass) -> Self {
        self.module.types_global_values.push(Instruction::new(
            Op::Variable,
            Some(TYPE_POINTER),
            Some(id),
            vec![Operand::StorageClass(storage_class)],
        ));
        self
    }

    pub fn decorate(mut self, id: Word, decoration: Decoration, value: u32) -> Self {
        self.module.annotations.push(Instruction::new(
            Op::Decorate,
            None,
            None,
            vec![
                Operand::IdRef(id),
                Operand::Decoration(decoration),
                Operand::LiteralBit32(value),
            ],
        ));
        self
    }

    pub fn function<I>(mut self, id: Word, body: I) -> Self
    where
        I: IntoIterator<Item = Instruction>,
    {
        let function = TestFunction::new(id)
            .label(self.next_label)
            .body(body)
            .build();
        self.next_label += 1;
        self.module.functions.push(function);
        self
    }

    pub fn entry_point(mut self, model: ExecutionModel, function: Word, name: &str) -> Self {
        self.module.entry_points.push(Instruction::new(
            Op::EntryPoint,
            None,
            None,
            vec![
                Operand::ExecutionModel(model),
                Operand::IdRef(function),
                Operand::LiteralString(name.to_string()),
            ],
        ));
        self
    }

    pub fn build(self) -> rspirv::dr::Module {
        self.module
    }

    /// Assembles the module into a SPIR-V binary.
    pub fn words(self) -> Vec<u32> {
        let mut module = self.build();
        module.header = Some(ModuleHeader::new(FIRST_LABEL * 2));
        module.assemble()
    }
}

/// Builds a function with a single block ending in `OpReturn`.
pub struct TestFunction {
    id: Word,
    label: Word,
    body: Vec<Instruction>,
}

impl TestFunction {
    pub fn new(id: Word) -> Self {
        Self {
            id,
            label: FIRST_LABEL,
            body: Vec::new(),
        }
    }

    pub fn label(mut self, label: Word) -> Self {
        self.label = label;
        self
    }

    pub fn body<I>(mut self, body: I) -> Self
    where
        I: IntoIterator<Item = Instruction>,
    {
        self.body.extend(body);
        self
    }

    pub fn build(self) -> Function {
        let mut block = Block::new();
        block.label = Some(Instruction::new(Op::Label, None, Some(self.label), Vec::new()));
        block.instructions = self.body;
        block
            .instructions
            .push(Instruction::new(Op::Return, None, None, Vec::new()));

        let mut function = Function::new();
        function.def = Some(Instruction::new(
            Op::Function,
            Some(TYPE_VOID),
            Some(self.id),
            vec![
                Operand::FunctionControl(FunctionControl::NONE),
                Operand::IdRef(TYPE_FUNCTION),
            ],
        ));
        function.end = Some(Instruction::new(Op::FunctionEnd, None, None, Vec::new()));
        function.blocks.push(block);
        function
    }
}

/// An instruction with a result type and `result` id.
pub fn instruction(opcode: Op, result: Option<Word>, operands: Vec<Operand>) -> Instruction {
    let result_type = result.map(|_| TYPE_FLOAT);
    Instruction::new(opcode, result_type, result, operands)
}

pub fn load(result: Word, pointer: Word) -> Instruction {
    instruction(Op::Load, Some(result), vec![Operand::IdRef(pointer)])
}

pub fn access_chain(opcode: Op, result: Word, base: Word) -> Instruction {
    instruction(opcode, Some(result), vec![Operand::IdRef(base)])
}

pub fn store(pointer: Word, object: Word) -> Instruction {
    instruction(
        Op::Store,
        None,
        vec![Operand::IdRef(pointer), Operand::IdRef(object)],
    )
}

pub fn copy_memory(opcode: Op, target: Word, source: Word) -> Instruction {
    let mut operands = vec![Operand::IdRef(target), Operand::IdRef(source)];
    if opcode == Op::CopyMemorySized {
        operands.push(Operand::IdRef(TYPE_FLOAT));
    }
    instruction(opcode, None, operands)
}

pub fn call(result: Word, function: Word) -> Instruction {
    Instruction::new(
        Op::FunctionCall,
        Some(TYPE_VOID),
        Some(result),
        vec![Operand::IdRef(function)],
    )
}

#[test]
fn analyze_module_no_uniforms() {
    let module = TestModule::new()
        .variable(10, StorageClass::Input)
        .function(4, [load(20, 10)])
        .entry_point(ExecutionModel::Vertex, 4, "main")
        .build();

    let analysis = analyze_module(&module).unwrap();
    assert_eq!(BTreeSet::new(), analysis.uniforms);
    assert_eq!(BTreeMap::new(), analysis.annotations);
    assert_eq!(BTreeSet::new(), analysis.entry_points[0].variables);
}

#[test]
fn analyze_spirv_single_entry_point() {
    let words = TestModule::new()
        .variable(7, StorageClass::Uniform)
        .decorate(7, Decoration::DescriptorSet, 2)
        .decorate(7, Decoration::Binding, 5)
        .function(4, [load(20, 7)])
        .entry_point(ExecutionModel::Fragment, 4, "main")
        .words();

    let analysis = analyze_spirv(&words).unwrap();
    insta::assert_snapshot!(analysis.to_string(), @r"
    7: (2, 5)
    main
    7
    ");
}

#[test]
fn analyze_spirv_shared_callee() {
    let words = TestModule::new()
        .variable(9, StorageClass::Uniform)
        .decorate(9, Decoration::DescriptorSet, 0)
        .decorate(9, Decoration::Binding, 1)
        .function(4, [call(20, 6)])
        .function(5, [call(21, 6)])
        .function(6, [load(22, 9)])
        .entry_point(ExecutionModel::Vertex, 4, "vs_main")
        .entry_point(ExecutionModel::Fragment, 5, "fs_main")
        .words();

    let analysis = analyze_spirv(&words).unwrap();
    insta::assert_snapshot!(analysis.to_string(), @r"
    9: (0, 1)
    vs_main
    9
    fs_main
    9
    ");
    assert_eq!(
        BTreeMap::from([((0, 1), wgpu::ShaderStages::VERTEX_FRAGMENT)]),
        analysis.binding_stages()
    );
}

#[test]
fn analyze_module_invalid_annotation_before_traversal() {
    // The annotation error takes priority over the call graph cycle.
    let module = TestModule::new()
        .variable(8, StorageClass::Private)
        .decorate(8, Decoration::Binding, 0)
        .function(4, [call(20, 4)])
        .entry_point(ExecutionModel::Vertex, 4, "main")
        .build();

    assert!(matches!(
        analyze_module(&module),
        Err(AnalyzeError::InvalidAnnotation {
            id: 8,
            decoration: BindingDecoration::Binding
        })
    ));
}

#[test]
fn analyze_module_cycle() {
    let module = TestModule::new()
        .function(4, [call(20, 5)])
        .function(5, [call(21, 6)])
        .function(6, [call(22, 5)])
        .entry_point(ExecutionModel::GLCompute, 4, "main")
        .build();

    assert!(matches!(
        analyze_module(&module),
        Err(AnalyzeError::CallGraphCycle { function: 5 })
    ));
}

#[test]
fn analyze_module_diamond() {
    let module = TestModule::new()
        .variable(10, StorageClass::Uniform)
        .variable(11, StorageClass::UniformConstant)
        .variable(12, StorageClass::Uniform)
        .variable(13, StorageClass::UniformConstant)
        .variable(14, StorageClass::Uniform)
        .function(4, [load(20, 10), call(21, 5), call(22, 6)])
        .function(5, [access_chain(Op::AccessChain, 23, 11), call(24, 3)])
        .function(6, [store(12, 25), call(26, 3)])
        .function(3, [copy_memory(Op::CopyMemory, 27, 13)])
        .entry_point(ExecutionModel::Fragment, 4, "main")
        .build();

    let analysis = analyze_module(&module).unwrap();
    assert_eq!(BTreeSet::from([10, 11, 12, 13, 14]), analysis.uniforms);
    assert_eq!(
        BTreeSet::from([10, 11, 12, 13]),
        analysis.entry_points[0].variables
    );
}

#[test]
fn analyze_spirv_invalid_binary() {
    // Truncated header.
    let result = analyze_spirv(&[rspirv::spirv::MAGIC_NUMBER, 0x0001_0000]);
    assert!(matches!(result, Err(AnalyzeError::Load { .. })));
}

#[test]
fn analyze_wgsl_multiple_entries() {
    let source = indoc! {r#"
        struct Camera {
            view_projection: mat4x4<f32>,
        }

        @group(0) @binding(0) var<uniform> camera: Camera;
        @group(1) @binding(2) var color_texture: texture_2d<f32>;
        @group(1) @binding(3) var color_sampler: sampler;

        fn shade(uv: vec2<f32>) -> vec4<f32> {
            return textureSample(color_texture, color_sampler, uv);
        }

        @vertex
        fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
            return camera.view_projection * vec4(position, 1.0);
        }

        @fragment
        fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
            return shade(uv);
        }
    "#};

    let analysis = analyze_wgsl(source, WgslOptions::default()).unwrap();

    let vs_main = analysis
        .entry_points
        .iter()
        .find(|e| e.name == "vs_main")
        .unwrap();
    let fs_main = analysis
        .entry_points
        .iter()
        .find(|e| e.name == "fs_main")
        .unwrap();

    let coordinates = |entry: &EntryPointUsage| {
        entry
            .bindings(&analysis.annotations)
            .filter_map(|(_, b)| b.coordinates())
            .collect::<BTreeSet<_>>()
    };
    assert_eq!(BTreeSet::from([(0, 0)]), coordinates(vs_main));
    assert_eq!(BTreeSet::from([(1, 2), (1, 3)]), coordinates(fs_main));

    assert_eq!(
        BTreeMap::from([
            ((0, 0), wgpu::ShaderStages::VERTEX),
            ((1, 2), wgpu::ShaderStages::FRAGMENT),
            ((1, 3), wgpu::ShaderStages::FRAGMENT),
        ]),
        analysis.binding_stages()
    );
}

#[test]
fn analyze_wgsl_parse_error() {
    let source = indoc! {r#"
        @fragment
        fn fs_main() }
    "#};

    let result = analyze_wgsl(source, WgslOptions::default());
    assert!(matches!(result, Err(AnalyzeError::ParseError { .. })));
}
