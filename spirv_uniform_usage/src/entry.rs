use std::collections::{BTreeMap, BTreeSet};

use rspirv::{
    dr::{Instruction, Module, Operand},
    spirv::{ExecutionModel, Op},
};

use crate::{
    annotations::Binding,
    closure::ClosureContext,
    spirv::{id_operand, operand},
    AnalyzeError, FunctionId, VariableId,
};

/// The uniform variables statically used by a single entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointUsage {
    pub name: String,
    pub function: FunctionId,
    pub execution_model: ExecutionModel,
    /// Uniforms used by the entry point function or anything it calls.
    pub variables: BTreeSet<VariableId>,
}

impl EntryPointUsage {
    /// The wgpu shader stage for this entry point's execution model.
    pub fn stages(&self) -> wgpu::ShaderStages {
        shader_stages(self.execution_model)
    }

    /// The binding of each used variable that has binding decorations.
    pub fn bindings<'a>(
        &'a self,
        annotations: &'a BTreeMap<VariableId, Binding>,
    ) -> impl Iterator<Item = (VariableId, Binding)> + 'a {
        self.variables
            .iter()
            .filter_map(|id| Some((*id, *annotations.get(id)?)))
    }
}

pub fn shader_stages(execution_model: ExecutionModel) -> wgpu::ShaderStages {
    match execution_model {
        ExecutionModel::Vertex => wgpu::ShaderStages::VERTEX,
        ExecutionModel::Fragment => wgpu::ShaderStages::FRAGMENT,
        ExecutionModel::GLCompute | ExecutionModel::Kernel => wgpu::ShaderStages::COMPUTE,
        ExecutionModel::TaskNV | ExecutionModel::TaskEXT => wgpu::ShaderStages::TASK,
        ExecutionModel::MeshNV | ExecutionModel::MeshEXT => wgpu::ShaderStages::MESH,
        // Stages like geometry or ray tracing have no wgpu equivalent.
        _ => wgpu::ShaderStages::NONE,
    }
}

/// Computes the uniform usage of every entry point in `module` in declaration order.
///
/// All entry points share the memoized closures in `context`,
/// so functions reachable from multiple entry points are only analyzed once.
pub fn entry_point_usage(
    module: &Module,
    context: &mut ClosureContext,
) -> Result<Vec<EntryPointUsage>, AnalyzeError> {
    module
        .entry_points
        .iter()
        .map(|inst| {
            let (execution_model, function, name) = entry_point(inst)?;
            let variables = context.closure(function)?;
            log::debug!("entry point {name} uses {} uniforms", variables.len());

            Ok(EntryPointUsage {
                name,
                function,
                execution_model,
                variables,
            })
        })
        .collect()
}

fn entry_point(inst: &Instruction) -> Result<(ExecutionModel, FunctionId, String), AnalyzeError> {
    let malformed = || AnalyzeError::MalformedInstruction {
        opcode: Op::EntryPoint,
    };

    let execution_model = match operand(inst, 0) {
        Some(Operand::ExecutionModel(model)) => *model,
        _ => return Err(malformed()),
    };
    let function = id_operand(inst, 1).ok_or_else(malformed)?;
    let name = match operand(inst, 2) {
        Some(Operand::LiteralString(name)) => name.clone(),
        _ => return Err(malformed()),
    };
    Ok((execution_model, function, name))
}
