use std::collections::BTreeSet;

use rspirv::{dr::Function, spirv::Op};

use crate::{
    spirv::{function_instructions, id_operand},
    AnalyzeError, FunctionId,
};

/// Returns the functions called directly from the body of `function`.
///
/// SPIR-V has no indirect calls, so this is the complete set of callees.
pub fn called_functions(function: &Function) -> Result<BTreeSet<FunctionId>, AnalyzeError> {
    function_instructions(function)
        .filter(|inst| inst.class.opcode == Op::FunctionCall)
        .map(|inst| {
            id_operand(inst, 2).ok_or(AnalyzeError::MalformedInstruction {
                opcode: Op::FunctionCall,
            })
        })
        .collect()
}
