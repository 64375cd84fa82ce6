use std::collections::BTreeSet;

use rspirv::{dr::Function, spirv::Op};

use crate::{
    spirv::{function_instructions, id_operand},
    VariableId,
};

/// The operands that may hold a pointer for instructions that access memory.
///
/// Uniforms are only reachable through pointers,
/// so no other opcodes or operands can reference a uniform variable.
pub fn pointer_operands(opcode: Op) -> &'static [usize] {
    match opcode {
        Op::Load
        | Op::AccessChain
        | Op::InBoundsAccessChain
        | Op::PtrAccessChain
        | Op::ArrayLength
        | Op::GenericPtrMemSemantics
        | Op::InBoundsPtrAccessChain => &[2],
        Op::Store => &[0],
        Op::CopyMemory | Op::CopyMemorySized => &[0, 1],
        _ => &[],
    }
}

/// Returns the variables in `from` referenced directly in the body of `function`.
///
/// Variables only used by called functions are not included.
pub fn used_variables(function: &Function, from: &BTreeSet<VariableId>) -> BTreeSet<VariableId> {
    function_instructions(function)
        .flat_map(|inst| {
            pointer_operands(inst.class.opcode)
                .iter()
                .filter_map(move |i| id_operand(inst, *i))
        })
        .filter(|id| from.contains(id))
        .collect()
}
