use std::collections::BTreeSet;

use rspirv::{
    dr::{Module, Operand},
    spirv::{Op, StorageClass},
};

use crate::{spirv::operand, VariableId};

/// Collects the ids of all global variables bound as external resources.
///
/// Only the `Uniform` and `UniformConstant` storage classes are considered.
pub fn uniform_variables(module: &Module) -> BTreeSet<VariableId> {
    module
        .types_global_values
        .iter()
        .filter(|inst| inst.class.opcode == Op::Variable)
        .filter(|inst| {
            matches!(
                operand(inst, 2),
                Some(Operand::StorageClass(
                    StorageClass::Uniform | StorageClass::UniformConstant
                ))
            )
        })
        .filter_map(|inst| inst.result_id)
        .collect()
}
