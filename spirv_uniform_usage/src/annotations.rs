use std::collections::{BTreeMap, BTreeSet};

use rspirv::{
    dr::{Instruction, Module, Operand},
    spirv::{Decoration, Op},
};

use crate::{
    spirv::{id_operand, operand},
    AnalyzeError, BindingDecoration, VariableId,
};

/// The resource binding coordinates decorated on a uniform variable.
///
/// A component is `None` if the module never decorated it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Binding {
    pub descriptor_set: Option<u32>,
    pub binding: Option<u32>,
}

impl Binding {
    /// The `(descriptor_set, binding)` pair if both components are decorated.
    pub fn coordinates(&self) -> Option<(u32, u32)> {
        Some((self.descriptor_set?, self.binding?))
    }
}

/// Maps each decorated uniform in `uniforms` to its binding coordinates.
///
/// Decorations are applied in module order, so a repeated decoration replaces the earlier value.
pub fn uniform_annotations(
    module: &Module,
    uniforms: &BTreeSet<VariableId>,
) -> Result<BTreeMap<VariableId, Binding>, AnalyzeError> {
    let mut annotations = BTreeMap::new();

    for inst in &module.annotations {
        if inst.class.opcode != Op::Decorate {
            continue;
        }

        let decoration = match operand(inst, 1) {
            Some(Operand::Decoration(Decoration::DescriptorSet)) => {
                BindingDecoration::DescriptorSet
            }
            Some(Operand::Decoration(Decoration::Binding)) => BindingDecoration::Binding,
            _ => continue,
        };

        let id = id_operand(inst, 0).ok_or(AnalyzeError::MalformedInstruction {
            opcode: Op::Decorate,
        })?;
        if !uniforms.contains(&id) {
            return Err(AnalyzeError::InvalidAnnotation { id, decoration });
        }

        let value = literal_operand(inst, 2)?;
        let binding: &mut Binding = annotations.entry(id).or_default();
        let component = match decoration {
            BindingDecoration::DescriptorSet => &mut binding.descriptor_set,
            BindingDecoration::Binding => &mut binding.binding,
        };
        if let Some(previous) = component.replace(value) {
            log::warn!("{decoration} of variable {id} redecorated from {previous} to {value}");
        }
    }

    log::debug!("found {} annotated uniforms", annotations.len());
    Ok(annotations)
}

fn literal_operand(inst: &Instruction, index: usize) -> Result<u32, AnalyzeError> {
    match operand(inst, index) {
        Some(Operand::LiteralBit32(value)) => Ok(*value),
        _ => Err(AnalyzeError::MalformedInstruction {
            opcode: inst.class.opcode,
        }),
    }
}
