use rspirv::{
    dr::{Function, Instruction, Operand},
    spirv::Word,
};

use crate::AnalyzeError;

/// Returns the operand at `index` using SPIR-V grammar numbering.
///
/// The grammar counts the result type and result id as the leading operands,
/// but rspirv stores them separately from [Instruction::operands].
pub fn operand(inst: &Instruction, index: usize) -> Option<&Operand> {
    let leading = inst.result_type.is_some() as usize + inst.result_id.is_some() as usize;
    inst.operands.get(index.checked_sub(leading)?)
}

/// Returns the id at operand `index` using SPIR-V grammar numbering.
pub fn id_operand(inst: &Instruction, index: usize) -> Option<Word> {
    match operand(inst, index)? {
        Operand::IdRef(id) => Some(*id),
        _ => None,
    }
}

/// Returns the result id of the `OpFunction` that defines `function`.
pub fn function_id(function: &Function) -> Option<Word> {
    function.def.as_ref().and_then(|def| def.result_id)
}

/// Iterates the body of `function` in instruction order.
pub fn function_instructions(function: &Function) -> impl Iterator<Item = &Instruction> {
    function
        .blocks
        .iter()
        .flat_map(|block| block.instructions.iter())
}

/// Converts a little-endian byte buffer into SPIR-V words.
pub fn words_from_bytes(bytes: &[u8]) -> Result<Vec<u32>, AnalyzeError> {
    if bytes.len() % 4 != 0 {
        return Err(AnalyzeError::TruncatedWord { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect())
}
