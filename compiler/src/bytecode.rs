//! Provides the traits and functions for converting a runtime program to its
//! corresponding binary representation.

use tiny_regex_runtime::bytecode::{
    CHAR_OPERAND_MASK, MAGIC_NUMBER, MAX_PROGRAM_LEN, OPCODE_TAG_SHIFT, OPERAND_MASK,
    SPLIT_TARGET_BITS, SPLIT_TARGET_MASK,
};
use tiny_regex_runtime::*;

use crate::compiler::{CompileErr, CompileErrKind};

/// Converts a compiled program into its binary image, a header followed by
/// one little-endian word per instruction.
///
/// # Example
///
/// ```
/// use tiny_regex_compiler::to_binary;
/// use tiny_regex_runtime::{FastForward, InstChar, Instructions, Opcode};
///
/// let input = Instructions::new(vec![Opcode::Char(InstChar::new('a')), Opcode::Match])
///     .with_fast_forward(FastForward::Char('a'));
/// let expected_output = vec![
///     0xF0, 0xF0, 1, 0, 2, 0, 0, 0, 97, 0, 0, 0, // header
///     97, 0, 0, 0, // char a
///     0, 0, 0, 192, // match
/// ];
///
/// assert_eq!(Ok(expected_output), to_binary(&input));
/// ```
pub fn to_binary(insts: &Instructions) -> Result<Vec<u8>, CompileErr> {
    if insts.len() > MAX_PROGRAM_LEN {
        return Err(CompileErr::new(CompileErrKind::ProgramTooLarge {
            len: insts.len(),
            max: MAX_PROGRAM_LEN,
        }));
    }

    Ok(insts.to_bytecode())
}

/// Represents a conversion trait to a given opcode's binary little-endian
/// representation.
pub trait ToBytecode {
    // the bytecode representable type.
    type Output;

    fn to_bytecode(&self) -> Self::Output;
}

impl ToBytecode for Instructions {
    type Output = Vec<u8>;

    fn to_bytecode(&self) -> Self::Output {
        // saturates, programs this large are rejected by to_binary.
        let inst_cnt = u32::try_from(self.len()).unwrap_or(u32::MAX);

        let (ff_variant, ff_value) = match self.fast_forward() {
            FastForward::None => (0u8, 0u32),
            FastForward::Char(c) => (1u8, c as u32),
        };

        let header = MAGIC_NUMBER
            .to_le_bytes()
            .into_iter()
            .chain([ff_variant, 0])
            .chain(inst_cnt.to_le_bytes())
            .chain(ff_value.to_le_bytes());

        let instruction_bytes = self
            .as_ref()
            .iter()
            .flat_map(|inst| inst.to_bytecode().to_le_bytes());

        header.chain(instruction_bytes).collect()
    }
}

impl ToBytecode for Instruction {
    type Output = u32;

    fn to_bytecode(&self) -> Self::Output {
        self.opcode().to_bytecode()
    }
}

impl ToBytecode for Opcode {
    type Output = u32;

    fn to_bytecode(&self) -> Self::Output {
        match self {
            Opcode::Char(ic) => ic.to_bytecode(),
            Opcode::Jmp(ij) => ij.to_bytecode(),
            Opcode::Split(is) => is.to_bytecode(),
            Opcode::Match => InstMatch.to_bytecode(),
        }
    }
}

fn tagged(tag: u32, operand: u32) -> u32 {
    (tag << OPCODE_TAG_SHIFT) | (operand & OPERAND_MASK)
}

impl ToBytecode for InstChar {
    type Output = u32;

    fn to_bytecode(&self) -> Self::Output {
        tagged(
            Self::OPCODE_BINARY_REPR,
            self.value() as u32 & CHAR_OPERAND_MASK,
        )
    }
}

impl ToBytecode for InstJmp {
    type Output = u32;

    fn to_bytecode(&self) -> Self::Output {
        tagged(Self::OPCODE_BINARY_REPR, self.next().as_u32())
    }
}

impl ToBytecode for InstSplit {
    type Output = u32;

    fn to_bytecode(&self) -> Self::Output {
        let x = self.x_branch().as_u32() & SPLIT_TARGET_MASK;
        let y = self.y_branch().as_u32() & SPLIT_TARGET_MASK;

        tagged(Self::OPCODE_BINARY_REPR, (x << SPLIT_TARGET_BITS) | y)
    }
}

impl ToBytecode for InstMatch {
    type Output = u32;

    fn to_bytecode(&self) -> Self::Output {
        tagged(Self::OPCODE_BINARY_REPR, 0)
    }
}
