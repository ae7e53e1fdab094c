//! Defines the fixed-width instruction word encoding shared by the compiler
//! and the runtime, and provides utilities for deserializing a binary
//! representation of a program.
//!
//! Each instruction is one 32-bit word. The top two bits tag the opcode and
//! the remaining 30 bits hold its operand:
//!
//! | tag  | opcode  | operand                                         |
//! |------|---------|-------------------------------------------------|
//! | `00` | `Char`  | bits 20..0, the unicode scalar value            |
//! | `01` | `Jmp`   | bits 29..0, the absolute target                 |
//! | `10` | `Split` | bits 29..15 the `x` target, bits 14..0 the `y`  |
//! | `11` | `Match` | unused, always zero                             |
//!
//! A binary image is a 12-byte header followed by one little-endian word
//! per instruction:
//!
//! | bytes  | field                                       |
//! |--------|---------------------------------------------|
//! | 0..2   | magic number, `0xF0F0`                      |
//! | 2      | fast-forward variant, 0 = none, 1 = char    |
//! | 3      | reserved, zero                              |
//! | 4..8   | instruction count, u32 little-endian        |
//! | 8..12  | fast-forward character, u32 little-endian   |

use crate::{FastForward, InstChar, InstIndex, InstJmp, InstMatch, InstSplit, Instructions, Opcode};

/// The bit offset of the opcode tag within an instruction word.
pub const OPCODE_TAG_SHIFT: u32 = 30;
/// Masks the operand bits of an instruction word.
pub const OPERAND_MASK: u32 = (1 << OPCODE_TAG_SHIFT) - 1;
/// Masks the character code of a `Char` operand.
pub const CHAR_OPERAND_MASK: u32 = (1 << 21) - 1;
/// The width of each of the two `Split` targets.
pub const SPLIT_TARGET_BITS: u32 = 15;
/// Masks a single `Split` target.
pub const SPLIT_TARGET_MASK: u32 = (1 << SPLIT_TARGET_BITS) - 1;
/// The maximum number of instructions a program may hold. Every address in
/// such a program fits in a `Split` target.
pub const MAX_PROGRAM_LEN: usize = 1 << SPLIT_TARGET_BITS;

/// Magic number prefixing every binary image.
pub const MAGIC_NUMBER: u16 = 0xF0F0;
/// The length, in bytes, of a binary image header.
pub const HEADER_LEN: usize = 12;

const WORD_LEN: usize = 4;

/// Attempts to convert a binary representation of a program into its
/// corresponding internal representation.
///
/// # Example
/// ```
/// use tiny_regex_runtime::{Instructions, InstChar, Opcode, bytecode};
///
/// let bin = vec![
///     0xF0, 0xF0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, // header
///     97, 0, 0, 0, // char a
///     0, 0, 0, 192, // match
/// ];
/// let expected_output =
///     Instructions::new(vec![Opcode::Char(InstChar::new('a')), Opcode::Match]);
///
/// assert_eq!(Ok(expected_output), bytecode::from_binary(bin));
/// ```
pub fn from_binary<B: AsRef<[u8]>>(bin: B) -> Result<Instructions, BytecodeDeserializationError> {
    Instructions::from_bytecode(bin)
}

/// Attempts to convert a sequence of instruction words, without a header,
/// into a program.
pub fn from_words(words: &[u32]) -> Result<Instructions, BytecodeDeserializationError> {
    let opcodes = words
        .iter()
        .map(|&word| Opcode::from_bytecode(word))
        .collect::<Result<Vec<_>, _>>()?;

    validate_targets(&opcodes)?;
    Ok(Instructions::new(opcodes))
}

/// Represents all error types that may _expectedly_ occur during
/// deserialization.
#[derive(Debug, PartialEq, Eq)]
pub enum BytecodeDeserializationErrorKind {
    /// The magic number or reserved fields of the header are invalid.
    InvalidHeader,
    /// The end of input is reached prior to a complete header.
    UnexpectedEndOfHeader,
    /// Fast-forward byte exceeds the allowable range of 0-1.
    FastForwardVariantOutOfRange,
    /// Represents fallibility of character conversions from a u32 -> char.
    CharacterEncodingError,
    /// The instruction bytes don't align with the header's instruction count.
    ByteWidthMismatch,
    /// A valid opcode has been provided but with an invalid operand.
    InvalidOperand,
    /// A jump or split target lies outside of the program.
    AddressOutOfRange,
}

/// Represents all error types that may _expectedly_ occur during
/// deserialization. Including the error kind and any optional
/// enriching data.
#[derive(Debug, PartialEq, Eq)]
pub struct BytecodeDeserializationError {
    /// The type of triggered error.
    kind: BytecodeDeserializationErrorKind,
    /// Additional error data.
    data: Option<String>,
}

impl BytecodeDeserializationError {
    /// Instantiates a new error.
    pub fn new(kind: BytecodeDeserializationErrorKind) -> Self {
        Self { kind, data: None }
    }

    /// Associates additional data with the error, returning the modified error.
    pub fn with_data(mut self, data: String) -> Self {
        self.data = Some(data);
        self
    }

    pub fn kind(&self) -> &BytecodeDeserializationErrorKind {
        &self.kind
    }
}

impl std::fmt::Display for BytecodeDeserializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.data.as_deref().unwrap_or_default();
        let padding = if self.data.is_some() { " " } else { "" };

        match &self.kind {
            BytecodeDeserializationErrorKind::InvalidHeader => {
                write!(f, "invalid header{}{}", padding, data)
            }
            BytecodeDeserializationErrorKind::UnexpectedEndOfHeader => {
                write!(f, "unexpected end of header")
            }
            BytecodeDeserializationErrorKind::FastForwardVariantOutOfRange => {
                write!(f, "fast-forward variant {}{}out of range", data, padding)
            }
            BytecodeDeserializationErrorKind::CharacterEncodingError => {
                write!(f, "unable to encode value {}{}as character", data, padding)
            }
            BytecodeDeserializationErrorKind::ByteWidthMismatch => {
                write!(f, "byte-width mismatch{}{}", padding, data)
            }
            BytecodeDeserializationErrorKind::InvalidOperand => {
                write!(f, "invalid operand {}", data)
            }
            BytecodeDeserializationErrorKind::AddressOutOfRange => {
                write!(f, "address {}{}out of range", data, padding)
            }
        }
    }
}

impl std::error::Error for BytecodeDeserializationError {}

/// Represents a conversion trait from a given opcode's binary representation
/// into its intermediary state.
pub trait FromBytecode<B> {
    // The output type of a successful conversion.
    type Output;
    // An alternate error type.
    type Error;

    fn from_bytecode(bin: B) -> Result<Self::Output, Self::Error>;
}

impl FromBytecode<u32> for Opcode {
    type Output = Self;

    type Error = BytecodeDeserializationError;

    fn from_bytecode(word: u32) -> Result<Self::Output, Self::Error> {
        let operand = word & OPERAND_MASK;

        match word >> OPCODE_TAG_SHIFT {
            InstChar::OPCODE_BINARY_REPR if operand & !CHAR_OPERAND_MASK != 0 => Err(
                BytecodeDeserializationError::new(BytecodeDeserializationErrorKind::InvalidOperand)
                    .with_data(format!("{:#010x}", word)),
            ),
            InstChar::OPCODE_BINARY_REPR => char::from_u32(operand)
                .map(|c| Opcode::Char(InstChar::new(c)))
                .ok_or_else(|| {
                    BytecodeDeserializationError::new(
                        BytecodeDeserializationErrorKind::CharacterEncodingError,
                    )
                    .with_data(operand.to_string())
                }),
            InstJmp::OPCODE_BINARY_REPR => Ok(Opcode::Jmp(InstJmp::new(InstIndex::from(operand)))),
            InstSplit::OPCODE_BINARY_REPR => {
                let x = (operand >> SPLIT_TARGET_BITS) & SPLIT_TARGET_MASK;
                let y = operand & SPLIT_TARGET_MASK;

                Ok(Opcode::Split(InstSplit::new(
                    InstIndex::from(x),
                    InstIndex::from(y),
                )))
            }
            InstMatch::OPCODE_BINARY_REPR if operand == 0 => Ok(Opcode::Match),
            _ => Err(
                BytecodeDeserializationError::new(BytecodeDeserializationErrorKind::InvalidOperand)
                    .with_data(format!("{:#010x}", word)),
            ),
        }
    }
}

impl<B: AsRef<[u8]>> FromBytecode<B> for Instructions {
    type Output = Self;

    type Error = BytecodeDeserializationError;

    fn from_bytecode(bin: B) -> Result<Self::Output, Self::Error> {
        let bin = bin.as_ref();
        let header = bin.get(..HEADER_LEN).ok_or_else(|| {
            BytecodeDeserializationError::new(
                BytecodeDeserializationErrorKind::UnexpectedEndOfHeader,
            )
        })?;

        if header[0..2] != MAGIC_NUMBER.to_le_bytes()[..] || header[3] != 0 {
            return Err(BytecodeDeserializationError::new(
                BytecodeDeserializationErrorKind::InvalidHeader,
            ));
        }

        let inst_cnt = read_u32_le(&header[4..8])? as usize;
        let ff_value = read_u32_le(&header[8..12])?;
        let fast_forward = match header[2] {
            0 => Ok(FastForward::None),
            1 => char::from_u32(ff_value).map(FastForward::Char).ok_or_else(|| {
                BytecodeDeserializationError::new(
                    BytecodeDeserializationErrorKind::CharacterEncodingError,
                )
                .with_data(ff_value.to_string())
            }),
            variant => Err(BytecodeDeserializationError::new(
                BytecodeDeserializationErrorKind::FastForwardVariantOutOfRange,
            )
            .with_data(variant.to_string())),
        }?;

        let inst_bytes = &bin[HEADER_LEN..];
        let expected_len = inst_cnt.checked_mul(WORD_LEN);
        if expected_len != Some(inst_bytes.len()) {
            return Err(BytecodeDeserializationError::new(
                BytecodeDeserializationErrorKind::ByteWidthMismatch,
            )
            .with_data(format!(
                "expected {} instructions, received {} bytes",
                inst_cnt,
                inst_bytes.len()
            )));
        }

        let words = inst_bytes
            .chunks_exact(WORD_LEN)
            .map(read_u32_le)
            .collect::<Result<Vec<_>, _>>()?;

        from_words(&words).map(|program| program.with_fast_forward(fast_forward))
    }
}

fn read_u32_le(bytes: &[u8]) -> Result<u32, BytecodeDeserializationError> {
    bytes.try_into().map(u32::from_le_bytes).map_err(|_| {
        BytecodeDeserializationError::new(BytecodeDeserializationErrorKind::ByteWidthMismatch)
            .with_data(format!("expected a 4-byte word, received {} bytes", bytes.len()))
    })
}

fn validate_targets(opcodes: &[Opcode]) -> Result<(), BytecodeDeserializationError> {
    let len = opcodes.len();
    let out_of_range = |idx: InstIndex| idx.as_usize() >= len;

    let invalid_target = opcodes.iter().find_map(|opcode| match opcode {
        Opcode::Jmp(jmp) if out_of_range(jmp.next()) => Some(jmp.next()),
        Opcode::Split(split) if out_of_range(split.x_branch()) => Some(split.x_branch()),
        Opcode::Split(split) if out_of_range(split.y_branch()) => Some(split.y_branch()),
        _ => None,
    });

    match invalid_target {
        Some(idx) => Err(BytecodeDeserializationError::new(
            BytecodeDeserializationErrorKind::AddressOutOfRange,
        )
        .with_data(idx.to_string())),
        None => Ok(()),
    }
}
