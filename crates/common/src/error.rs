//! Decode errors for raw bytecode codes.

use thiserror::Error;

/// Errors that occur when mapping raw bytecode fields onto the typed model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Opcode byte not recognized.
    #[error("invalid opcode: {0:#04x}")]
    InvalidOpcode(u8),

    /// Data type nibble not recognized.
    #[error("invalid data type: {0:#04x}")]
    InvalidDataType(u8),

    /// Variable addressing mode not recognized.
    #[error("invalid variable type: {0:#04x}")]
    InvalidVariableType(u8),

    /// Comparison kind outside 0..=6.
    #[error("invalid comparison kind: {0}")]
    InvalidComparisonKind(u8),
}
