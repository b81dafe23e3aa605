//! Operand data types carried in an instruction's type nibbles.

use crate::error::DecodeError;

/// The data type of an instruction operand.
///
/// Instructions carry up to two of these (`data_type_1`, `data_type_2`).
/// For `conv` they are the source and destination types; for `pop` the
/// first one says where the value sits relative to the instance operands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit float.
    Double = 0x00,
    /// 32-bit float.
    Float = 0x01,
    /// 32-bit signed integer.
    Int32 = 0x02,
    /// 64-bit signed integer.
    Int64 = 0x03,
    /// Boolean.
    Boolean = 0x04,
    /// Variable reference.
    Variable = 0x05,
    /// String table index.
    String = 0x06,
    /// Instance id.
    Instance = 0x07,
    /// Deleted value.
    Delete = 0x08,
    /// Undefined.
    Undefined = 0x09,
    /// Unsigned integer.
    UnsignedInt = 0x0A,
    /// 16-bit signed integer, encoded inline in the instruction word.
    Int16 = 0x0F,
}

/// All data types, in definition order.
pub const ALL_DATA_TYPES: [DataType; 12] = [
    DataType::Double,
    DataType::Float,
    DataType::Int32,
    DataType::Int64,
    DataType::Boolean,
    DataType::Variable,
    DataType::String,
    DataType::Instance,
    DataType::Delete,
    DataType::Undefined,
    DataType::UnsignedInt,
    DataType::Int16,
];

impl TryFrom<u8> for DataType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(DataType::Double),
            0x01 => Ok(DataType::Float),
            0x02 => Ok(DataType::Int32),
            0x03 => Ok(DataType::Int64),
            0x04 => Ok(DataType::Boolean),
            0x05 => Ok(DataType::Variable),
            0x06 => Ok(DataType::String),
            0x07 => Ok(DataType::Instance),
            0x08 => Ok(DataType::Delete),
            0x09 => Ok(DataType::Undefined),
            0x0A => Ok(DataType::UnsignedInt),
            0x0F => Ok(DataType::Int16),
            _ => Err(DecodeError::InvalidDataType(value)),
        }
    }
}

impl DataType {
    /// Returns the one-letter disassembly suffix (`push.v`, `pop.e.v`, ...).
    pub fn suffix(&self) -> &'static str {
        match self {
            DataType::Double => "d",
            DataType::Float => "f",
            DataType::Int32 => "i",
            DataType::Int64 => "l",
            DataType::Boolean => "b",
            DataType::Variable => "v",
            DataType::String => "s",
            DataType::Instance => "inst",
            DataType::Delete => "delete",
            DataType::Undefined => "undefined",
            DataType::UnsignedInt => "u",
            DataType::Int16 => "e",
        }
    }

    /// Number of stack slots a value of this type occupies.
    ///
    /// 64-bit values take two 32-bit slots, which is why `dup.l 0` moves
    /// as much as `dup.i 1`.
    pub fn slot_width(&self) -> usize {
        match self {
            DataType::Int64 => 2,
            _ => 1,
        }
    }
}
