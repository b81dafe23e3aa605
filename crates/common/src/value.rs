//! Literal payloads carried by push instructions.

use crate::data_type::DataType;

/// Immediate value attached to an instruction.
///
/// Strings are not resolved here; `String` holds an index into the
/// container's string table.
#[derive(Debug, Clone, Copy, Default)]
pub enum Value {
    /// No payload.
    #[default]
    None,
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Float(f32),
    Boolean(bool),
    /// String table index.
    String(u32),
}

// Floats compare bitwise so that Value stays Eq and a pushed NaN still
// equals itself in tests.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Value {
    /// The data type this payload is encoded as, if any.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::None => None,
            Value::Int16(_) => Some(DataType::Int16),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Double(_) => Some(DataType::Double),
            Value::Float(_) => Some(DataType::Float),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::String(_) => Some(DataType::String),
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Value::Int16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// String table index.
    pub fn as_string_index(&self) -> Option<u32> {
        match self {
            Value::String(v) => Some(*v),
            _ => None,
        }
    }
}
