//! Instance scopes, variable addressing modes, and comparison kinds.

use crate::error::DecodeError;

/// The instance an instruction's variable operand is resolved against.
///
/// Negative codes are special scopes; non-negative codes name an object
/// (or, at runtime, an instance id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceType {
    Undefined,
    SelfInstance,
    Other,
    All,
    Noone,
    Global,
    Builtin,
    Local,
    /// The instance is taken from the operand stack.
    StackTop,
    Argument,
    Static,
    /// Object index.
    Object(i16),
}

impl InstanceType {
    /// Map a raw instance code onto the typed scope.
    pub fn from_code(code: i16) -> Self {
        match code {
            -1 => InstanceType::SelfInstance,
            -2 => InstanceType::Other,
            -3 => InstanceType::All,
            -4 => InstanceType::Noone,
            -5 => InstanceType::Global,
            -6 => InstanceType::Builtin,
            -7 => InstanceType::Local,
            -9 => InstanceType::StackTop,
            -15 => InstanceType::Argument,
            -16 => InstanceType::Static,
            c if c >= 0 => InstanceType::Object(c),
            _ => InstanceType::Undefined,
        }
    }

    /// The raw instance code.
    pub fn code(&self) -> i16 {
        match self {
            InstanceType::Undefined => 0,
            InstanceType::SelfInstance => -1,
            InstanceType::Other => -2,
            InstanceType::All => -3,
            InstanceType::Noone => -4,
            InstanceType::Global => -5,
            InstanceType::Builtin => -6,
            InstanceType::Local => -7,
            InstanceType::StackTop => -9,
            InstanceType::Argument => -15,
            InstanceType::Static => -16,
            InstanceType::Object(c) => *c,
        }
    }

    /// Lower-case scope name used in disassembly.
    pub fn name(&self) -> String {
        match self {
            InstanceType::Undefined => "undefined".to_string(),
            InstanceType::SelfInstance => "self".to_string(),
            InstanceType::Other => "other".to_string(),
            InstanceType::All => "all".to_string(),
            InstanceType::Noone => "noone".to_string(),
            InstanceType::Global => "global".to_string(),
            InstanceType::Builtin => "builtin".to_string(),
            InstanceType::Local => "local".to_string(),
            InstanceType::StackTop => "[stacktop]".to_string(),
            InstanceType::Argument => "arg".to_string(),
            InstanceType::Static => "static".to_string(),
            InstanceType::Object(c) => format!("obj{c}"),
        }
    }
}

/// How a variable operand is addressed.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// Array element: index and instance are popped from the stack.
    Array = 0x00,
    /// Instance popped from the stack.
    StackTop = 0x80,
    /// Plain variable on the instruction's instance.
    Normal = 0xA0,
    /// Instance-scoped variable.
    Instance = 0xE0,
    MultiPush = 0x10,
    MultiPushPop = 0x90,
}

impl TryFrom<u8> for VariableType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(VariableType::Array),
            0x80 => Ok(VariableType::StackTop),
            0xA0 => Ok(VariableType::Normal),
            0xE0 => Ok(VariableType::Instance),
            0x10 => Ok(VariableType::MultiPush),
            0x90 => Ok(VariableType::MultiPushPop),
            _ => Err(DecodeError::InvalidVariableType(value)),
        }
    }
}

/// Comparison performed by `cmp`.
///
/// `dup` reuses this field as a flag; a non-zero value there marks the
/// newer per-instance stack-move form.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComparisonKind {
    #[default]
    None = 0,
    Less = 1,
    LessEqual = 2,
    Equal = 3,
    NotEqual = 4,
    GreaterEqual = 5,
    Greater = 6,
}

impl TryFrom<u8> for ComparisonKind {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ComparisonKind::None),
            1 => Ok(ComparisonKind::Less),
            2 => Ok(ComparisonKind::LessEqual),
            3 => Ok(ComparisonKind::Equal),
            4 => Ok(ComparisonKind::NotEqual),
            5 => Ok(ComparisonKind::GreaterEqual),
            6 => Ok(ComparisonKind::Greater),
            _ => Err(DecodeError::InvalidComparisonKind(value)),
        }
    }
}

impl ComparisonKind {
    /// Disassembly name (`LT`, `EQ`, ...). Empty for `None`.
    pub fn name(&self) -> &'static str {
        match self {
            ComparisonKind::None => "",
            ComparisonKind::Less => "LT",
            ComparisonKind::LessEqual => "LTE",
            ComparisonKind::Equal => "EQ",
            ComparisonKind::NotEqual => "NEQ",
            ComparisonKind::GreaterEqual => "GTE",
            ComparisonKind::Greater => "GT",
        }
    }
}
