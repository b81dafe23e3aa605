//! Opcode definitions for GML bytecode (format 15 and later).

use crate::error::DecodeError;

/// Identifies the operation an instruction performs.
///
/// The `#[repr(u8)]` discriminants are the raw opcode bytes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Conversion
    /// Convert the top of stack from `data_type_1` to `data_type_2`.
    Conv = 0x07,

    // Arithmetic
    /// Pop two values, push their product.
    Mul = 0x08,
    /// Pop two values, push their quotient.
    Div = 0x09,
    /// Pop two values, push the integer quotient (`div`).
    Rem = 0x0A,
    /// Pop two values, push the remainder (`mod`).
    Mod = 0x0B,
    /// Pop two values, push their sum.
    Add = 0x0C,
    /// Pop two values, push (second_popped - first_popped).
    Sub = 0x0D,

    // Logic & bitwise
    /// Logical or bitwise AND.
    And = 0x0E,
    /// Logical or bitwise OR.
    Or = 0x0F,
    /// Logical or bitwise XOR.
    Xor = 0x10,
    /// Pop one value, push its negation.
    Neg = 0x11,
    /// Pop one value, push its logical or bitwise complement.
    Not = 0x12,
    /// Shift left.
    Shl = 0x13,
    /// Shift right.
    Shr = 0x14,
    /// Pop two values, push the comparison result. Kind in `comparison_kind`.
    Cmp = 0x15,

    // Stores
    /// Store into a variable, or permute the stack when no variable is attached.
    Pop = 0x45,
    /// Push an immediate integer.
    PushI = 0x84,
    /// Duplicate the top `extra + 1` stack slots.
    Dup = 0x86,

    // Calls & returns
    /// Call a function held in a variable.
    CallV = 0x99,
    /// Pop one value and return it.
    Ret = 0x9C,
    /// Return without a value.
    Exit = 0x9D,
    /// Pop and discard one value.
    Popz = 0x9E,

    // Control transfer
    /// Unconditional branch.
    B = 0xB6,
    /// Branch if true.
    Bt = 0xB7,
    /// Branch if false.
    Bf = 0xB8,
    /// Enter a `with` block.
    PushEnv = 0xBA,
    /// Leave a `with` block.
    PopEnv = 0xBB,

    // Pushes
    /// Push a constant or a variable.
    Push = 0xC0,
    /// Push a local variable.
    PushLoc = 0xC1,
    /// Push a global variable.
    PushGlb = 0xC2,
    /// Push a builtin variable.
    PushBltn = 0xC3,
    /// Call a function by reference. `argument_count` values are popped.
    Call = 0xD9,
    /// Extended opcode family introduced in later runtimes.
    Break = 0xFF,
}

/// All opcodes, in definition order.
pub const ALL_OPCODES: [Opcode; 33] = [
    Opcode::Conv,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Rem,
    Opcode::Mod,
    Opcode::Add,
    Opcode::Sub,
    Opcode::And,
    Opcode::Or,
    Opcode::Xor,
    Opcode::Neg,
    Opcode::Not,
    Opcode::Shl,
    Opcode::Shr,
    Opcode::Cmp,
    Opcode::Pop,
    Opcode::PushI,
    Opcode::Dup,
    Opcode::CallV,
    Opcode::Ret,
    Opcode::Exit,
    Opcode::Popz,
    Opcode::B,
    Opcode::Bt,
    Opcode::Bf,
    Opcode::PushEnv,
    Opcode::PopEnv,
    Opcode::Push,
    Opcode::PushLoc,
    Opcode::PushGlb,
    Opcode::PushBltn,
    Opcode::Call,
    Opcode::Break,
];

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x07 => Ok(Opcode::Conv),

            0x08 => Ok(Opcode::Mul),
            0x09 => Ok(Opcode::Div),
            0x0A => Ok(Opcode::Rem),
            0x0B => Ok(Opcode::Mod),
            0x0C => Ok(Opcode::Add),
            0x0D => Ok(Opcode::Sub),

            0x0E => Ok(Opcode::And),
            0x0F => Ok(Opcode::Or),
            0x10 => Ok(Opcode::Xor),
            0x11 => Ok(Opcode::Neg),
            0x12 => Ok(Opcode::Not),
            0x13 => Ok(Opcode::Shl),
            0x14 => Ok(Opcode::Shr),
            0x15 => Ok(Opcode::Cmp),

            0x45 => Ok(Opcode::Pop),
            0x84 => Ok(Opcode::PushI),
            0x86 => Ok(Opcode::Dup),

            0x99 => Ok(Opcode::CallV),
            0x9C => Ok(Opcode::Ret),
            0x9D => Ok(Opcode::Exit),
            0x9E => Ok(Opcode::Popz),

            0xB6 => Ok(Opcode::B),
            0xB7 => Ok(Opcode::Bt),
            0xB8 => Ok(Opcode::Bf),
            0xBA => Ok(Opcode::PushEnv),
            0xBB => Ok(Opcode::PopEnv),

            0xC0 => Ok(Opcode::Push),
            0xC1 => Ok(Opcode::PushLoc),
            0xC2 => Ok(Opcode::PushGlb),
            0xC3 => Ok(Opcode::PushBltn),
            0xD9 => Ok(Opcode::Call),
            0xFF => Ok(Opcode::Break),

            _ => Err(DecodeError::InvalidOpcode(value)),
        }
    }
}

impl Opcode {
    /// Returns the disassembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Conv => "conv",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Rem => "rem",
            Opcode::Mod => "mod",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Neg => "neg",
            Opcode::Not => "not",
            Opcode::Shl => "shl",
            Opcode::Shr => "shr",
            Opcode::Cmp => "cmp",
            Opcode::Pop => "pop",
            Opcode::PushI => "pushi",
            Opcode::Dup => "dup",
            Opcode::CallV => "callv",
            Opcode::Ret => "ret",
            Opcode::Exit => "exit",
            Opcode::Popz => "popz",
            Opcode::B => "b",
            Opcode::Bt => "bt",
            Opcode::Bf => "bf",
            Opcode::PushEnv => "pushenv",
            Opcode::PopEnv => "popenv",
            Opcode::Push => "push",
            Opcode::PushLoc => "pushloc",
            Opcode::PushGlb => "pushglb",
            Opcode::PushBltn => "pushbltn",
            Opcode::Call => "call",
            Opcode::Break => "break",
        }
    }

    /// True for the four push forms that accept a variable operand.
    pub fn is_push(&self) -> bool {
        matches!(
            self,
            Opcode::Push | Opcode::PushLoc | Opcode::PushGlb | Opcode::PushBltn
        )
    }

    /// True for opcodes that pop two operands and push one result.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Div
                | Opcode::And
                | Opcode::Or
                | Opcode::Mod
                | Opcode::Rem
                | Opcode::Xor
                | Opcode::Shl
                | Opcode::Shr
                | Opcode::Cmp
        )
    }
}
