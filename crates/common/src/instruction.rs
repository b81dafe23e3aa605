//! Decoded GML instructions.
//!
//! Instructions arrive fully decoded from the container reader: variable
//! and function operands are already resolved to table indices, and the
//! immediate payload is typed. Nothing in this workspace mutates them.

use std::fmt;

use crate::data_type::DataType;
use crate::error::DecodeError;
use crate::opcode::Opcode;
use crate::scope::{ComparisonKind, InstanceType, VariableType};
use crate::value::Value;

/// A resolved variable operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableRef {
    /// Index into the container's variable table.
    pub target: u32,
    /// Addressing mode of this access.
    pub variable_type: VariableType,
}

impl VariableRef {
    pub fn new(target: u32, variable_type: VariableType) -> Self {
        Self {
            target,
            variable_type,
        }
    }
}

/// A resolved function operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionRef {
    /// Index into the container's function table.
    pub target: u32,
}

impl FunctionRef {
    pub fn new(target: u32) -> Self {
        Self { target }
    }
}

/// A single decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Primary operand type.
    pub data_type_1: DataType,
    /// Secondary operand type. Only meaningful for two-type forms.
    pub data_type_2: DataType,
    /// Immediate payload for pushes.
    pub value: Value,
    /// Variable operand, for pushes and stores.
    pub variable: Option<VariableRef>,
    /// Function operand, for `call`.
    pub function: Option<FunctionRef>,
    /// Instance the variable operand is resolved against.
    pub instance_type: InstanceType,
    /// Raw comparison field. `cmp` reads it as a [`ComparisonKind`];
    /// `dup` treats any non-zero value as a flag.
    pub comparison_kind: u8,
    /// Extra operand of `dup` (slots to duplicate, minus one).
    pub extra: u8,
    /// Extra operand of the stack-permuting `pop.e.v`.
    pub swap_extra: u8,
    /// Argument count of `call`.
    pub argument_count: u16,
}

impl Instruction {
    /// Create an instruction with no operands.
    pub fn new(opcode: Opcode, data_type_1: DataType, data_type_2: DataType) -> Self {
        Self {
            opcode,
            data_type_1,
            data_type_2,
            value: Value::None,
            variable: None,
            function: None,
            instance_type: InstanceType::Undefined,
            comparison_kind: 0,
            extra: 0,
            swap_extra: 0,
            argument_count: 0,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    pub fn with_variable(mut self, variable: VariableRef, instance_type: InstanceType) -> Self {
        self.variable = Some(variable);
        self.instance_type = instance_type;
        self
    }

    pub fn with_function(mut self, function: FunctionRef, argument_count: u16) -> Self {
        self.function = Some(function);
        self.argument_count = argument_count;
        self
    }

    pub fn with_comparison(mut self, comparison_kind: u8) -> Self {
        self.comparison_kind = comparison_kind;
        self
    }

    pub fn with_extra(mut self, extra: u8) -> Self {
        self.extra = extra;
        self
    }

    pub fn with_swap_extra(mut self, swap_extra: u8) -> Self {
        self.swap_extra = swap_extra;
        self
    }

    /// The comparison performed by a `cmp` instruction.
    pub fn comparison(&self) -> Result<ComparisonKind, DecodeError> {
        ComparisonKind::try_from(self.comparison_kind)
    }

    /// `dup.v`: duplicates a variable's instance operands.
    pub fn is_variable_dup(&self) -> bool {
        self.opcode == Opcode::Dup && self.data_type_1 == DataType::Variable
    }

    /// `pop.e.v` without a target: permutes the stack instead of storing.
    pub fn is_stack_permutation(&self) -> bool {
        self.opcode == Opcode::Pop && self.variable.is_none()
    }

    /// `pop.e.v` in either form (store of an Int16 into a variable slot,
    /// or the permutation form).
    pub fn is_int16_variable_pop(&self) -> bool {
        self.opcode == Opcode::Pop
            && self.data_type_1 == DataType::Int16
            && self.data_type_2 == DataType::Variable
    }

    /// True if this instruction's disassembly shows both type suffixes.
    fn has_two_types(&self) -> bool {
        self.opcode == Opcode::Conv || self.opcode == Opcode::Pop || self.opcode.is_binary()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.opcode.mnemonic(), self.data_type_1.suffix())?;
        if self.has_two_types() {
            write!(f, ".{}", self.data_type_2.suffix())?;
        }

        match self.opcode {
            Opcode::Cmp => {
                let name = self.comparison().map(|c| c.name()).unwrap_or("?");
                write!(f, " {name}")
            }
            Opcode::Dup => {
                write!(f, " {}", self.extra)?;
                if self.comparison_kind != 0 {
                    write!(f, " {}", self.comparison_kind)?;
                }
                Ok(())
            }
            Opcode::Pop if self.variable.is_none() => write!(f, " {}", self.swap_extra),
            Opcode::Call => match self.function {
                Some(func) => write!(f, " fn{}(argc={})", func.target, self.argument_count),
                None => write!(f, " ?(argc={})", self.argument_count),
            },
            _ => match self.variable {
                Some(var) => {
                    let prefix = match var.variable_type {
                        VariableType::Array => "[array]",
                        VariableType::StackTop => "[stacktop]",
                        _ => "",
                    };
                    write!(f, " {prefix}{}.var{}", self.instance_type.name(), var.target)
                }
                None => match self.value {
                    Value::None => Ok(()),
                    Value::Int16(v) => write!(f, " {v}"),
                    Value::Int32(v) => write!(f, " {v}"),
                    Value::Int64(v) => write!(f, " {v}"),
                    Value::Double(v) => write!(f, " {v}"),
                    Value::Float(v) => write!(f, " {v}"),
                    Value::Boolean(v) => write!(f, " {v}"),
                    Value::String(v) => write!(f, " str{v}"),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(op: Opcode, t1: DataType, t2: DataType) -> Instruction {
        Instruction::new(op, t1, t2)
    }

    #[test]
    fn new_has_no_operands() {
        let i = instr(Opcode::Add, DataType::Int32, DataType::Int32);
        assert_eq!(i.value, Value::None);
        assert!(i.variable.is_none());
        assert!(i.function.is_none());
        assert_eq!(i.extra, 0);
        assert_eq!(i.argument_count, 0);
    }

    #[test]
    fn variable_dup_detection() {
        let dup = instr(Opcode::Dup, DataType::Variable, DataType::Double);
        assert!(dup.is_variable_dup());
        let dup_i = instr(Opcode::Dup, DataType::Int32, DataType::Double);
        assert!(!dup_i.is_variable_dup());
    }

    #[test]
    fn permutation_pop_detection() {
        let swap = instr(Opcode::Pop, DataType::Int16, DataType::Variable).with_swap_extra(5);
        assert!(swap.is_stack_permutation());
        assert!(swap.is_int16_variable_pop());

        let store = instr(Opcode::Pop, DataType::Variable, DataType::Variable).with_variable(
            VariableRef::new(1, VariableType::Normal),
            InstanceType::SelfInstance,
        );
        assert!(!store.is_stack_permutation());
        assert!(!store.is_int16_variable_pop());
    }

    #[test]
    fn comparison_decode() {
        let cmp = instr(Opcode::Cmp, DataType::Int32, DataType::Int32).with_comparison(1);
        assert_eq!(cmp.comparison(), Ok(ComparisonKind::Less));
        let bad = cmp.clone().with_comparison(9);
        assert_eq!(bad.comparison(), Err(DecodeError::InvalidComparisonKind(9)));
    }

    // --- Display ---

    #[test]
    fn display_push_variable() {
        let i = instr(Opcode::Push, DataType::Variable, DataType::Double).with_variable(
            VariableRef::new(3, VariableType::Normal),
            InstanceType::SelfInstance,
        );
        assert_eq!(i.to_string(), "push.v self.var3");
    }

    #[test]
    fn display_push_literal() {
        let i = instr(Opcode::Push, DataType::Int16, DataType::Double).with_value(Value::Int16(1));
        assert_eq!(i.to_string(), "push.e 1");
        let s = instr(Opcode::Push, DataType::String, DataType::Double).with_value(Value::String(9));
        assert_eq!(s.to_string(), "push.s str9");
    }

    #[test]
    fn display_two_type_forms() {
        let add = instr(Opcode::Add, DataType::Int32, DataType::Variable);
        assert_eq!(add.to_string(), "add.i.v");
        let cmp = instr(Opcode::Cmp, DataType::Int32, DataType::Int32).with_comparison(3);
        assert_eq!(cmp.to_string(), "cmp.i.i EQ");
        let swap = instr(Opcode::Pop, DataType::Int16, DataType::Variable).with_swap_extra(5);
        assert_eq!(swap.to_string(), "pop.e.v 5");
    }

    #[test]
    fn display_dup_and_call() {
        let dup = instr(Opcode::Dup, DataType::Variable, DataType::Double);
        assert_eq!(dup.to_string(), "dup.v 0");
        let call = instr(Opcode::Call, DataType::Int32, DataType::Double)
            .with_function(FunctionRef::new(2), 1);
        assert_eq!(call.to_string(), "call.i fn2(argc=1)");
    }

    #[test]
    fn display_array_access() {
        let i = instr(Opcode::Pop, DataType::Variable, DataType::Variable).with_variable(
            VariableRef::new(4, VariableType::Array),
            InstanceType::SelfInstance,
        );
        assert_eq!(i.to_string(), "pop.v.v [array]self.var4");
    }
}
