//! The shared expression stack and the static stack effect of each opcode.
//!
//! Blocks run one after another against the same [`ExprStack`]; whatever a
//! block leaves behind is picked up by the next block or by the assembler.

use gmdc_common::{DataType, InstanceType, Instruction, Opcode, VariableType};

use crate::ast::NodeId;
use crate::error::DecompileError;

/// Stack of expression nodes not yet consumed into a statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExprStack {
    items: Vec<NodeId>,
}

impl ExprStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: NodeId) {
        self.items.push(id);
    }

    /// Pop for the instruction at `at`.
    pub fn pop(&mut self, at: usize) -> Result<NodeId, DecompileError> {
        self.items.pop().ok_or(DecompileError::StackUnderflow { at })
    }

    /// Pop a value the assembler needs for `construct`.
    pub fn pop_for(&mut self, construct: &'static str) -> Result<NodeId, DecompileError> {
        self.items
            .pop()
            .ok_or(DecompileError::MissingExpression { construct })
    }

    pub fn try_pop(&mut self) -> Option<NodeId> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<NodeId> {
        self.items.last().copied()
    }

    /// Replace the top item. No effect on an empty stack.
    pub fn replace_top(&mut self, id: NodeId) {
        if let Some(top) = self.items.last_mut() {
            *top = id;
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items from bottom to top.
    pub fn as_slice(&self) -> &[NodeId] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<NodeId> {
        self.items
    }
}

impl Extend<NodeId> for ExprStack {
    fn extend<T: IntoIterator<Item = NodeId>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl IntoIterator for ExprStack {
    type Item = NodeId;
    type IntoIter = std::vec::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl From<Vec<NodeId>> for ExprStack {
    fn from(items: Vec<NodeId>) -> Self {
        Self { items }
    }
}

/// Number of instance and index operands a variable access pops.
pub fn variable_operand_pops(instr: &Instruction) -> usize {
    match instr.variable {
        Some(_) if instr.instance_type == InstanceType::StackTop => 1,
        Some(var) if var.variable_type == VariableType::StackTop => 1,
        Some(var) if var.variable_type == VariableType::Array => 2,
        _ => 0,
    }
}

/// Number of values an instruction pops, ignoring idioms.
pub fn stack_pops(instr: &Instruction) -> usize {
    match instr.opcode {
        Opcode::Push | Opcode::PushLoc | Opcode::PushGlb | Opcode::PushBltn => {
            if instr.data_type_1 == DataType::Variable {
                variable_operand_pops(instr)
            } else {
                0
            }
        }
        Opcode::PushI
        | Opcode::Exit
        | Opcode::B
        | Opcode::Bt
        | Opcode::Bf
        | Opcode::PushEnv
        | Opcode::PopEnv
        | Opcode::CallV
        | Opcode::Break => 0,

        Opcode::Pop => {
            if instr.variable.is_none() {
                2 + usize::from(instr.swap_extra).saturating_sub(4)
            } else {
                let value = match instr.data_type_1 {
                    DataType::Int32 | DataType::Variable => 1,
                    _ => 0,
                };
                value + variable_operand_pops(instr)
            }
        }

        Opcode::Neg | Opcode::Not | Opcode::Ret | Opcode::Popz | Opcode::Conv => 1,

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
        | Opcode::Cmp => 2,

        Opcode::Call => usize::from(instr.argument_count),
        Opcode::Dup => dup_count(instr),
    }
}

/// Net change in stack depth (pushes minus pops), ignoring idioms.
pub fn stack_delta(instr: &Instruction) -> i64 {
    let pops = stack_pops(instr) as i64;
    let pushes: i64 = match instr.opcode {
        // Literal or variable
        Opcode::Push | Opcode::PushLoc | Opcode::PushGlb | Opcode::PushBltn | Opcode::PushI => 1,

        Opcode::Pop => {
            if instr.variable.is_none() {
                2
            } else {
                0
            }
        }

        // Pop 1, push 1
        Opcode::Neg | Opcode::Not | Opcode::Conv => 1,

        // Pop 2, push 1
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
        | Opcode::Cmp => 1,

        Opcode::Call => 1,
        Opcode::Dup => 2 * dup_count(instr) as i64,

        Opcode::Ret
        | Opcode::Popz
        | Opcode::Exit
        | Opcode::B
        | Opcode::Bt
        | Opcode::Bf
        | Opcode::PushEnv
        | Opcode::PopEnv
        | Opcode::CallV
        | Opcode::Break => 0,
    };
    pushes - pops
}

/// Number of stack items a `dup` copies.
pub fn dup_count(instr: &Instruction) -> usize {
    (usize::from(instr.extra) + 1) * instr.data_type_1.slot_width()
}
