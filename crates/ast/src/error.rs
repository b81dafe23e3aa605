//! Errors raised while reconstructing a function's AST.
//!
//! Any of these aborts the current function only. Instruction indices
//! (`at`) are relative to the block being executed.

use gmdc_common::{DataType, Opcode};
use thiserror::Error;

/// Errors that occur during symbolic execution or structural assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecompileError {
    /// An instruction form this stage does not handle.
    #[error("unsupported {} instruction at {at}: {reason}", .opcode.mnemonic())]
    UnsupportedInstruction {
        at: usize,
        opcode: Opcode,
        reason: &'static str,
    },

    /// An instruction needed an operand but the expression stack was empty.
    #[error("expression stack underflow at instruction {at}")]
    StackUnderflow { at: usize },

    /// The assembler needed a value on the expression stack for a construct.
    #[error("missing expression for {construct}")]
    MissingExpression { construct: &'static str },

    /// A push, pop or call carried no variable or function operand.
    #[error("missing variable or function reference at instruction {at}")]
    MissingReference { at: usize },

    /// A literal payload does not match the instruction's data type.
    #[error("malformed literal at instruction {at}: expected {expected:?} payload")]
    MalformedValue { at: usize, expected: DataType },

    /// A graph node lacks a branch its kind requires.
    #[error("{kind} node is missing branch {index}")]
    MissingBranch { kind: &'static str, index: usize },

    /// A node handle does not exist in the graph.
    #[error("node {node} is not in the graph")]
    UnknownNode { node: usize },

    /// A loop-condition or continue block outside of any loop.
    #[error("loop control outside of any loop")]
    MissingEnclosingLoop,
}
