//! Instruction windows that collapse into one source-level construct.
//!
//! The matchers here only inspect instructions and AST nodes; the
//! executor applies the stack effects and moves its cursor past the
//! window.

use gmdc_common::{DataType, Instruction, Opcode, Value, VariableType};

use crate::ast::{Ast, AstKind, BinaryOp, NodeId};
use crate::context::DecompileContext;

/// A recognized `x++`, `x--`, `++x` or `--x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementMatch {
    /// `Add` or `Sub`.
    pub op: BinaryOp,
    pub prefix: bool,
}

/// Where a prefix window ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixEnd {
    /// Index of the first instruction after the window.
    pub next: usize,
    /// The window ended in a stack-permuting `pop.e.v`.
    pub permuted: bool,
}

fn increment_op(instr: &Instruction) -> Option<BinaryOp> {
    match instr.opcode {
        Opcode::Add => Some(BinaryOp::Add),
        Opcode::Sub => Some(BinaryOp::Sub),
        _ => None,
    }
}

/// Check whether the Int16 push at `i` starts or continues an
/// increment/decrement window. Postfix is tried first.
pub fn match_increment(
    ctx: &DecompileContext,
    instrs: &[Instruction],
    i: usize,
) -> Option<IncrementMatch> {
    let push = instrs.get(i)?;
    if push.data_type_1 != DataType::Int16 || push.value != Value::Int16(1) {
        return None;
    }
    match_postfix(ctx, instrs, i).or_else(|| match_prefix(instrs, i))
}

/// `dup.v; push.e 1; add|sub` (or, before 2.3, `dup.v; pop.e.v; push.e 1; add|sub`).
fn match_postfix(ctx: &DecompileContext, instrs: &[Instruction], i: usize) -> Option<IncrementMatch> {
    if i < 2 || i + 1 >= instrs.len() {
        return None;
    }
    let prev1 = &instrs[i - 1];
    let prev2 = &instrs[i - 2];

    let direct = prev1.is_variable_dup();
    let through_swap = ctx.supports_postfix_swap_window()
        && prev2.is_variable_dup()
        && prev1.is_stack_permutation()
        && prev1.data_type_1 == DataType::Int16;
    if !direct && !through_swap {
        return None;
    }

    increment_op(&instrs[i + 1]).map(|op| IncrementMatch { op, prefix: false })
}

/// `push.e 1; add|sub; dup.v`.
fn match_prefix(instrs: &[Instruction], i: usize) -> Option<IncrementMatch> {
    if i + 2 >= instrs.len() {
        return None;
    }
    let op = increment_op(&instrs[i + 1])?;
    instrs[i + 2]
        .is_variable_dup()
        .then_some(IncrementMatch { op, prefix: true })
}

/// First instruction after a postfix window starting at `i`.
///
/// The window covers the push, the `add`/`sub`, one write-back `pop` and
/// any stack-permuting pops around it. It stops after that one write-back:
/// a second variable `pop` is the store that consumes the increment's
/// value, as in `b = a++`.
pub fn postfix_end(instrs: &[Instruction], i: usize) -> usize {
    let mut j = i + 2;
    let mut wrote_back = false;
    while let Some(instr) = instrs.get(j) {
        if instr.is_stack_permutation() {
            j += 1;
        } else if instr.opcode == Opcode::Pop && !wrote_back {
            wrote_back = true;
            j += 1;
        } else {
            break;
        }
    }
    j.min(instrs.len())
}

/// End of a prefix window starting at `i`: the first `pop` after it, plus
/// the write-back that follows a `pop.e.v`.
pub fn prefix_end(instrs: &[Instruction], i: usize) -> PrefixEnd {
    let terminator = (i + 1..instrs.len()).find(|&j| instrs[j].opcode == Opcode::Pop);
    match terminator {
        Some(j) if instrs[j].is_int16_variable_pop() => PrefixEnd {
            next: (j + 2).min(instrs.len()),
            permuted: true,
        },
        Some(j) => PrefixEnd {
            next: j + 1,
            permuted: false,
        },
        None => PrefixEnd {
            next: instrs.len(),
            permuted: false,
        },
    }
}

/// Recognize a desugared `target op= rhs`.
///
/// The store's instance operand must be a `dup` copy, the access must go
/// through the stack or an array, and the stored value must be a binary
/// expression whose left operand is a variable. Returns the operator and
/// the right-hand side.
pub fn compound_assignment(
    ast: &Ast,
    instance: NodeId,
    scope: VariableType,
    value: NodeId,
) -> Option<(BinaryOp, NodeId)> {
    if !ast[instance].duplicated {
        return None;
    }
    if !matches!(scope, VariableType::StackTop | VariableType::Array) {
        return None;
    }

    let node = &ast[value];
    let op = match node.kind {
        AstKind::Binary(op) => op,
        _ => return None,
    };
    let (&lhs, &rhs) = (node.children.first()?, node.children.get(1)?);
    match ast[lhs].kind {
        AstKind::Variable { .. } => Some((op, rhs)),
        _ => None,
    }
}

/// The boolean an Int16 `0` or `1` literal stands for.
pub fn boolean_literal(ast: &Ast, id: NodeId) -> Option<bool> {
    match ast.get(id)?.kind {
        AstKind::Int16 { value: 0, .. } => Some(false),
        AstKind::Int16 { value: 1, .. } => Some(true),
        _ => None,
    }
}
