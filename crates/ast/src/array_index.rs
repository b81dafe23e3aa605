//! Recovery of two-dimensional array indices from older formats.
//!
//! Before 2.3 the compiler flattened `a[row, col]` into a single index
//! `row * 32000 + col`. Newer formats index each dimension natively.

use log::debug;

use crate::ast::{Ast, AstKind, BinaryOp, NodeId};
use crate::context::{DecompileContext, LEGACY_ARRAY_STRIDE};

/// Split an array index expression into its dimensions.
///
/// Returns `[row, col]` when `index` has the flattened shape under a
/// legacy format, and `[index]` otherwise.
pub fn process_array_index(ctx: &DecompileContext, ast: &Ast, index: NodeId) -> Vec<NodeId> {
    if !ctx.uses_legacy_arrays() {
        return vec![index];
    }

    match split_flattened(ast, index) {
        Some((row, col)) => {
            debug!("recovered 2d array index from {}", ast.describe(index));
            vec![row, col]
        }
        None => vec![index],
    }
}

/// Match `Add(Mul(row, Int32(stride)), col)`.
fn split_flattened(ast: &Ast, index: NodeId) -> Option<(NodeId, NodeId)> {
    let add = ast.get(index)?;
    if add.kind != AstKind::Binary(BinaryOp::Add) {
        return None;
    }
    let (&mul_id, &col) = (add.children.first()?, add.children.get(1)?);

    let mul = ast.get(mul_id)?;
    if mul.kind != AstKind::Binary(BinaryOp::Mul) {
        return None;
    }
    let (&row, &stride) = (mul.children.first()?, mul.children.get(1)?);

    match ast.get(stride)?.kind {
        AstKind::Int32(LEGACY_ARRAY_STRIDE) => Some((row, col)),
        _ => None,
    }
}
