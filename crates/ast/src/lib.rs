//! AST reconstruction for GML bytecode.
//!
//! Takes the structured control-flow graph of one function and turns it
//! into an AST the printer can render as script text:
//!
//! - [`execute`] symbolically runs each block against a shared
//!   expression stack, producing expression and statement nodes
//! - [`idiom`] recognizes increments, compound assignments and boolean
//!   literals hidden in instruction sequences
//! - [`array_index`] recovers two-dimensional indices in older formats
//! - [`builder`] walks the graph with an explicit work-stack and builds
//!   loops, conditionals, switches, short-circuits and ternaries
//!
//! # Usage
//!
//! ```
//! use gmdc_ast::{build_ast, AstKind, DecompileContext};
//! use gmdc_common::{
//!     ControlFlow, ControlFlowGraph, DataType, FormatVersion, InstanceType, Instruction, Node,
//!     Opcode, Value, VariableRef, VariableType,
//! };
//!
//! // x = 5
//! let store = Instruction::new(Opcode::Pop, DataType::Variable, DataType::Int32)
//!     .with_variable(VariableRef::new(0, VariableType::Normal), InstanceType::SelfInstance);
//! let code = vec![
//!     Instruction::new(Opcode::Push, DataType::Int32, DataType::Double).with_value(Value::Int32(5)),
//!     store,
//! ];
//!
//! let mut graph = ControlFlowGraph::new();
//! graph.add(Node::block(code, ControlFlow::None));
//!
//! let ctx = DecompileContext::new(FormatVersion::new(2, 3, 0, 0));
//! let ast = build_ast(&ctx, &mut graph).unwrap();
//! let body = ast.children(ast.root());
//! assert_eq!(body.len(), 1);
//! assert!(matches!(ast[body[0]].kind, AstKind::Assign(_)));
//! ```
//!
//! # Logging
//!
//! Diagnostics go through the `log` facade: `trace` for every executed
//! instruction, `debug` for recognized idioms, folds and pruning, and
//! `warn` for tolerated quirks. No logger is installed here.

pub mod array_index;
pub mod ast;
pub mod builder;
pub mod context;
pub mod error;
pub mod execute;
pub mod idiom;
pub mod stack;

pub use ast::{AssignOp, Ast, AstKind, AstNode, BinaryOp, NodeId, UnaryOp};
pub use builder::AstBuilder;
pub use context::DecompileContext;
pub use error::DecompileError;
pub use execute::{execute_block, BlockExecutor};
pub use stack::{stack_delta, ExprStack};

use gmdc_common::ControlFlowGraph;

/// Build the AST of one function.
///
/// The graph's entry node is assembled into the root block of the
/// returned [`Ast`]. Branches after `break` and `continue` blocks are
/// pruned from `graph` in place.
///
/// # Errors
///
/// Returns [`DecompileError`] on unsupported instruction forms, stack
/// underflow, or a graph that lacks branches its node kinds require.
pub fn build_ast(
    ctx: &DecompileContext,
    graph: &mut ControlFlowGraph,
) -> Result<Ast, DecompileError> {
    AstBuilder::new(ctx).build(graph)
}
