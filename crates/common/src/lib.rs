//! Shared model for GML bytecode decompilation.
//!
//! This crate holds the inputs of the AST-reconstruction stage:
//!
//! - [`Opcode`], [`DataType`], [`InstanceType`], [`VariableType`] and
//!   [`ComparisonKind`]: the typed instruction fields
//! - [`Instruction`]: a decoded instruction with resolved references
//! - [`Value`]: the literal payload of push instructions
//! - [`FormatVersion`]: the bytecode format version that gates legacy idioms
//! - [`ControlFlowGraph`]: the structured graph produced by the structuring pass
//! - [`DecodeError`]: errors from mapping raw codes onto the typed model
//!
//! # Dependencies
//!
//! This crate uses `thiserror` and has no other dependencies.

pub mod data_type;
pub mod error;
pub mod graph;
pub mod instruction;
pub mod opcode;
pub mod scope;
pub mod value;
pub mod version;

// Re-export commonly used types at the crate root.
pub use data_type::DataType;
pub use error::DecodeError;
pub use graph::{
    Block, ControlFlow, ControlFlowGraph, LoopKind, Node, NodeKind, NodeRef, ShortCircuitKind,
};
pub use instruction::{FunctionRef, Instruction, VariableRef};
pub use opcode::Opcode;
pub use scope::{ComparisonKind, InstanceType, VariableType};
pub use value::Value;
pub use version::FormatVersion;
