//! Structured control-flow graph handed over by the structuring pass.
//!
//! Nodes live in an arena and refer to each other through [`NodeRef`]
//! handles. The meaning of each position in `branches` is fixed per node
//! kind:
//!
//! ```text
//! Block         [continuation?]
//! If            [continuation, true-block, else-block?]
//! Loop (For)    [continuation, body, increment]
//! Loop (other)  [continuation, body]
//! Switch        [preamble?, case_1 .. case_n]
//! ShortCircuit  [continuation?]
//! ```

use std::ops::{Index, IndexMut};

use crate::instruction::Instruction;

/// Handle of a node inside a [`ControlFlowGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeRef(pub usize);

/// Role of a block in the structure it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControlFlow {
    #[default]
    None,
    Break,
    Continue,
    /// Leaves the loop condition on the stack.
    LoopCondition,
    /// Leaves the switch's controlling expression on the stack.
    SwitchExpression,
    /// Leaves a case label on the stack.
    SwitchCase,
    SwitchDefault,
    IfCondition,
    WithExpression,
    RepeatExpression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    While,
    For,
    DoUntil,
    Repeat,
    With,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortCircuitKind {
    And,
    Or,
}

/// A straight-line run of instructions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    /// Instructions in execution order.
    pub instructions: Vec<Instruction>,
    pub control_flow: ControlFlow,
}

impl Block {
    pub fn new(instructions: Vec<Instruction>, control_flow: ControlFlow) -> Self {
        Self {
            instructions,
            control_flow,
        }
    }
}

/// The closed set of structured node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Block(Block),
    If {
        /// Block that leaves the condition on the stack.
        header: Block,
    },
    Loop(LoopKind),
    Switch,
    ShortCircuit {
        kind: ShortCircuitKind,
        /// One subgraph per operand, each leaving its value on the stack.
        conditions: Vec<NodeRef>,
    },
}

impl NodeKind {
    /// Short lower-case name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Block(_) => "block",
            NodeKind::If { .. } => "if",
            NodeKind::Loop(_) => "loop",
            NodeKind::Switch => "switch",
            NodeKind::ShortCircuit { .. } => "short-circuit",
        }
    }
}

/// A node of the structured graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub branches: Vec<NodeRef>,
    pub unreachable: bool,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            branches: Vec::new(),
            unreachable: false,
        }
    }

    pub fn block(instructions: Vec<Instruction>, control_flow: ControlFlow) -> Self {
        Self::new(NodeKind::Block(Block::new(instructions, control_flow)))
    }

    pub fn if_statement(header: Block) -> Self {
        Self::new(NodeKind::If { header })
    }

    pub fn loop_of(kind: LoopKind) -> Self {
        Self::new(NodeKind::Loop(kind))
    }

    pub fn switch() -> Self {
        Self::new(NodeKind::Switch)
    }

    pub fn short_circuit(kind: ShortCircuitKind, conditions: Vec<NodeRef>) -> Self {
        Self::new(NodeKind::ShortCircuit { kind, conditions })
    }

    pub fn with_branches(mut self, branches: Vec<NodeRef>) -> Self {
        self.branches = branches;
        self
    }

    pub fn marked_unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

/// Arena of structured nodes with a single entry block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlFlowGraph {
    nodes: Vec<Node>,
    entry: NodeRef,
}

impl ControlFlowGraph {
    /// Create an empty graph. The entry defaults to the first node added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its handle.
    pub fn add(&mut self, node: Node) -> NodeRef {
        self.nodes.push(node);
        NodeRef(self.nodes.len() - 1)
    }

    pub fn set_entry(&mut self, entry: NodeRef) {
        self.entry = entry;
    }

    pub fn entry(&self) -> NodeRef {
        self.entry
    }

    pub fn get(&self, node: NodeRef) -> Option<&Node> {
        self.nodes.get(node.0)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<NodeRef> for ControlFlowGraph {
    type Output = Node;

    fn index(&self, node: NodeRef) -> &Node {
        &self.nodes[node.0]
    }
}

impl IndexMut<NodeRef> for ControlFlowGraph {
    fn index_mut(&mut self, node: NodeRef) -> &mut Node {
        &mut self.nodes[node.0]
    }
}
