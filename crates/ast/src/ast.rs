//! AST arena handed to the code printer.
//!
//! Every node lives in one [`Ast`] and refers to its sub-nodes through
//! [`NodeId`] handles. All sub-nodes are kept in `children`, so generic
//! walkers never need kind-specific accessors. The one exception is a
//! variable's instance operand, which is held in [`AstKind::Variable::left`].
//!
//! Children layout per kind:
//!
//! ```text
//! Variable       [index...]
//! Binary         [left, right]
//! Unary          [operand]
//! FunctionCall   [arg...]
//! Assign         [target, value] or [target] for increments
//! If             [condition, true-block, else-block?, true-value?, false-value?]
//! WhileLoop      [body, condition?]
//! DoUntilLoop    [body, condition?]
//! ForLoop        [increment-block, body, condition?]
//! RepeatLoop     [count, body]
//! WithLoop       [target, body]
//! Switch         [expression, case/default/statement...]
//! SwitchCase     [expression]
//! Return         [value]
//! Block          [statement...]
//! ShortCircuit   [condition...]
//! ```

use std::fmt::Write as _;
use std::ops::{Index, IndexMut};

use gmdc_common::{ComparisonKind, DataType, Opcode, ShortCircuitKind, VariableType};

/// Handle of a node inside an [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Binary operator, derived from the instruction that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    /// Remainder (`mod`).
    Mod,
    /// Integer division (`div`).
    Rem,
    Xor,
    Shl,
    Shr,
    Compare(ComparisonKind),
}

impl BinaryOp {
    /// Map a two-operand opcode onto its operator. `comparison` is only
    /// read for `cmp`.
    pub fn from_opcode(opcode: Opcode, comparison: ComparisonKind) -> Option<Self> {
        let op = match opcode {
            Opcode::Add => BinaryOp::Add,
            Opcode::Sub => BinaryOp::Sub,
            Opcode::Mul => BinaryOp::Mul,
            Opcode::Div => BinaryOp::Div,
            Opcode::And => BinaryOp::And,
            Opcode::Or => BinaryOp::Or,
            Opcode::Mod => BinaryOp::Mod,
            Opcode::Rem => BinaryOp::Rem,
            Opcode::Xor => BinaryOp::Xor,
            Opcode::Shl => BinaryOp::Shl,
            Opcode::Shr => BinaryOp::Shr,
            Opcode::Cmp => BinaryOp::Compare(comparison),
            _ => return None,
        };
        Some(op)
    }

    /// Source-level operator text.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Mod => "%",
            BinaryOp::Rem => "div",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Compare(kind) => match kind {
                ComparisonKind::Less => "<",
                ComparisonKind::LessEqual => "<=",
                ComparisonKind::Equal => "==",
                ComparisonKind::NotEqual => "!=",
                ComparisonKind::GreaterEqual => ">=",
                ComparisonKind::Greater => ">",
                ComparisonKind::None => "?",
            },
        }
    }
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    /// Logical or bitwise complement, depending on the operand type.
    Not,
}

/// How an [`AstKind::Assign`] combines target and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `target = value`
    Plain,
    /// `target op= value`
    Compound(BinaryOp),
    /// `target++`, `--target`, ... `op` is `Add` or `Sub`.
    Increment { op: BinaryOp, prefix: bool },
}

/// The closed set of AST node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    // Expressions
    Int16 {
        value: i16,
        /// The push form that produced the literal.
        opcode: Opcode,
    },
    Int32(i32),
    Int64(i64),
    Double(f64),
    Float(f32),
    Boolean(bool),
    /// String table index.
    String(u32),
    Variable {
        /// Variable table index.
        target: u32,
        scope: VariableType,
        /// Instance or array base expression.
        left: Option<NodeId>,
    },
    Binary(BinaryOp),
    Unary {
        op: UnaryOp,
        data_type: DataType,
    },
    FunctionCall {
        /// Function table index.
        target: u32,
    },
    /// Raw instance code used as an instance expression.
    TypeInstance(i16),

    // Statements
    Assign(AssignOp),
    If {
        /// Expression stack depth when the statement was created.
        stack_count: usize,
    },
    WhileLoop {
        continue_used: bool,
    },
    ForLoop,
    DoUntilLoop,
    RepeatLoop,
    WithLoop,
    Switch,
    SwitchCase,
    SwitchDefault,
    Break,
    Continue,
    Return,
    Exit,
    Block,
    ShortCircuit(ShortCircuitKind),
}

impl AstKind {
    /// Short lower-case name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            AstKind::Int16 { .. } => "int16",
            AstKind::Int32(_) => "int32",
            AstKind::Int64(_) => "int64",
            AstKind::Double(_) => "double",
            AstKind::Float(_) => "float",
            AstKind::Boolean(_) => "boolean",
            AstKind::String(_) => "string",
            AstKind::Variable { .. } => "variable",
            AstKind::Binary(_) => "binary",
            AstKind::Unary { .. } => "unary",
            AstKind::FunctionCall { .. } => "call",
            AstKind::TypeInstance(_) => "instance",
            AstKind::Assign(_) => "assign",
            AstKind::If { .. } => "if",
            AstKind::WhileLoop { .. } => "while",
            AstKind::ForLoop => "for",
            AstKind::DoUntilLoop => "do-until",
            AstKind::RepeatLoop => "repeat",
            AstKind::WithLoop => "with",
            AstKind::Switch => "switch",
            AstKind::SwitchCase => "case",
            AstKind::SwitchDefault => "default",
            AstKind::Break => "break",
            AstKind::Continue => "continue",
            AstKind::Return => "return",
            AstKind::Exit => "exit",
            AstKind::Block => "block",
            AstKind::ShortCircuit(_) => "short-circuit",
        }
    }
}

/// A node of the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: AstKind,
    pub children: Vec<NodeId>,
    /// Set when the node was copied by `dup` and is shared by two uses.
    pub duplicated: bool,
}

impl AstNode {
    pub fn new(kind: AstKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            duplicated: false,
        }
    }
}

/// Arena holding a decompiled function body.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<AstNode>,
    root: NodeId,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    /// Create an arena holding only an empty root block.
    pub fn new() -> Self {
        Self {
            nodes: vec![AstNode::new(AstKind::Block)],
            root: NodeId(0),
        }
    }

    /// The function body block.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Add a childless node.
    pub fn add(&mut self, kind: AstKind) -> NodeId {
        self.add_with_children(kind, Vec::new())
    }

    pub fn add_with_children(&mut self, kind: AstKind, children: Vec<NodeId>) -> NodeId {
        self.nodes.push(AstNode {
            kind,
            children,
            duplicated: false,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Add an empty block.
    pub fn block(&mut self) -> NodeId {
        self.add(AstKind::Block)
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.add_with_children(AstKind::Binary(op), vec![left, right])
    }

    pub fn assign(&mut self, op: AssignOp, target: NodeId, value: Option<NodeId>) -> NodeId {
        let mut children = vec![target];
        children.extend(value);
        self.add_with_children(AstKind::Assign(op), children)
    }

    pub fn get(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Append `child` to `parent`'s children.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[parent.0].children.insert(index, child);
    }

    /// Remove the last occurrence of `child` from `parent`. Returns false
    /// if `child` was not there.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.nodes[parent.0].children;
        match children.iter().rposition(|&c| c == child) {
            Some(pos) => {
                children.remove(pos);
                true
            }
            None => false,
        }
    }

    /// The children of `id` paired with their nodes, in order.
    pub fn statements(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &AstNode)> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .map(move |&child| (child, &self.nodes[child.0]))
    }

    /// Number of nodes in the arena, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Render `id` as a compact s-expression, for logs and tests.
    pub fn describe(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.describe_into(id, &mut out);
        out
    }

    fn describe_into(&self, id: NodeId, out: &mut String) {
        let node = &self[id];
        let _ = match &node.kind {
            AstKind::Int16 { value, .. } => write!(out, "{value}"),
            AstKind::Int32(v) => write!(out, "{v}"),
            AstKind::Int64(v) => write!(out, "{v}L"),
            AstKind::Double(v) => write!(out, "{v:?}"),
            AstKind::Float(v) => write!(out, "{v:?}f"),
            AstKind::Boolean(v) => write!(out, "{v}"),
            AstKind::String(v) => write!(out, "str{v}"),
            AstKind::TypeInstance(code) => write!(out, "inst{code}"),
            AstKind::Variable { target, left, .. } => {
                if let Some(left) = left {
                    self.describe_into(*left, out);
                    out.push('.');
                }
                let _ = write!(out, "var{target}");
                if !node.children.is_empty() {
                    out.push('[');
                    for (i, &index) in node.children.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.describe_into(index, out);
                    }
                    out.push(']');
                }
                Ok(())
            }
            AstKind::Binary(op) => write!(out, "({}", op.symbol()),
            AstKind::Unary { op, .. } => match op {
                UnaryOp::Neg => write!(out, "(neg"),
                UnaryOp::Not => write!(out, "(not"),
            },
            AstKind::FunctionCall { target } => write!(out, "(fn{target}"),
            AstKind::Assign(op) => match op {
                AssignOp::Plain => write!(out, "(="),
                AssignOp::Compound(op) => write!(out, "({}=", op.symbol()),
                AssignOp::Increment { op, prefix } => {
                    let sym = if *op == BinaryOp::Sub { "--" } else { "++" };
                    if *prefix {
                        write!(out, "({sym}pre")
                    } else {
                        write!(out, "({sym}post")
                    }
                }
            },
            other => write!(out, "({}", other.name()),
        };

        let is_leaf = matches!(
            node.kind,
            AstKind::Int16 { .. }
                | AstKind::Int32(_)
                | AstKind::Int64(_)
                | AstKind::Double(_)
                | AstKind::Float(_)
                | AstKind::Boolean(_)
                | AstKind::String(_)
                | AstKind::TypeInstance(_)
                | AstKind::Variable { .. }
        );
        if is_leaf {
            return;
        }
        for &child in &node.children {
            out.push(' ');
            self.describe_into(child, out);
        }
        out.push(')');
    }
}

impl Index<NodeId> for Ast {
    type Output = AstNode;

    fn index(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Ast {
    fn index_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.0]
    }
}
