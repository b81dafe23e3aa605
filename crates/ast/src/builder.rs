//! Structural assembly of the AST from the control-flow graph.
//!
//! The graph is walked depth-first with an explicit work-stack, so deeply
//! nested code never grows the call stack. Each frame says which node to
//! visit and which AST container receives its statements. Frames are
//! popped last-in first-out: a node schedules its continuation *before*
//! its own children so the children are processed first.

use gmdc_common::{ControlFlow, ControlFlowGraph, LoopKind, NodeKind, NodeRef, ShortCircuitKind};
use log::debug;

use crate::ast::{Ast, AstKind, NodeId};
use crate::context::{DecompileContext, TERNARY_CHILD_COUNT};
use crate::error::DecompileError;
use crate::execute::execute_block;
use crate::stack::ExprStack;

/// An If statement whose branches are still being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenIf {
    statement: NodeId,
    /// The container holding `statement`, needed to splice out a ternary.
    container: NodeId,
}

/// One pending unit of work.
#[derive(Debug, Clone, Copy)]
struct Frame {
    container: NodeId,
    node: NodeRef,
    enclosing_loop: Option<NodeId>,
    enclosing_if: Option<OpenIf>,
}

impl Frame {
    /// Same context, different node.
    fn with_node(self, node: NodeRef) -> Self {
        Self { node, ..self }
    }
}

fn branch(branches: &[NodeRef], kind: &'static str, index: usize) -> Result<NodeRef, DecompileError> {
    branches
        .get(index)
        .copied()
        .ok_or(DecompileError::MissingBranch { kind, index })
}

/// Drop every branch of `node` that is not marked unreachable.
///
/// Code after a `break` or `continue` is dead; only branches the
/// structuring pass explicitly kept as unreachable code survive.
pub fn prune_reachable_branches(graph: &mut ControlFlowGraph, node: NodeRef) {
    let kept: Vec<NodeRef> = graph[node]
        .branches
        .iter()
        .copied()
        .filter(|&b| graph.get(b).map_or(false, |n| n.unreachable))
        .collect();
    let removed = graph[node].branches.len() - kept.len();
    if removed > 0 {
        debug!("pruned {removed} branch(es) after node {}", node.0);
    }
    graph[node].branches = kept;
}

/// Assembles AST nodes for one function.
pub struct AstBuilder<'a> {
    ctx: &'a DecompileContext,
    ast: Ast,
}

impl<'a> AstBuilder<'a> {
    pub fn new(ctx: &'a DecompileContext) -> Self {
        Self {
            ctx,
            ast: Ast::new(),
        }
    }

    /// The AST assembled so far.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn into_ast(self) -> Ast {
        self.ast
    }

    /// Assemble the whole graph into the root block.
    ///
    /// Values left on the expression stack at the end are dropped.
    pub fn build(mut self, graph: &mut ControlFlowGraph) -> Result<Ast, DecompileError> {
        let root = self.ast.root();
        let entry = graph.entry();
        let leftover = self.build_from_node(graph, root, entry)?;
        if !leftover.is_empty() {
            debug!("{} expression(s) left on the stack", leftover.len());
        }
        Ok(self.ast)
    }

    /// Assemble the subgraph at `start` into `container` and return the
    /// expressions it leaves behind.
    pub fn build_from_node(
        &mut self,
        graph: &mut ControlFlowGraph,
        container: NodeId,
        start: NodeRef,
    ) -> Result<ExprStack, DecompileError> {
        let mut work = vec![Frame {
            container,
            node: start,
            enclosing_loop: None,
            enclosing_if: None,
        }];
        let mut stack = ExprStack::new();

        while let Some(frame) = work.pop() {
            let node = graph
                .get(frame.node)
                .ok_or(DecompileError::UnknownNode { node: frame.node.0 })?;

            match &node.kind {
                NodeKind::Block(block) => {
                    let control_flow = block.control_flow;
                    if let Some(&next) = node.branches.first() {
                        work.push(frame.with_node(next));
                    }
                    execute_block(
                        self.ctx,
                        &block.instructions,
                        &mut self.ast,
                        &mut stack,
                        frame.container,
                    )?;

                    // The continuation is already scheduled; pruning only
                    // affects later visits through the graph.
                    if matches!(control_flow, ControlFlow::Break | ControlFlow::Continue) {
                        prune_reachable_branches(graph, frame.node);
                    }
                    self.finish_block(frame, control_flow, &mut stack)?;
                }
                NodeKind::If { header } => {
                    execute_block(
                        self.ctx,
                        &header.instructions,
                        &mut self.ast,
                        &mut stack,
                        frame.container,
                    )?;
                    self.open_if(frame, &node.branches, &mut work, &mut stack)?;
                }
                NodeKind::ShortCircuit { kind, conditions } => {
                    let kind = *kind;
                    let conditions = conditions.clone();
                    if let Some(&next) = node.branches.first() {
                        work.push(frame.with_node(next));
                    }
                    self.short_circuit(graph, frame, kind, &conditions, &mut stack)?;
                }
                NodeKind::Loop(kind) => {
                    self.open_loop(frame, *kind, &node.branches, &mut work, &mut stack)?;
                }
                NodeKind::Switch => self.open_switch(frame, &node.branches, &mut work),
            }
        }

        Ok(stack)
    }

    /// React to a block's control-flow role once its code has run.
    fn finish_block(
        &mut self,
        frame: Frame,
        control_flow: ControlFlow,
        stack: &mut ExprStack,
    ) -> Result<(), DecompileError> {
        let container = frame.container;

        match control_flow {
            ControlFlow::Break => {
                let stmt = self.ast.add(AstKind::Break);
                self.ast.push_child(container, stmt);
            }
            ControlFlow::Continue => {
                let stmt = self.ast.add(AstKind::Continue);
                self.ast.push_child(container, stmt);
                let enclosing = frame
                    .enclosing_loop
                    .ok_or(DecompileError::MissingEnclosingLoop)?;
                if let AstKind::WhileLoop { continue_used } = &mut self.ast[enclosing].kind {
                    *continue_used = true;
                }
            }
            ControlFlow::LoopCondition => {
                let enclosing = frame
                    .enclosing_loop
                    .ok_or(DecompileError::MissingEnclosingLoop)?;
                let condition = stack.pop_for("loop condition")?;
                self.ast.push_child(enclosing, condition);
            }
            ControlFlow::SwitchExpression => {
                let expression = stack.pop_for("switch expression")?;
                self.ast.insert_child(container, 0, expression);
            }
            ControlFlow::SwitchCase => {
                let expression = stack.pop_for("switch case")?;
                let case = self
                    .ast
                    .add_with_children(AstKind::SwitchCase, vec![expression]);
                self.ast.push_child(container, case);
            }
            ControlFlow::SwitchDefault => {
                let default = self.ast.add(AstKind::SwitchDefault);
                self.ast.push_child(container, default);
            }
            // Already consumed when the owning node was built.
            ControlFlow::IfCondition | ControlFlow::WithExpression | ControlFlow::RepeatExpression => {}
            ControlFlow::None => {
                if let Some(open) = frame.enclosing_if {
                    self.fold_ternary(open, stack)?;
                }
            }
        }
        Ok(())
    }

    /// Attach a branch value to an open If. Once both values are present
    /// the If becomes an expression on the stack.
    fn fold_ternary(&mut self, open: OpenIf, stack: &mut ExprStack) -> Result<(), DecompileError> {
        let stack_count = match self.ast[open.statement].kind {
            AstKind::If { stack_count } => stack_count,
            _ => return Ok(()),
        };
        let children = self.ast.children(open.statement).len();
        if stack.len() != stack_count + 1 || !(3..TERNARY_CHILD_COUNT).contains(&children) {
            return Ok(());
        }

        let value = stack.pop_for("ternary value")?;
        self.ast.push_child(open.statement, value);
        if children + 1 >= TERNARY_CHILD_COUNT {
            self.ast.remove_child(open.container, open.statement);
            stack.push(open.statement);
            debug!("folded ternary {}", self.ast.describe(open.statement));
        }
        Ok(())
    }

    fn open_if(
        &mut self,
        frame: Frame,
        branches: &[NodeRef],
        work: &mut Vec<Frame>,
        stack: &mut ExprStack,
    ) -> Result<(), DecompileError> {
        let continuation = branch(branches, "if", 0)?;
        let true_branch = branch(branches, "if", 1)?;
        let else_branch = branches.get(2).copied();

        work.push(frame.with_node(continuation));

        let condition = stack.pop_for("if condition")?;
        let statement = self.ast.add_with_children(
            AstKind::If {
                stack_count: stack.len(),
            },
            vec![condition],
        );
        self.ast.push_child(frame.container, statement);

        let open = Some(OpenIf {
            statement,
            container: frame.container,
        });
        let true_block = self.ast.block();
        self.ast.push_child(statement, true_block);

        if let Some(else_branch) = else_branch {
            let else_block = self.ast.block();
            self.ast.push_child(statement, else_block);
            work.push(Frame {
                container: else_block,
                node: else_branch,
                enclosing_loop: frame.enclosing_loop,
                enclosing_if: open,
            });
        }
        work.push(Frame {
            container: true_block,
            node: true_branch,
            enclosing_loop: frame.enclosing_loop,
            enclosing_if: open,
        });
        Ok(())
    }

    /// Each condition is assembled on its own stack; its top value becomes
    /// an operand and anything beneath it moves to the outer stack.
    fn short_circuit(
        &mut self,
        graph: &mut ControlFlowGraph,
        frame: Frame,
        kind: ShortCircuitKind,
        conditions: &[NodeRef],
        stack: &mut ExprStack,
    ) -> Result<(), DecompileError> {
        let mut operands = Vec::with_capacity(conditions.len());
        for &condition in conditions {
            let mut inner = self.build_from_node(graph, frame.container, condition)?;
            operands.push(inner.pop_for("short-circuit condition")?);
            stack.extend(inner);
        }

        let expression = self
            .ast
            .add_with_children(AstKind::ShortCircuit(kind), operands);
        stack.push(expression);
        Ok(())
    }

    fn open_loop(
        &mut self,
        frame: Frame,
        kind: LoopKind,
        branches: &[NodeRef],
        work: &mut Vec<Frame>,
        stack: &mut ExprStack,
    ) -> Result<(), DecompileError> {
        let statement = match kind {
            LoopKind::While => self.ast.add(AstKind::WhileLoop {
                continue_used: false,
            }),
            LoopKind::For => self.ast.add(AstKind::ForLoop),
            LoopKind::DoUntil => self.ast.add(AstKind::DoUntilLoop),
            LoopKind::Repeat => {
                let count = stack.pop_for("repeat count")?;
                self.ast.add_with_children(AstKind::RepeatLoop, vec![count])
            }
            LoopKind::With => {
                let target = stack.pop_for("with target")?;
                self.ast.add_with_children(AstKind::WithLoop, vec![target])
            }
        };

        if kind == LoopKind::For {
            let init = branch(branches, "for loop", 0)?;
            let increment = branch(branches, "for loop", 2)?;
            work.push(Frame {
                enclosing_loop: Some(statement),
                ..frame.with_node(init)
            });

            // The increment runs outside the loop body's own scope.
            let increment_block = self.ast.block();
            self.ast.push_child(statement, increment_block);
            work.push(Frame {
                container: increment_block,
                ..frame.with_node(increment)
            });
        }

        let body_block = self.ast.block();
        self.ast.push_child(statement, body_block);
        self.ast.push_child(frame.container, statement);

        let body = branch(branches, "loop", 1)?;
        if kind != LoopKind::For {
            let continuation = branch(branches, "loop", 0)?;
            work.push(frame.with_node(continuation));
        }
        work.push(Frame {
            container: body_block,
            node: body,
            enclosing_loop: Some(statement),
            enclosing_if: frame.enclosing_if,
        });
        Ok(())
    }

    /// Cases are scheduled in reverse so they are assembled in order.
    fn open_switch(&mut self, frame: Frame, branches: &[NodeRef], work: &mut Vec<Frame>) {
        if let Some(&first) = branches.first() {
            work.push(frame.with_node(first));
        }

        let statement = self.ast.add(AstKind::Switch);
        self.ast.push_child(frame.container, statement);
        for &case in branches.iter().skip(1).rev() {
            work.push(Frame {
                container: statement,
                ..frame.with_node(case)
            });
        }
    }
}
