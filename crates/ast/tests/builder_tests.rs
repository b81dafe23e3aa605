//! Integration tests for structural AST assembly.
//!
//! Each test hand-builds the structured graph a function would produce and
//! checks the resulting tree through its s-expression rendering.

use gmdc_ast::{build_ast, Ast, AstBuilder, AstKind, DecompileContext, DecompileError, NodeId};
use gmdc_common::{
    Block, ControlFlow, ControlFlowGraph, DataType, FormatVersion, InstanceType, Instruction,
    LoopKind, Node, NodeRef, Opcode, ShortCircuitKind, Value, VariableRef, VariableType,
};

// ============================================================
// Helper functions
// ============================================================

fn ctx() -> DecompileContext {
    DecompileContext::new(FormatVersion::new(2, 3, 0, 0))
}

fn instr(op: Opcode, t1: DataType, t2: DataType) -> Instruction {
    Instruction::new(op, t1, t2)
}

fn push_i32(v: i32) -> Instruction {
    instr(Opcode::Push, DataType::Int32, DataType::Double).with_value(Value::Int32(v))
}

fn push_v(target: u32) -> Instruction {
    instr(Opcode::Push, DataType::Variable, DataType::Double).with_variable(
        VariableRef::new(target, VariableType::Normal),
        InstanceType::SelfInstance,
    )
}

fn pop_v(target: u32) -> Instruction {
    instr(Opcode::Pop, DataType::Variable, DataType::Variable).with_variable(
        VariableRef::new(target, VariableType::Normal),
        InstanceType::SelfInstance,
    )
}

/// `var<target> = <v>`
fn store(target: u32, v: i32) -> Vec<Instruction> {
    vec![push_i32(v), pop_v(target)]
}

/// `var<target> < <limit>`
fn less_than(target: u32, limit: i32) -> Vec<Instruction> {
    vec![
        push_v(target),
        push_i32(limit),
        instr(Opcode::Cmp, DataType::Int32, DataType::Int32).with_comparison(1),
        instr(Opcode::Bf, DataType::Int32, DataType::Double),
    ]
}

fn exit() -> Instruction {
    instr(Opcode::Exit, DataType::Int32, DataType::Double)
}

fn block(g: &mut ControlFlowGraph, code: Vec<Instruction>, flow: ControlFlow) -> NodeRef {
    g.add(Node::block(code, flow))
}

fn link(g: &mut ControlFlowGraph, from: NodeRef, branches: Vec<NodeRef>) {
    g[from].branches = branches;
}

fn build(g: &mut ControlFlowGraph, entry: NodeRef) -> Ast {
    g.set_entry(entry);
    build_ast(&ctx(), g).unwrap()
}

fn statements(ast: &Ast) -> &[NodeId] {
    ast.children(ast.root())
}

// ============================================================
// Conditionals
// ============================================================

#[test]
fn if_without_else() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, store(2, 2), ControlFlow::None);
    let then = block(&mut g, store(1, 1), ControlFlow::None);
    let header = Block::new(
        vec![push_v(0), instr(Opcode::Bf, DataType::Int32, DataType::Double)],
        ControlFlow::IfCondition,
    );
    let entry = g.add(Node::if_statement(header).with_branches(vec![after, then]));

    let ast = build(&mut g, entry);
    let stmts = statements(&ast);
    assert_eq!(stmts.len(), 2);
    assert_eq!(ast.children(stmts[0]).len(), 2);
    assert_eq!(
        ast.describe(ast.root()),
        "(block (if inst-1.var0 (block (= inst-1.var1 1))) (= inst-1.var2 2))"
    );
}

#[test]
fn if_with_else() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, store(2, 2), ControlFlow::None);
    let then = block(&mut g, store(1, 1), ControlFlow::None);
    let otherwise = block(&mut g, store(1, 3), ControlFlow::None);
    let header = Block::new(vec![push_v(0)], ControlFlow::IfCondition);
    let entry = g.add(Node::if_statement(header).with_branches(vec![after, then, otherwise]));

    let ast = build(&mut g, entry);
    let stmt = statements(&ast)[0];
    assert!(matches!(ast[stmt].kind, AstKind::If { stack_count: 0 }));
    assert_eq!(ast.children(stmt).len(), 3);
    assert_eq!(
        ast.describe(ast.root()),
        "(block (if inst-1.var0 (block (= inst-1.var1 1)) (block (= inst-1.var1 3))) (= inst-1.var2 2))"
    );
}

#[test]
fn value_producing_branches_fold_into_ternary() {
    // var0 = var1 ? 1 : 2
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, vec![pop_v(0)], ControlFlow::None);
    let then = block(&mut g, vec![push_i32(1)], ControlFlow::None);
    let otherwise = block(&mut g, vec![push_i32(2)], ControlFlow::None);
    let header = Block::new(vec![push_v(1)], ControlFlow::IfCondition);
    let entry = g.add(Node::if_statement(header).with_branches(vec![after, then, otherwise]));

    let ast = build(&mut g, entry);
    assert_eq!(statements(&ast).len(), 1);
    assert_eq!(
        ast.describe(ast.root()),
        "(block (= inst-1.var0 (if inst-1.var1 (block) (block) 1 2)))"
    );
}

#[test]
fn if_without_condition_value() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, vec![], ControlFlow::None);
    let then = block(&mut g, vec![], ControlFlow::None);
    let entry = g.add(
        Node::if_statement(Block::new(vec![], ControlFlow::IfCondition))
            .with_branches(vec![after, then]),
    );
    g.set_entry(entry);

    let result = build_ast(&ctx(), &mut g);
    assert_eq!(
        result,
        Err(DecompileError::MissingExpression {
            construct: "if condition"
        })
    );
}

// ============================================================
// Loops
// ============================================================

#[test]
fn while_loop_with_continue() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, vec![exit()], ControlFlow::None);
    let condition = block(&mut g, less_than(0, 10), ControlFlow::LoopCondition);
    let body = block(&mut g, store(1, 1), ControlFlow::Continue);
    let live = block(&mut g, store(9, 99), ControlFlow::None);
    let dead = g.add(Node::block(store(7, 7), ControlFlow::None).marked_unreachable());
    link(&mut g, condition, vec![body]);
    link(&mut g, body, vec![live, dead]);
    let entry = g.add(Node::loop_of(LoopKind::While).with_branches(vec![after, condition]));

    let ast = build(&mut g, entry);
    assert_eq!(g[body].branches, vec![dead]);

    let stmt = statements(&ast)[0];
    assert_eq!(
        ast[stmt].kind,
        AstKind::WhileLoop {
            continue_used: true
        }
    );
    assert_eq!(
        ast.describe(ast.root()),
        "(block (while (block (= inst-1.var1 1) (continue) (= inst-1.var9 99)) (< inst-1.var0 10)) (exit))"
    );
}

#[test]
fn break_keeps_scheduled_continuation() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, vec![], ControlFlow::None);
    let body = block(&mut g, vec![], ControlFlow::Break);
    let live = block(&mut g, store(9, 99), ControlFlow::None);
    link(&mut g, body, vec![live]);
    let entry = g.add(Node::loop_of(LoopKind::While).with_branches(vec![after, body]));

    let ast = build(&mut g, entry);
    assert!(g[body].branches.is_empty());
    assert_eq!(
        ast.describe(ast.root()),
        "(block (while (block (break) (= inst-1.var9 99))))"
    );
}

#[test]
fn pruned_break_successor_is_not_revisited() {
    // Both arms of the If share one break block.
    let mut g = ControlFlowGraph::new();
    let end = block(&mut g, vec![], ControlFlow::None);
    let after = block(&mut g, vec![], ControlFlow::None);
    let brk = block(&mut g, vec![], ControlFlow::Break);
    let live = block(&mut g, store(9, 99), ControlFlow::None);
    link(&mut g, brk, vec![live]);
    let header = Block::new(vec![push_v(0)], ControlFlow::IfCondition);
    let cond_if = g.add(Node::if_statement(header).with_branches(vec![after, brk, brk]));
    let entry = g.add(Node::loop_of(LoopKind::While).with_branches(vec![end, cond_if]));

    let ast = build(&mut g, entry);
    assert!(g[brk].branches.is_empty());
    assert_eq!(
        ast.describe(ast.root()),
        "(block (while (block (if inst-1.var0 (block (break) (= inst-1.var9 99)) (block (break))))))"
    );
}

#[test]
fn for_loop_children_are_increment_body_condition() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, vec![exit()], ControlFlow::None);
    let condition = block(&mut g, less_than(0, 10), ControlFlow::LoopCondition);
    let body = block(&mut g, store(1, 1), ControlFlow::None);
    let increment = block(
        &mut g,
        vec![
            push_v(0),
            push_i32(1),
            instr(Opcode::Add, DataType::Int32, DataType::Variable),
            pop_v(0),
        ],
        ControlFlow::None,
    );
    link(&mut g, condition, vec![body]);
    let entry = g.add(
        Node::loop_of(LoopKind::For).with_branches(vec![after, condition, increment]),
    );

    let ast = build(&mut g, entry);
    let stmts = statements(&ast);
    assert_eq!(stmts.len(), 2);
    assert_eq!(ast[stmts[0]].kind, AstKind::ForLoop);

    let parts = ast.children(stmts[0]);
    assert_eq!(parts.len(), 3);
    assert_eq!(
        ast.describe(parts[0]),
        "(block (= inst-1.var0 (+ inst-1.var0 1)))"
    );
    assert_eq!(ast.describe(parts[1]), "(block (= inst-1.var1 1))");
    assert_eq!(ast.describe(parts[2]), "(< inst-1.var0 10)");
    assert_eq!(ast[stmts[1]].kind, AstKind::Exit);
}

#[test]
fn for_loop_needs_increment_branch() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, vec![], ControlFlow::None);
    let body = block(&mut g, vec![], ControlFlow::None);
    let entry = g.add(Node::loop_of(LoopKind::For).with_branches(vec![after, body]));
    g.set_entry(entry);

    assert_eq!(
        build_ast(&ctx(), &mut g),
        Err(DecompileError::MissingBranch {
            kind: "for loop",
            index: 2
        })
    );
}

#[test]
fn do_until_condition_follows_body() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, vec![], ControlFlow::None);
    let body = block(&mut g, store(1, 1), ControlFlow::None);
    let condition = block(&mut g, vec![push_v(0)], ControlFlow::LoopCondition);
    link(&mut g, body, vec![condition]);
    let entry = g.add(Node::loop_of(LoopKind::DoUntil).with_branches(vec![after, body]));

    let ast = build(&mut g, entry);
    assert_eq!(
        ast.describe(ast.root()),
        "(block (do-until (block (= inst-1.var1 1)) inst-1.var0))"
    );
}

#[test]
fn repeat_takes_count_from_stack() {
    let mut g = ControlFlowGraph::new();
    let seed = block(&mut g, vec![push_i32(3)], ControlFlow::RepeatExpression);
    let after = block(&mut g, vec![exit()], ControlFlow::None);
    let body = block(&mut g, store(1, 1), ControlFlow::None);
    let repeat = g.add(Node::loop_of(LoopKind::Repeat).with_branches(vec![after, body]));
    link(&mut g, seed, vec![repeat]);

    let ast = build(&mut g, seed);
    assert_eq!(
        ast.describe(ast.root()),
        "(block (repeat 3 (block (= inst-1.var1 1))) (exit))"
    );
}

#[test]
fn with_takes_target_from_stack() {
    let mut g = ControlFlowGraph::new();
    let seed = block(&mut g, vec![push_i32(100)], ControlFlow::WithExpression);
    let after = block(&mut g, vec![], ControlFlow::None);
    let body = block(&mut g, store(1, 1), ControlFlow::None);
    let with = g.add(Node::loop_of(LoopKind::With).with_branches(vec![after, body]));
    link(&mut g, seed, vec![with]);

    let ast = build(&mut g, seed);
    assert_eq!(
        ast.describe(ast.root()),
        "(block (with 100 (block (= inst-1.var1 1))))"
    );
}

#[test]
fn with_without_target() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, vec![], ControlFlow::None);
    let body = block(&mut g, vec![], ControlFlow::None);
    let entry = g.add(Node::loop_of(LoopKind::With).with_branches(vec![after, body]));
    g.set_entry(entry);

    assert_eq!(
        build_ast(&ctx(), &mut g),
        Err(DecompileError::MissingExpression {
            construct: "with target"
        })
    );
}

#[test]
fn continue_outside_loop() {
    let mut g = ControlFlowGraph::new();
    let entry = block(&mut g, vec![], ControlFlow::Continue);
    g.set_entry(entry);
    assert_eq!(
        build_ast(&ctx(), &mut g),
        Err(DecompileError::MissingEnclosingLoop)
    );
}

#[test]
fn deep_nesting_does_not_recurse() {
    const DEPTH: usize = 10_000;

    let mut g = ControlFlowGraph::new();
    let end = block(&mut g, vec![], ControlFlow::None);
    let mut inner = block(&mut g, store(0, 1), ControlFlow::None);
    for _ in 0..DEPTH {
        inner = g.add(Node::loop_of(LoopKind::While).with_branches(vec![end, inner]));
    }

    let ast = build(&mut g, inner);

    // Walk down the nest without recursion.
    let mut depth = 0;
    let mut current = statements(&ast)[0];
    while let AstKind::WhileLoop { .. } = ast[current].kind {
        depth += 1;
        let body = ast.children(current)[0];
        current = ast.children(body)[0];
    }
    assert_eq!(depth, DEPTH);
    assert!(matches!(ast[current].kind, AstKind::Assign(_)));
}

// ============================================================
// Switch
// ============================================================

#[test]
fn switch_with_case_and_default() {
    let mut g = ControlFlowGraph::new();
    // Switch lowering leaves a popz with nothing to discard.
    let after = block(
        &mut g,
        vec![instr(Opcode::Popz, DataType::Variable, DataType::Double)],
        ControlFlow::None,
    );
    let expression = block(&mut g, vec![push_v(0)], ControlFlow::SwitchExpression);
    let case = block(&mut g, vec![push_i32(1)], ControlFlow::SwitchCase);
    let case_body = block(&mut g, store(1, 5), ControlFlow::None);
    let case_break = block(&mut g, vec![], ControlFlow::Break);
    let default = block(&mut g, vec![], ControlFlow::SwitchDefault);
    let default_body = block(&mut g, vec![exit()], ControlFlow::None);
    link(&mut g, case, vec![case_body]);
    link(&mut g, case_body, vec![case_break]);
    link(&mut g, default, vec![default_body]);
    let entry = g.add(Node::switch().with_branches(vec![after, expression, case, default]));

    let ast = build(&mut g, entry);
    assert_eq!(statements(&ast).len(), 1);
    assert_eq!(
        ast.describe(ast.root()),
        "(block (switch inst-1.var0 (case 1) (= inst-1.var1 5) (break) (default) (exit)))"
    );
}

#[test]
fn switch_case_without_value() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, vec![], ControlFlow::None);
    let case = block(&mut g, vec![], ControlFlow::SwitchCase);
    let entry = g.add(Node::switch().with_branches(vec![after, case]));
    g.set_entry(entry);

    assert_eq!(
        build_ast(&ctx(), &mut g),
        Err(DecompileError::MissingExpression {
            construct: "switch case"
        })
    );
}

// ============================================================
// Short-circuit evaluation
// ============================================================

#[test]
fn short_circuit_feeds_if_condition() {
    let mut g = ControlFlowGraph::new();
    let first = block(&mut g, vec![push_v(0)], ControlFlow::None);
    let second = block(&mut g, vec![push_v(1)], ControlFlow::None);
    let after = block(&mut g, vec![], ControlFlow::None);
    let then = block(&mut g, store(2, 1), ControlFlow::None);
    let header = Block::new(
        vec![instr(Opcode::Bf, DataType::Int32, DataType::Double)],
        ControlFlow::IfCondition,
    );
    let cond_if = g.add(Node::if_statement(header).with_branches(vec![after, then]));
    let entry = g.add(
        Node::short_circuit(ShortCircuitKind::And, vec![first, second]).with_branches(vec![cond_if]),
    );

    let ast = build(&mut g, entry);
    let stmt = statements(&ast)[0];
    let condition = ast.children(stmt)[0];
    assert_eq!(ast[condition].kind, AstKind::ShortCircuit(ShortCircuitKind::And));
    assert_eq!(
        ast.describe(ast.root()),
        "(block (if (short-circuit inst-1.var0 inst-1.var1) (block (= inst-1.var2 1))))"
    );
}

#[test]
fn short_circuit_moves_leftovers_to_outer_stack() {
    let mut g = ControlFlowGraph::new();
    let first = block(&mut g, vec![push_i32(7), push_v(0)], ControlFlow::None);
    let second = block(&mut g, vec![push_v(1)], ControlFlow::None);
    let entry = g.add(Node::short_circuit(ShortCircuitKind::Or, vec![first, second]));

    let ctx = ctx();
    let mut builder = AstBuilder::new(&ctx);
    let root = builder.ast().root();
    let leftover = builder.build_from_node(&mut g, root, entry).unwrap();

    let ast = builder.ast();
    let rendered: Vec<String> = leftover
        .as_slice()
        .iter()
        .map(|&id| ast.describe(id))
        .collect();
    assert_eq!(
        rendered,
        vec!["7", "(short-circuit inst-1.var0 inst-1.var1)"]
    );
}

#[test]
fn short_circuit_condition_without_value() {
    let mut g = ControlFlowGraph::new();
    let empty = block(&mut g, vec![], ControlFlow::None);
    let entry = g.add(Node::short_circuit(ShortCircuitKind::And, vec![empty]));
    g.set_entry(entry);

    assert_eq!(
        build_ast(&ctx(), &mut g),
        Err(DecompileError::MissingExpression {
            construct: "short-circuit condition"
        })
    );
}

// ============================================================
// Errors from block execution
// ============================================================

#[test]
fn unsupported_instruction_in_nested_block() {
    let mut g = ControlFlowGraph::new();
    let after = block(&mut g, vec![], ControlFlow::None);
    let then = block(
        &mut g,
        vec![instr(Opcode::CallV, DataType::Variable, DataType::Double)],
        ControlFlow::None,
    );
    let header = Block::new(vec![push_v(0)], ControlFlow::IfCondition);
    let entry = g.add(Node::if_statement(header).with_branches(vec![after, then]));
    g.set_entry(entry);

    assert!(matches!(
        build_ast(&ctx(), &mut g),
        Err(DecompileError::UnsupportedInstruction {
            at: 0,
            opcode: Opcode::CallV,
            ..
        })
    ));
}

#[test]
fn empty_graph() {
    let mut g = ControlFlowGraph::new();
    assert_eq!(
        build_ast(&ctx(), &mut g),
        Err(DecompileError::UnknownNode { node: 0 })
    );
}
