//! Symbolic execution of one block's instructions.
//!
//! Values are AST nodes instead of runtime values: pushes create
//! expression nodes, operators combine them, and stores, returns and
//! discarded values become statements appended to the current container.

use gmdc_common::{DataType, InstanceType, Instruction, Opcode, VariableType};
use log::{debug, trace, warn};

use crate::array_index::process_array_index;
use crate::ast::{AssignOp, Ast, AstKind, BinaryOp, NodeId, UnaryOp};
use crate::context::DecompileContext;
use crate::error::DecompileError;
use crate::idiom::{self, IncrementMatch};
use crate::stack::{dup_count, ExprStack};

/// Run `instructions` against `stack`, appending statements to `container`.
pub fn execute_block(
    ctx: &DecompileContext,
    instructions: &[Instruction],
    ast: &mut Ast,
    stack: &mut ExprStack,
    container: NodeId,
) -> Result<(), DecompileError> {
    BlockExecutor::new(ctx, ast, stack, container).execute(instructions)
}

/// Executes blocks against a shared expression stack.
pub struct BlockExecutor<'a> {
    ctx: &'a DecompileContext,
    ast: &'a mut Ast,
    stack: &'a mut ExprStack,
    /// Statement list that receives stores, returns and discarded values.
    container: NodeId,
}

impl<'a> BlockExecutor<'a> {
    pub fn new(
        ctx: &'a DecompileContext,
        ast: &'a mut Ast,
        stack: &'a mut ExprStack,
        container: NodeId,
    ) -> Self {
        Self {
            ctx,
            ast,
            stack,
            container,
        }
    }

    /// Execute instructions left to right. Idiom windows move the cursor
    /// past everything they consume.
    pub fn execute(&mut self, instructions: &[Instruction]) -> Result<(), DecompileError> {
        let mut pc = 0;

        while pc < instructions.len() {
            let at = pc;
            let instr = &instructions[at];
            pc += 1;
            trace!("{at:>4}: {instr}  (depth {})", self.stack.len());

            match instr.opcode {
                Opcode::Push | Opcode::PushLoc | Opcode::PushGlb | Opcode::PushBltn => {
                    if let Some(m) = idiom::match_increment(self.ctx, instructions, at) {
                        pc = self.exec_increment(instructions, at, m)?;
                        continue;
                    }
                    self.exec_push(at, instr)?
                }
                Opcode::PushI => self.exec_push_immediate(at, instr)?,
                Opcode::Pop => self.exec_pop(at, instr)?,

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
                | Opcode::Cmp => self.exec_binary(at, instr)?,

                Opcode::Neg => self.exec_unary(at, instr, UnaryOp::Neg)?,
                Opcode::Not => self.exec_unary(at, instr, UnaryOp::Not)?,
                Opcode::Call => self.exec_call(at, instr)?,
                Opcode::Ret => self.exec_ret(at)?,
                Opcode::Exit => {
                    let exit = self.ast.add(AstKind::Exit);
                    self.ast.push_child(self.container, exit);
                }
                Opcode::Popz => self.exec_popz(at),
                Opcode::Dup => self.exec_dup(at, instr)?,
                Opcode::Conv => self.exec_conv(instr),

                // Consumed by the owning If or Loop node.
                Opcode::B | Opcode::Bt | Opcode::Bf | Opcode::PushEnv | Opcode::PopEnv => {}

                Opcode::CallV => {
                    return Err(DecompileError::UnsupportedInstruction {
                        at,
                        opcode: instr.opcode,
                        reason: "call through a variable",
                    })
                }
                Opcode::Break => {
                    return Err(DecompileError::UnsupportedInstruction {
                        at,
                        opcode: instr.opcode,
                        reason: "extended opcode",
                    })
                }
            }
        }

        Ok(())
    }

    fn push_node(&mut self, kind: AstKind) -> NodeId {
        let id = self.ast.add(kind);
        self.stack.push(id);
        id
    }

    /// Build the literal node for a push of `instr.data_type_1`.
    fn literal(&self, at: usize, instr: &Instruction) -> Result<AstKind, DecompileError> {
        let malformed = || DecompileError::MalformedValue {
            at,
            expected: instr.data_type_1,
        };
        let value = &instr.value;

        let kind = match instr.data_type_1 {
            DataType::Int16 => AstKind::Int16 {
                value: value.as_i16().ok_or_else(malformed)?,
                opcode: instr.opcode,
            },
            DataType::Int32 => AstKind::Int32(value.as_i32().ok_or_else(malformed)?),
            DataType::Int64 => AstKind::Int64(value.as_i64().ok_or_else(malformed)?),
            DataType::Double => AstKind::Double(value.as_f64().ok_or_else(malformed)?),
            DataType::Float => AstKind::Float(value.as_f32().ok_or_else(malformed)?),
            DataType::Boolean => AstKind::Boolean(value.as_bool().ok_or_else(malformed)?),
            DataType::String => AstKind::String(value.as_string_index().ok_or_else(malformed)?),
            _ => {
                return Err(DecompileError::UnsupportedInstruction {
                    at,
                    opcode: instr.opcode,
                    reason: "push of this data type",
                })
            }
        };
        Ok(kind)
    }

    fn exec_push(&mut self, at: usize, instr: &Instruction) -> Result<(), DecompileError> {
        if instr.data_type_1 == DataType::Variable {
            let (variable, _) = self.variable(at, instr)?;
            self.stack.push(variable);
        } else {
            let kind = self.literal(at, instr)?;
            self.push_node(kind);
        }
        Ok(())
    }

    fn exec_push_immediate(&mut self, at: usize, instr: &Instruction) -> Result<(), DecompileError> {
        match instr.data_type_1 {
            DataType::Int16 | DataType::Int32 | DataType::Int64 => {
                let kind = self.literal(at, instr)?;
                self.push_node(kind);
                Ok(())
            }
            _ => Err(DecompileError::UnsupportedInstruction {
                at,
                opcode: instr.opcode,
                reason: "pushi of a non-integer type",
            }),
        }
    }

    /// Build a variable node for `instr`'s operand, popping its instance
    /// and index operands. Returns the variable and its instance node.
    fn variable(&mut self, at: usize, instr: &Instruction) -> Result<(NodeId, NodeId), DecompileError> {
        let var = instr
            .variable
            .ok_or(DecompileError::MissingReference { at })?;

        let mut indices = Vec::new();
        let left = if instr.instance_type == InstanceType::StackTop
            || var.variable_type == VariableType::StackTop
        {
            self.stack.pop(at)?
        } else if var.variable_type == VariableType::Array {
            let index = self.stack.pop(at)?;
            indices = process_array_index(self.ctx, self.ast, index);
            self.stack.pop(at)?
        } else {
            self.ast.add(AstKind::TypeInstance(instr.instance_type.code()))
        };

        let variable = self.ast.add_with_children(
            AstKind::Variable {
                target: var.target,
                scope: var.variable_type,
                left: Some(left),
            },
            indices,
        );
        Ok((variable, left))
    }

    fn exec_increment(
        &mut self,
        instructions: &[Instruction],
        at: usize,
        m: IncrementMatch,
    ) -> Result<usize, DecompileError> {
        let op = AssignOp::Increment {
            op: m.op,
            prefix: m.prefix,
        };

        if m.prefix {
            let target = self.stack.pop(at)?;
            let assign = self.ast.assign(op, target, None);
            self.stack.push(assign);

            let end = idiom::prefix_end(instructions, at);
            if end.permuted {
                // Keep the increment, drop the copy beneath it.
                let top = self.stack.pop(at)?;
                self.stack.pop(at)?;
                self.stack.push(top);
            }
            debug!(
                "prefix increment at {at}: {} (next {})",
                self.ast.describe(assign),
                end.next
            );
            Ok(end.next)
        } else {
            // The duplicate left by `dup.v`.
            self.stack.pop(at)?;
            let target = self.stack.pop(at)?;
            let assign = self.ast.assign(op, target, None);
            self.stack.push(assign);

            let next = idiom::postfix_end(instructions, at);
            debug!(
                "postfix increment at {at}: {} (next {next})",
                self.ast.describe(assign)
            );
            Ok(next)
        }
    }

    fn exec_pop(&mut self, at: usize, instr: &Instruction) -> Result<(), DecompileError> {
        if instr.is_stack_permutation() {
            return self.exec_permutation(at, instr);
        }

        // Int32 stores carry the value beneath the instance operands,
        // Variable stores carry it on top.
        let value_first = match instr.data_type_1 {
            DataType::Int32 => true,
            DataType::Variable => false,
            _ => {
                return Err(DecompileError::UnsupportedInstruction {
                    at,
                    opcode: instr.opcode,
                    reason: "store of this data type",
                })
            }
        };

        let mut value = None;
        if value_first {
            value = Some(self.stack.pop(at)?);
        }
        let (target, instance) = self.variable(at, instr)?;
        let value = match value {
            Some(value) => value,
            None => self.stack.pop(at)?,
        };

        let scope = instr
            .variable
            .map(|v| v.variable_type)
            .unwrap_or(VariableType::Normal);
        let statement = match idiom::compound_assignment(self.ast, instance, scope, value) {
            Some((op, rhs)) => {
                let statement = self.ast.assign(AssignOp::Compound(op), target, Some(rhs));
                debug!("compound assignment at {at}: {}", self.ast.describe(statement));
                statement
            }
            None => self.ast.assign(AssignOp::Plain, target, Some(value)),
        };
        self.ast.push_child(self.container, statement);
        Ok(())
    }

    /// `pop.e.v N`: pop two, drop `N - 4` beneath them, push the two back.
    fn exec_permutation(&mut self, at: usize, instr: &Instruction) -> Result<(), DecompileError> {
        let e1 = self.stack.pop(at)?;
        let e2 = self.stack.pop(at)?;
        for _ in 0..usize::from(instr.swap_extra).saturating_sub(4) {
            self.stack.pop(at)?;
        }
        self.stack.push(e2);
        self.stack.push(e1);
        Ok(())
    }

    fn exec_binary(&mut self, at: usize, instr: &Instruction) -> Result<(), DecompileError> {
        let unsupported = |reason| DecompileError::UnsupportedInstruction {
            at,
            opcode: instr.opcode,
            reason,
        };
        let comparison = match instr.opcode {
            Opcode::Cmp => instr
                .comparison()
                .map_err(|_| unsupported("unknown comparison kind"))?,
            _ => Default::default(),
        };
        let op = BinaryOp::from_opcode(instr.opcode, comparison)
            .ok_or_else(|| unsupported("not a binary operator"))?;

        let right = self.stack.pop(at)?;
        let left = self.stack.pop(at)?;
        let binary = self.ast.binary(op, left, right);
        self.stack.push(binary);
        Ok(())
    }

    fn exec_unary(&mut self, at: usize, instr: &Instruction, op: UnaryOp) -> Result<(), DecompileError> {
        let operand = self.stack.pop(at)?;
        let unary = self.ast.add_with_children(
            AstKind::Unary {
                op,
                data_type: instr.data_type_1,
            },
            vec![operand],
        );
        self.stack.push(unary);
        Ok(())
    }

    /// The first value popped is the first argument.
    fn exec_call(&mut self, at: usize, instr: &Instruction) -> Result<(), DecompileError> {
        let function = instr
            .function
            .ok_or(DecompileError::MissingReference { at })?;
        let args = (0..instr.argument_count)
            .map(|_| self.stack.pop(at))
            .collect::<Result<Vec<_>, _>>()?;
        let call = self.ast.add_with_children(
            AstKind::FunctionCall {
                target: function.target,
            },
            args,
        );
        self.stack.push(call);
        Ok(())
    }

    fn exec_ret(&mut self, at: usize) -> Result<(), DecompileError> {
        let value = self.stack.pop(at)?;
        let ret = self.ast.add_with_children(AstKind::Return, vec![value]);
        self.ast.push_child(self.container, ret);
        Ok(())
    }

    /// Discard the top value as an expression statement.
    fn exec_popz(&mut self, at: usize) {
        match self.stack.try_pop() {
            Some(value) => self.ast.push_child(self.container, value),
            // Switch lowering emits this with nothing on the stack.
            None => warn!("popz on empty expression stack at {at}; ignored"),
        }
    }

    fn exec_dup(&mut self, at: usize, instr: &Instruction) -> Result<(), DecompileError> {
        if instr.comparison_kind != 0 {
            return Err(DecompileError::UnsupportedInstruction {
                at,
                opcode: instr.opcode,
                reason: "per-instance stack move",
            });
        }

        let count = dup_count(instr);
        let depth = self.stack.len();
        if depth < count {
            return Err(DecompileError::StackUnderflow { at });
        }

        let copied = self.stack.as_slice()[depth - count..].to_vec();
        for &id in &copied {
            self.ast[id].duplicated = true;
        }
        self.stack.extend(copied);
        Ok(())
    }

    /// Int32 to Boolean over a literal 0 or 1 becomes `false` / `true`.
    fn exec_conv(&mut self, instr: &Instruction) {
        if instr.data_type_1 != DataType::Int32 || instr.data_type_2 != DataType::Boolean {
            return;
        }
        let literal = match self.stack.peek() {
            Some(top) => idiom::boolean_literal(self.ast, top),
            None => None,
        };
        if let Some(value) = literal {
            let boolean = self.ast.add(AstKind::Boolean(value));
            self.stack.replace_top(boolean);
        }
    }
}
