//! Statement translation.

use super::Generator;
use crate::ast::Statement;
use crate::diagnostic::Diagnostic;
use crate::ir::{Instr, Segment};

impl Generator<'_> {
    pub(crate) fn emit_statements(&mut self, statements: &[Statement]) -> Result<(), Diagnostic> {
        for stmt in statements {
            self.emit_statement(stmt)?;
        }
        Ok(())
    }

    fn emit_statement(&mut self, stmt: &Statement) -> Result<(), Diagnostic> {
        match stmt {
            Statement::Let { name, index, value } => {
                match index {
                    Some(index) => {
                        // Effective address = base + index.
                        let base = self.resolve(name)?;
                        let (seg, idx) = (base.kind.segment(), base.index);
                        self.emit(Instr::Push(seg, idx));
                        self.emit_expression(index)?;
                        self.emit(Instr::Add);

                        self.emit_expression(value)?;

                        // pointer 1 must be set only after the RHS is on the
                        // stack; park the value in temp 0 across the switch.
                        self.emit(Instr::Pop(Segment::Temp, 0));
                        self.emit(Instr::Pop(Segment::Pointer, 1));
                        self.emit(Instr::Push(Segment::Temp, 0));
                        self.emit(Instr::Pop(Segment::That, 0));
                    }
                    None => {
                        self.emit_expression(value)?;
                        let target = self.resolve(name)?;
                        let (seg, idx) = (target.kind.segment(), target.index);
                        self.emit(Instr::Pop(seg, idx));
                    }
                }
                Ok(())
            }

            Statement::If {
                cond,
                then_body,
                else_body,
            } => {
                let id = self.next_label_id();
                let end = self.make_label("ifStatement", id, "END");

                self.emit_expression(cond)?;
                self.emit(Instr::Not);

                match else_body {
                    Some(else_body) => {
                        let else_label =
                            self.make_label("ifStatement", id, "EXECUTE_SECOND_STATEMENT");
                        self.emit(Instr::IfGoto(else_label.clone()));
                        self.emit_statements(then_body)?;
                        self.emit(Instr::Goto(end.clone()));
                        self.emit(Instr::Label(else_label));
                        self.emit_statements(else_body)?;
                        self.emit(Instr::Label(end));
                    }
                    None => {
                        self.emit(Instr::IfGoto(end.clone()));
                        self.emit_statements(then_body)?;
                        self.emit(Instr::Label(end));
                    }
                }
                Ok(())
            }

            Statement::While { cond, body } => {
                let id = self.next_label_id();
                let start = self.make_label("whileStatement", id, "START");
                let end = self.make_label("whileStatement", id, "END");

                self.emit(Instr::Label(start.clone()));
                self.emit_expression(cond)?;
                self.emit(Instr::Not);
                self.emit(Instr::IfGoto(end.clone()));
                self.emit_statements(body)?;
                self.emit(Instr::Goto(start));
                self.emit(Instr::Label(end));
                Ok(())
            }

            Statement::Do { call } => {
                let return_type = self.emit_call(call)?;
                // A void callee still pushes a result word; discard it. A
                // non-void result is silently left on the stack.
                if return_type.is_void() {
                    self.emit(Instr::Pop(Segment::Temp, 0));
                }
                Ok(())
            }

            Statement::Return { value, span } => {
                if self.sub_return.is_void() {
                    self.emit(Instr::Push(Segment::Constant, 0));
                } else {
                    match value {
                        Some(expr) => self.emit_expression(expr)?,
                        None => {
                            return Err(Diagnostic::error(
                                format!(
                                    "subroutine '{}' returns {} but this return has no value",
                                    self.sub_name,
                                    self.sub_return.name()
                                ),
                                *span,
                            )
                            .with_help("write 'return <expression>;'".to_string()));
                        }
                    }
                }
                self.emit(Instr::Return);
                Ok(())
            }
        }
    }
}
