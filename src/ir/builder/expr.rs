//! Expression, term, and call translation.

use super::Generator;
use crate::ast::{BinOp, Expression, ReturnType, SubroutineCall, Term, UnaryOp};
use crate::diagnostic::Diagnostic;
use crate::ir::{Instr, Segment};

impl Generator<'_> {
    /// Emit an alternating term/operator list strictly left to right:
    /// `T0 T1 op0 T2 op1 ...`. There is no precedence; only parentheses
    /// regroup, and they were already folded into the tree by the parser.
    pub(crate) fn emit_expression(&mut self, expr: &Expression) -> Result<(), Diagnostic> {
        self.emit_term(&expr.first)?;
        for (op, term) in &expr.rest {
            self.emit_term(term)?;
            self.emit_op(*op);
        }
        Ok(())
    }

    fn emit_op(&mut self, op: BinOp) {
        let instr = match op {
            BinOp::Add => Instr::Add,
            BinOp::Sub => Instr::Sub,
            BinOp::And => Instr::And,
            BinOp::Or => Instr::Or,
            BinOp::Gt => Instr::Gt,
            BinOp::Lt => Instr::Lt,
            BinOp::Eq => Instr::Eq,
            // The target has no multiply/divide; they are library calls.
            BinOp::Mul => Instr::Call("Math.multiply".to_string(), 2),
            BinOp::Div => Instr::Call("Math.divide".to_string(), 2),
        };
        self.emit(instr);
    }

    pub(crate) fn emit_term(&mut self, term: &Term) -> Result<(), Diagnostic> {
        match term {
            Term::IntConst(n) => self.emit(Instr::Push(Segment::Constant, *n)),

            // true is all ones (two's-complement -1); false and null are 0.
            Term::True => {
                self.emit(Instr::Push(Segment::Constant, 1));
                self.emit(Instr::Neg);
            }
            Term::False | Term::Null => self.emit(Instr::Push(Segment::Constant, 0)),

            Term::This => self.emit(Instr::Push(Segment::Pointer, 0)),

            Term::StrConst(text) => self.emit_string(text),

            Term::Var(name) => {
                let var = self.resolve(name)?;
                let (seg, idx) = (var.kind.segment(), var.index);
                self.emit(Instr::Push(seg, idx));
            }

            Term::Index { name, index } => {
                let base = self.resolve(name)?;
                let (seg, idx) = (base.kind.segment(), base.index);
                self.emit(Instr::Push(seg, idx));
                self.emit_expression(index)?;
                self.emit(Instr::Add);
                self.emit(Instr::Pop(Segment::Pointer, 1));
                self.emit(Instr::Push(Segment::That, 0));
            }

            Term::Call(call) => {
                self.emit_call(call)?;
            }

            Term::Paren(expr) => self.emit_expression(expr)?,

            Term::Unary { op, term } => {
                self.emit_term(term)?;
                self.emit(match op {
                    UnaryOp::Neg => Instr::Neg,
                    UnaryOp::Not => Instr::Not,
                });
            }
        }
        Ok(())
    }

    /// Build a fresh string object and append each character.
    fn emit_string(&mut self, text: &str) {
        let chars: Vec<u16> = text.chars().map(|c| c as u16).collect();
        self.emit(Instr::Push(Segment::Constant, chars.len() as u16));
        self.emit(Instr::Call("String.new".to_string(), 1));
        for ch in chars {
            self.emit(Instr::Push(Segment::Constant, ch));
            self.emit(Instr::Call("String.appendChar".to_string(), 2));
        }
    }

    /// Emit a subroutine call and report the callee's declared return type
    /// so `do` statements can decide whether to discard the result.
    ///
    /// Four shapes:
    /// 1. `name(args)` — method on the current object.
    /// 2. `ThisClass.name(args)` — function/constructor in this class.
    /// 3. `var.name(args)` — method on the object held by `var`.
    /// 4. `OtherClass.name(args)` — function/constructor elsewhere.
    pub(crate) fn emit_call(&mut self, call: &SubroutineCall) -> Result<ReturnType, Diagnostic> {
        match &call.receiver {
            None => {
                // Method on `this`: the receiver is the current object.
                self.emit(Instr::Push(Segment::Pointer, 0));
                for arg in &call.args {
                    self.emit_expression(arg)?;
                }
                let class = self.class_name().to_string();
                let return_type = self.lookup_return_type(&class, &call.name)?;
                self.emit(Instr::Call(
                    format!("{}.{}", class, call.name.node),
                    call.args.len() as u16 + 1,
                ));
                Ok(return_type)
            }

            Some(receiver) if receiver.node == self.class_name() => {
                for arg in &call.args {
                    self.emit_expression(arg)?;
                }
                let return_type = self.lookup_return_type(&receiver.node, &call.name)?;
                self.emit(Instr::Call(
                    format!("{}.{}", receiver.node, call.name.node),
                    call.args.len() as u16,
                ));
                Ok(return_type)
            }

            Some(receiver) => {
                // A variable in scope wins over a class of the same name.
                if let Some(var) = self.resolve_var(&receiver.node) {
                    let class = var.ty.clone();
                    let (seg, idx) = (var.kind.segment(), var.index);
                    self.emit(Instr::Push(seg, idx));
                    for arg in &call.args {
                        self.emit_expression(arg)?;
                    }
                    let return_type = self.lookup_return_type(&class, &call.name)?;
                    self.emit(Instr::Call(
                        format!("{}.{}", class, call.name.node),
                        call.args.len() as u16 + 1,
                    ));
                    Ok(return_type)
                } else {
                    for arg in &call.args {
                        self.emit_expression(arg)?;
                    }
                    let return_type = self.lookup_return_type(&receiver.node, &call.name)?;
                    self.emit(Instr::Call(
                        format!("{}.{}", receiver.node, call.name.node),
                        call.args.len() as u16,
                    ));
                    Ok(return_type)
                }
            }
        }
    }
}
