//! Stack-IR lowering — produces target assembly from `Vec<Instr>`.
//!
//! The target keeps the stack machine in a flat 16-bit address space:
//! `SP=0`, `LCL=1`, `ARG=2`, `THIS=3`, `THAT=4`, scratch at `R13`/`R14`,
//! the `temp` segment at addresses 5–12, and `static i` of unit `F` as the
//! assembler symbol `F.i`. Every IR instruction is preceded by its text as
//! an assembly comment; the assembler strips those.

use crate::diagnostic::Diagnostic;
use crate::ir::{self, Instr, Segment};

/// Initialise SP to 256. Execution then falls through into the first
/// translated unit, which is the `Sys` unit when one exists.
pub const BOOTSTRAP: [&str; 4] = ["@256", "D=A", "@SP", "M=D"];

/// The assembly for one translated unit.
#[derive(Debug)]
pub struct TranslatedUnit {
    pub name: String,
    pub lines: Vec<String>,
}

/// Translate one unit's IR to assembly.
pub fn translate_unit(name: &str, instrs: &[Instr]) -> TranslatedUnit {
    let mut tr = UnitTranslator::new(name);
    for instr in instrs {
        tr.lower(instr);
    }
    TranslatedUnit {
        name: name.to_string(),
        lines: tr.out,
    }
}

/// Translate IR text (a `.vm` artifact read back from disk).
pub fn translate_text(name: &str, text: &str) -> Result<TranslatedUnit, Diagnostic> {
    let instrs = ir::parse_text(text)?;
    Ok(translate_unit(name, &instrs))
}

/// Stitch translated units into one program: optional bootstrap first,
/// then the `Sys` unit, then the rest in the given order.
pub fn combine(units: Vec<TranslatedUnit>, add_bootstrap: bool) -> Vec<String> {
    let mut out = Vec::new();
    if add_bootstrap {
        out.push("// bootstrap".to_string());
        out.extend(BOOTSTRAP.iter().map(|s| s.to_string()));
    }
    let (sys, rest): (Vec<TranslatedUnit>, Vec<TranslatedUnit>) =
        units.into_iter().partition(|u| u.name == "Sys");
    for unit in sys.into_iter().chain(rest) {
        out.extend(unit.lines);
    }
    out
}

struct UnitTranslator {
    unit: String,
    /// Name of the function currently being translated; scopes IR labels
    /// and seeds comparison label prefixes.
    function: String,
    /// Lines emitted so far (labels included, comments not) — makes every
    /// comparison and call label unique within the unit.
    emitted: usize,
    out: Vec<String>,
}

impl UnitTranslator {
    fn new(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            function: String::new(),
            emitted: 0,
            out: Vec::new(),
        }
    }

    fn lower(&mut self, instr: &Instr) {
        self.out.push(format!("// {}", instr));
        match instr {
            Instr::Push(seg, i) => self.push(*seg, *i),
            Instr::Pop(seg, i) => self.pop(*seg, *i),

            Instr::Add => self.binary("D=M+D"),
            Instr::Sub => self.binary("D=M-D"),
            Instr::And => self.binary("D=M&D"),
            Instr::Or => self.binary("D=M|D"),
            Instr::Eq => self.compare("JEQ"),
            Instr::Gt => self.compare("JGT"),
            Instr::Lt => self.compare("JLT"),
            Instr::Neg => self.unary("M=-D"),
            Instr::Not => self.unary("M=!D"),

            Instr::Label(l) => {
                let scoped = self.scoped_label(l);
                self.emit(format!("({})", scoped));
            }
            Instr::Goto(l) => {
                let scoped = self.scoped_label(l);
                self.emit(format!("@{}", scoped));
                self.emit("0;JMP");
            }
            Instr::IfGoto(l) => {
                let scoped = self.scoped_label(l);
                self.pop_into_d();
                self.emit(format!("@{}", scoped));
                self.emit("D;JNE");
            }

            Instr::Function(name, locals) => {
                self.function = name.clone();
                self.emit(format!("({})", name));
                for _ in 0..*locals {
                    self.push(Segment::Constant, 0);
                }
            }
            Instr::Call(name, args) => self.call(name, *args),
            Instr::Return => self.ret(),
        }
    }

    // ── Memory access ─────────────────────────────────────────────

    fn push(&mut self, seg: Segment, index: u16) {
        self.address_into_r13(seg, index);
        // R13 holds a value for constant, an address otherwise.
        self.emit("@R13");
        if seg == Segment::Constant {
            self.emit("D=M");
        } else {
            self.emit("A=M");
            self.emit("D=M");
        }
        self.emit("@SP");
        self.emit("A=M");
        self.emit("M=D");
        self.sp_inc();
    }

    fn pop(&mut self, seg: Segment, index: u16) {
        self.address_into_r13(seg, index);
        self.pop_into_d();
        self.emit("@R13");
        self.emit("A=M");
        self.emit("M=D");
    }

    /// Load the effective address (or, for `constant`, the value itself)
    /// into R13.
    fn address_into_r13(&mut self, seg: Segment, index: u16) {
        match seg {
            Segment::Constant => {
                self.emit(format!("@{}", index));
                self.emit("D=A");
            }
            Segment::Temp => {
                self.emit(format!("@{}", 5 + index));
                self.emit("D=A");
            }
            Segment::Pointer => {
                self.emit(if index == 0 { "@THIS" } else { "@THAT" });
                self.emit("D=A");
            }
            Segment::Static => {
                self.emit(format!("@{}.{}", self.unit, index));
                self.emit("D=A");
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                let base = match seg {
                    Segment::Local => "@LCL",
                    Segment::Argument => "@ARG",
                    Segment::This => "@THIS",
                    _ => "@THAT",
                };
                self.emit(base);
                self.emit("D=M");
                self.emit(format!("@{}", index));
                self.emit("D=D+A");
            }
        }
        self.emit("@R13");
        self.emit("M=D");
    }

    // ── Arithmetic ────────────────────────────────────────────────

    fn binary(&mut self, op_line: &str) {
        self.pop_into_d();
        self.sp_dec();
        self.emit("@SP");
        self.emit("A=M");
        self.emit(op_line); // D = *SP <op> D
        self.emit("@SP");
        self.emit("A=M");
        self.emit("M=D");
        self.sp_inc();
    }

    fn unary(&mut self, store_line: &str) {
        self.pop_into_d();
        self.emit("@SP");
        self.emit("A=M");
        self.emit(store_line);
        self.sp_inc();
    }

    /// Subtract and branch: write -1 for true, 0 for false.
    fn compare(&mut self, jump: &str) {
        let context = self.function.clone();
        let true_label = self.fresh_label(&context, "TRUE");
        let end_label = self.fresh_label(&context, "END");

        self.pop_into_d();
        self.sp_dec();
        self.emit("@SP");
        self.emit("A=M");
        self.emit("D=M-D");
        self.emit(format!("@{}", true_label));
        self.emit(format!("D;{}", jump));
        self.emit("@SP");
        self.emit("A=M");
        self.emit("M=0");
        self.emit(format!("@{}", end_label));
        self.emit("0;JMP");
        self.emit(format!("({})", true_label));
        self.emit("@SP");
        self.emit("A=M");
        self.emit("M=-1");
        self.emit(format!("({})", end_label));
        self.sp_inc();
    }

    // ── Calling convention ────────────────────────────────────────

    fn call(&mut self, name: &str, args: u16) {
        let return_label = self.fresh_label(name, "RETURN");

        // Push the return address.
        self.emit(format!("@{}", return_label));
        self.emit("D=A");
        self.emit("@SP");
        self.emit("A=M");
        self.emit("M=D");
        self.sp_inc();

        // Save the caller's frame pointers.
        for reg in ["@LCL", "@ARG", "@THIS", "@THAT"] {
            self.emit(reg);
            self.emit("D=M");
            self.emit("@SP");
            self.emit("A=M");
            self.emit("M=D");
            self.sp_inc();
        }

        // ARG = SP - 5 - args
        self.emit("@SP");
        self.emit("D=M");
        self.emit("@5");
        self.emit("D=D-A");
        self.emit(format!("@{}", args));
        self.emit("D=D-A");
        self.emit("@ARG");
        self.emit("M=D");

        // LCL = SP
        self.emit("@SP");
        self.emit("D=M");
        self.emit("@LCL");
        self.emit("M=D");

        self.emit(format!("@{}", name));
        self.emit("0;JMP");
        self.emit(format!("({})", return_label));
    }

    fn ret(&mut self) {
        // R13 = LCL (frame pointer)
        self.emit("@LCL");
        self.emit("D=M");
        self.emit("@R13");
        self.emit("M=D");

        // R14 = *(frame - 5), the saved return address
        self.emit("@R13");
        self.emit("D=M");
        self.emit("@5");
        self.emit("D=D-A");
        self.emit("A=D");
        self.emit("D=M");
        self.emit("@R14");
        self.emit("M=D");

        // *ARG = return value; SP = ARG + 1
        self.pop_into_d();
        self.emit("@ARG");
        self.emit("A=M");
        self.emit("M=D");
        self.emit("@ARG");
        self.emit("D=M+1");
        self.emit("@SP");
        self.emit("M=D");

        // Restore THAT, THIS, ARG, LCL from the frame.
        for (offset, reg) in [(1, "@THAT"), (2, "@THIS"), (3, "@ARG"), (4, "@LCL")] {
            self.emit("@R13");
            self.emit("D=M");
            self.emit(format!("@{}", offset));
            self.emit("D=D-A");
            self.emit("A=D");
            self.emit("D=M");
            self.emit(reg);
            self.emit("M=D");
        }

        self.emit("@R14");
        self.emit("A=M");
        self.emit("0;JMP");
    }

    // ── Primitives ────────────────────────────────────────────────

    fn emit(&mut self, line: impl Into<String>) {
        self.out.push(line.into());
        self.emitted += 1;
    }

    fn sp_inc(&mut self) {
        self.emit("@SP");
        self.emit("M=M+1");
    }

    fn sp_dec(&mut self) {
        self.emit("@SP");
        self.emit("M=M-1");
    }

    /// SP--, then D = *SP.
    fn pop_into_d(&mut self) {
        self.sp_dec();
        self.emit("@SP");
        self.emit("A=M");
        self.emit("D=M");
    }

    /// `<unit>:<context>:<emitted>:<suffix>` — unique because every use
    /// emits at least one instruction before the next label is minted.
    fn fresh_label(&self, context: &str, suffix: &str) -> String {
        format!("{}:{}:{}:{}", self.unit, context, self.emitted, suffix)
    }

    /// IR labels are scoped to their enclosing function.
    fn scoped_label(&self, label: &str) -> String {
        if self.function.is_empty() {
            label.to_string()
        } else {
            format!("{}${}", self.function, label)
        }
    }
}
