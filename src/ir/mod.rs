//! The stack-oriented intermediate representation.
//!
//! The front end emits `Vec<Instr>` per compilation unit; the translator in
//! [`lower`] consumes them and produces target assembly. The IR moves
//! through the pipeline as typed values and is only serialised to its
//! line-oriented text form when a `keep_vm` artifact is requested (or read
//! back by the standalone `translate` command).

pub mod builder;
pub mod lower;

use std::fmt;

use crate::diagnostic::Diagnostic;

/// The eight named memory segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Pointer,
    Temp,
    Static,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
            Segment::Static => "static",
        }
    }

    pub fn from_str(s: &str) -> Option<Segment> {
        match s {
            "constant" => Some(Segment::Constant),
            "local" => Some(Segment::Local),
            "argument" => Some(Segment::Argument),
            "this" => Some(Segment::This),
            "that" => Some(Segment::That),
            "pointer" => Some(Segment::Pointer),
            "temp" => Some(Segment::Temp),
            "static" => Some(Segment::Static),
            _ => None,
        }
    }
}

/// One IR instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    Push(Segment, u16),
    Pop(Segment, u16),

    // Arithmetic and logic
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,

    // Flow, scoped to the enclosing function
    Label(String),
    Goto(String),
    IfGoto(String),

    // Subroutines
    Function(String, u16),
    Call(String, u16),
    Return,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Push(seg, i) => write!(f, "push {} {}", seg.as_str(), i),
            Instr::Pop(seg, i) => write!(f, "pop {} {}", seg.as_str(), i),
            Instr::Add => write!(f, "add"),
            Instr::Sub => write!(f, "sub"),
            Instr::Neg => write!(f, "neg"),
            Instr::Eq => write!(f, "eq"),
            Instr::Gt => write!(f, "gt"),
            Instr::Lt => write!(f, "lt"),
            Instr::And => write!(f, "and"),
            Instr::Or => write!(f, "or"),
            Instr::Not => write!(f, "not"),
            Instr::Label(l) => write!(f, "label {}", l),
            Instr::Goto(l) => write!(f, "goto {}", l),
            Instr::IfGoto(l) => write!(f, "if-goto {}", l),
            Instr::Function(name, locals) => write!(f, "function {} {}", name, locals),
            Instr::Call(name, args) => write!(f, "call {} {}", name, args),
            Instr::Return => write!(f, "return"),
        }
    }
}

impl Instr {
    /// Parse one line of IR text. Comments must already be stripped.
    pub fn parse(line: &str) -> Result<Instr, Diagnostic> {
        let mut parts = line.split_whitespace();
        let head = parts
            .next()
            .ok_or_else(|| Diagnostic::stage("translate", "empty instruction"))?;
        let rest: Vec<&str> = parts.collect();

        let instr = match (head, rest.as_slice()) {
            ("push", [seg, index]) => {
                let (seg, index) = parse_segment_index(seg, index)?;
                Instr::Push(seg, index)
            }
            ("pop", [seg, index]) => {
                let (seg, index) = parse_segment_index(seg, index)?;
                if seg == Segment::Constant {
                    return Err(Diagnostic::stage(
                        "translate",
                        "cannot pop to the constant segment",
                    ));
                }
                Instr::Pop(seg, index)
            }
            ("add", []) => Instr::Add,
            ("sub", []) => Instr::Sub,
            ("neg", []) => Instr::Neg,
            ("eq", []) => Instr::Eq,
            ("gt", []) => Instr::Gt,
            ("lt", []) => Instr::Lt,
            ("and", []) => Instr::And,
            ("or", []) => Instr::Or,
            ("not", []) => Instr::Not,
            ("label", [l]) => Instr::Label(l.to_string()),
            ("goto", [l]) => Instr::Goto(l.to_string()),
            ("if-goto", [l]) => Instr::IfGoto(l.to_string()),
            ("function", [name, locals]) => {
                Instr::Function(name.to_string(), parse_count(head, locals)?)
            }
            ("call", [name, args]) => Instr::Call(name.to_string(), parse_count(head, args)?),
            ("return", []) => Instr::Return,
            _ => {
                return Err(Diagnostic::stage(
                    "translate",
                    format!("unrecognised instruction '{}'", line.trim()),
                ))
            }
        };
        Ok(instr)
    }
}

fn parse_segment_index(seg: &str, index: &str) -> Result<(Segment, u16), Diagnostic> {
    let segment = Segment::from_str(seg)
        .ok_or_else(|| Diagnostic::stage("translate", format!("unknown segment '{}'", seg)))?;
    let index: u16 = index
        .parse()
        .map_err(|_| Diagnostic::stage("translate", format!("invalid segment index '{}'", index)))?;
    match segment {
        Segment::Pointer if index > 1 => Err(Diagnostic::stage(
            "translate",
            format!("pointer index {} out of range (0 or 1)", index),
        )),
        Segment::Temp if index > 7 => Err(Diagnostic::stage(
            "translate",
            format!("temp index {} out of range (0..=7)", index),
        )),
        _ => Ok((segment, index)),
    }
}

fn parse_count(context: &str, text: &str) -> Result<u16, Diagnostic> {
    text.parse()
        .map_err(|_| Diagnostic::stage("translate", format!("invalid {} count '{}'", context, text)))
}

/// Parse a whole IR text: strip `//` comments and blank lines, parse the rest.
pub fn parse_text(text: &str) -> Result<Vec<Instr>, Diagnostic> {
    let mut instrs = Vec::new();
    for line in text.lines() {
        let line = match line.find("//") {
            Some(at) => &line[..at],
            None => line,
        };
        if line.trim().is_empty() {
            continue;
        }
        instrs.push(Instr::parse(line)?);
    }
    Ok(instrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Instr::Push(Segment::Constant, 5).to_string(), "push constant 5");
        assert_eq!(Instr::Pop(Segment::This, 0).to_string(), "pop this 0");
        assert_eq!(Instr::Add.to_string(), "add");
        assert_eq!(Instr::IfGoto("loop:END".into()).to_string(), "if-goto loop:END");
        assert_eq!(
            Instr::Function("Main.main".into(), 2).to_string(),
            "function Main.main 2"
        );
        assert_eq!(
            Instr::Call("Math.multiply".into(), 2).to_string(),
            "call Math.multiply 2"
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let lines = [
            "push constant 7",
            "push local 3",
            "pop argument 1",
            "pop static 2",
            "push pointer 1",
            "pop temp 6",
            "add",
            "sub",
            "neg",
            "eq",
            "gt",
            "lt",
            "and",
            "or",
            "not",
            "label L1",
            "goto L1",
            "if-goto L1",
            "function Sys.init 0",
            "call Sys.halt 0",
            "return",
        ];
        for line in lines {
            let instr = Instr::parse(line).expect(line);
            assert_eq!(instr.to_string(), line);
        }
    }

    #[test]
    fn test_parse_text_skips_comments_and_blanks() {
        let text = "// preamble\n\npush constant 1 // inline\nreturn\n";
        let instrs = parse_text(text).expect("parse");
        assert_eq!(
            instrs,
            vec![Instr::Push(Segment::Constant, 1), Instr::Return]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Instr::parse("frobnicate").is_err());
        assert!(Instr::parse("push nowhere 0").is_err());
        assert!(Instr::parse("push constant x").is_err());
        assert!(Instr::parse("pop constant 0").is_err());
        assert!(Instr::parse("push pointer 2").is_err());
        assert!(Instr::parse("pop temp 8").is_err());
        assert!(Instr::parse("call Main.run").is_err());
    }

    #[test]
    fn test_parse_error_names_construct() {
        let err = Instr::parse("shuffle 1 2").unwrap_err();
        assert!(err.message.starts_with("translate:"), "got: {}", err.message);
        assert!(err.message.contains("shuffle"));
    }
}
