use crate::span::{Span, Spanned};

/// A parsed compilation unit: exactly one class per `.src` file.
#[derive(Clone, Debug)]
pub struct Class {
    pub name: Spanned<String>,
    pub var_decs: Vec<ClassVarDec>,
    pub subroutines: Vec<SubroutineDec>,
}

/// `static`/`field` declaration at class level. One node may declare
/// several names of the same type: `field int x, y;`.
#[derive(Clone, Debug)]
pub struct ClassVarDec {
    pub kind: ClassVarKind,
    pub ty: Type,
    pub names: Vec<Spanned<String>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassVarKind {
    Static,
    Field,
}

impl ClassVarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassVarKind::Static => "static",
            ClassVarKind::Field => "field",
        }
    }
}

/// A syntactic type: the three primitives or a class name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    Char,
    Boolean,
    ClassName(String),
}

impl Type {
    /// The type's source spelling, used as the symbol-table type name.
    pub fn name(&self) -> &str {
        match self {
            Type::Int => "int",
            Type::Char => "char",
            Type::Boolean => "boolean",
            Type::ClassName(name) => name,
        }
    }

    pub fn is_keyword(&self) -> bool {
        !matches!(self, Type::ClassName(_))
    }
}

#[derive(Clone, Debug)]
pub struct SubroutineDec {
    pub kind: SubroutineKind,
    pub return_type: ReturnType,
    pub name: Spanned<String>,
    /// Declared parameters. Always present, possibly empty.
    pub params: Vec<Param>,
    pub body: SubroutineBody,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl SubroutineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubroutineKind::Constructor => "constructor",
            SubroutineKind::Function => "function",
            SubroutineKind::Method => "method",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Of(Type),
}

impl ReturnType {
    pub fn name(&self) -> &str {
        match self {
            ReturnType::Void => "void",
            ReturnType::Of(ty) => ty.name(),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ReturnType::Void)
    }
}

#[derive(Clone, Debug)]
pub struct Param {
    pub ty: Type,
    pub name: Spanned<String>,
}

#[derive(Clone, Debug)]
pub struct SubroutineBody {
    pub var_decs: Vec<VarDec>,
    pub statements: Vec<Statement>,
}

/// `var` declaration inside a subroutine body.
#[derive(Clone, Debug)]
pub struct VarDec {
    pub ty: Type,
    pub names: Vec<Spanned<String>>,
}

#[derive(Clone, Debug)]
pub enum Statement {
    Let {
        name: Spanned<String>,
        /// Present for an array store: `let name[index] = value;`.
        index: Option<Expression>,
        value: Expression,
    },
    If {
        cond: Expression,
        then_body: Vec<Statement>,
        else_body: Option<Vec<Statement>>,
    },
    While {
        cond: Expression,
        body: Vec<Statement>,
    },
    Do {
        call: SubroutineCall,
    },
    Return {
        value: Option<Expression>,
        span: Span,
    },
}

/// An alternating term/operator list. Operator precedence is deliberately
/// undefined; evaluation is strictly left to right and only parentheses
/// group.
#[derive(Clone, Debug)]
pub struct Expression {
    pub first: Term,
    pub rest: Vec<(BinOp, Term)>,
}

impl Expression {
    pub fn single(term: Term) -> Self {
        Self {
            first: term,
            rest: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Term {
    IntConst(u16),
    StrConst(String),
    True,
    False,
    Null,
    This,
    Var(Spanned<String>),
    Index {
        name: Spanned<String>,
        index: Box<Expression>,
    },
    Call(SubroutineCall),
    Paren(Box<Expression>),
    Unary {
        op: UnaryOp,
        term: Box<Term>,
    },
}

/// `name(args)` or `receiver.name(args)`. The receiver is resolved during
/// code generation: a variable means a method call on that object, a class
/// name means a function or constructor call.
#[derive(Clone, Debug)]
pub struct SubroutineCall {
    pub receiver: Option<Spanned<String>>,
    pub name: Spanned<String>,
    pub args: Vec<Expression>,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    And, // &
    Or,  // |
    Lt,  // <
    Gt,  // >
    Eq,  // =
}

impl BinOp {
    pub fn from_symbol(c: char) -> Option<BinOp> {
        match c {
            '+' => Some(BinOp::Add),
            '-' => Some(BinOp::Sub),
            '*' => Some(BinOp::Mul),
            '/' => Some(BinOp::Div),
            '&' => Some(BinOp::And),
            '|' => Some(BinOp::Or),
            '<' => Some(BinOp::Lt),
            '>' => Some(BinOp::Gt),
            '=' => Some(BinOp::Eq),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
            BinOp::And => '&',
            BinOp::Or => '|',
            BinOp::Lt => '<',
            BinOp::Gt => '>',
            BinOp::Eq => '=',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg, // -
    Not, // ~
}

impl UnaryOp {
    pub fn as_char(&self) -> char {
        match self {
            UnaryOp::Neg => '-',
            UnaryOp::Not => '~',
        }
    }
}
