use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::lexeme::{Keyword, Lexeme};
use crate::span::{Span, Spanned};

const MAX_NESTING_DEPTH: u32 = 256;

/// Recursive-descent parser. One parse function per grammar production;
/// the first token mismatch aborts the parse with no recovery.
pub struct Parser {
    tokens: Vec<Spanned<Lexeme>>,
    pos: usize,
    depth: u32,
    warnings: Vec<Diagnostic>,
}

type Parsed<T> = Result<T, Diagnostic>;

impl Parser {
    pub fn new(tokens: Vec<Spanned<Lexeme>>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            warnings: Vec::new(),
        }
    }

    /// Parse one compilation unit. On success also returns accumulated
    /// warnings; on failure returns the single diagnostic that stopped the
    /// parse.
    pub fn parse_class(mut self) -> Result<(Class, Vec<Diagnostic>), Vec<Diagnostic>> {
        match self.parse_class_inner() {
            Ok(class) => Ok((class, self.warnings)),
            Err(diag) => Err(vec![diag]),
        }
    }

    fn parse_class_inner(&mut self) -> Parsed<Class> {
        self.expect_keyword(Keyword::Class)?;
        let name = self.expect_ident()?;
        self.expect_symbol('{')?;

        let mut var_decs = Vec::new();
        while self.at_keyword(Keyword::Static) || self.at_keyword(Keyword::Field) {
            var_decs.push(self.parse_class_var_dec()?);
        }

        let mut subroutines = Vec::new();
        while self.at_keyword(Keyword::Constructor)
            || self.at_keyword(Keyword::Function)
            || self.at_keyword(Keyword::Method)
        {
            subroutines.push(self.parse_subroutine_dec()?);
        }

        self.expect_symbol('}')?;
        if !self.at_eof() {
            return Err(self
                .error_at_current("expected end of file after class body")
                .with_help("each source file contains exactly one class".to_string()));
        }

        Ok(Class {
            name,
            var_decs,
            subroutines,
        })
    }

    fn parse_class_var_dec(&mut self) -> Parsed<ClassVarDec> {
        let kind = if self.eat_keyword(Keyword::Static) {
            ClassVarKind::Static
        } else {
            self.expect_keyword(Keyword::Field)?;
            ClassVarKind::Field
        };
        let ty = self.parse_type()?;
        let names = self.parse_name_list()?;
        Ok(ClassVarDec { kind, ty, names })
    }

    /// `name (',' name)* ';'` — the tail of a variable declaration.
    fn parse_name_list(&mut self) -> Parsed<Vec<Spanned<String>>> {
        let mut names = vec![self.expect_ident()?];
        while self.eat_symbol(',') {
            names.push(self.expect_ident()?);
        }
        self.expect_symbol(';')?;
        Ok(names)
    }

    fn parse_type(&mut self) -> Parsed<Type> {
        let tok = self.advance();
        match tok.node {
            Lexeme::Keyword(Keyword::Int) => Ok(Type::Int),
            Lexeme::Keyword(Keyword::Char) => Ok(Type::Char),
            Lexeme::Keyword(Keyword::Boolean) => Ok(Type::Boolean),
            Lexeme::Identifier(name) => Ok(Type::ClassName(name)),
            other => Err(Diagnostic::error(
                format!("expected type, found {}", other.description()),
                tok.span,
            )
            .with_help("types are 'int', 'char', 'boolean', or a class name".to_string())),
        }
    }

    fn parse_subroutine_dec(&mut self) -> Parsed<SubroutineDec> {
        let kind = if self.eat_keyword(Keyword::Constructor) {
            SubroutineKind::Constructor
        } else if self.eat_keyword(Keyword::Function) {
            SubroutineKind::Function
        } else {
            self.expect_keyword(Keyword::Method)?;
            SubroutineKind::Method
        };

        let return_type = if self.eat_keyword(Keyword::Void) {
            ReturnType::Void
        } else {
            ReturnType::Of(self.parse_type()?)
        };

        let name = self.expect_ident()?;
        self.expect_symbol('(')?;
        let params = self.parse_parameter_list()?;
        self.expect_symbol(')')?;
        let body = self.parse_subroutine_body()?;

        Ok(SubroutineDec {
            kind,
            return_type,
            name,
            params,
            body,
        })
    }

    /// A parameter list is present even when empty: `()` parses to an
    /// empty vector, not to an absent node.
    fn parse_parameter_list(&mut self) -> Parsed<Vec<Param>> {
        let mut params = Vec::new();
        if self.at_symbol(')') {
            return Ok(params);
        }
        loop {
            let ty = self.parse_type()?;
            let name = self.expect_ident()?;
            params.push(Param { ty, name });
            if !self.eat_symbol(',') {
                break;
            }
        }
        Ok(params)
    }

    fn parse_subroutine_body(&mut self) -> Parsed<SubroutineBody> {
        self.expect_symbol('{')?;

        let mut var_decs = Vec::new();
        while self.at_keyword(Keyword::Var) {
            self.advance();
            let ty = self.parse_type()?;
            let names = self.parse_name_list()?;
            var_decs.push(VarDec { ty, names });
        }

        let statements = self.parse_statements()?;
        self.expect_symbol('}')?;

        Ok(SubroutineBody {
            var_decs,
            statements,
        })
    }

    /// Parse statements until the enclosing '}'.
    fn parse_statements(&mut self) -> Parsed<Vec<Statement>> {
        let mut statements = Vec::new();
        while !self.at_symbol('}') {
            let stmt = self.parse_statement()?;
            let ended = matches!(stmt, Statement::Return { .. });
            statements.push(stmt);
            if ended && !self.at_symbol('}') {
                self.warnings.push(
                    Diagnostic::warning(
                        "unreachable statements after 'return'".to_string(),
                        self.current_span(),
                    )
                    .with_help("move the return to the end of the block".to_string()),
                );
            }
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Parsed<Statement> {
        if self.at_keyword(Keyword::Let) {
            self.parse_let()
        } else if self.at_keyword(Keyword::If) {
            self.parse_if()
        } else if self.at_keyword(Keyword::While) {
            self.parse_while()
        } else if self.at_keyword(Keyword::Do) {
            self.parse_do()
        } else if self.at_keyword(Keyword::Return) {
            self.parse_return()
        } else {
            Err(self
                .error_at_current("expected statement")
                .with_help(
                    "statements begin with 'let', 'if', 'while', 'do', or 'return'".to_string(),
                ))
        }
    }

    fn parse_let(&mut self) -> Parsed<Statement> {
        self.expect_keyword(Keyword::Let)?;
        let name = self.expect_ident()?;

        let index = if self.eat_symbol('[') {
            let idx = self.parse_expression()?;
            self.expect_symbol(']')?;
            Some(idx)
        } else {
            None
        };

        self.expect_symbol('=')?;
        let value = self.parse_expression()?;
        self.expect_symbol(';')?;

        Ok(Statement::Let { name, index, value })
    }

    fn parse_if(&mut self) -> Parsed<Statement> {
        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        let cond = self.parse_expression()?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;
        let then_body = self.parse_statements()?;
        self.expect_symbol('}')?;

        let else_body = if self.eat_keyword(Keyword::Else) {
            self.expect_symbol('{')?;
            let body = self.parse_statements()?;
            self.expect_symbol('}')?;
            Some(body)
        } else {
            None
        };

        Ok(Statement::If {
            cond,
            then_body,
            else_body,
        })
    }

    fn parse_while(&mut self) -> Parsed<Statement> {
        self.expect_keyword(Keyword::While)?;
        self.expect_symbol('(')?;
        let cond = self.parse_expression()?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;
        let body = self.parse_statements()?;
        self.expect_symbol('}')?;
        Ok(Statement::While { cond, body })
    }

    fn parse_do(&mut self) -> Parsed<Statement> {
        self.expect_keyword(Keyword::Do)?;
        let first = self.expect_ident()?;
        let call = self.parse_call_after_name(first)?;
        self.expect_symbol(';')?;
        Ok(Statement::Do { call })
    }

    fn parse_return(&mut self) -> Parsed<Statement> {
        let span = self.current_span();
        self.expect_keyword(Keyword::Return)?;
        let value = if self.at_symbol(';') {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_symbol(';')?;
        Ok(Statement::Return { value, span })
    }

    // ── Expressions ───────────────────────────────────────────────

    fn parse_expression(&mut self) -> Parsed<Expression> {
        self.enter_nesting()?;
        let first = self.parse_term()?;
        let mut rest = Vec::new();
        loop {
            let op = match &self.current().node {
                Lexeme::Symbol(c) => match BinOp::from_symbol(*c) {
                    Some(op) => op,
                    None => break,
                },
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_term()?));
        }
        self.exit_nesting();
        Ok(Expression { first, rest })
    }

    /// One token of lookahead disambiguates terms: `[` after a name is an
    /// array index, `(` or `.` a call, a leading `(` a parenthesised
    /// expression, `-`/`~` a unary operator.
    fn parse_term(&mut self) -> Parsed<Term> {
        self.enter_nesting()?;
        let tok = self.advance();
        let term = match tok.node {
            Lexeme::IntConst(n) => Term::IntConst(n),
            Lexeme::StrConst(s) => Term::StrConst(s),
            Lexeme::Keyword(Keyword::True) => Term::True,
            Lexeme::Keyword(Keyword::False) => Term::False,
            Lexeme::Keyword(Keyword::Null) => Term::Null,
            Lexeme::Keyword(Keyword::This) => Term::This,
            Lexeme::Symbol('(') => {
                let expr = self.parse_expression()?;
                self.expect_symbol(')')?;
                Term::Paren(Box::new(expr))
            }
            Lexeme::Symbol('-') => Term::Unary {
                op: UnaryOp::Neg,
                term: Box::new(self.parse_term()?),
            },
            Lexeme::Symbol('~') => Term::Unary {
                op: UnaryOp::Not,
                term: Box::new(self.parse_term()?),
            },
            Lexeme::Identifier(name) => {
                let name = Spanned::new(name, tok.span);
                if self.at_symbol('[') {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect_symbol(']')?;
                    Term::Index {
                        name,
                        index: Box::new(index),
                    }
                } else if self.at_symbol('(') || self.at_symbol('.') {
                    Term::Call(self.parse_call_after_name(name)?)
                } else {
                    Term::Var(name)
                }
            }
            other => {
                return Err(Diagnostic::error(
                    format!("expected term, found {}", other.description()),
                    tok.span,
                )
                .with_help(
                    "a term is a constant, a variable, a call, '(expr)', or a unary '-'/'~'"
                        .to_string(),
                ));
            }
        };
        self.exit_nesting();
        Ok(term)
    }

    /// Finish a subroutine call whose leading identifier has been consumed.
    fn parse_call_after_name(&mut self, first: Spanned<String>) -> Parsed<SubroutineCall> {
        let (receiver, name) = if self.eat_symbol('.') {
            let method = self.expect_ident()?;
            (Some(first), method)
        } else {
            (None, first)
        };

        self.expect_symbol('(')?;
        let args = self.parse_expression_list()?;
        let close = self.expect_symbol(')')?;

        let open_span = receiver.as_ref().map(|r| r.span).unwrap_or(name.span);
        Ok(SubroutineCall {
            receiver,
            name,
            args,
            span: open_span.merge(close),
        })
    }

    /// Empty when the next token is ')'.
    fn parse_expression_list(&mut self) -> Parsed<Vec<Expression>> {
        let mut args = Vec::new();
        if self.at_symbol(')') {
            return Ok(args);
        }
        args.push(self.parse_expression()?);
        while self.eat_symbol(',') {
            args.push(self.parse_expression()?);
        }
        Ok(args)
    }

    // ── Cursor helpers ────────────────────────────────────────────

    fn current(&self) -> &Spanned<Lexeme> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn advance(&mut self) -> Spanned<Lexeme> {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        self.current().node == Lexeme::Eof
    }

    fn at_symbol(&self, c: char) -> bool {
        self.current().node == Lexeme::Symbol(c)
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.current().node == Lexeme::Keyword(kw)
    }

    fn eat_symbol(&mut self, c: char) -> bool {
        if self.at_symbol(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, c: char) -> Parsed<Span> {
        if self.at_symbol(c) {
            Ok(self.advance().span)
        } else {
            Err(self.error_at_current(&format!(
                "expected '{}', found {}",
                c,
                self.current().node.description()
            )))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Parsed<Span> {
        if self.at_keyword(kw) {
            Ok(self.advance().span)
        } else {
            Err(self.error_at_current(&format!(
                "expected '{}', found {}",
                kw.as_str(),
                self.current().node.description()
            )))
        }
    }

    fn expect_ident(&mut self) -> Parsed<Spanned<String>> {
        match &self.current().node {
            Lexeme::Identifier(name) => {
                let name = name.clone();
                let span = self.current_span();
                self.advance();
                Ok(Spanned::new(name, span))
            }
            other => Err(Diagnostic::error(
                format!("expected identifier, found {}", other.description()),
                self.current_span(),
            )),
        }
    }

    fn error_at_current(&self, message: &str) -> Diagnostic {
        Diagnostic::error(message.to_string(), self.current_span())
    }

    fn enter_nesting(&mut self) -> Parsed<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self
                .error_at_current("expression nesting depth exceeded (maximum 256 levels)")
                .with_help("split the expression across several statements".to_string()));
        }
        Ok(())
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }
}
