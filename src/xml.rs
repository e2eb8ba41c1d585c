//! Tabular XML dump of the parse tree — the `keep_xml` artifact.
//!
//! One tag or token per line, tab-indented by nesting depth. Structural
//! tags carry the grammar production names; leaves are `<kind> lexeme
//! </kind>` token lines.

use crate::ast::*;
use crate::span::Spanned;

/// Render a parsed class as the tabularized tag-per-line dump.
pub fn class_to_xml(class: &Class) -> String {
    let mut w = XmlWriter::default();
    w.class(class);
    let mut text = w.lines.join("\n");
    text.push('\n');
    text
}

#[derive(Default)]
struct XmlWriter {
    lines: Vec<String>,
    depth: usize,
}

impl XmlWriter {
    fn open(&mut self, tag: &str) {
        self.push(format!("<{}>", tag));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.push(format!("</{}>", tag));
    }

    fn token(&mut self, kind: &str, text: &str) {
        self.push(format!("<{}> {} </{}>", kind, text, kind));
    }

    fn symbol(&mut self, c: char) {
        self.token("symbol", &c.to_string());
    }

    fn keyword(&mut self, text: &str) {
        self.token("keyword", text);
    }

    fn identifier(&mut self, text: &str) {
        self.token("identifier", text);
    }

    fn push(&mut self, line: String) {
        self.lines.push(format!("{}{}", "\t".repeat(self.depth), line));
    }

    fn type_token(&mut self, ty: &Type) {
        if ty.is_keyword() {
            self.keyword(ty.name());
        } else {
            self.identifier(ty.name());
        }
    }

    // ── Productions ───────────────────────────────────────────────

    fn class(&mut self, class: &Class) {
        self.open("class");
        self.keyword("class");
        self.identifier(&class.name.node);
        self.symbol('{');
        for dec in &class.var_decs {
            self.class_var_dec(dec);
        }
        for sub in &class.subroutines {
            self.subroutine_dec(sub);
        }
        self.symbol('}');
        self.close("class");
    }

    fn class_var_dec(&mut self, dec: &ClassVarDec) {
        self.open("classVarDec");
        self.keyword(dec.kind.as_str());
        self.type_token(&dec.ty);
        self.name_list(&dec.names);
        self.close("classVarDec");
    }

    fn name_list(&mut self, names: &[Spanned<String>]) {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.symbol(',');
            }
            self.identifier(&name.node);
        }
        self.symbol(';');
    }

    fn subroutine_dec(&mut self, sub: &SubroutineDec) {
        self.open("subroutineDec");
        self.keyword(sub.kind.as_str());
        match &sub.return_type {
            ReturnType::Void => self.keyword("void"),
            ReturnType::Of(ty) => self.type_token(ty),
        }
        self.identifier(&sub.name.node);
        self.symbol('(');
        self.open("parameterList");
        for (i, param) in sub.params.iter().enumerate() {
            if i > 0 {
                self.symbol(',');
            }
            self.type_token(&param.ty);
            self.identifier(&param.name.node);
        }
        self.close("parameterList");
        self.symbol(')');
        self.subroutine_body(&sub.body);
        self.close("subroutineDec");
    }

    fn subroutine_body(&mut self, body: &SubroutineBody) {
        self.open("subroutineBody");
        self.symbol('{');
        for dec in &body.var_decs {
            self.open("varDec");
            self.keyword("var");
            self.type_token(&dec.ty);
            self.name_list(&dec.names);
            self.close("varDec");
        }
        self.statements(&body.statements);
        self.symbol('}');
        self.close("subroutineBody");
    }

    fn statements(&mut self, statements: &[Statement]) {
        self.open("statements");
        for stmt in statements {
            self.statement(stmt);
        }
        self.close("statements");
    }

    fn statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Let { name, index, value } => {
                self.open("letStatement");
                self.keyword("let");
                self.identifier(&name.node);
                if let Some(index) = index {
                    self.symbol('[');
                    self.expression(index);
                    self.symbol(']');
                }
                self.symbol('=');
                self.expression(value);
                self.symbol(';');
                self.close("letStatement");
            }
            Statement::If {
                cond,
                then_body,
                else_body,
            } => {
                self.open("ifStatement");
                self.keyword("if");
                self.symbol('(');
                self.expression(cond);
                self.symbol(')');
                self.symbol('{');
                self.statements(then_body);
                self.symbol('}');
                if let Some(else_body) = else_body {
                    self.keyword("else");
                    self.symbol('{');
                    self.statements(else_body);
                    self.symbol('}');
                }
                self.close("ifStatement");
            }
            Statement::While { cond, body } => {
                self.open("whileStatement");
                self.keyword("while");
                self.symbol('(');
                self.expression(cond);
                self.symbol(')');
                self.symbol('{');
                self.statements(body);
                self.symbol('}');
                self.close("whileStatement");
            }
            Statement::Do { call } => {
                self.open("doStatement");
                self.keyword("do");
                self.call(call);
                self.symbol(';');
                self.close("doStatement");
            }
            Statement::Return { value, .. } => {
                self.open("returnStatement");
                self.keyword("return");
                if let Some(value) = value {
                    self.expression(value);
                }
                self.symbol(';');
                self.close("returnStatement");
            }
        }
    }

    fn expression(&mut self, expr: &Expression) {
        self.open("expression");
        self.term(&expr.first);
        for (op, term) in &expr.rest {
            self.symbol(op.as_char());
            self.term(term);
        }
        self.close("expression");
    }

    fn term(&mut self, term: &Term) {
        self.open("term");
        match term {
            Term::IntConst(n) => self.token("integerConstant", &n.to_string()),
            Term::StrConst(s) => self.token("stringConstant", s),
            Term::True => self.keyword("true"),
            Term::False => self.keyword("false"),
            Term::Null => self.keyword("null"),
            Term::This => self.keyword("this"),
            Term::Var(name) => self.identifier(&name.node),
            Term::Index { name, index } => {
                self.identifier(&name.node);
                self.symbol('[');
                self.expression(index);
                self.symbol(']');
            }
            Term::Call(call) => self.call(call),
            Term::Paren(expr) => {
                self.symbol('(');
                self.expression(expr);
                self.symbol(')');
            }
            Term::Unary { op, term } => {
                self.symbol(op.as_char());
                self.term(term);
            }
        }
        self.close("term");
    }

    fn call(&mut self, call: &SubroutineCall) {
        if let Some(receiver) = &call.receiver {
            self.identifier(&receiver.node);
            self.symbol('.');
        }
        self.identifier(&call.name.node);
        self.symbol('(');
        self.open("expressionList");
        for (i, arg) in call.args.iter().enumerate() {
            if i > 0 {
                self.symbol(',');
            }
            self.expression(arg);
        }
        self.close("expressionList");
        self.symbol(')');
    }
}
