pub mod api;
pub mod asm;
pub mod ast;
pub mod diagnostic;
pub mod ir;
pub mod lexeme;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod stdlib;
pub mod sym;
pub mod xml;

// Re-export the compile API — `crucible::compile_directory()` etc.
pub use api::*;

use diagnostic::{render_diagnostics, Diagnostic};
use lexer::Lexer;
use parser::Parser;

/// Lex and parse one compilation unit, rendering any diagnostics to
/// stderr.
pub(crate) fn parse_source(
    source: &str,
    filename: &str,
    unit: u16,
) -> Result<ast::Class, Vec<Diagnostic>> {
    let (tokens, lex_errors) = Lexer::new(source, unit).tokenize();
    if !lex_errors.is_empty() {
        render_diagnostics(&lex_errors, filename, source);
        return Err(lex_errors);
    }

    match Parser::new(tokens).parse_class() {
        Ok((class, warnings)) => {
            if !warnings.is_empty() {
                render_diagnostics(&warnings, filename, source);
            }
            Ok(class)
        }
        Err(errors) => {
            render_diagnostics(&errors, filename, source);
            Err(errors)
        }
    }
}

/// Like [`parse_source`] but without rendering — for tools that surface
/// diagnostics themselves.
pub fn parse_source_silent(source: &str, unit: u16) -> Result<ast::Class, Vec<Diagnostic>> {
    let (tokens, lex_errors) = Lexer::new(source, unit).tokenize();
    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }
    Parser::new(tokens)
        .parse_class()
        .map(|(class, _warnings)| class)
}
