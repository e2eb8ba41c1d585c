use crate::diagnostic::Diagnostic;
use crate::lexeme::{Keyword, Lexeme, SYMBOLS};
use crate::span::{Span, Spanned};

/// Integer constants live in the 15-bit non-negative range.
const MAX_INT_CONST: u32 = 32767;

pub struct Lexer<'src> {
    source: &'src [u8],
    unit: u16,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, unit: u16) -> Self {
        Self {
            source: source.as_bytes(),
            unit,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> (Vec<Spanned<Lexeme>>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.node == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Spanned<Lexeme> {
        loop {
            self.skip_whitespace_and_comments();

            if self.pos >= self.source.len() {
                return self.make_token(Lexeme::Eof, self.pos, self.pos);
            }

            let start = self.pos;
            let ch = self.source[self.pos];

            if is_ident_start(ch) {
                return self.scan_ident_or_keyword();
            }

            if ch.is_ascii_digit() {
                return self.scan_number();
            }

            if ch == b'"' {
                return self.scan_string();
            }

            if SYMBOLS.contains(&(ch as char)) {
                self.pos += 1;
                return self.make_token(Lexeme::Symbol(ch as char), start, self.pos);
            }

            self.diagnostics.push(
                Diagnostic::error(
                    format!("illegal character '{}' (U+{:04X})", ch as char, ch),
                    Span::new(self.unit, start as u32, self.pos as u32 + 1),
                )
                .with_help("this character is not part of the language's syntax".to_string()),
            );
            self.pos += 1;
            // Error recorded; resume scanning after the offending byte.
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }

            // Line comment: // to end of line
            if self.at_pair(b'/', b'/') {
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            // Block comment: /* to matching */
            if self.at_pair(b'/', b'*') {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.pos >= self.source.len() {
                        self.diagnostics.push(
                            Diagnostic::error(
                                "unterminated block comment".to_string(),
                                Span::new(self.unit, start as u32, self.pos as u32),
                            )
                            .with_help("close the comment with '*/'".to_string()),
                        );
                        break;
                    }
                    if self.at_pair(b'*', b'/') {
                        self.pos += 2;
                        break;
                    }
                    self.pos += 1;
                }
                continue;
            }

            break;
        }
    }

    fn at_pair(&self, first: u8, second: u8) -> bool {
        self.pos + 1 < self.source.len()
            && self.source[self.pos] == first
            && self.source[self.pos + 1] == second
    }

    fn scan_ident_or_keyword(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or_default();
        let token = match Keyword::from_str(text) {
            Some(kw) => Lexeme::Keyword(kw),
            None => Lexeme::Identifier(text.to_string()),
        };
        self.make_token(token, start, self.pos)
    }

    fn scan_number(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos]).unwrap_or_default();
        let value = match text.parse::<u32>() {
            Ok(n) if n <= MAX_INT_CONST => n as u16,
            _ => {
                self.diagnostics.push(
                    Diagnostic::error(
                        format!("integer constant '{}' is out of range", text),
                        Span::new(self.unit, start as u32, self.pos as u32),
                    )
                    .with_help(format!("constants must be at most {}", MAX_INT_CONST)),
                );
                0
            }
        };
        self.make_token(Lexeme::IntConst(value), start, self.pos)
    }

    /// Scan a string constant. The closing quote must appear before the end
    /// of the line; a '/' or '*' inside the quotes is ordinary text.
    fn scan_string(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        self.pos += 1; // opening quote
        let body_start = self.pos;

        while self.pos < self.source.len()
            && self.source[self.pos] != b'"'
            && self.source[self.pos] != b'\n'
        {
            self.pos += 1;
        }

        if self.pos >= self.source.len() || self.source[self.pos] == b'\n' {
            self.diagnostics.push(
                Diagnostic::error(
                    "unterminated string constant".to_string(),
                    Span::new(self.unit, start as u32, self.pos as u32),
                )
                .with_help("string constants must close on the same line".to_string()),
            );
            let text = std::str::from_utf8(&self.source[body_start..self.pos])
                .unwrap_or_default()
                .to_string();
            return self.make_token(Lexeme::StrConst(text), start, self.pos);
        }

        let text = std::str::from_utf8(&self.source[body_start..self.pos])
            .unwrap_or_default()
            .to_string();
        self.pos += 1; // closing quote
        self.make_token(Lexeme::StrConst(text), start, self.pos)
    }

    fn make_token(&self, token: Lexeme, start: usize, end: usize) -> Spanned<Lexeme> {
        Spanned::new(token, Span::new(self.unit, start as u32, end as u32))
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Lexeme> {
        let (tokens, diags) = Lexer::new(source, 0).tokenize();
        assert!(diags.is_empty(), "unexpected errors: {:?}", diags);
        tokens.into_iter().map(|t| t.node).collect()
    }

    fn lex_with_errors(source: &str) -> (Vec<Lexeme>, Vec<Diagnostic>) {
        let (tokens, diags) = Lexer::new(source, 0).tokenize();
        (tokens.into_iter().map(|t| t.node).collect(), diags)
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = lex("class Main field count");
        assert_eq!(
            tokens,
            vec![
                Lexeme::Keyword(Keyword::Class),
                Lexeme::Identifier("Main".into()),
                Lexeme::Keyword(Keyword::Field),
                Lexeme::Identifier("count".into()),
                Lexeme::Eof,
            ]
        );
    }

    #[test]
    fn test_symbols_are_boundaries() {
        // No whitespace needed around symbols
        let tokens = lex("x=y+1;");
        assert_eq!(
            tokens,
            vec![
                Lexeme::Identifier("x".into()),
                Lexeme::Symbol('='),
                Lexeme::Identifier("y".into()),
                Lexeme::Symbol('+'),
                Lexeme::IntConst(1),
                Lexeme::Symbol(';'),
                Lexeme::Eof,
            ]
        );
    }

    #[test]
    fn test_all_nineteen_symbols() {
        let tokens = lex("{ } ( ) [ ] . , ; + - * / & | < > = ~");
        let symbols: Vec<char> = tokens
            .iter()
            .filter_map(|t| match t {
                Lexeme::Symbol(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(symbols, SYMBOLS.to_vec());
    }

    #[test]
    fn test_string_constant_strips_quotes() {
        let tokens = lex("let s = \"hello world\";");
        assert!(tokens.contains(&Lexeme::StrConst("hello world".into())));
    }

    #[test]
    fn test_comment_markers_inside_string() {
        // '/' and '*' inside a string literal are not comments
        let tokens = lex("\"a // b /* c\"");
        assert_eq!(
            tokens,
            vec![Lexeme::StrConst("a // b /* c".into()), Lexeme::Eof]
        );
    }

    #[test]
    fn test_line_comment() {
        let tokens = lex("let // comment until eol\nx");
        assert_eq!(
            tokens,
            vec![
                Lexeme::Keyword(Keyword::Let),
                Lexeme::Identifier("x".into()),
                Lexeme::Eof,
            ]
        );
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let tokens = lex("a /* one\ntwo\nthree */ b");
        assert_eq!(
            tokens,
            vec![
                Lexeme::Identifier("a".into()),
                Lexeme::Identifier("b".into()),
                Lexeme::Eof,
            ]
        );
    }

    #[test]
    fn test_integer_constant() {
        let tokens = lex("0 7 32767");
        assert_eq!(
            tokens,
            vec![
                Lexeme::IntConst(0),
                Lexeme::IntConst(7),
                Lexeme::IntConst(32767),
                Lexeme::Eof,
            ]
        );
    }

    #[test]
    fn test_error_integer_out_of_range() {
        let (_tokens, diags) = lex_with_errors("32768");
        assert!(!diags.is_empty());
        assert!(
            diags[0].message.contains("out of range"),
            "got: {}",
            diags[0].message
        );
    }

    #[test]
    fn test_error_unterminated_string() {
        let (_tokens, diags) = lex_with_errors("\"no closing quote");
        assert!(!diags.is_empty());
        assert!(
            diags[0].message.contains("unterminated string"),
            "got: {}",
            diags[0].message
        );
    }

    #[test]
    fn test_error_string_broken_by_newline() {
        let (_tokens, diags) = lex_with_errors("\"first\nsecond\"");
        assert!(!diags.is_empty());
        assert!(diags[0].message.contains("unterminated string"));
    }

    #[test]
    fn test_error_illegal_character() {
        let (_tokens, diags) = lex_with_errors("let x = 1 ? 2;");
        assert!(!diags.is_empty());
        assert!(
            diags[0].message.contains("illegal character '?'"),
            "got: {}",
            diags[0].message
        );
        assert!(diags[0].help.is_some());
    }

    #[test]
    fn test_error_unterminated_block_comment() {
        let (_tokens, diags) = lex_with_errors("a /* never closed");
        assert!(!diags.is_empty());
        assert!(diags[0].message.contains("unterminated block comment"));
    }

    #[test]
    fn test_tokenize_is_idempotent_over_pretty_print() {
        // Re-lexing the space-joined lexemes yields the same token stream.
        let source = "let arr[i]=x*3;";
        let first = lex(source);
        let printed: Vec<String> = first
            .iter()
            .filter(|t| **t != Lexeme::Eof)
            .map(|t| match t {
                Lexeme::Keyword(kw) => kw.as_str().to_string(),
                Lexeme::Symbol(c) => c.to_string(),
                Lexeme::Identifier(name) => name.clone(),
                Lexeme::IntConst(n) => n.to_string(),
                Lexeme::StrConst(s) => format!("\"{}\"", s),
                Lexeme::Eof => unreachable!(),
            })
            .collect();
        let second = lex(&printed.join(" "));
        assert_eq!(first, second);
    }
}
