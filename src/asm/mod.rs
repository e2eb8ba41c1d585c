//! Two-pass symbolic assembler: symbolic assembly text to bit-exact
//! 16-character binary words.
//!
//! Pass structure: a clean pass strips comments and whitespace, the symbol
//! pass resolves labels and allocates variables (see [`symbols`]), and the
//! encoding pass maps each surviving line to one machine word (see
//! [`encode`]).

pub mod encode;
pub mod symbols;

use crate::diagnostic::Diagnostic;

/// Assemble a full program. Returns one 16-character binary line per
/// instruction; label definitions contribute no words.
pub fn assemble(source: &str) -> Result<Vec<String>, Diagnostic> {
    let cleaned = clean(source);
    let resolved = symbols::resolve(cleaned)?;
    resolved.iter().map(|line| encode::encode_line(line)).collect()
}

/// Remove `//` comments, `/* */` spans, legacy block-comment continuation
/// lines (leading `*`), and every whitespace character.
fn clean(source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut in_block = false;

    for raw in source.lines() {
        let mut rest = raw;
        let mut kept = String::new();

        if in_block {
            match rest.find("*/") {
                Some(end) => {
                    rest = &rest[end + 2..];
                    in_block = false;
                }
                None => continue,
            }
        }

        if rest.trim_start().starts_with('*') {
            continue;
        }

        while !rest.is_empty() {
            match (rest.find("//"), rest.find("/*")) {
                (Some(line_at), None) => {
                    kept.push_str(&rest[..line_at]);
                    rest = "";
                }
                (Some(line_at), block_at) if block_at.map_or(true, |b| line_at < b) => {
                    kept.push_str(&rest[..line_at]);
                    rest = "";
                }
                (_, Some(block_at)) => {
                    kept.push_str(&rest[..block_at]);
                    match rest[block_at + 2..].find("*/") {
                        Some(end) => rest = &rest[block_at + 2 + end + 2..],
                        None => {
                            in_block = true;
                            rest = "";
                        }
                    }
                }
                (None, None) => {
                    kept.push_str(rest);
                    rest = "";
                }
            }
        }

        let compact: String = kept.chars().filter(|c| !c.is_whitespace()).collect();
        if !compact.is_empty() {
            out.push(compact);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_whitespace_and_comments() {
        let lines = clean("  D = M   // trailing\n\n@ 12\n// whole line\nM=D\n");
        assert_eq!(lines, vec!["D=M", "@12", "M=D"]);
    }

    #[test]
    fn test_clean_block_comment_span() {
        let lines = clean("@1\n/* a block\n * continuation\nstill inside */\n@2\n");
        assert_eq!(lines, vec!["@1", "@2"]);
    }

    #[test]
    fn test_clean_drops_star_lines() {
        let lines = clean("* orphan continuation\n@3\n");
        assert_eq!(lines, vec!["@3"]);
    }

    #[test]
    fn test_clean_inline_block_comment() {
        let lines = clean("D=/*pick*/M\n");
        assert_eq!(lines, vec!["D=M"]);
    }

    #[test]
    fn test_assemble_label_program() {
        // Forward reference: the first @LOOP resolves to the label ahead.
        let words = assemble("@LOOP\n(LOOP)\nD=D+1\n@LOOP\nD;JNE\n").expect("assemble");
        assert_eq!(
            words,
            vec![
                "0000000000000001", // @1 — LOOP is the next instruction index
                "1110011111010000", // D=D+1
                "0000000000000001", // @1
                "1110001100000101", // D;JNE
            ]
        );
    }

    #[test]
    fn test_labels_occupy_no_words() {
        let source = "(A)\n@0\n(B)\nD=A\n(C)\n";
        let words = assemble(source).expect("assemble");
        assert_eq!(words.len(), 2);
        for word in &words {
            assert_eq!(word.len(), 16);
            assert!(word.chars().all(|c| c == '0' || c == '1'));
        }
    }

    #[test]
    fn test_assemble_bootstrap_sequence() {
        let words = assemble("@256\nD=A\n@SP\nM=D\n").expect("assemble");
        assert_eq!(
            words,
            vec![
                "0000000100000000", // @256
                "1110110000010000", // D=A
                "0000000000000000", // @SP = @0
                "1110001100001000", // M=D
            ]
        );
    }

    #[test]
    fn test_assemble_error_propagates() {
        let err = assemble("@1\nD=Q\n").unwrap_err();
        assert!(err.message.starts_with("assemble:"), "got: {}", err.message);
    }
}
