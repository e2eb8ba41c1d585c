//! Standard-library signatures.
//!
//! The code generator needs return types for calls into library classes it
//! never sees source for. They come from a plain-text descriptor: a line
//! holding a class name opens a section, and each subroutine inside it is
//! declared as `<kind> <return_type> <name>(<params>):`. A descriptor for
//! the default library ships embedded in the binary; `--stdlib` swaps in a
//! replacement file. Implementations are linked later by the target VM.

use std::collections::HashMap;
use std::path::Path;

use crate::ast::{ReturnType, SubroutineKind, Type};
use crate::diagnostic::Diagnostic;

const DEFAULT_DESCRIPTOR: &str = include_str!("stdlib.txt");

/// One declared library subroutine. Only the signature exists; parameters
/// are kept as raw text since nothing checks arity.
#[derive(Clone, Debug)]
pub struct StdSubroutine {
    pub kind: SubroutineKind,
    pub return_type: ReturnType,
    pub params: String,
}

/// Read-only map of library class → subroutine → signature.
#[derive(Clone, Debug, Default)]
pub struct Stdlib {
    classes: HashMap<String, HashMap<String, StdSubroutine>>,
}

impl Stdlib {
    /// The embedded default library.
    pub fn builtin() -> Stdlib {
        Self::from_descriptor(DEFAULT_DESCRIPTOR)
            .expect("embedded standard library descriptor is well-formed")
    }

    pub fn load(path: &Path) -> Result<Stdlib, Diagnostic> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Diagnostic::stage("stdlib", format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_descriptor(&text)
    }

    pub fn from_descriptor(text: &str) -> Result<Stdlib, Diagnostic> {
        let mut classes: HashMap<String, HashMap<String, StdSubroutine>> = HashMap::new();
        let mut current: Option<String> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(sub_line) = line.strip_suffix(':') {
                let class = current.as_ref().ok_or_else(|| {
                    Diagnostic::stage(
                        "stdlib",
                        format!("subroutine declared before any class: '{}'", line),
                    )
                })?;
                let (name, sub) = parse_subroutine(sub_line)?;
                classes
                    .get_mut(class)
                    .expect("current class section was inserted")
                    .insert(name, sub);
            } else if is_class_header(line) {
                classes.entry(line.to_string()).or_default();
                current = Some(line.to_string());
            } else {
                return Err(Diagnostic::stage(
                    "stdlib",
                    format!("malformed descriptor line: '{}'", line),
                ));
            }
        }

        Ok(Stdlib { classes })
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn lookup(&self, class: &str, subroutine: &str) -> Option<&StdSubroutine> {
        self.classes.get(class)?.get(subroutine)
    }
}

fn is_class_header(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !line.starts_with(|c: char| c.is_ascii_digit())
}

/// `<kind> <return_type> <name>(<params>)` with the trailing ':' removed.
fn parse_subroutine(line: &str) -> Result<(String, StdSubroutine), Diagnostic> {
    let malformed = || {
        Diagnostic::stage(
            "stdlib",
            format!("malformed subroutine declaration: '{}:'", line),
        )
    };

    let mut parts = line.splitn(3, ' ');
    let kind = match parts.next() {
        Some("constructor") => SubroutineKind::Constructor,
        Some("function") => SubroutineKind::Function,
        Some("method") => SubroutineKind::Method,
        _ => return Err(malformed()),
    };
    let return_type = return_type_from_name(parts.next().ok_or_else(malformed)?);
    let name_and_params = parts.next().ok_or_else(malformed)?;

    let open = name_and_params.find('(').ok_or_else(malformed)?;
    let close = name_and_params.rfind(')').ok_or_else(malformed)?;
    if close < open {
        return Err(malformed());
    }
    let name = name_and_params[..open].trim().to_string();
    if name.is_empty() {
        return Err(malformed());
    }
    let params = name_and_params[open + 1..close].trim().to_string();

    Ok((
        name,
        StdSubroutine {
            kind,
            return_type,
            params,
        },
    ))
}

fn return_type_from_name(name: &str) -> ReturnType {
    match name {
        "void" => ReturnType::Void,
        "int" => ReturnType::Of(Type::Int),
        "char" => ReturnType::Of(Type::Char),
        "boolean" => ReturnType::Of(Type::Boolean),
        other => ReturnType::Of(Type::ClassName(other.to_string())),
    }
}
