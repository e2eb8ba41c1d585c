//! Public compile API: the three-stage pipeline behind the CLI.
//!
//! `compile_directory` runs the whole chain: parse + index (phase 1),
//! per-unit code generation against the frozen index (phase 2), stack-IR
//! lowering into one combined assembly stream, and two-pass assembly into
//! `<basename>.bin`. Intermediate artifacts are kept in memory and only
//! written when a `keep_*` option asks for them.

pub(crate) mod pipeline;

use std::path::{Path, PathBuf};

use crate::asm;
use crate::diagnostic::{render_diagnostics, Diagnostic};
use crate::ir::builder::Generator;
use crate::ir::lower;
use crate::stdlib::Stdlib;

use pipeline::{basename, Project};

#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Prepend the SP-initialisation bootstrap.
    pub add_bootstrap: bool,
    /// Keep per-unit parse-tree dumps (`<Class>.xml`).
    pub keep_xml: bool,
    /// Keep per-unit IR listings (`<Class>.vm`).
    pub keep_vm: bool,
    /// Keep per-unit assembly and the combined `out.asm`.
    pub keep_asm: bool,
    /// Replacement standard-library descriptor; embedded default if unset.
    pub stdlib_path: Option<PathBuf>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            add_bootstrap: true,
            keep_xml: false,
            keep_vm: false,
            keep_asm: false,
            stdlib_path: None,
        }
    }
}

/// What a successful build produced.
#[derive(Debug)]
pub struct BuildArtifacts {
    pub bin_path: PathBuf,
    pub unit_names: Vec<String>,
    /// Number of machine words in the final binary.
    pub word_count: usize,
}

/// Compile every `.src` unit under `dir` into `<dirname>.bin`.
pub fn compile_directory(dir: &Path, options: &CompileOptions) -> Result<BuildArtifacts, Diagnostic> {
    let stdlib = load_stdlib(options)?;
    let project = Project::load(dir)?;

    let mut translated = Vec::with_capacity(project.units.len());
    for unit in &project.units {
        let ops = match Generator::generate(&unit.class, &project.index, &stdlib) {
            Ok(ops) => ops,
            Err(diags) => {
                render_diagnostics(&diags, &unit.path.to_string_lossy(), &unit.source);
                return Err(Diagnostic::stage(
                    "codegen",
                    format!("{} error(s) in '{}'", diags.len(), unit.path.display()),
                ));
            }
        };

        if options.keep_xml {
            let xml = crate::xml::class_to_xml(&unit.class);
            write_artifact(&dir.join(format!("{}.xml", unit.name)), &xml)?;
        }
        if options.keep_vm {
            let mut text: String = ops
                .iter()
                .map(|op| format!("{}\n", op))
                .collect();
            if text.is_empty() {
                text.push('\n');
            }
            write_artifact(&dir.join(format!("{}.vm", unit.name)), &text)?;
        }

        let unit_asm = lower::translate_unit(&unit.name, &ops);
        if options.keep_asm {
            write_artifact(
                &dir.join(format!("{}.asm", unit.name)),
                &join_lines(&unit_asm.lines),
            )?;
        }
        translated.push(unit_asm);
    }

    let combined = lower::combine(translated, options.add_bootstrap);
    if options.keep_asm {
        write_artifact(&dir.join("out.asm"), &join_lines(&combined))?;
    }

    let words = asm::assemble(&combined.join("\n"))?;

    let program = dir
        .canonicalize()
        .ok()
        .map(|p| basename(&p))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "out".to_string());
    let bin_path = dir.join(format!("{}.bin", program));
    write_artifact(&bin_path, &join_lines(&words))?;

    Ok(BuildArtifacts {
        bin_path,
        unit_names: project.units.iter().map(|u| u.name.clone()).collect(),
        word_count: words.len(),
    })
}

/// Parse and resolve without emitting anything: a file or a directory.
pub fn check_path(path: &Path, options: &CompileOptions) -> Result<usize, Diagnostic> {
    let stdlib = load_stdlib(options)?;
    let project = if path.is_dir() {
        Project::load(path)?
    } else {
        Project::load_file(path)?
    };

    for unit in &project.units {
        if let Err(diags) = Generator::generate(&unit.class, &project.index, &stdlib) {
            render_diagnostics(&diags, &unit.path.to_string_lossy(), &unit.source);
            return Err(Diagnostic::stage(
                "codegen",
                format!("{} error(s) in '{}'", diags.len(), unit.path.display()),
            ));
        }
    }
    Ok(project.units.len())
}

/// Translate `.vm` IR text (one file or a directory of files) to assembly.
pub fn translate_ir(path: &Path, add_bootstrap: bool) -> Result<Vec<String>, Diagnostic> {
    let files: Vec<PathBuf> = if path.is_dir() {
        let entries = std::fs::read_dir(path)
            .map_err(|e| Diagnostic::stage("io", format!("cannot read '{}': {}", path.display(), e)))?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "vm"))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(Diagnostic::stage(
                "translate",
                format!("no .vm files found in '{}'", path.display()),
            ));
        }
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut units = Vec::with_capacity(files.len());
    for file in &files {
        let text = std::fs::read_to_string(file).map_err(|e| {
            Diagnostic::stage("io", format!("cannot read '{}': {}", file.display(), e))
        })?;
        units.push(lower::translate_text(&basename(file), &text)?);
    }
    Ok(lower::combine(units, add_bootstrap))
}

/// Assemble one `.asm` file to binary words.
pub fn assemble_file(path: &Path) -> Result<Vec<String>, Diagnostic> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Diagnostic::stage("io", format!("cannot read '{}': {}", path.display(), e))
    })?;
    asm::assemble(&text)
}

fn load_stdlib(options: &CompileOptions) -> Result<Stdlib, Diagnostic> {
    match &options.stdlib_path {
        Some(path) => Stdlib::load(path),
        None => Ok(Stdlib::builtin()),
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn write_artifact(path: &Path, text: &str) -> Result<(), Diagnostic> {
    std::fs::write(path, text)
        .map_err(|e| Diagnostic::stage("io", format!("cannot write '{}': {}", path.display(), e)))
}
