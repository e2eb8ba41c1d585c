//! Phase 1 of the front end: discover, parse, and index a compilation set.
//!
//! Every `.src` file in the directory is one compilation unit. Units parse
//! independently, so phase 1 fans out across a rayon pool; the global
//! subroutine index is built only after the parallel barrier, and is
//! frozen before phase 2 (code generation) reads it.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::ast;
use crate::diagnostic::Diagnostic;
use crate::sym::GlobalIndex;

/// One parsed compilation unit.
#[derive(Debug)]
pub struct ParsedUnit {
    /// Unit name = file basename = class name.
    pub name: String,
    pub path: PathBuf,
    pub source: String,
    pub class: ast::Class,
}

/// A fully parsed compilation set with its frozen subroutine index.
#[derive(Debug)]
pub struct Project {
    pub units: Vec<ParsedUnit>,
    pub index: GlobalIndex,
}

impl Project {
    /// Load every unit under `dir` (sorted by name for deterministic
    /// output order), parse them in parallel, and build the index.
    pub fn load(dir: &Path) -> Result<Project, Diagnostic> {
        let files = collect_source_files(dir)?;
        if files.is_empty() {
            return Err(Diagnostic::stage(
                "parse",
                format!("no .src files found in '{}'", dir.display()),
            ));
        }

        let parsed: Vec<Result<ParsedUnit, Diagnostic>> = files
            .par_iter()
            .enumerate()
            .map(|(unit_id, path)| load_unit(path, unit_id as u16))
            .collect();

        let mut units = Vec::with_capacity(parsed.len());
        for result in parsed {
            units.push(result?);
        }

        let mut index = GlobalIndex::new();
        for unit in &units {
            index.add_class(&unit.class);
        }

        Ok(Project { units, index })
    }

    /// Load a single `.src` file as a one-unit compilation set.
    pub fn load_file(path: &Path) -> Result<Project, Diagnostic> {
        let unit = load_unit(path, 0)?;
        let mut index = GlobalIndex::new();
        index.add_class(&unit.class);
        Ok(Project {
            units: vec![unit],
            index,
        })
    }
}

fn load_unit(path: &Path, unit_id: u16) -> Result<ParsedUnit, Diagnostic> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        Diagnostic::stage("io", format!("cannot read '{}': {}", path.display(), e))
    })?;
    let filename = path.to_string_lossy();

    let class = crate::parse_source(&source, &filename, unit_id).map_err(|diags| {
        Diagnostic::stage(
            "parse",
            format!("{} error(s) in '{}'", diags.len(), filename),
        )
    })?;

    let name = basename(path);
    if class.name.node != name {
        Diagnostic::error(
            format!(
                "class '{}' does not match its file name '{}'",
                class.name.node,
                path.file_name().unwrap_or_default().to_string_lossy()
            ),
            class.name.span,
        )
        .with_help(format!("rename the class or the file to '{}'", name))
        .render(&filename, &source);
        return Err(Diagnostic::stage(
            "parse",
            format!("class/file name mismatch in '{}'", filename),
        ));
    }

    Ok(ParsedUnit {
        name,
        path: path.to_path_buf(),
        source,
        class,
    })
}

/// Non-recursive directory walk, `.src` files only, sorted by name.
fn collect_source_files(dir: &Path) -> Result<Vec<PathBuf>, Diagnostic> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Diagnostic::stage("io", format!("cannot read '{}': {}", dir.display(), e))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "src"))
        .collect();
    files.sort();
    Ok(files)
}

pub(crate) fn basename(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).expect("write");
    }

    #[test]
    fn test_load_directory_builds_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "Main.src",
            "class Main { function void main() { do Helper.run(); return; } }",
        );
        write(
            dir.path(),
            "Helper.src",
            "class Helper { function void run() { return; } }",
        );

        let project = Project::load(dir.path()).expect("load");
        assert_eq!(project.units.len(), 2);
        // Sorted by file name.
        assert_eq!(project.units[0].name, "Helper");
        assert_eq!(project.units[1].name, "Main");
        assert!(project.index.lookup("Helper", "run").is_some());
        assert!(project.index.lookup("Main", "main").is_some());
    }

    #[test]
    fn test_empty_directory_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Project::load(dir.path()).unwrap_err();
        assert!(err.message.contains("no .src files"));
    }

    #[test]
    fn test_class_name_must_match_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "Main.src", "class Wrong { }");
        let err = Project::load(dir.path()).unwrap_err();
        assert!(err.message.contains("mismatch"));
    }

    #[test]
    fn test_parse_error_surfaces_as_stage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "Main.src", "class Main { function }");
        let err = Project::load(dir.path()).unwrap_err();
        assert!(err.message.starts_with("parse:"), "got: {}", err.message);
    }

    #[test]
    fn test_non_src_files_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "Main.src", "class Main { }");
        write(dir.path(), "notes.txt", "not source");
        let project = Project::load(dir.path()).expect("load");
        assert_eq!(project.units.len(), 1);
    }
}
