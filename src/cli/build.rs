use std::path::PathBuf;
use std::process;

use clap::Args;

use super::parse_yes_no;

#[derive(Args)]
pub struct BuildArgs {
    /// Directory holding the .src compilation set
    #[arg(default_value = ".")]
    pub input: PathBuf,
    /// Initialise SP to 256 before the program runs
    #[arg(
        long = "add-bootstrap-code",
        value_name = "yes|no",
        default_value = "yes",
        value_parser = parse_yes_no
    )]
    pub add_bootstrap_code: bool,
    /// Keep per-unit parse-tree dumps (<Class>.xml)
    #[arg(
        long = "keep-xml",
        value_name = "yes|no",
        default_value = "no",
        value_parser = parse_yes_no
    )]
    pub keep_xml: bool,
    /// Keep per-unit IR listings (<Class>.vm)
    #[arg(
        long = "keep-vm",
        value_name = "yes|no",
        default_value = "no",
        value_parser = parse_yes_no
    )]
    pub keep_vm: bool,
    /// Keep per-unit assembly and the combined out.asm
    #[arg(
        long = "keep-asm",
        value_name = "yes|no",
        default_value = "no",
        value_parser = parse_yes_no
    )]
    pub keep_asm: bool,
    /// Replacement standard-library descriptor file
    #[arg(long, value_name = "PATH")]
    pub stdlib: Option<PathBuf>,
}

pub fn cmd_build(args: BuildArgs) {
    let options = crucible::CompileOptions {
        add_bootstrap: args.add_bootstrap_code,
        keep_xml: args.keep_xml,
        keep_vm: args.keep_vm,
        keep_asm: args.keep_asm,
        stdlib_path: args.stdlib,
    };

    eprintln!("Compiling {}...", args.input.display());
    match crucible::compile_directory(&args.input, &options) {
        Ok(artifacts) => {
            eprintln!(
                "Compiled {} unit(s) -> {} ({} words)",
                artifacts.unit_names.len(),
                artifacts.bin_path.display(),
                artifacts.word_count
            );
        }
        Err(e) => {
            eprintln!("error: {}", e.message);
            process::exit(1);
        }
    }
}
