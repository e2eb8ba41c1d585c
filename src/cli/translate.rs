use std::path::PathBuf;
use std::process;

use clap::Args;

use super::parse_yes_no;

#[derive(Args)]
pub struct TranslateArgs {
    /// A .vm file or a directory of them
    pub input: PathBuf,
    /// Output .asm file (default: <input>.asm, or out.asm for a directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Prepend the SP-initialisation bootstrap
    #[arg(
        long = "add-bootstrap-code",
        value_name = "yes|no",
        default_value = "no",
        value_parser = parse_yes_no
    )]
    pub add_bootstrap_code: bool,
}

pub fn cmd_translate(args: TranslateArgs) {
    let lines = match crucible::translate_ir(&args.input, args.add_bootstrap_code) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("error: {}", e.message);
            process::exit(1);
        }
    };

    let out_path = args.output.unwrap_or_else(|| {
        if args.input.is_dir() {
            args.input.join("out.asm")
        } else {
            args.input.with_extension("asm")
        }
    });

    let mut text = lines.join("\n");
    text.push('\n');
    if let Err(e) = std::fs::write(&out_path, text) {
        eprintln!("error: cannot write '{}': {}", out_path.display(), e);
        process::exit(1);
    }
    eprintln!("Translated -> {}", out_path.display());
}
