use std::path::PathBuf;
use std::process;

use clap::Args;

#[derive(Args)]
pub struct AssembleArgs {
    /// Input .asm file
    pub input: PathBuf,
    /// Output file (default: <input>.bin)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn cmd_assemble(args: AssembleArgs) {
    let words = match crucible::assemble_file(&args.input) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("error: {}", e.message);
            process::exit(1);
        }
    };

    let out_path = args
        .output
        .unwrap_or_else(|| args.input.with_extension("bin"));

    let mut text = words.join("\n");
    text.push('\n');
    if let Err(e) = std::fs::write(&out_path, text) {
        eprintln!("error: cannot write '{}': {}", out_path.display(), e);
        process::exit(1);
    }
    eprintln!("Assembled {} word(s) -> {}", words.len(), out_path.display());
}
