mod cli;

use clap::{Parser, Subcommand};

use cli::assemble::AssembleArgs;
use cli::build::BuildArgs;
use cli::check::CheckArgs;
use cli::translate::TranslateArgs;

#[derive(Parser)]
#[command(
    name = "crucible",
    version,
    about = "Crucible compiler — class-based source to 16-bit machine code"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a directory of .src files to machine code
    Build(BuildArgs),
    /// Parse and resolve a file or directory without emitting code
    Check(CheckArgs),
    /// Translate stack IR (.vm) to target assembly
    Translate(TranslateArgs),
    /// Assemble target assembly (.asm) to binary words
    Assemble(AssembleArgs),
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => cli::build::cmd_build(args),
        Command::Check(args) => cli::check::cmd_check(args),
        Command::Translate(args) => cli::translate::cmd_translate(args),
        Command::Assemble(args) => cli::assemble::cmd_assemble(args),
    }
}
