use std::path::PathBuf;
use std::process;

use clap::Args;

#[derive(Args)]
pub struct CheckArgs {
    /// A .src file or a directory of them
    #[arg(default_value = ".")]
    pub input: PathBuf,
    /// Replacement standard-library descriptor file
    #[arg(long, value_name = "PATH")]
    pub stdlib: Option<PathBuf>,
}

pub fn cmd_check(args: CheckArgs) {
    let options = crucible::CompileOptions {
        stdlib_path: args.stdlib,
        ..Default::default()
    };

    match crucible::check_path(&args.input, &options) {
        Ok(units) => eprintln!("OK ({} unit(s))", units),
        Err(e) => {
            eprintln!("error: {}", e.message);
            process::exit(1);
        }
    }
}
