//! antdoc CLI entry point.

use clap::Parser;

use antdoc::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Analyze(args) => match cli::run_analyze(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                EXIT_ERROR
            }
        },
        Commands::Tags(args) => match cli::run_tags(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                EXIT_ERROR
            }
        },
    };

    std::process::exit(exit_code);
}
