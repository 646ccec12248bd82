//! # Contexture CLI
//!
//! This is the binary entry point for the `contexture` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Translating command failures into an exit code from the error taxonomy.
//!
//! The core application logic lives in the library crate, keeping the binary
//! a thin wrapper around reusable functionality.

mod cli;
mod commands;

use clap::Parser;
use contexture::error::Error;

fn main() {
    let cli = cli::Cli::parse();
    if let Err(e) = cli.execute() {
        eprintln!("error: {e:#}");
        // Library errors carry their own exit code; anything else is 1.
        let code = e
            .downcast_ref::<Error>()
            .map(|err| err.kind().exit_code())
            .unwrap_or(1);
        std::process::exit(code);
    }
}
