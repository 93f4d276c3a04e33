//! Charagen - Command-line tool for generating layered pixel-art characters

use std::process::ExitCode;

use charagen::cli;

fn main() -> ExitCode {
    cli::run()
}
