//! simple-maps - command-line client for the cartes.io mapping platform

use std::process::ExitCode;

use colored::Colorize;

mod cli;
mod commands;
mod output;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format!("{err:#}").red());
            ExitCode::FAILURE
        }
    }
}
