//! RecordVault CLI - operator and scripting front end for RecordVault
//!
//! Provisions keys and admins, issues session tokens, and runs token-gated
//! record operations against the core library.

mod app;
mod cli;
mod commands;
mod config;
mod errors;
mod logging;
mod output;

use clap::Parser;

use crate::app::AppContext;
use crate::cli::Cli;
use crate::errors::exit_code_for;

fn main() {
    let cli = Cli::parse();

    let result = AppContext::new(&cli).and_then(|ctx| {
        logging::init_logging(&ctx.logging_settings());
        commands::dispatch(&ctx)
    });

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code_for(&err));
    }
}
