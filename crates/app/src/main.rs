use std::process::ExitCode;

use clap::Parser;

use epicevents_app::cli::{self, Cli};

fn main() -> ExitCode {
    epicevents_observability::init();

    match cli::run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
