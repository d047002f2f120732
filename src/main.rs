//! taskrank - score tasks and suggest what to work on next

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = taskrank::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
