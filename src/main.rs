//! # snapmatch CLI
//!
//! Command-line interface for SnapMatch.
//!
//! ## Usage
//! ```bash
//! snapmatch --raw ~/Archive --edited ~/Exports --out ~/Matched
//! snapmatch --raw ~/Archive --edited ~/Exports --out ~/Matched --dry-run --output json
//! ```

mod cli;

use console::style;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
