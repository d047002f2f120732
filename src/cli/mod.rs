//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Create a `.taskrank/` project directory |
//! | `analyze` | Score every task in a batch, optionally saving it |
//! | `suggest` | Dependency-aware top suggestions with an explanation |
//! | `history` | List or clear saved tasks |
//! | `config` | Show the effective configuration |
//!
//! ## Input
//!
//! `analyze` and `suggest` read JSON from a file argument or stdin, either
//! `{"tasks": [...], "save": false}` or a bare list of tasks.
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - Human-readable tables
//! - `json` - Machine-parseable JSON; rejected batches print an error body
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logging on stderr, or set `RUST_LOG`:
//! ```bash
//! taskrank --verbose suggest tasks.json
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod input;
mod analyze;
mod suggest;
mod history;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
