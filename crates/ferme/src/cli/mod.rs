//! # CLI Behavior
//!
//! One possible UI client for fermeapp. It is the only place that knows about
//! terminal output and exit codes.
//!
//! ## Naked Execution (`ferme`)
//!
//! Running `ferme` with no subcommand shows the dashboard.
//!
//! ## Global Options
//!
//! - `--user <id>`: whose rows to read and write (default: the demo user, 1)
//! - `--data <file>`: JSON document to use instead of the configured one
//! - `--read-only`: simulate writes; nothing reaches the file
//! - `--strict`: `ferme query` fails on statements the store does not recognize
//! - `-v`: debug logging on stderr (`RUST_LOG` takes precedence)
//!
//! ## Module Structure
//!
//! - `setup`: argument parsing via clap
//! - `commands`: context wiring and dispatch
//! - `render`: output formatting

mod commands;
mod render;
pub mod setup;

pub use commands::run;
