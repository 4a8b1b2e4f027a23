//! # Ferme CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, this file only
//! invokes `cli::run()` and turns an error into exit code 1.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/ferme/src/cli/)                          │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - logging, config, dispatch (commands.rs)                  │
//! │  - terminal rendering (render.rs)                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  fermeapp: FermeApi → commands → store / prediction         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything from the API inward returns plain Rust values. Printing, colors and
//! the exit code are decided here.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
