//! # Ferme Architecture
//!
//! Ferme is a **UI-agnostic farm management library**. It tracks plots, input stock
//! and field alerts for each farmer, and predicts what needs doing on each plot today
//! from its crop calendar and the weather.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (crates/ferme)                                         │
//! │  - Parses arguments, renders output, owns the exit code     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs, init.rs)                                │
//! │  - Thin facade over commands, wired from configuration      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Business rules, validation, task aggregation             │
//! │  - Talks to the store with statement text and $N params     │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                         │
//!                    ▼                         ▼
//! ┌──────────────────────────────┐ ┌────────────────────────────┐
//! │  Prediction (prediction.rs,  │ │  Storage Layer (store/)    │
//! │  phases.rs, weather.rs)      │ │  - Statement emulation     │
//! │  - Pure, no I/O              │ │  - JSON file or memory     │
//! └──────────────────────────────┘ └────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never prints and never exits. The prediction engine is
//! pure: the same plot, weather and clock always give the same tasks.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`init`]: Builds an API from configuration
//! - [`commands`]: Business logic for each operation
//! - [`store`]: Statement emulation and persistence
//! - [`prediction`]: Task generation for one plot
//! - [`phases`]: Crop calendars
//! - [`weather`]: Weather snapshots and sources
//! - [`model`]: Table rows
//! - [`config`]: Configuration loading
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod init;
pub mod model;
pub mod phases;
pub mod prediction;
pub mod store;
pub mod weather;
