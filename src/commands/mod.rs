//! Command handlers behind the CLI.
//!
//! Each submodule holds the logic for one group of subcommands, kept out of
//! `main.rs` so it can be driven from tests.

pub mod config;
pub mod run;

pub use config::{init_config, resolve_settings, show_config};
pub use run::{run, RunReport};
