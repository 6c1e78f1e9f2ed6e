//! CLI, configuration and command pipelines.
//!
//! This crate provides the `tasklog` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;
pub mod signals;

pub use cli::Cli;
pub use config::AppConfig;
pub use error::{ClientError, ClientResult};
