//! Subcommand implementations.

#[cfg(feature = "google")]
pub mod auth;
pub mod cleanup;
pub mod config;
pub mod export;
