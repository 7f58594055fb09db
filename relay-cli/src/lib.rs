//! # llm-relay
//!
//! Thin orchestration CLI that forwards chat requests to external
//! model-serving command-line tools through [`llm_relay_process`].

/// Command-line surface.
pub mod cli;
/// Subcommand implementations.
pub mod commands;
/// Configuration loading.
pub mod config;
/// Public error types.
pub mod errors;

pub use errors::Error;
