//! Command-line interface for vaultpress.
//!
//! - [`cli`]: clap argument types
//! - [`config`]: [`VaultpressConfig`](config::VaultpressConfig), loaded with `confyg`
//! - [`config_handlers`]: `config path|get|set|init|export`
//! - [`commands`]: parse, sync, newsletter, content, and publish handlers
//! - [`app`]: logging setup and dispatch

#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;

pub use cli::CliArgs;
pub use config::VaultpressConfig;
