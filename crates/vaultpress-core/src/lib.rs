//! Shared errors, traits, and utilities for vaultpress.
//!
//! This crate provides the foundational types used across all vaultpress
//! crates. It has no internal vaultpress dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`traits`]: Configuration management trait used by the CLI
//! - [`util`]: File, path, and slug utilities

pub mod error;
pub mod traits;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use traits::ConfigManager;

// Convenience re-exports from util
pub use util::files::{ensure_dir, read_text, write_text};
pub use util::ids::{slug_from_relative_path, truncate_chars};
pub use util::paths::{expand_tilde, resolve_against};
