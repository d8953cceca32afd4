//! Utility modules for file operations, path handling, and slugs.
//!
//! # Modules
//!
//! - [`files`]: Async file reading, writing, copying, and discovery
//! - [`ids`]: Slug derivation and character-safe truncation
//! - [`paths`]: Tilde expansion and relative path resolution

pub mod files;
pub mod ids;
pub mod paths;
