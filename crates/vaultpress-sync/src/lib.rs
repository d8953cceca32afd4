//! Getting selected rows from the vault onto the site.
//!
//! # Modules
//!
//! - [`filter`]: Date, tag, and score filters over parsed rows
//! - [`sync`]: Copying vault notes (or generating documents) into the content root
//! - [`publish`]: Committing and pushing newsletter changes with git

pub mod filter;
pub mod publish;
pub mod sync;

pub use filter::{DateRange, FilterConfig, filter_rows, normalize_date};
pub use publish::{ChangeSet, GitPublisher, PublishOutcome, PublishReport, parse_porcelain};
pub use sync::{PlannedSync, SyncConfig, SyncMode, SyncOptions, SyncStats, plan_sync, sync_rows};
