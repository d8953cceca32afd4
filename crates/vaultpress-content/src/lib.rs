//! Obsidian table import and newsletter documents.
//!
//! This crate turns an Obsidian Markdown table of collected articles into
//! normalized [`TableRow`]s, and writes newsletter issues as Markdown files
//! whose frontmatter survives a YAML-then-JSON round trip.
//!
//! # Modules
//!
//! - [`markdown`]: Table parsing, cell cleaning, frontmatter reading/writing
//! - [`row`]: The normalized row type with ordered passthrough columns
//! - [`included`]: Items included in an issue and their decoder
//! - [`news`]: News documents generated from table rows
//! - [`newsletter`]: Issue drafts, rendering, and saving
//! - [`catalog`]: Listing published news and notes
//!
//! # Example
//!
//! ```rust
//! use vaultpress_content::{parse_table, IncludedItem, NewsletterDraft};
//!
//! let rows = parse_table("| 文件路径 | 日期 | 标题 |\n|---|---|---|\n| 公开内容/新闻/a.md | 2024-03-01 | 甲 |").unwrap();
//!
//! let mut draft = NewsletterDraft::new("第 1 期");
//! draft.included_items = rows.iter().map(IncludedItem::from_row).collect();
//! let today = chrono::NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
//! let doc = draft.render(today).unwrap();
//! assert!(doc.contains("1. [甲](#a)"));
//! ```

pub mod catalog;
pub mod included;
pub mod markdown;
pub mod news;
pub mod newsletter;
pub mod row;

mod proptests;

pub use catalog::{ContentItem, ContentKind, list_content};
pub use included::{IncludedEntry, IncludedItem, decode_included_items, decode_included_value};
pub use markdown::{
    FrontmatterResult, FrontmatterWriter, escape_json_for_yaml, extract_frontmatter, parse_table,
    parse_table_file,
};
pub use news::render_news_document;
pub use newsletter::{NewsletterDraft, SavedNewsletter};
pub use row::{ExtraFields, TableRow};
