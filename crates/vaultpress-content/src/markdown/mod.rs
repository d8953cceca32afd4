//! Markdown-level building blocks.
//!
//! - [`table`]: Obsidian pipe-table parsing into [`TableRow`](crate::row::TableRow)s
//! - [`helpers`]: Cell cleaning and value normalization
//! - [`frontmatter`]: YAML frontmatter reading, writing, and escaping

pub mod frontmatter;
pub mod helpers;
pub mod table;

pub use frontmatter::{
    FrontmatterResult, FrontmatterWriter, escape_json_for_yaml, extract_frontmatter, quote_yaml,
};
pub use helpers::{br_to_commas, br_to_newlines, clean_inline, parse_score, parse_tags};
pub use table::{parse_table, parse_table_file, split_cells};
