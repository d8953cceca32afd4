//! Catalog of published site content.
//!
//! News lives under `公开内容/新闻` and notes under `公开内容/笔记` in the
//! site content root. The catalog is what an editor picks issue items from.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vaultpress_core::util::files::{FindOptions, find_all_files};
use vaultpress_core::{Error, Result, read_text, slug_from_relative_path};

use crate::markdown::frontmatter::extract_frontmatter;

/// Kind of catalog entry, determined by its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    News,
    Notes,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::News, ContentKind::Notes];

    /// Directory under the content root.
    pub fn dir(self) -> &'static str {
        match self {
            ContentKind::News => "公开内容/新闻",
            ContentKind::Notes => "公开内容/笔记",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::News => f.write_str("news"),
            ContentKind::Notes => f.write_str("notes"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "news" | "新闻" => Ok(ContentKind::News),
            "notes" | "note" | "笔记" => Ok(ContentKind::Notes),
            other => Err(Error::validation(format!("Unknown content kind: {other}"))),
        }
    }
}

/// One published document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Path relative to the kind directory, without `.md`.
    pub slug: String,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// News only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub kind: ContentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chinese_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underwater_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_extraction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_companies: Option<String>,
}

impl ContentItem {
    /// Case-insensitive match on title, summary, or any tag.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&query)
            || self
                .summary
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&query))
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// Build an item from a document's text; `None` when it has no title.
pub fn parse_content_item(content: &str, slug: String, kind: ContentKind) -> Result<Option<ContentItem>> {
    let fm = extract_frontmatter(content)?;
    let Some(title) = fm.get_str("title").map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let text = |key: &str| fm.get_scalar_string(key).filter(|v| !v.is_empty());

    Ok(Some(ContentItem {
        slug,
        title: title.to_string(),
        date: text("date").unwrap_or_default(),
        tags: fm.get_string_list("tags"),
        summary: match kind {
            ContentKind::News => text("summary"),
            ContentKind::Notes => None,
        },
        kind,
        chinese_title: text("chineseTitle"),
        underwater_info: text("underwaterInfo"),
        case_extraction: text("caseExtraction"),
        related_companies: text("relatedCompanies"),
    }))
}

/// List the documents of the given kinds, newest first.
///
/// Documents that cannot be read or parsed, or that have no title, are
/// skipped with a warning. Items with equal dates keep directory order.
pub async fn list_content(content_root: &Path, kinds: &[ContentKind]) -> Result<Vec<ContentItem>> {
    let mut items = Vec::new();
    for &kind in kinds {
        let base = content_root.join(kind.dir());
        for file in find_all_files(&base, FindOptions::markdown()).await? {
            let content = match read_text(&file.path).await {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Skipping unreadable {}: {e}", file.path.display());
                    continue;
                }
            };
            let slug = slug_from_relative_path(&file.relative_path);
            match parse_content_item(&content, slug, kind) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => log::warn!("Skipping {} without a title", file.path.display()),
                Err(e) => log::warn!("Skipping {}: {e}", file.path.display()),
            }
        }
    }
    items.sort_by(|a, b| b.date.cmp(&a.date));
    log::debug!("Catalog holds {} items", items.len());
    Ok(items)
}
