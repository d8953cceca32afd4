//! Items included in a newsletter issue.
//!
//! Issues store their items as a JSON array embedded in the
//! `includedItems` frontmatter string. Older issues stored a plain array of
//! slugs, and some hand-edited files contain raw control characters inside
//! the JSON strings; [`decode_included_items`] accepts all of these.
//! Issues written by the first admin tool hold a YAML sequence instead of
//! a string; [`decode_included_value`] accepts either shape.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use vaultpress_core::{Error, Result};

use crate::catalog::ContentItem;
use crate::row::TableRow;

/// One item in an issue, with the editor's per-issue text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedItem {
    pub slug: String,
    #[serde(default)]
    pub chinese_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underwater_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_extraction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_companies: Option<String>,
}

impl IncludedItem {
    /// An item known only by slug (legacy issues).
    pub fn from_slug(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Default::default()
        }
    }

    /// Seed an item from a parsed table row.
    pub fn from_row(row: &TableRow) -> Self {
        let text = |chinese: &str, camel: &str| row.lookup(chinese, camel).map(String::from);
        Self {
            slug: row.slug(),
            chinese_title: row.display_title().unwrap_or_default().to_string(),
            underwater_info: text("水下信息", "underwaterInfo"),
            case_extraction: text("案例提取", "caseExtraction"),
            related_companies: text("涉及公司", "relatedCompanies"),
        }
    }

    /// Seed an item from a catalog entry, preferring its Chinese title.
    pub fn from_content(item: &ContentItem) -> Self {
        Self {
            slug: item.slug.clone(),
            chinese_title: item
                .chinese_title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| item.title.clone()),
            underwater_info: item.underwater_info.clone(),
            case_extraction: item.case_extraction.clone(),
            related_companies: item.related_companies.clone(),
        }
    }

    /// Title shown in the issue body; falls back to `内容 N` (1-based).
    pub fn heading(&self, position: usize) -> String {
        if self.chinese_title.trim().is_empty() {
            format!("内容 {position}")
        } else {
            self.chinese_title.clone()
        }
    }
}

/// An entry as accepted from callers: a full item or a legacy slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncludedEntry {
    Slug(String),
    Item(IncludedItem),
}

impl From<IncludedEntry> for IncludedItem {
    fn from(entry: IncludedEntry) -> Self {
        match entry {
            IncludedEntry::Slug(slug) => IncludedItem::from_slug(slug),
            IncludedEntry::Item(item) => item,
        }
    }
}

/// Decode the `includedItems` string from a newsletter's frontmatter.
///
/// Empty input yields no items. When the first JSON parse fails, raw
/// control characters inside string literals are escaped and the parse is
/// retried once.
///
/// ```rust
/// use vaultpress_content::included::decode_included_items;
///
/// let items = decode_included_items(r#"["a", {"slug":"b","chineseTitle":"乙"}]"#).unwrap();
/// assert_eq!(items[0].slug, "a");
/// assert_eq!(items[1].chinese_title, "乙");
/// ```
pub fn decode_included_items(raw: &str) -> Result<Vec<IncludedItem>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<IncludedEntry> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(first) => {
            log::debug!("includedItems did not parse ({first}); repairing control characters");
            let repaired = repair_control_chars(raw);
            serde_json::from_str(&repaired)
                .map_err(|e| Error::parse(format!("Invalid includedItems JSON: {e}")))?
        }
    };
    Ok(entries.into_iter().map(IncludedItem::from).collect())
}

/// Decode an `includedItems` frontmatter value of any stored shape.
///
/// A string is decoded as embedded JSON; a sequence holds slugs or item
/// mappings directly; null means no items.
pub fn decode_included_value(value: &Value) -> Result<Vec<IncludedItem>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(raw) => decode_included_items(raw),
        Value::Sequence(_) => {
            let entries: Vec<IncludedEntry> = serde_yaml::from_value(value.clone())
                .map_err(|e| Error::parse(format!("Invalid includedItems sequence: {e}")))?;
            Ok(entries.into_iter().map(IncludedItem::from).collect())
        }
        other => Err(Error::parse(format!(
            "includedItems must be a string or a sequence, found {other:?}"
        ))),
    }
}

/// Escape raw control characters that appear inside JSON string literals.
///
/// Characters outside strings and existing escape sequences are left
/// untouched. `\b \t \n \f \r` use their short forms; other controls
/// become `\uXXXX`.
pub fn repair_control_chars(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;
    for c in raw.chars() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }
        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_string = false;
                out.push(c);
            }
            '\u{8}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
