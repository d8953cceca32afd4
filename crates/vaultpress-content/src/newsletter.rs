//! Newsletter issues as Markdown documents.
//!
//! A [`NewsletterDraft`] is what an editor submits; [`NewsletterDraft::save`]
//! writes it as `<file_name>.md` with a frontmatter block and a body that
//! lists the included items.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use vaultpress_core::{Error, Result, ensure_dir, truncate_chars, write_text};

use crate::included::{IncludedEntry, IncludedItem};
use crate::markdown::frontmatter::{FrontmatterWriter, single_line};

/// Default issue directory, relative to the site root.
pub const DEFAULT_NEWSLETTER_DIR: &str = "内容/公开内容/周报";

const ILLEGAL_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '[', ']', '(', ')'];
const MAX_FILE_NAME_CHARS: usize = 50;

/// Link text on one line with Markdown link brackets escaped.
fn link_text(heading: &str) -> String {
    let mut out = String::with_capacity(heading.len());
    for c in single_line(heading).trim().chars() {
        if matches!(c, '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Link target for a slug. Characters that would end or split a Markdown
/// link destination are percent-encoded; everything else is kept as is.
fn anchor(slug: &str) -> String {
    let mut out = String::with_capacity(slug.len());
    for c in slug.trim().chars() {
        let breaks_link = matches!(c, '(' | ')' | '<' | '>' | '[' | ']' | '"' | '\\' | '%');
        if breaks_link || c.is_whitespace() || c.is_control() {
            out.push_str(&urlencoding::encode(c.encode_utf8(&mut [0; 4])));
        } else {
            out.push(c);
        }
    }
    out
}

/// An issue as submitted by the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsletterDraft {
    pub title: String,
    /// `YYYY-MM-DD`; today when empty.
    pub date: String,
    pub cover_image: Option<String>,
    pub editorial_content: Option<String>,
    #[serde(deserialize_with = "deserialize_entries")]
    pub included_items: Vec<IncludedItem>,
    pub tags: Vec<String>,
    pub published: bool,
}

fn deserialize_entries<'de, D>(deserializer: D) -> std::result::Result<Vec<IncludedItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entries = Vec::<IncludedEntry>::deserialize(deserializer)?;
    Ok(entries.into_iter().map(IncludedItem::from).collect())
}

/// Where a saved issue landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedNewsletter {
    pub file_path: PathBuf,
    pub file_name: String,
}

/// File stem for an issue title.
///
/// Removes characters illegal in file names, turns whitespace runs into
/// `-`, lower-cases, and keeps at most 50 characters. Titles that reduce
/// to nothing become `newsletter`.
///
/// ```rust
/// use vaultpress_content::newsletter::file_name;
///
/// assert_eq!(file_name("Weekly: AI  周报 [12]"), "weekly-ai-周报-12");
/// ```
pub fn file_name(title: &str) -> String {
    let legal: String = title
        .chars()
        .filter(|c| !ILLEGAL_NAME_CHARS.contains(c))
        .collect();
    let hyphenated = whitespace_run_re().replace_all(&legal, "-").to_lowercase();
    let name = truncate_chars(&hyphenated, MAX_FILE_NAME_CHARS);
    if name.trim_matches('-').is_empty() {
        "newsletter".to_string()
    } else {
        name.to_string()
    }
}

fn whitespace_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace regex"))
}

impl NewsletterDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Reject drafts that cannot be written.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("周报标题不能为空"));
        }
        Ok(())
    }

    /// The issue date, or `today` when none was given.
    pub fn effective_date(&self, today: NaiveDate) -> String {
        let date = self.date.trim();
        if date.is_empty() {
            today.format("%Y-%m-%d").to_string()
        } else {
            date.to_string()
        }
    }

    /// The issue body: editorial text, then the list of included items.
    pub fn render_body(&self) -> String {
        let mut body = String::new();
        if let Some(editorial) = self.editorial_content.as_deref()
            && !editorial.trim().is_empty()
        {
            body.push_str(editorial);
            body.push_str("\n\n");
        }
        if !self.included_items.is_empty() {
            body.push_str("---\n\n## 本期内容\n\n本期周报包含了以下精选内容：\n\n");
            for (index, item) in self.included_items.iter().enumerate() {
                let position = index + 1;
                body.push_str(&format!(
                    "{position}. [{}](#{})\n",
                    link_text(&item.heading(position)),
                    anchor(&item.slug)
                ));
            }
            body.push_str("\n---\n\n");
        }
        body
    }

    /// The complete Markdown document, dated `today` if the draft has no date.
    pub fn render(&self, today: NaiveDate) -> Result<String> {
        self.validate()?;
        let mut writer = FrontmatterWriter::new()
            .string("title", &self.title)
            .date("date", &self.effective_date(today))
            .optional_string("coverImage", self.cover_image.as_deref())
            .tags("tags", &self.tags);
        if !self.included_items.is_empty() {
            writer = writer.json_string("includedItems", &self.included_items)?;
        }
        Ok(writer
            .boolean("published", self.published)
            .render(&self.render_body()))
    }

    /// Validate, render, and write the issue into `dir`.
    ///
    /// Nothing touches the filesystem when validation fails. The directory
    /// is created if needed; an existing file with the same name is
    /// replaced.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<SavedNewsletter> {
        self.save_dated(dir, Local::now().date_naive()).await
    }

    /// [`save`](Self::save) with an explicit reference date.
    pub async fn save_dated(&self, dir: impl AsRef<Path>, today: NaiveDate) -> Result<SavedNewsletter> {
        let content = self.render(today)?;
        let dir = dir.as_ref();
        ensure_dir(dir).await?;

        let file_name = format!("{}.md", file_name(&self.title));
        let file_path = dir.join(&file_name);
        write_text(&file_path, &content).await?;
        log::info!("Saved newsletter {}", file_path.display());

        Ok(SavedNewsletter {
            file_path,
            file_name,
        })
    }
}
