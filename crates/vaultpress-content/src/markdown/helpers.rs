//! Cell cleaning and value normalization helpers.
//!
//! Obsidian tables carry inline Markdown, HTML entities, and `<br>` tags
//! inside cells. These helpers turn raw cell text into the plain values
//! stored on a [`TableRow`](crate::row::TableRow).
//!
//! # Key Functions
//!
//! - [`clean_inline`]: Strip links, numeric entities, and HTML tags
//! - [`br_to_newlines`] / [`br_to_commas`]: Normalize `<br>` variants
//! - [`parse_tags`]: Split a tag cell on commas and whitespace
//! - [`parse_score`]: Lenient numeric parsing
//! - [`synthesize_file_path`]: Derive a content path from a title
//!
//! # Example
//!
//! ```rust
//! use vaultpress_content::markdown::helpers::{clean_inline, br_to_commas};
//!
//! assert_eq!(clean_inline("[OpenAI 发布](https://x.y) &#128293;"), "OpenAI 发布");
//! assert_eq!(br_to_commas("OpenAI<br>Google<BR/>"), "OpenAI, Google");
//! ```

use std::sync::OnceLock;

use regex::Regex;
use vaultpress_core::truncate_chars;

/// Directory (relative to the vault) that synthesized paths live under.
pub const NEWS_PATH_PREFIX: &str = "公开内容/新闻/";

/// Maximum length, in characters, of a synthesized file stem.
pub const MAX_STEM_CHARS: usize = 50;

/// Characters removed from titles before they become file names.
const ILLEGAL_FILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '[', ']', '(', ')'];

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("Invalid link regex"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&#\d+;").expect("Invalid entity regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"))
}

fn br_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("Invalid br regex"))
}

fn tag_separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[,，\s]+").expect("Invalid tag separator regex"))
}

fn numeric_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("Invalid number regex")
    })
}

fn hyphen_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s-]+").expect("Invalid hyphen regex"))
}

/// Replace Markdown links `[text](url)` with their text.
pub fn strip_markdown_links(input: &str) -> String {
    link_re().replace_all(input, "$1").into_owned()
}

/// Remove numeric HTML entities such as `&#128293;`.
pub fn strip_numeric_entities(input: &str) -> String {
    entity_re().replace_all(input, "").into_owned()
}

/// Remove anything that looks like an HTML tag.
pub fn strip_html_tags(input: &str) -> String {
    tag_re().replace_all(input, "").into_owned()
}

/// Clean a title-like cell: links become their text, numeric entities and
/// HTML tags are removed, and the result is trimmed.
pub fn clean_inline(input: &str) -> String {
    let text = strip_markdown_links(input);
    let text = strip_numeric_entities(&text);
    strip_html_tags(&text).trim().to_string()
}

/// Split a cell on every `<br>` variant (`<br>`, `<br/>`, `<br />`, any case).
pub fn split_br(input: &str) -> Vec<&str> {
    br_re().split(input).collect()
}

/// Convert `<br>` variants to newlines, then clean each line.
///
/// Line order is kept; lines are trimmed but blank lines in the middle are
/// preserved so paragraph breaks survive.
pub fn br_to_newlines(input: &str) -> String {
    let lines: Vec<String> = split_br(input).into_iter().map(clean_inline).collect();
    lines.join("\n").trim().to_string()
}

/// Convert `<br>`-separated values into a `", "`-joined list.
///
/// Empty segments are dropped, so a trailing `<br>` does not leave a
/// dangling separator.
pub fn br_to_commas(input: &str) -> String {
    split_br(input)
        .into_iter()
        .map(clean_inline)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Split a tag cell on runs of ASCII commas, full-width commas, and
/// whitespace, dropping empty pieces.
pub fn parse_tags(input: &str) -> Vec<String> {
    tag_separator_re()
        .split(input)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Values of a `类型` cell: split on `<br>`, cleaned, empties dropped.
pub fn parse_type_values(input: &str) -> Vec<String> {
    split_br(input)
        .into_iter()
        .map(clean_inline)
        .filter(|value| !value.is_empty())
        .collect()
}

/// Parse a score cell.
///
/// Leading whitespace is skipped and the longest numeric prefix is used,
/// so `"4.5分"` yields `4.5`. Returns `None` when no number is present or
/// the value is not finite. `"0"` yields `Some(0.0)`.
pub fn parse_score(input: &str) -> Option<f64> {
    let trimmed = input.trim_start();
    let matched = numeric_prefix_re().find(trimmed)?;
    matched
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|score| score.is_finite())
}

/// Turn a title into a file stem.
///
/// Applies [`clean_inline`], removes characters that are illegal in file
/// names or Markdown links, collapses whitespace and hyphen runs into one
/// `-`, trims hyphens from both ends, and truncates to
/// [`MAX_STEM_CHARS`] characters (never splitting a character).
pub fn sanitize_file_stem(title: &str) -> String {
    let cleaned = clean_inline(title);
    let legal: String = cleaned
        .chars()
        .filter(|c| !ILLEGAL_FILE_CHARS.contains(c))
        .collect();
    let hyphenated = hyphen_run_re().replace_all(&legal, "-");
    let trimmed = hyphenated.trim_matches('-');
    truncate_chars(trimmed, MAX_STEM_CHARS)
        .trim_end_matches('-')
        .to_string()
}

/// Build `公开内容/新闻/<stem>.md` for a row that has a title but no path.
///
/// When the title sanitizes to nothing, the first whitespace-separated
/// token of the date (with `-` removed) is used, then `untitled`.
pub fn synthesize_file_path(title: &str, date: &str) -> String {
    let mut stem = sanitize_file_stem(title);
    if stem.is_empty() {
        stem = date
            .split_whitespace()
            .next()
            .map(|token| token.replace('-', ""))
            .filter(|token| !token.is_empty())
            .unwrap_or_else(|| "untitled".to_string());
    }
    format!("{NEWS_PATH_PREFIX}{stem}.md")
}
