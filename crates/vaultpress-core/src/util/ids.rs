//! Slug and identifier utilities.
//!
//! Content items are addressed by slugs derived from their path under a
//! content-kind directory: `公开内容/新闻/2024/ai-chips.md` under the news
//! directory has slug `2024/ai-chips`.

use std::path::{Component, Path};

/// Derive a slug from a path relative to a content-kind directory.
///
/// Path separators are normalized to `/` and a trailing `.md` is removed.
/// The text is otherwise kept as-is so that slugs written into newsletters
/// keep matching the rendered site.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use vaultpress_core::util::ids::slug_from_relative_path;
///
/// assert_eq!(slug_from_relative_path(Path::new("AI芯片新进展.md")), "AI芯片新进展");
/// assert_eq!(slug_from_relative_path(Path::new("2024/week-1.md")), "2024/week-1");
/// ```
pub fn slug_from_relative_path(path: &Path) -> String {
    let joined = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    joined
        .strip_suffix(".md")
        .map(str::to_string)
        .unwrap_or(joined)
}

/// Truncate a string to at most `max_chars` characters.
///
/// Counts Unicode scalar values, never bytes, so multi-byte text is never
/// split inside a character.
///
/// # Examples
///
/// ```
/// use vaultpress_core::util::ids::truncate_chars;
///
/// assert_eq!(truncate_chars("人工智能芯片", 4), "人工智能");
/// assert_eq!(truncate_chars("short", 50), "short");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // slug_from_relative_path tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_slug_simple() {
        assert_eq!(slug_from_relative_path(Path::new("news.md")), "news");
    }

    #[test]
    fn test_slug_nested() {
        assert_eq!(
            slug_from_relative_path(Path::new("2024/01/芯片.md")),
            "2024/01/芯片"
        );
    }

    #[test]
    fn test_slug_without_extension() {
        assert_eq!(slug_from_relative_path(Path::new("README")), "README");
    }

    #[test]
    fn test_slug_keeps_inner_dots() {
        assert_eq!(slug_from_relative_path(Path::new("v1.2-notes.md")), "v1.2-notes");
    }

    #[test]
    fn test_slug_skips_current_dir() {
        assert_eq!(slug_from_relative_path(Path::new("./a/b.md")), "a/b");
    }

    // -------------------------------------------------------------------------
    // truncate_chars tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_truncate_multibyte() {
        let title = "这是一个非常长的中文标题".repeat(10);
        let cut = truncate_chars(&title, 50);
        assert_eq!(cut.chars().count(), 50);
        assert!(title.starts_with(cut));
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate_chars("abc", 3), "abc");
    }

    #[test]
    fn test_truncate_zero() {
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
