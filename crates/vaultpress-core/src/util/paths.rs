//! Path resolution utilities.
//!
//! Vault and content paths come from configuration files and may use `~`
//! or be relative to the directory the config file lives in.

use std::path::{Path, PathBuf};

/// Expands `~` and environment variables in a path.
///
/// Falls back to the input unchanged when expansion fails (for example an
/// undefined variable).
///
/// # Example
///
/// ```
/// use vaultpress_core::util::paths::expand_tilde;
///
/// let expanded = expand_tilde("~/vault");
/// assert!(!expanded.starts_with("~"));
/// ```
pub fn expand_tilde(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            log::debug!("Could not expand {path}: {e}");
            match dirs::home_dir() {
                Some(home) if path.starts_with("~/") => home.join(&path[2..]),
                _ => PathBuf::from(path),
            }
        }
    }
}

/// Resolve `path` against `base` unless it is already absolute.
///
/// A leading `./` is dropped so joined paths stay tidy.
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use vaultpress_core::util::paths::resolve_against;
///
/// assert_eq!(
///     resolve_against(Path::new("/site"), "./内容"),
///     PathBuf::from("/site/内容")
/// );
/// assert_eq!(resolve_against(Path::new("/site"), "/abs"), PathBuf::from("/abs"));
/// ```
pub fn resolve_against(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let trimmed = path.strip_prefix("./").unwrap_or(path);
    base.join(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_with_tilde() {
        let path = expand_tilde("~/test/path");
        assert!(!path.starts_with("~"), "Tilde should be expanded");
        if let Some(home) = dirs::home_dir() {
            assert!(path.starts_with(&home), "Path should start with home dir");
            assert!(path.ends_with("test/path"), "Path should preserve suffix");
        }
    }

    #[test]
    fn test_expand_tilde_absolute_unchanged() {
        assert_eq!(expand_tilde("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_tilde_relative_unchanged() {
        assert_eq!(expand_tilde("relative/path"), PathBuf::from("relative/path"));
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_against(Path::new("/vault"), "公开内容/新闻/a.md"),
            PathBuf::from("/vault/公开内容/新闻/a.md")
        );
    }

    #[test]
    fn test_resolve_absolute() {
        assert_eq!(
            resolve_against(Path::new("/vault"), "/elsewhere/a.md"),
            PathBuf::from("/elsewhere/a.md")
        );
    }
}
