//! Async file utilities for vaultpress.
//!
//! Provides the file discovery, reading, and writing operations shared by
//! the table parser, the newsletter writer, the sync engine, and the
//! content catalog.

use async_walkdir::WalkDir;
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

use crate::{Error, Result};

/// Create a directory and all of its parents.
///
/// Succeeds when the directory already exists, so calling it repeatedly
/// on the same path is safe.
///
/// # Example
///
/// ```no_run
/// # use vaultpress_core::util::files::ensure_dir;
/// # async fn example() -> vaultpress_core::Result<()> {
/// ensure_dir("内容/公开内容/周报").await?;
/// ensure_dir("内容/公开内容/周报").await?;
/// # Ok(())
/// # }
/// ```
pub async fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match fs::create_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(Error::io_with_path(e, path)),
    }
}

/// Read a UTF-8 text file.
///
/// Returns [`Error::FileNotFound`] when the path does not exist, and an
/// I/O error carrying the path for any other failure.
pub async fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    match fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::file_not_found(path)),
        Err(e) => Err(Error::io_with_path(e, path)),
    }
}

/// Write a UTF-8 text file, replacing any existing content.
pub async fn write_text(path: impl AsRef<Path>, content: &str) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, content)
        .await
        .map_err(|e| Error::io_with_path(e, path))
}

/// Copy `from` to `to`, creating the parent directory of `to` first.
pub async fn copy_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<u64> {
    let (from, to) = (from.as_ref(), to.as_ref());
    if let Some(parent) = to.parent() {
        ensure_dir(parent).await?;
    }
    fs::copy(from, to)
        .await
        .map_err(|e| Error::io_with_path(e, from))
}

/// Check whether a path exists without treating errors as fatal.
pub async fn exists(path: impl AsRef<Path>) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Last modification time of a file.
pub async fn modified_time(path: impl AsRef<Path>) -> Result<SystemTime> {
    let path = path.as_ref();
    let meta = fs::metadata(path)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    meta.modified().map_err(|e| Error::io_with_path(e, path))
}

/// Options for finding files.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// File extension to match (without dot), e.g., "md"
    pub extension: Option<&'static str>,
    /// Maximum directory depth to search (None = unlimited)
    pub max_depth: Option<usize>,
}

impl FindOptions {
    /// Create options for finding markdown files.
    pub fn markdown() -> Self {
        Self {
            extension: Some("md"),
            max_depth: None,
        }
    }

    /// Set maximum search depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the file.
    pub path: PathBuf,
    /// File stem (filename without extension).
    pub stem: String,
    /// Path relative to the search base.
    pub relative_path: PathBuf,
}

/// Find all files matching criteria in a directory.
///
/// A missing base directory yields an empty list. Results are sorted by
/// relative path so listings are stable across platforms.
///
/// # Example
///
/// ```no_run
/// # use vaultpress_core::util::files::{find_all_files, FindOptions};
/// # use std::path::Path;
/// # async fn example() -> vaultpress_core::Result<()> {
/// let files = find_all_files(Path::new("内容/公开内容/新闻"), FindOptions::markdown()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn find_all_files(base_path: &Path, options: FindOptions) -> Result<Vec<FileInfo>> {
    if !exists(base_path).await {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut walker = WalkDir::new(base_path);

    while let Some(entry_result) = walker.next().await {
        let entry = entry_result
            .map_err(|e| Error::io_with_path(std::io::Error::other(e.to_string()), base_path))?;
        let path = entry.path();

        // Skip directories
        if path.is_dir() {
            continue;
        }

        if let Some(max_depth) = options.max_depth {
            let depth = path
                .strip_prefix(base_path)
                .map(|p| p.components().count())
                .unwrap_or(0);
            if depth > max_depth {
                continue;
            }
        }

        if let Some(ext) = options.extension
            && path.extension().and_then(|e| e.to_str()) != Some(ext)
        {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let relative_path = path.strip_prefix(base_path).unwrap_or(&path).to_path_buf();

        files.push(FileInfo {
            path: path.to_path_buf(),
            stem,
            relative_path,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ------------------------------------------------------------------------
    // ensure_dir tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_ensure_dir_twice_is_ok() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("内容").join("公开内容").join("周报");

        ensure_dir(&target).await.unwrap();
        ensure_dir(&target).await.unwrap();
        assert!(target.is_dir());
    }

    #[tokio::test]
    async fn test_ensure_dir_over_file_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, "x").unwrap();

        let err = ensure_dir(&file).await.unwrap_err();
        assert!(err.is_io());
    }

    // ------------------------------------------------------------------------
    // read/write tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_text(dir.path().join("missing.md")).await.unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("note.md");
        write_text(&path, "第一行\n第二行").await.unwrap();
        assert_eq!(read_text(&path).await.unwrap(), "第一行\n第二行");
    }

    #[tokio::test]
    async fn test_copy_file_creates_parent() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.md");
        std::fs::write(&src, "hello").unwrap();
        let dst = dir.path().join("nested").join("deeper").join("a.md");

        let bytes = copy_file(&src, &dst).await.unwrap();
        assert_eq!(bytes, 5);
        assert_eq!(std::fs::read_to_string(dst).unwrap(), "hello");
    }

    // ------------------------------------------------------------------------
    // find_all_files tests
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_find_all_markdown_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.md"), "").unwrap();
        std::fs::write(dir.path().join("sub").join("a.md"), "").unwrap();
        std::fs::write(dir.path().join("image.png"), "").unwrap();

        let files = find_all_files(dir.path(), FindOptions::markdown())
            .await
            .unwrap();
        let rel: Vec<_> = files.iter().map(|f| f.relative_path.clone()).collect();
        assert_eq!(rel, vec![PathBuf::from("b.md"), PathBuf::from("sub/a.md")]);
        assert_eq!(files[1].stem, "a");
    }

    #[tokio::test]
    async fn test_find_all_files_max_depth() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("top.md"), "").unwrap();
        std::fs::write(dir.path().join("sub").join("deep.md"), "").unwrap();

        let files = find_all_files(dir.path(), FindOptions::markdown().with_max_depth(1))
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].stem, "top");
    }

    #[tokio::test]
    async fn test_find_all_files_missing_base() {
        let dir = TempDir::new().unwrap();
        let files = find_all_files(&dir.path().join("nope"), FindOptions::markdown())
            .await
            .unwrap();
        assert!(files.is_empty());
    }
}
