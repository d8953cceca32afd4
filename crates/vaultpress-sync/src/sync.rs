//! Vault-to-site file sync.
//!
//! Each selected row becomes one file under the site content root, either
//! by copying the row's note out of the vault ([`SyncMode::Copy`]) or by
//! rendering a news document from the row itself ([`SyncMode::Generate`]).
//! A failing row is counted and reported; the batch always runs to the end.

use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use vaultpress_content::TableRow;
use vaultpress_content::markdown::helpers::synthesize_file_path;
use vaultpress_content::news::render_news_document;
use vaultpress_core::util::files::{copy_file, exists, modified_time};
use vaultpress_core::{Error, Result, ensure_dir, read_text, write_text};

/// How rows are turned into site files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Copy the vault note named by the row's path.
    #[default]
    Copy,
    /// Render a news document from the row's fields.
    Generate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    pub mode: SyncMode,
    /// Keep the row's relative path under the content root; otherwise
    /// only the file name is kept.
    pub preserve_structure: bool,
    /// Copy local images referenced by synced notes.
    pub sync_attachments: bool,
    /// Skip copies whose target is at least as new as the source.
    pub incremental: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            mode: SyncMode::Copy,
            preserve_structure: true,
            sync_attachments: true,
            incremental: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    pub vault_path: PathBuf,
    pub content_path: PathBuf,
    pub options: SyncOptions,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub total_files: usize,
    pub synced_files: usize,
    pub skipped_files: usize,
    pub errors: Vec<String>,
}

/// One planned file operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSync {
    /// Vault note to copy; `None` when the file is generated.
    pub source: Option<PathBuf>,
    pub target: PathBuf,
}

enum RowOutcome {
    Synced,
    /// Skipped, with an optional message for the error list.
    Skipped(Option<String>),
}

fn image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("Invalid image regex"))
}

fn row_label(row: &TableRow) -> &str {
    row.title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(row.file_path.as_str())
}

/// Where a vault-relative path lives on disk; absolute paths are kept.
pub fn source_path(file_path: &str, vault_path: &Path) -> PathBuf {
    let path = Path::new(file_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        vault_path.join(path)
    }
}

/// Where a row's file lands under the content root.
///
/// Paths that climb out of the content root are rejected.
pub fn target_path(file_path: &str, content_path: &Path, preserve_structure: bool) -> Result<PathBuf> {
    let path = Path::new(file_path);
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(Error::validation(format!("Path leaves the content root: {file_path}")));
    }
    if !preserve_structure {
        let name = path
            .file_name()
            .ok_or_else(|| Error::validation(format!("Path has no file name: {file_path}")))?;
        return Ok(content_path.join(name));
    }
    let relative: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    if relative.as_os_str().is_empty() {
        return Err(Error::validation(format!("Path has no file name: {file_path}")));
    }
    Ok(content_path.join(relative))
}

/// The vault-relative path used for a generated row.
fn generated_path(row: &TableRow) -> String {
    if row.file_path.trim().is_empty() {
        synthesize_file_path(row.title.as_deref().unwrap_or_default(), &row.date)
    } else {
        row.file_path.trim().to_string()
    }
}

/// List what [`sync_rows`] would do, without touching the filesystem.
///
/// Rows whose target cannot be computed are left out.
pub fn plan_sync(rows: &[TableRow], config: &SyncConfig) -> Vec<PlannedSync> {
    let options = &config.options;
    rows.iter()
        .filter_map(|row| {
            let (source, rel) = match options.mode {
                SyncMode::Copy => (
                    Some(source_path(&row.file_path, &config.vault_path)),
                    row.file_path.clone(),
                ),
                SyncMode::Generate => (None, generated_path(row)),
            };
            match target_path(&rel, &config.content_path, options.preserve_structure) {
                Ok(target) => Some(PlannedSync { source, target }),
                Err(e) => {
                    log::warn!("Cannot plan {}: {e}", row_label(row));
                    None
                }
            }
        })
        .collect()
}

/// Sync `rows` into the content root.
///
/// Only a failure to create the content root aborts the batch.
pub async fn sync_rows(rows: &[TableRow], config: &SyncConfig) -> Result<SyncStats> {
    ensure_dir(&config.content_path).await?;

    let mut stats = SyncStats {
        total_files: rows.len(),
        ..Default::default()
    };

    for row in rows {
        let result = match config.options.mode {
            SyncMode::Copy => copy_row(row, config).await,
            SyncMode::Generate => generate_row(row, config).await,
        };
        match result {
            Ok(RowOutcome::Synced) => stats.synced_files += 1,
            Ok(RowOutcome::Skipped(message)) => {
                stats.skipped_files += 1;
                stats.errors.extend(message);
            }
            Err(e) => {
                log::warn!("Sync failed for {}: {e}", row_label(row));
                stats.skipped_files += 1;
                stats.errors.push(format!("同步失败 {}: {e}", row_label(row)));
            }
        }
    }

    log::info!(
        "Synced {} of {} files ({} skipped)",
        stats.synced_files,
        stats.total_files,
        stats.skipped_files
    );
    Ok(stats)
}

async fn copy_row(row: &TableRow, config: &SyncConfig) -> Result<RowOutcome> {
    let options = &config.options;
    let source = source_path(&row.file_path, &config.vault_path);
    if !exists(&source).await {
        return Ok(RowOutcome::Skipped(Some(format!("文件不存在: {}", source.display()))));
    }

    let target = target_path(&row.file_path, &config.content_path, options.preserve_structure)?;
    if options.incremental
        && exists(&target).await
        && modified_time(&source).await? <= modified_time(&target).await?
    {
        log::debug!("Up to date: {}", target.display());
        return Ok(RowOutcome::Skipped(None));
    }

    copy_file(&source, &target).await?;
    log::debug!("Copied {} -> {}", source.display(), target.display());

    if options.sync_attachments
        && row.file_path.ends_with(".md")
        && let Err(e) = sync_attachments(&source, config).await
    {
        log::warn!("Attachment scan failed for {}: {e}", source.display());
    }
    Ok(RowOutcome::Synced)
}

async fn generate_row(row: &TableRow, config: &SyncConfig) -> Result<RowOutcome> {
    let has_title = row.title.as_deref().is_some_and(|t| !t.trim().is_empty());
    if !has_title && row.file_path.trim().is_empty() {
        let date = if row.date.trim().is_empty() { "?" } else { row.date.trim() };
        return Ok(RowOutcome::Skipped(Some(format!("条目缺少标题和文件路径: {date}"))));
    }
    if row.date.trim().is_empty() {
        return Ok(RowOutcome::Skipped(Some(format!("条目缺少日期: {}", row_label(row)))));
    }

    let target = target_path(&generated_path(row), &config.content_path, config.options.preserve_structure)?;
    if let Some(parent) = target.parent() {
        ensure_dir(parent).await?;
    }
    write_text(&target, &render_news_document(row)).await?;
    log::debug!("Generated {}", target.display());
    Ok(RowOutcome::Synced)
}

/// Copy the local images referenced by `note` into the content root.
///
/// Remote images are skipped, and so are images missing from the vault.
/// Individual copy failures are logged and do not fail the note. Returns
/// the number of images copied.
pub async fn sync_attachments(note: &Path, config: &SyncConfig) -> Result<usize> {
    let content = read_text(note).await?;
    let mut copied = 0;

    for caps in image_re().captures_iter(&content) {
        let image = caps[2].trim();
        if image.starts_with("http://") || image.starts_with("https://") {
            continue;
        }
        let source = source_path(image, &config.vault_path);
        if !exists(&source).await {
            log::debug!("Attachment not in vault: {}", source.display());
            continue;
        }
        let target = match target_path(image.trim_start_matches('/'), &config.content_path, true) {
            Ok(target) => target,
            Err(e) => {
                log::warn!("Skipping attachment {image}: {e}");
                continue;
            }
        };
        match copy_file(&source, &target).await {
            Ok(_) => copied += 1,
            Err(e) => log::warn!("Attachment sync failed for {image}: {e}"),
        }
    }
    Ok(copied)
}
