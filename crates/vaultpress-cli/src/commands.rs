//! Handlers for the content commands: parse, sync, newsletter, content,
//! and publish.

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::io::AsyncReadExt;
use vaultpress_content::{
    ContentKind, IncludedItem, NewsletterDraft, TableRow, decode_included_value,
    extract_frontmatter, list_content, parse_table_file,
};
use vaultpress_core::{Error, Result, read_text};
use vaultpress_sync::{SyncMode, filter_rows, plan_sync, sync_rows};

use crate::config::VaultpressConfig;

async fn load_rows(config: &VaultpressConfig, table: Option<&str>) -> Result<Vec<TableRow>> {
    let path = config.table_path(table)?;
    parse_table_file(&path).await
}

// ============================================================================
// parse
// ============================================================================

pub async fn cmd_parse(config: &VaultpressConfig, table: Option<&str>, json: bool) -> Result<()> {
    let rows = load_rows(config, table).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in &rows {
        println!(
            "{}\t{}\t{}",
            row.date,
            row.display_title().unwrap_or("-"),
            row.file_path
        );
    }
    println!("{} rows", rows.len());
    Ok(())
}

// ============================================================================
// sync
// ============================================================================

pub async fn cmd_sync(
    config: &VaultpressConfig,
    table: Option<&str>,
    dry_run: bool,
    generate: bool,
) -> Result<()> {
    let rows = load_rows(config, table).await?;
    let total = rows.len();
    let rows = filter_rows(rows, &config.filters, Local::now().date_naive())?;
    println!("{} of {total} rows match the filters", rows.len());
    if rows.is_empty() {
        return Ok(());
    }

    let mut sync_config = config.sync_config()?;
    if generate {
        sync_config.options.mode = SyncMode::Generate;
    }

    if dry_run {
        for planned in plan_sync(&rows, &sync_config) {
            match planned.source {
                Some(source) => println!("{} -> {}", source.display(), planned.target.display()),
                None => println!("generate -> {}", planned.target.display()),
            }
        }
        return Ok(());
    }

    let stats = sync_rows(&rows, &sync_config).await?;
    println!("Total:   {}", stats.total_files);
    println!("Synced:  {}", stats.synced_files);
    println!("Skipped: {}", stats.skipped_files);
    for error in &stats.errors {
        println!("  - {error}");
    }
    Ok(())
}

// ============================================================================
// newsletter
// ============================================================================

async fn read_draft(source: &str) -> Result<NewsletterDraft> {
    let text = if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        read_text(source).await?
    };
    serde_json::from_str(&text).map_err(|e| Error::parse(format!("Invalid newsletter draft: {e}")))
}

pub async fn cmd_newsletter_save(config: &VaultpressConfig, draft: &str, out: Option<&str>) -> Result<PathBuf> {
    let draft = read_draft(draft).await?;
    let dir = match out {
        Some(dir) => PathBuf::from(dir),
        None => config.newsletter_path()?,
    };
    let saved = draft.save(&dir).await?;
    println!("{}", saved.file_path.display());
    Ok(saved.file_path)
}

/// The included items of a saved issue.
pub async fn newsletter_items(file: &Path) -> Result<Vec<IncludedItem>> {
    let content = read_text(file).await?;
    let fm = extract_frontmatter(&content)?;
    match fm.get("includedItems") {
        Some(value) => decode_included_value(value),
        None => Ok(Vec::new()),
    }
}

pub async fn cmd_newsletter_items(file: &str, json: bool) -> Result<()> {
    let items = newsletter_items(Path::new(file)).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    for (index, item) in items.iter().enumerate() {
        println!("{}. {} ({})", index + 1, item.heading(index + 1), item.slug);
    }
    Ok(())
}

// ============================================================================
// content
// ============================================================================

pub async fn cmd_content_list(
    config: &VaultpressConfig,
    kind: Option<&str>,
    query: Option<&str>,
    json: bool,
) -> Result<()> {
    let kinds = match kind {
        Some(kind) => vec![kind.parse::<ContentKind>()?],
        None => ContentKind::ALL.to_vec(),
    };
    let mut items = list_content(&config.content_path()?, &kinds).await?;
    if let Some(query) = query {
        items.retain(|item| item.matches(query));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    for item in &items {
        println!("{}\t{}\t{}/{}", item.date, item.title, item.kind, item.slug);
    }
    println!("{} items", items.len());
    Ok(())
}

// ============================================================================
// publish
// ============================================================================

pub async fn cmd_publish(config: &VaultpressConfig) -> Result<()> {
    let report = config.publisher()?.publish().await;
    for line in &report.logs {
        println!("{line}");
    }
    if report.outcome.is_success() {
        Ok(())
    } else {
        Err(Error::process(format!("Publish did not complete: {:?}", report.outcome)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> VaultpressConfig {
        let mut config = VaultpressConfig::default();
        config.vault.path = Some(dir.join("vault").to_string_lossy().into_owned());
        config.content.path = Some(dir.join("site").to_string_lossy().into_owned());
        config.publish.repo_root = Some(dir.join("repo").to_string_lossy().into_owned());
        config
    }

    #[tokio::test]
    async fn test_load_rows_from_vault() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        std::fs::create_dir_all(dir.path().join("vault")).unwrap();
        std::fs::write(
            dir.path().join("vault").join("资讯汇总.md"),
            "| 文件路径 | 日期 | 标题 |\n|---|---|---|\n| a.md | 2024-03-01 | 甲 |\n",
        )
        .unwrap();

        let rows = load_rows(&config, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(cmd_parse(&config, None, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_newsletter_save_then_items() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let draft = dir.path().join("draft.json");
        std::fs::write(
            &draft,
            r#"{"title":"第 3 期","date":"2024-03-08","includedItems":["a",{"slug":"b","chineseTitle":"乙","underwaterInfo":"一\n二"}]}"#,
        )
        .unwrap();

        let saved = cmd_newsletter_save(&config, draft.to_str().unwrap(), None)
            .await
            .unwrap();
        assert_eq!(saved, config.newsletter_path().unwrap().join("第-3-期.md"));

        let items = newsletter_items(&saved).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], IncludedItem::from_slug("a"));
        assert_eq!(items[1].underwater_info.as_deref(), Some("一\n二"));
    }

    #[tokio::test]
    async fn test_newsletter_items_without_field() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("issue.md");
        std::fs::write(&file, "---\ntitle: T\n---\nbody").unwrap();
        assert!(newsletter_items(&file).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_newsletter_items_legacy_sequence() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("issue.md");
        std::fs::write(&file, "---\ntitle: T\nincludedItems: [\"a\", \"b\"]\n---\nbody").unwrap();
        let items = newsletter_items(&file).await.unwrap();
        assert_eq!(items, vec![IncludedItem::from_slug("a"), IncludedItem::from_slug("b")]);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let draft = dir.path().join("draft.json");
        std::fs::write(&draft, "{not json").unwrap();
        let err = read_draft(draft.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn test_content_list_rejects_unknown_kind() {
        let dir = TempDir::new().unwrap();
        let config = config_for(dir.path());
        let err = cmd_content_list(&config, Some("blog"), None, false).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_sync_generate_from_config() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(dir.path());
        let table = dir.path().join("table.md");
        let today = Local::now().date_naive();
        let old = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        std::fs::write(
            &table,
            format!(
                "| 文件路径 | 日期 | 标题 |\n|---|---|---|\n| 公开内容/新闻/new.md | {today} | 新 |\n| 公开内容/新闻/old.md | {old} | 旧 |\n"
            ),
        )
        .unwrap();
        config.filters.date_range = Some(vaultpress_sync::DateRange {
            custom: Some("最近7天".to_string()),
            ..Default::default()
        });

        cmd_sync(&config, table.to_str(), false, true).await.unwrap();
        assert!(dir.path().join("site/公开内容/新闻/new.md").exists());
        assert!(!dir.path().join("site/公开内容/新闻/old.md").exists());
    }
}
