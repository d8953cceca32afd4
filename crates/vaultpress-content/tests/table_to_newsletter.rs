//! End-to-end: Obsidian table on disk -> rows -> newsletter issue -> catalog.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use tempfile::TempDir;
use vaultpress_content::{
    ContentKind, IncludedItem, NewsletterDraft, decode_included_items, extract_frontmatter,
    list_content, parse_table_file,
};

const TABLE: &str = "\
# 2024 年 3 月资讯

> 由抓取脚本自动生成

| 文件路径 | 抓取时间 | 中文标题 | 标签 | 类型 | 评分 | 水下信息 | 涉及的公司 | 来源链接 |
| -------- | -------- | -------- | ---- | ---- | ---- | -------- | ---------- | -------- |
| 公开内容/新闻/openai-gpt5.md | 2024-03-01 | [OpenAI 发布 GPT-5](https://x.y) | AI，大模型 | 新闻 | 9 | 训练成本<br>推理价格 | OpenAI<br>Microsoft | https://x.y |
|  | 2024-03-02 | 英伟达 \"财报\" 超预期 |  | 财报<br/>深度 | 7.5分 |  | NVIDIA |  |
| 公开内容/新闻/missing-date.md |  | 无日期 |  |  |  |  |  |  |

后续笔记
";

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
}

#[tokio::test]
async fn test_table_file_to_saved_newsletter() {
    let dir = TempDir::new().unwrap();
    let table_path = dir.path().join("资讯汇总.md");
    std::fs::write(&table_path, TABLE).unwrap();

    let rows = parse_table_file(&table_path).await.unwrap();
    assert_eq!(rows.len(), 2);

    let first = &rows[0];
    assert_eq!(first.title.as_deref(), Some("OpenAI 发布 GPT-5"));
    assert_eq!(first.score, Some(9.0));
    assert_eq!(
        first.tags.as_deref(),
        Some(&["AI".to_string(), "大模型".to_string(), "新闻".to_string()][..])
    );
    assert_eq!(first.underwater_info.as_deref(), Some("训练成本\n推理价格"));
    assert_eq!(first.related_companies.as_deref(), Some("OpenAI, Microsoft"));
    assert_eq!(first.extra.get("来源链接"), Some("https://x.y"));

    let second = &rows[1];
    assert_eq!(second.file_path, "公开内容/新闻/英伟达-财报-超预期.md");
    assert_eq!(second.score, Some(7.5));

    let mut draft = NewsletterDraft::new("第 1 期：AI 周报");
    draft.tags = vec!["周报".to_string()];
    draft.included_items = rows.iter().map(IncludedItem::from_row).collect();

    let out_dir = dir.path().join("内容/公开内容/周报");
    let saved = draft.save_dated(&out_dir, day()).await.unwrap();
    assert_eq!(saved.file_name, "第-1-期：ai-周报.md");

    let content = std::fs::read_to_string(&saved.file_path).unwrap();
    let parsed = extract_frontmatter(&content).unwrap();
    let decoded = decode_included_items(parsed.get_str("includedItems").unwrap()).unwrap();
    assert_eq!(decoded, draft.included_items);
    assert_eq!(decoded[1].chinese_title, "英伟达 \"财报\" 超预期");
    assert!(parsed.body().contains("1. [OpenAI 发布 GPT-5](#openai-gpt5)"));
    assert!(parsed.body().contains("2. [英伟达 \"财报\" 超预期](#英伟达-财报-超预期)"));
}

#[tokio::test]
async fn test_catalog_feeds_included_items() {
    let dir = TempDir::new().unwrap();
    let news = dir.path().join("公开内容/新闻");
    std::fs::create_dir_all(&news).unwrap();
    std::fs::write(
        news.join("openai.md"),
        "---\ntitle: OpenAI\ndate: 2024-03-01\nchineseTitle: OpenAI 中文\nunderwaterInfo: 细节\n---\n正文",
    )
    .unwrap();

    let items = list_content(dir.path(), &[ContentKind::News]).await.unwrap();
    let included: Vec<_> = items.iter().map(IncludedItem::from_content).collect();
    assert_eq!(included[0].slug, "openai");
    assert_eq!(included[0].chinese_title, "OpenAI 中文");
    assert_eq!(included[0].underwater_info.as_deref(), Some("细节"));
}
