//! News documents generated from table rows.
//!
//! When a row has no note in the vault (or the caller prefers generated
//! output), [`render_news_document`] writes a complete Markdown document
//! from the row's fields alone.

use crate::markdown::frontmatter::FrontmatterWriter;
use crate::markdown::helpers::split_br;
use crate::row::TableRow;

/// Body sections appended after the summary, as `(heading, camelCase alias)`.
const BODY_SECTIONS: &[(&str, &str)] = &[
    ("金句", "goldenQuote"),
    ("水下信息", "underwaterInfo"),
    ("案例提取", "caseExtraction"),
    ("涉及公司", "relatedCompanies"),
    ("原标题", "originalTitle"),
];

fn br_joined(value: &str, separator: &str) -> String {
    split_br(value).join(separator).trim().to_string()
}

fn comma_list(value: &str) -> String {
    split_br(value)
        .into_iter()
        .flat_map(|part| part.split('\n'))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a row as a news document.
///
/// ```rust
/// use vaultpress_content::{news::render_news_document, TableRow};
///
/// let row = TableRow {
///     file_path: "公开内容/新闻/a.md".into(),
///     date: "2024-03-01 08:03".into(),
///     title: Some("标题".into()),
///     ..Default::default()
/// };
/// let doc = render_news_document(&row);
/// assert!(doc.starts_with("---\ntitle: \"标题\"\ndate: 2024-03-01\n---\n\n# 标题\n\n"));
/// ```
pub fn render_news_document(row: &TableRow) -> String {
    let title = row.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let date = row.date.split_whitespace().next().unwrap_or_default();
    let tags: Vec<String> = row
        .tags
        .iter()
        .flatten()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();
    let summary = row.summary.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let source = row.source.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let mut writer = FrontmatterWriter::new()
        .optional_string("title", title)
        .date("date", date)
        .tags("tags", &tags);
    if let Some(score) = row.score {
        writer = writer.number("score", score);
    }

    let chinese_title = row
        .lookup("中文标题", "chineseTitle")
        .map(|v| br_joined(v, " "))
        .unwrap_or_default();
    let underwater = row
        .lookup("水下信息", "underwaterInfo")
        .map(|v| br_joined(v, "\n"))
        .unwrap_or_default();
    let cases = row
        .lookup("案例提取", "caseExtraction")
        .map(|v| br_joined(v, "\n"))
        .unwrap_or_default();
    let companies = row
        .lookup("涉及公司", "relatedCompanies")
        .map(comma_list)
        .unwrap_or_default();

    let writer = writer
        .optional_string("summary", summary)
        .optional_string("source", source)
        .optional_string("chineseTitle", Some(chinese_title.as_str()))
        .multiline_string("underwaterInfo", &underwater)
        .multiline_string("caseExtraction", &cases)
        .optional_string("relatedCompanies", Some(companies.as_str()));

    log::debug!(
        "Rendering {} (chineseTitle: {}, underwaterInfo: {}, caseExtraction: {})",
        row.file_path,
        !chinese_title.is_empty(),
        !underwater.is_empty(),
        !cases.is_empty()
    );

    let mut body = String::new();
    if let Some(title) = title {
        body.push_str(&format!("# {title}\n\n"));
    }
    if let Some(summary) = summary {
        body.push_str(&format!("{summary}\n\n"));
    }
    if let Some(source) = source {
        body.push_str(&format!("**来源**: {source}\n\n"));
    }
    for (heading, alias) in BODY_SECTIONS {
        let Some(value) = row.lookup(heading, alias) else {
            continue;
        };
        let content = br_joined(value, "\n");
        if !content.is_empty() {
            body.push_str(&format!("## {heading}\n\n{content}\n\n"));
        }
    }

    writer.render(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::frontmatter::extract_frontmatter;

    fn row() -> TableRow {
        let mut row = TableRow {
            file_path: "公开内容/新闻/a.md".to_string(),
            date: "2024-03-01".to_string(),
            title: Some("OpenAI \"发布\"\n新模型".to_string()),
            tags: Some(vec![" AI ".to_string(), "".to_string()]),
            score: Some(9.0),
            summary: Some("摘要".to_string()),
            source: Some("36氪".to_string()),
            underwater_info: Some("第一\n第二".to_string()),
            related_companies: Some("OpenAI, Microsoft".to_string()),
            ..Default::default()
        };
        row.extra.insert("金句", "一句<br>两句");
        row
    }

    #[test]
    fn test_frontmatter_fields_parse_back() {
        let doc = render_news_document(&row());
        let fm = extract_frontmatter(&doc).unwrap();
        assert_eq!(fm.get_str("title"), Some("OpenAI \"发布\" 新模型"));
        assert_eq!(fm.get_scalar_string("date").as_deref(), Some("2024-03-01"));
        assert_eq!(fm.get_string_list("tags"), vec!["AI"]);
        assert_eq!(fm.get_scalar_string("score").as_deref(), Some("9"));
        assert_eq!(fm.get_str("underwaterInfo"), Some("第一\n第二"));
        assert_eq!(fm.get_str("relatedCompanies"), Some("OpenAI, Microsoft"));
        assert_eq!(fm.get_str("chineseTitle"), None);
    }

    #[test]
    fn test_body_sections() {
        let doc = render_news_document(&row());
        let body = extract_frontmatter(&doc).unwrap().body().to_string();
        assert!(body.starts_with("# OpenAI \"发布\"\n新模型\n\n摘要\n\n**来源**: 36氪\n\n"));
        assert!(body.contains("## 金句\n\n一句\n两句\n\n"));
        assert!(body.contains("## 水下信息\n\n第一\n第二\n\n"));
        assert!(body.contains("## 涉及公司\n\nOpenAI, Microsoft\n\n"));
        assert!(!body.contains("## 案例提取"));
    }

    #[test]
    fn test_non_iso_date_is_quoted() {
        let row = TableRow {
            file_path: "a.md".to_string(),
            date: "2024/3/1 08:00".to_string(),
            ..Default::default()
        };
        let doc = render_news_document(&row);
        assert!(doc.contains("date: \"2024/3/1\"\n"));
    }

    #[test]
    fn test_related_companies_from_extra_column() {
        let mut row = TableRow {
            date: "2024-03-01".to_string(),
            ..Default::default()
        };
        row.extra.insert("relatedCompanies", "A<br>B\nC");
        let doc = render_news_document(&row);
        assert!(doc.contains("relatedCompanies: \"A, B, C\"\n"));
    }
}
