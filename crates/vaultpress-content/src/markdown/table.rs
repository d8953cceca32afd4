//! Obsidian Markdown table parsing.
//!
//! Finds the first GFM pipe table in a document and turns each data row
//! into a normalized [`TableRow`]. Headers may be Chinese or English; a
//! declarative rule list maps them onto known fields, and anything left
//! over is kept verbatim in [`TableRow::extra`].
//!
//! ```rust
//! use vaultpress_content::markdown::table::parse_table;
//!
//! let doc = "\
//! 新闻汇总
//!
//! | 文件路径 | 抓取时间 | 中文标题 | 评分 |
//! | --- | --- | --- | --- |
//! | 公开内容/新闻/a.md | 2024-03-01 | 第一条 | 8 |
//! ";
//! let rows = parse_table(doc).unwrap();
//! assert_eq!(rows.len(), 1);
//! assert_eq!(rows[0].title.as_deref(), Some("第一条"));
//! assert_eq!(rows[0].score, Some(8.0));
//! ```

use std::path::Path;

use vaultpress_core::{Error, Result, read_text};

use crate::markdown::helpers::{
    br_to_commas, br_to_newlines, clean_inline, parse_score, parse_tags, parse_type_values,
    synthesize_file_path,
};
use crate::row::TableRow;

/// Known fields a header can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FilePath,
    Date,
    Title,
    Tags,
    /// `类型` values, appended to tags.
    Kind,
    Score,
    Summary,
    Source,
    ChineseTitle,
    UnderwaterInfo,
    CaseExtraction,
    RelatedCompanies,
}

/// A field and its header synonyms, highest priority first.
///
/// Synonyms are compared against the trimmed, lower-cased header, so the
/// English forms are case-insensitive while Chinese forms match literally.
#[derive(Debug, Clone, Copy)]
pub struct HeaderRule {
    pub field: Field,
    pub synonyms: &'static [&'static str],
}

pub const HEADER_RULES: &[HeaderRule] = &[
    HeaderRule { field: Field::FilePath, synonyms: &["文件路径", "filepath", "file_path"] },
    HeaderRule { field: Field::Date, synonyms: &["抓取时间", "日期", "date"] },
    HeaderRule { field: Field::Title, synonyms: &["中文标题", "标题", "title"] },
    HeaderRule { field: Field::Tags, synonyms: &["标签", "tags"] },
    HeaderRule { field: Field::Kind, synonyms: &["类型"] },
    HeaderRule { field: Field::Score, synonyms: &["评分", "score"] },
    HeaderRule { field: Field::Summary, synonyms: &["摘要", "summary"] },
    HeaderRule { field: Field::Source, synonyms: &["来源", "source"] },
    HeaderRule { field: Field::ChineseTitle, synonyms: &["中文标题", "chinesetitle"] },
    HeaderRule { field: Field::UnderwaterInfo, synonyms: &["水下信息", "underwaterinfo"] },
    HeaderRule { field: Field::CaseExtraction, synonyms: &["案例提取", "caseextraction"] },
    HeaderRule {
        field: Field::RelatedCompanies,
        synonyms: &["涉及公司", "涉及的公司", "relatedcompanies"],
    },
];

/// Every `(field, priority)` a header maps to; empty for passthrough columns.
pub fn resolve_header(header: &str) -> Vec<(Field, usize)> {
    let normalized = header.trim().to_lowercase();
    HEADER_RULES
        .iter()
        .filter_map(|rule| {
            rule.synonyms
                .iter()
                .position(|synonym| *synonym == normalized)
                .map(|priority| (rule.field, priority))
        })
        .collect()
}

/// Split a table line into trimmed cells.
///
/// Exactly one boundary pipe is removed from each end, then the line is
/// split on `|`. Empty cells are kept so columns never shift.
///
/// ```rust
/// use vaultpress_content::markdown::table::split_cells;
///
/// assert_eq!(split_cells("| a |  | c |"), vec!["a", "", "c"]);
/// assert_eq!(split_cells("|| b |"), vec!["", "b"]);
/// ```
pub fn split_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn is_table_line(line: &str) -> bool {
    line.trim().starts_with('|')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    SeekingHeader,
    SeekingSeparator,
    ReadingRows,
    Done,
}

/// Header index built once per table.
#[derive(Debug)]
struct ColumnMap {
    headers: Vec<String>,
    targets: Vec<Vec<(Field, usize)>>,
}

impl ColumnMap {
    fn new(headers: Vec<String>) -> Self {
        let targets = headers.iter().map(|h| resolve_header(h)).collect();
        Self { headers, targets }
    }

    /// Highest-priority non-empty value for `field`; ties go to the
    /// leftmost column.
    fn best<'c>(&self, cells: &'c [String], field: Field) -> Option<&'c str> {
        let mut best: Option<(usize, &'c str)> = None;
        for (index, targets) in self.targets.iter().enumerate() {
            let Some(value) = cells.get(index).map(String::as_str) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            for (target, priority) in targets {
                if *target == field && best.is_none_or(|(p, _)| *priority < p) {
                    best = Some((*priority, value));
                }
            }
        }
        best.map(|(_, value)| value)
    }

    /// All non-empty values for `field`, in column order.
    fn all<'c>(&self, cells: &'c [String], field: Field) -> Vec<&'c str> {
        self.targets
            .iter()
            .enumerate()
            .filter(|(_, targets)| targets.iter().any(|(f, _)| *f == field))
            .filter_map(|(index, _)| cells.get(index).map(String::as_str))
            .filter(|value| !value.is_empty())
            .collect()
    }

    fn build_row(&self, cells: &[String]) -> TableRow {
        let clean = |field| self.best(cells, field).map(clean_inline).filter(|v| !v.is_empty());
        let raw = |field| self.best(cells, field).map(String::from);

        let mut row = TableRow {
            file_path: raw(Field::FilePath).unwrap_or_default(),
            date: raw(Field::Date).unwrap_or_default(),
            title: clean(Field::Title),
            score: self.best(cells, Field::Score).and_then(parse_score),
            summary: raw(Field::Summary),
            source: raw(Field::Source),
            chinese_title: clean(Field::ChineseTitle),
            underwater_info: self.best(cells, Field::UnderwaterInfo).map(br_to_newlines),
            case_extraction: self.best(cells, Field::CaseExtraction).map(br_to_newlines),
            related_companies: self.best(cells, Field::RelatedCompanies).map(br_to_commas),
            ..Default::default()
        };
        if row.title.is_none() {
            row.title = row.chinese_title.clone();
        }

        let mut tags = self.best(cells, Field::Tags).map(parse_tags).unwrap_or_default();
        for kind in self.all(cells, Field::Kind) {
            tags.extend(parse_type_values(kind));
        }
        if !tags.is_empty() {
            row.tags = Some(tags);
        }

        for (index, header) in self.headers.iter().enumerate() {
            if header.is_empty() || !self.targets[index].is_empty() {
                continue;
            }
            let value = cells.get(index).map(String::as_str).unwrap_or_default();
            row.extra.insert(header.as_str(), value);
        }

        if row.file_path.is_empty()
            && let Some(title) = row.title.as_deref()
        {
            row.file_path = synthesize_file_path(title, &row.date);
            log::debug!("Synthesized path {} for row without 文件路径", row.file_path);
        }

        row
    }
}

/// Parse the first table in `content` into accepted rows, in order.
///
/// Returns [`Error::NotFound`] when no line starts with `|`. Rows without
/// a date, or without both a path and a title, are dropped.
pub fn parse_table(content: &str) -> Result<Vec<TableRow>> {
    let mut state = ParseState::SeekingHeader;
    let mut columns: Option<ColumnMap> = None;
    let mut rows = Vec::new();
    let mut rejected = 0usize;

    for line in content.lines() {
        if state == ParseState::SeekingSeparator {
            state = ParseState::ReadingRows;
            if line.contains("---") {
                continue;
            }
        }

        match state {
            ParseState::SeekingHeader => {
                if is_table_line(line) {
                    let headers = split_cells(line);
                    log::debug!("Table headers: {headers:?}");
                    columns = Some(ColumnMap::new(headers));
                    state = ParseState::SeekingSeparator;
                }
            }
            ParseState::ReadingRows => {
                if !is_table_line(line) {
                    state = ParseState::Done;
                    break;
                }
                let cells = split_cells(line);
                if cells.iter().all(String::is_empty) {
                    continue;
                }
                let Some(map) = columns.as_ref() else {
                    continue;
                };
                let row = map.build_row(&cells);
                if row.is_accepted() {
                    rows.push(row);
                } else {
                    rejected += 1;
                }
            }
            ParseState::SeekingSeparator | ParseState::Done => break,
        }
    }

    if columns.is_none() {
        return Err(Error::not_found("Markdown table"));
    }
    log::debug!(
        "Parsed {} table rows ({} rejected, final state {:?})",
        rows.len(),
        rejected,
        state
    );
    Ok(rows)
}

/// Read `path` and parse its first table.
///
/// A missing file is reported as [`Error::FileNotFound`].
pub async fn parse_table_file(path: impl AsRef<Path>) -> Result<Vec<TableRow>> {
    let path = path.as_ref();
    let content = read_text(path).await?;
    let rows = parse_table(&content)?;
    log::info!("Parsed {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
