//! Normalized table rows.
//!
//! A [`TableRow`] has a fixed set of known fields plus an ordered
//! [`ExtraFields`] list holding every column the header rules did not
//! recognize, keyed by the original header text.
//!
//! Rows serialize with camelCase keys and the extras flattened into the
//! same object:
//!
//! ```json
//! {"filePath":"公开内容/新闻/a.md","date":"2024-03-01","title":"A","来源链接":"https://..."}
//! ```

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::markdown::helpers::NEWS_PATH_PREFIX;

/// One parsed and normalized table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableRow {
    /// Vault-relative path of the source note (may be synthesized).
    pub file_path: String,
    /// Raw date text from the date column.
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chinese_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underwater_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_extraction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_companies: Option<String>,
    /// Unrecognized columns, in header order.
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl TableRow {
    /// A row is kept only when it has a date and either a path or a title.
    pub fn is_accepted(&self) -> bool {
        !self.date.is_empty() && (!self.file_path.is_empty() || has_text(&self.title))
    }

    /// Bilingual field lookup.
    ///
    /// Returns the first non-empty value among the known field named by
    /// `camel_alias`, the extra column `chinese_key`, and the extra column
    /// `camel_alias`.
    ///
    /// ```rust
    /// use vaultpress_content::TableRow;
    ///
    /// let mut row = TableRow::default();
    /// row.extra.insert("水下信息", "第一行");
    /// assert_eq!(row.lookup("水下信息", "underwaterInfo"), Some("第一行"));
    /// ```
    pub fn lookup(&self, chinese_key: &str, camel_alias: &str) -> Option<&str> {
        let known = match camel_alias {
            "title" => self.title.as_deref(),
            "summary" => self.summary.as_deref(),
            "source" => self.source.as_deref(),
            "chineseTitle" => self.chinese_title.as_deref(),
            "underwaterInfo" => self.underwater_info.as_deref(),
            "caseExtraction" => self.case_extraction.as_deref(),
            "relatedCompanies" => self.related_companies.as_deref(),
            _ => None,
        };
        [known, self.extra.get(chinese_key), self.extra.get(camel_alias)]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
    }

    /// Title to display: the Chinese title when present, else the title.
    pub fn display_title(&self) -> Option<&str> {
        self.lookup("中文标题", "chineseTitle")
            .or_else(|| self.title.as_deref().filter(|t| !t.is_empty()))
    }

    /// Slug of the row's note under `公开内容/新闻/`, without `.md`.
    ///
    /// Paths outside the news directory keep their full relative form.
    pub fn slug(&self) -> String {
        let path = self.file_path.trim_start_matches("./");
        let path = path.strip_prefix(NEWS_PATH_PREFIX).unwrap_or(path);
        path.strip_suffix(".md").unwrap_or(path).to_string()
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Passthrough columns, kept in the order their headers appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFields {
    entries: Vec<(String, String)>,
}

impl ExtraFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing (in place) any earlier value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ExtraFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExtraFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ExtraFieldsVisitor)
    }
}

struct ExtraFieldsVisitor;

impl<'de> Visitor<'de> for ExtraFieldsVisitor {
    type Value = ExtraFields;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of extra column values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut extra = ExtraFields::new();
        while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(text) => extra.insert(key, text),
                other => extra.insert(key, other.to_string()),
            }
        }
        Ok(extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> TableRow {
        let mut row = TableRow {
            file_path: "公开内容/新闻/openai-news.md".to_string(),
            date: "2024-03-01".to_string(),
            title: Some("OpenAI 新闻".to_string()),
            score: Some(8.0),
            ..Default::default()
        };
        row.extra.insert("来源链接", "https://example.com");
        row.extra.insert("备注", "重要");
        row
    }

    // ------------------------------------------------------------------------
    // acceptance tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_accepted_with_path_or_title() {
        let row = sample_row();
        assert!(row.is_accepted());

        let title_only = TableRow {
            date: "2024-03-01".to_string(),
            title: Some("标题".to_string()),
            ..Default::default()
        };
        assert!(title_only.is_accepted());
    }

    #[test]
    fn test_rejected_without_date_or_identity() {
        let no_date = TableRow {
            file_path: "a.md".to_string(),
            ..Default::default()
        };
        assert!(!no_date.is_accepted());

        let empty_title = TableRow {
            date: "2024-03-01".to_string(),
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(!empty_title.is_accepted());
    }

    // ------------------------------------------------------------------------
    // lookup tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_lookup_prefers_known_field() {
        let mut row = sample_row();
        row.underwater_info = Some("已知".to_string());
        row.extra.insert("水下信息", "额外");
        assert_eq!(row.lookup("水下信息", "underwaterInfo"), Some("已知"));
    }

    #[test]
    fn test_lookup_skips_empty_values() {
        let mut row = sample_row();
        row.case_extraction = Some(String::new());
        row.extra.insert("案例提取", "");
        row.extra.insert("caseExtraction", "英文列");
        assert_eq!(row.lookup("案例提取", "caseExtraction"), Some("英文列"));
    }

    #[test]
    fn test_lookup_missing() {
        assert_eq!(sample_row().lookup("涉及公司", "relatedCompanies"), None);
    }

    #[test]
    fn test_display_title_prefers_chinese() {
        let mut row = sample_row();
        assert_eq!(row.display_title(), Some("OpenAI 新闻"));
        row.chinese_title = Some("中文".to_string());
        assert_eq!(row.display_title(), Some("中文"));
    }

    #[test]
    fn test_slug() {
        assert_eq!(sample_row().slug(), "openai-news");
        let other = TableRow {
            file_path: "./笔记/a.md".to_string(),
            ..Default::default()
        };
        assert_eq!(other.slug(), "笔记/a");
    }

    // ------------------------------------------------------------------------
    // serialization tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_serialize_camel_case_with_ordered_extras() {
        let json = serde_json::to_string(&sample_row()).unwrap();
        assert_eq!(
            json,
            r#"{"filePath":"公开内容/新闻/openai-news.md","date":"2024-03-01","title":"OpenAI 新闻","score":8.0,"来源链接":"https://example.com","备注":"重要"}"#
        );
    }

    #[test]
    fn test_deserialize_collects_unknown_keys() {
        let json = r#"{"filePath":"a.md","date":"2024-03-01","tags":["AI"],"备注":"x","selected":true}"#;
        let row: TableRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.tags, Some(vec!["AI".to_string()]));
        assert_eq!(row.extra.get("备注"), Some("x"));
        assert_eq!(row.extra.get("selected"), Some("true"));
        assert_eq!(row.extra.len(), 2);
    }

    #[test]
    fn test_extra_insert_replaces_in_place() {
        let mut extra = ExtraFields::new();
        extra.insert("a", "1");
        extra.insert("b", "2");
        extra.insert("a", "3");
        assert_eq!(extra.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(extra.get("a"), Some("3"));
    }
}
