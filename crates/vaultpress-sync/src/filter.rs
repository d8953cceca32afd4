//! Row filters applied before syncing.
//!
//! Filters run in a fixed order: date range, then tags, then minimum score.
//! Every filter is optional; an empty [`FilterConfig`] keeps all rows.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, TimeDelta};
use regex::Regex;
use serde::{Deserialize, Serialize};
use vaultpress_content::TableRow;
use vaultpress_core::{Error, Result};

/// Date bounds, either explicit or as a `custom` rule.
///
/// Explicit `start`/`end` override whatever `custom` resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
    /// `最近N天`, `YYYY-MM-DD to YYYY-MM-DD`, or a single `YYYY-MM-DD`.
    pub custom: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub date_range: Option<DateRange>,
    /// Keep rows carrying at least one of these tags.
    pub tags: Vec<String>,
    pub min_score: Option<f64>,
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self.date_range.is_none() && self.tags.is_empty() && self.min_score.is_none()
    }
}

/// Inclusive day bounds resolved from a [`DateRange`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateBounds {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateBounds {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

fn dotted_date_res() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})").expect("Invalid dash date regex"),
            Regex::new(r"^(\d{4})/(\d{1,2})/(\d{1,2})").expect("Invalid slash date regex"),
            Regex::new(r"^(\d{4})\.(\d{1,2})\.(\d{1,2})").expect("Invalid dot date regex"),
        ]
    })
}

fn recent_days_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"最近(\d+)天").expect("Invalid recent-days regex"))
}

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d{4}-\d{1,2}-\d{1,2})\s+to\s+(\d{4}-\d{1,2}-\d{1,2})")
            .expect("Invalid date range regex")
    })
}

/// Calendar day of a table date cell.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and `YYYY.MM.DD` with one- or
/// two-digit month and day (anything after the day, such as a time, is
/// ignored), and RFC 3339 timestamps.
///
/// ```rust
/// use chrono::NaiveDate;
/// use vaultpress_sync::filter::normalize_date;
///
/// assert_eq!(normalize_date("2024/3/1 08:00"), NaiveDate::from_ymd_opt(2024, 3, 1));
/// assert_eq!(normalize_date("下周"), None);
/// ```
pub fn normalize_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    for re in dotted_date_res() {
        let Some(caps) = re.captures(value) else {
            continue;
        };
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
}

fn explicit_bound(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    normalize_date(value)
        .map(Some)
        .ok_or_else(|| Error::validation(format!("Invalid {field} date: {value}")))
}

/// Resolve a [`DateRange`] against `today`.
///
/// An unrecognized `custom` rule is ignored with a warning; malformed
/// explicit bounds are a validation error.
pub fn resolve_date_bounds(range: &DateRange, today: NaiveDate) -> Result<DateBounds> {
    let mut bounds = DateBounds::default();

    if let Some(rule) = range.custom.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        if let Some(caps) = recent_days_re().captures(rule) {
            let days: i64 = caps[1]
                .parse()
                .map_err(|_| Error::validation(format!("Invalid day count in rule: {rule}")))?;
            let start = TimeDelta::try_days(days)
                .and_then(|span| today.checked_sub_signed(span))
                .ok_or_else(|| Error::validation(format!("Day count out of range in rule: {rule}")))?;
            bounds.start = Some(start);
            bounds.end = Some(today);
        } else if let Some(caps) = range_re().captures(rule) {
            bounds.start = normalize_date(&caps[1]);
            bounds.end = normalize_date(&caps[2]);
        } else if let Some(day) = normalize_date(rule).filter(|_| !rule.contains(char::is_whitespace)) {
            bounds.start = Some(day);
            bounds.end = Some(day);
        } else {
            log::warn!("Ignoring unrecognized date rule: {rule}");
        }
    }

    if let Some(start) = explicit_bound("start", range.start.as_deref())? {
        bounds.start = Some(start);
    }
    if let Some(end) = explicit_bound("end", range.end.as_deref())? {
        bounds.end = Some(end);
    }
    Ok(bounds)
}

/// Apply `config` to `rows`, keeping their order.
///
/// Under a date filter, rows whose date cannot be read are dropped. Under
/// `min_score`, rows without a score are dropped. Tags match exactly.
pub fn filter_rows(mut rows: Vec<TableRow>, config: &FilterConfig, today: NaiveDate) -> Result<Vec<TableRow>> {
    let total = rows.len();

    if let Some(range) = &config.date_range {
        let bounds = resolve_date_bounds(range, today)?;
        if !bounds.is_unbounded() {
            rows.retain(|row| normalize_date(&row.date).is_some_and(|date| bounds.contains(date)));
        }
    }

    if !config.tags.is_empty() {
        rows.retain(|row| {
            row.tags
                .as_deref()
                .is_some_and(|tags| tags.iter().any(|tag| config.tags.contains(tag)))
        });
    }

    if let Some(min_score) = config.min_score {
        rows.retain(|row| row.score.is_some_and(|score| score >= min_score));
    }

    log::info!("Filters kept {} of {} rows", rows.len(), total);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(path: &str, date: &str, tags: &[&str], score: Option<f64>) -> TableRow {
        TableRow {
            file_path: path.to_string(),
            date: date.to_string(),
            tags: if tags.is_empty() {
                None
            } else {
                Some(tags.iter().map(|t| t.to_string()).collect())
            },
            score,
            ..Default::default()
        }
    }

    fn paths(rows: &[TableRow]) -> Vec<&str> {
        rows.iter().map(|r| r.file_path.as_str()).collect()
    }

    fn sample() -> Vec<TableRow> {
        vec![
            row("a.md", "2024-03-01", &["AI"], Some(9.0)),
            row("b.md", "2024/02/20 10:00", &["融资"], Some(6.5)),
            row("c.md", "2024.3.5", &[], None),
            row("d.md", "未知", &["AI", "融资"], Some(8.0)),
        ]
    }

    // ------------------------------------------------------------------------
    // normalize_date tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2024-03-01"), Some(day(2024, 3, 1)));
        assert_eq!(normalize_date("2024/3/1"), Some(day(2024, 3, 1)));
        assert_eq!(normalize_date("2024.03.01 08:30"), Some(day(2024, 3, 1)));
        assert_eq!(normalize_date("2024-03-01T23:00:00+08:00"), Some(day(2024, 3, 1)));
    }

    #[test]
    fn test_normalize_date_rejects_garbage() {
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("2024-13-01"), None);
        assert_eq!(normalize_date("2024-03/01"), None);
        assert_eq!(normalize_date("昨天"), None);
    }

    // ------------------------------------------------------------------------
    // resolve_date_bounds tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_recent_days_rule() {
        let range = DateRange {
            custom: Some("最近7天".to_string()),
            ..Default::default()
        };
        let bounds = resolve_date_bounds(&range, day(2024, 3, 8)).unwrap();
        assert_eq!(bounds.start, Some(day(2024, 3, 1)));
        assert_eq!(bounds.end, Some(day(2024, 3, 8)));
    }

    #[test]
    fn test_recent_days_rule_out_of_range() {
        for rule in ["最近1000000000天", "最近100000000000000天", "最近99999999999999999999天"] {
            let range = DateRange {
                custom: Some(rule.to_string()),
                ..Default::default()
            };
            let err = resolve_date_bounds(&range, day(2024, 3, 8)).unwrap_err();
            assert!(err.is_validation(), "{rule}");
        }
    }

    #[test]
    fn test_range_and_single_rules() {
        let today = day(2024, 3, 8);
        let range = DateRange {
            custom: Some("2024-02-01 TO 2024-02-29".to_string()),
            ..Default::default()
        };
        let bounds = resolve_date_bounds(&range, today).unwrap();
        assert_eq!(bounds.start, Some(day(2024, 2, 1)));
        assert_eq!(bounds.end, Some(day(2024, 2, 29)));

        let single = DateRange {
            custom: Some("2024-03-05".to_string()),
            ..Default::default()
        };
        let bounds = resolve_date_bounds(&single, today).unwrap();
        assert_eq!(bounds.start, bounds.end);
    }

    #[test]
    fn test_explicit_bounds_override_custom() {
        let range = DateRange {
            start: Some("2024-03-03".to_string()),
            end: None,
            custom: Some("最近30天".to_string()),
        };
        let bounds = resolve_date_bounds(&range, day(2024, 3, 8)).unwrap();
        assert_eq!(bounds.start, Some(day(2024, 3, 3)));
        assert_eq!(bounds.end, Some(day(2024, 3, 8)));
    }

    #[test]
    fn test_unknown_rule_is_unbounded() {
        let range = DateRange {
            custom: Some("上个季度".to_string()),
            ..Default::default()
        };
        assert!(resolve_date_bounds(&range, day(2024, 3, 8)).unwrap().is_unbounded());
    }

    #[test]
    fn test_invalid_explicit_bound() {
        let range = DateRange {
            end: Some("soon".to_string()),
            ..Default::default()
        };
        let err = resolve_date_bounds(&range, day(2024, 3, 8)).unwrap_err();
        assert!(err.is_validation());
    }

    // ------------------------------------------------------------------------
    // filter_rows tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_empty_config_keeps_everything() {
        let config = FilterConfig::default();
        assert!(config.is_empty());
        let kept = filter_rows(sample(), &config, day(2024, 3, 8)).unwrap();
        assert_eq!(kept.len(), 4);
    }

    #[test]
    fn test_date_filter_drops_unreadable_dates() {
        let config = FilterConfig {
            date_range: Some(DateRange {
                start: Some("2024-03-01".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let kept = filter_rows(sample(), &config, day(2024, 3, 8)).unwrap();
        assert_eq!(paths(&kept), vec!["a.md", "c.md"]);
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let config = FilterConfig {
            date_range: Some(DateRange {
                start: Some("2024-02-20".to_string()),
                end: Some("2024-03-01".to_string()),
                custom: None,
            }),
            ..Default::default()
        };
        let kept = filter_rows(sample(), &config, day(2024, 3, 8)).unwrap();
        assert_eq!(paths(&kept), vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_tag_filter_matches_any() {
        let config = FilterConfig {
            tags: vec!["融资".to_string(), "机器人".to_string()],
            ..Default::default()
        };
        let kept = filter_rows(sample(), &config, day(2024, 3, 8)).unwrap();
        assert_eq!(paths(&kept), vec!["b.md", "d.md"]);
    }

    #[test]
    fn test_min_score_drops_unscored() {
        let config = FilterConfig {
            min_score: Some(8.0),
            ..Default::default()
        };
        let kept = filter_rows(sample(), &config, day(2024, 3, 8)).unwrap();
        assert_eq!(paths(&kept), vec!["a.md", "d.md"]);
    }

    #[test]
    fn test_filters_compose() {
        let config = FilterConfig {
            date_range: Some(DateRange {
                custom: Some("最近30天".to_string()),
                ..Default::default()
            }),
            tags: vec!["AI".to_string()],
            min_score: Some(5.0),
        };
        let kept = filter_rows(sample(), &config, day(2024, 3, 8)).unwrap();
        assert_eq!(paths(&kept), vec!["a.md"]);
    }

    #[test]
    fn test_config_deserializes() {
        let json = r#"{"date_range":{"custom":"最近7天"},"tags":["AI"],"min_score":7}"#;
        let config: FilterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tags, vec!["AI"]);
        assert_eq!(config.min_score, Some(7.0));
        assert_eq!(config.date_range.unwrap().custom.as_deref(), Some("最近7天"));
    }
}
