//! YAML frontmatter reading and writing.
//!
//! Documents produced and consumed here look like:
//!
//! ```markdown
//! ---
//! title: "第 12 期周报"
//! date: 2024-03-08
//! tags: ["AI", "周报"]
//! includedItems: "[{\"slug\":\"a\",\"chineseTitle\":\"标题\"}]"
//! published: false
//! ---
//!
//! 正文
//! ```
//!
//! [`FrontmatterWriter`] emits the block line by line with explicit
//! quoting; [`extract_frontmatter`] reads it back into a `serde_yaml::Value`.
//!
//! # Usage
//!
//! ```rust
//! use vaultpress_content::markdown::frontmatter::{extract_frontmatter, FrontmatterWriter};
//!
//! let doc = FrontmatterWriter::new()
//!     .string("title", "He said \"hi\"")
//!     .boolean("published", false)
//!     .render("Body");
//!
//! let parsed = extract_frontmatter(&doc).unwrap();
//! assert_eq!(parsed.get_str("title"), Some("He said \"hi\""));
//! assert_eq!(parsed.get_bool("published"), Some(false));
//! assert_eq!(parsed.body(), "Body");
//! ```

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use vaultpress_core::{Error, Result};

// ============================================================================
// Reading
// ============================================================================

/// Parsed frontmatter and the body that follows it.
#[derive(Debug, Clone)]
pub struct FrontmatterResult<'a> {
    value: Option<Value>,
    body: &'a str,
    had_delimiters: bool,
}

impl<'a> FrontmatterResult<'a> {
    /// Whether a frontmatter block was found and parsed.
    pub fn has_frontmatter(&self) -> bool {
        self.value.is_some()
    }

    /// Whether both delimiters were present, even if the YAML was invalid.
    pub fn had_delimiters(&self) -> bool {
        self.had_delimiters
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn body(&self) -> &'a str {
        self.body
    }

    /// Deserialize the frontmatter into `T`; `None` when absent.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.value
            .clone()
            .map(|value| {
                serde_yaml::from_value(value)
                    .map_err(|e| Error::parse(format!("Failed to deserialize frontmatter: {e}")))
            })
            .transpose()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.value.as_ref()?.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.value.as_ref()?.get(key)?.as_str()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.value.as_ref()?.get(key)?.as_bool()
    }

    /// A string field that may have been written as a bare scalar of
    /// another type (a date, a number).
    pub fn get_scalar_string(&self, key: &str) -> Option<String> {
        match self.value.as_ref()?.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// A list of strings; empty when missing or not a sequence.
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.value
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(Value::as_sequence)
            .map(|seq| {
                seq.iter()
                    .filter_map(|item| item.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Split `content` into a YAML frontmatter block and a body.
///
/// - No opening `---` line: the whole content is the body.
/// - Opening line but no closing `---` line: logged, whole content is body.
/// - Invalid YAML: logged, body is what follows the closing delimiter.
///
/// A single blank line after the closing delimiter is not part of the body.
pub fn extract_frontmatter(content: &str) -> Result<FrontmatterResult<'_>> {
    let unframed = FrontmatterResult {
        value: None,
        body: content,
        had_delimiters: false,
    };

    let Some(after_open) = strip_delimiter_line(content) else {
        return Ok(unframed);
    };

    let mut offset = 0;
    let mut closing = None;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == "---" {
            closing = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let Some((yaml_end, body_start)) = closing else {
        log::warn!("Frontmatter opening delimiter found but no closing delimiter");
        return Ok(unframed);
    };

    let yaml = &after_open[..yaml_end];
    let rest = &after_open[body_start..];
    let body = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let value = match serde_yaml::from_str::<Value>(yaml) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Failed to parse frontmatter YAML: {e}");
            None
        }
    };
    Ok(FrontmatterResult {
        value,
        body,
        had_delimiters: true,
    })
}

fn strip_delimiter_line(content: &str) -> Option<&str> {
    let newline = content.find('\n')?;
    (content[..newline].trim_end() == "---").then(|| &content[newline + 1..])
}

// ============================================================================
// Writing
// ============================================================================

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid date regex"))
}

fn line_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\r\n]+").expect("Invalid line break regex"))
}

/// Whether `value` is a bare `YYYY-MM-DD` date.
pub fn is_iso_date(value: &str) -> bool {
    iso_date_re().is_match(value)
}

/// Collapse every run of line breaks to a single space.
pub fn single_line(value: &str) -> String {
    line_break_re().replace_all(value, " ").into_owned()
}

/// Escape text for the inside of a YAML double-quoted scalar.
///
/// `\` becomes `\\` and `"` becomes `\"`. Characters a YAML reader would
/// reject or fold (C0/C1 controls other than tab, line and paragraph
/// separators, `U+FFFE`/`U+FFFF`) are written as `\xNN` or `\uNNNN`
/// escapes; JSON text never contains them, so escaped JSON is unaffected.
pub fn escape_yaml_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push('\t'),
            c if (c as u32) <= 0xFF && (c.is_control() || c == '\u{85}') => {
                out.push_str(&format!("\\x{:02X}", c as u32));
            }
            '\u{2028}' | '\u{2029}' | '\u{FEFF}' | '\u{FFFE}' | '\u{FFFF}' => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// Quote a single-line string scalar.
///
/// ```rust
/// use vaultpress_content::markdown::frontmatter::quote_yaml;
///
/// assert_eq!(quote_yaml("a \"b\"\nc"), r#""a \"b\" c""#);
/// ```
pub fn quote_yaml(value: &str) -> String {
    format!("\"{}\"", escape_yaml_double_quoted(&single_line(value)))
}

/// Encode a value as JSON and embed that JSON as a YAML string scalar.
///
/// The steps are fixed: JSON-encode, double every backslash, escape every
/// `"`, wrap in double quotes. A YAML reader yields the exact JSON text
/// back, and a JSON decode of that text yields the original value.
///
/// ```rust
/// use vaultpress_content::markdown::frontmatter::escape_json_for_yaml;
///
/// let scalar = escape_json_for_yaml(&vec!["a\"b"]).unwrap();
/// assert_eq!(scalar, r#""[\"a\\\"b\"]""#);
/// ```
pub fn escape_json_for_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(format!("\"{}\"", escape_yaml_double_quoted(&json)))
}

/// Builder for a frontmatter block.
///
/// Keys are written in call order; the writer never reorders or merges.
#[derive(Debug, Clone, Default)]
pub struct FrontmatterWriter {
    lines: Vec<String>,
}

impl FrontmatterWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A double-quoted single-line string.
    pub fn string(mut self, key: &str, value: &str) -> Self {
        self.lines.push(format!("{key}: {}", quote_yaml(value)));
        self
    }

    /// A string, omitted when `None` or empty.
    pub fn optional_string(self, key: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => self.string(key, value),
            None => self,
        }
    }

    /// A double-quoted string whose line breaks survive as `\n` escapes.
    /// Omitted when empty.
    pub fn multiline_string(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            let value = value.replace("\r\n", "\n");
            self.lines
                .push(format!("{key}: \"{}\"", escape_yaml_double_quoted(&value)));
        }
        self
    }

    /// A bare number; non-finite values are skipped.
    pub fn number(mut self, key: &str, value: f64) -> Self {
        if value.is_finite() {
            self.lines.push(format!("{key}: {value}"));
        }
        self
    }

    /// A date: bare when `YYYY-MM-DD`, quoted (with a warning) otherwise.
    /// Empty values are omitted.
    pub fn date(mut self, key: &str, value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return self;
        }
        if is_iso_date(value) {
            self.lines.push(format!("{key}: {value}"));
        } else {
            log::warn!("Date {value:?} is not YYYY-MM-DD; writing it quoted");
            self.lines.push(format!("{key}: {}", quote_yaml(value)));
        }
        self
    }

    /// A flow list of quoted strings, omitted when empty.
    pub fn tags(mut self, key: &str, values: &[String]) -> Self {
        if values.is_empty() {
            return self;
        }
        let items: Vec<String> = values.iter().map(|v| quote_yaml(v)).collect();
        self.lines.push(format!("{key}: [{}]", items.join(", ")));
        self
    }

    pub fn boolean(mut self, key: &str, value: bool) -> Self {
        self.lines.push(format!("{key}: {value}"));
        self
    }

    /// A value stored as an escaped JSON string (see [`escape_json_for_yaml`]).
    pub fn json_string<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Result<Self> {
        self.lines.push(format!("{key}: {}", escape_json_for_yaml(value)?));
        Ok(self)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `---`, the lines, `---`, a blank line, then the body.
    pub fn render(&self, body: &str) -> String {
        format!("---\n{}\n---\n\n{body}", self.lines.join("\n"))
    }
}
