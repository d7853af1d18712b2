//! Front matter extraction and the metadata export header.
//!
//! Front matter is a YAML block delimited by `---` lines at the start of the file:
//!
//! ```markdown
//! ---
//! title: My Page
//! date: 2024-06-01
//! categories: [rust, systems]
//! published: true
//! ---
//!
//! # Content starts here
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;

const DELIMITER: &str = "---";

#[derive(thiserror::Error, Debug)]
pub enum FrontmatterError {
    #[error("document has no front matter block (expected a leading '---' line)")]
    Missing,

    #[error("front matter opened on line {line} is never closed")]
    Unterminated { line: usize },

    #[error("front matter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,

    #[error("front matter is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("front matter field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("front matter keys must be strings")]
    NonStringKey,

    #[error("failed to serialize metadata export: {0}")]
    Export(#[from] serde_json::Error),
}

// =============================================================================
// Dates
// =============================================================================

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not an ISO-8601 date")]
pub struct DateParseError(String);

/// A publication date as written by the author.
///
/// Keeps the raw text so re-serialization reproduces it exactly, and orders by
/// the parsed instant. Dates without a time sort as midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocDate {
    raw: String,
    at: NaiveDateTime,
}

impl DocDate {
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for DocDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let at = DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(|| DateParseError(s.to_string()))?;

        Ok(Self {
            raw: s.to_string(),
            at,
        })
    }
}

impl Ord for DocDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at).then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for DocDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DocDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DocDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Front matter record
// =============================================================================

/// Article metadata parsed from the front matter block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    pub title: String,
    pub date: DocDate,
    pub categories: Vec<String>,
    pub published: bool,
    /// Page description for previews
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Additional arbitrary metadata, exported verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Frontmatter {
    /// Build the record from a parsed YAML mapping, validating each field.
    fn from_mapping(mut mapping: serde_yaml::Mapping) -> Result<Self, FrontmatterError> {
        let title = match take(&mut mapping, "title")? {
            Value::String(s) if !s.trim().is_empty() => s,
            _ => return Err(invalid("title", "a non-empty string")),
        };

        let date = match take(&mut mapping, "date")? {
            Value::String(s) => s.parse().map_err(|_| invalid("date", "an ISO-8601 date"))?,
            _ => return Err(invalid("date", "an ISO-8601 date")),
        };

        let categories = match take(&mut mapping, "categories")? {
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    _ => Err(invalid("categories", "a list of strings")),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(invalid("categories", "a list of strings")),
        };

        let published = match take(&mut mapping, "published")? {
            Value::Bool(b) => b,
            _ => return Err(invalid("published", "a boolean")),
        };

        let description = match mapping.remove("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(_) => return Err(invalid("description", "a string")),
        };

        let mut extra = serde_json::Map::new();
        for (key, value) in mapping {
            let Value::String(key) = key else {
                return Err(FrontmatterError::NonStringKey);
            };
            extra.insert(key, serde_json::to_value(value)?);
        }

        Ok(Self {
            title,
            date,
            categories,
            published,
            description,
            extra,
        })
    }

    /// Serialize the metadata as a module-level script the host template reads statically.
    ///
    /// The JSON is safe to embed literally: `<`, `>` and `&` are written as
    /// unicode escapes so no string value can close the surrounding script.
    pub fn metadata_export(&self) -> Result<String, FrontmatterError> {
        let json = serde_json::to_string(self)?
            .replace('<', "\\u003c")
            .replace('>', "\\u003e")
            .replace('&', "\\u0026")
            .replace('\u{2028}', "\\u2028")
            .replace('\u{2029}', "\\u2029");

        Ok(format!(
            "<script context=\"module\">\n\texport const metadata = {json};\n</script>\n"
        ))
    }
}

fn take(mapping: &mut serde_yaml::Mapping, field: &'static str) -> Result<Value, FrontmatterError> {
    match mapping.remove(field) {
        None | Some(Value::Null) => Err(FrontmatterError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn invalid(field: &'static str, expected: &'static str) -> FrontmatterError {
    FrontmatterError::InvalidField { field, expected }
}

// =============================================================================
// Extraction
// =============================================================================

/// Result of splitting a source into front matter and body.
#[derive(Debug)]
pub struct Extracted {
    pub front_matter: Frontmatter,
    /// The markup body without the front matter block
    pub body: String,
    /// Number of source lines before the body, front matter included
    pub body_line_offset: usize,
}

/// Split raw source text into validated front matter and the remaining body.
pub fn extract(source: &str) -> Result<Extracted, FrontmatterError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut lines = source.split_inclusive('\n').enumerate();

    // The opening delimiter must be the first non-blank line
    let opening = lines
        .by_ref()
        .find(|(_, line)| !line.trim().is_empty())
        .filter(|(_, line)| is_delimiter(line));
    let Some((opening_idx, _)) = opening else {
        return Err(FrontmatterError::Missing);
    };

    let mut yaml = String::new();
    let mut body_start = None;
    let mut offset: usize = source
        .split_inclusive('\n')
        .take(opening_idx + 1)
        .map(str::len)
        .sum();
    for (_, line) in lines {
        offset += line.len();
        if is_delimiter(line) {
            body_start = Some(offset);
            break;
        }
        yaml.push_str(line);
    }
    let Some(body_start) = body_start else {
        return Err(FrontmatterError::Unterminated {
            line: opening_idx + 1,
        });
    };

    let mapping = match serde_yaml::from_str::<Value>(&yaml)? {
        Value::Mapping(mapping) => mapping,
        // An empty block parses as null
        Value::Null => serde_yaml::Mapping::new(),
        _ => return Err(FrontmatterError::NotAMapping),
    };

    Ok(Extracted {
        front_matter: Frontmatter::from_mapping(mapping)?,
        body: source[body_start..].to_string(),
        body_line_offset: source[..body_start].split_inclusive('\n').count(),
    })
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}
