use chrono::NaiveDate;
use serde::Deserialize;

use crate::dates::{format_iso_date, monday_of, parse_iso_date, sunday_of};

// Positional file layout, one field per line:
//   0 title
//   1 startDate or startDate,endDate
//   2 summary
//   3 blank separator
//   4.. body
pub const TITLE_LINE: usize = 0;
pub const DATE_LINE: usize = 1;
pub const SUMMARY_LINE: usize = 2;
pub const SEPARATOR_LINE: usize = 3;
pub const CONTENT_START_LINE: usize = 4;

/// Fields of a positional file before any default or derivation is applied.
#[derive(Debug, PartialEq)]
pub struct PositionalFields<'a> {
    pub title: &'a str,
    pub date_field: &'a str,
    pub summary: &'a str,
    pub separator: &'a str,
    pub content: String,
}

pub fn parse_positional(text: &str) -> PositionalFields {
    let lines: Vec<&str> = text.lines().collect();
    let line = |idx: usize| lines.get(idx).copied().map(str::trim).unwrap_or("");

    let content = lines.iter()
        .skip(CONTENT_START_LINE)
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n");

    PositionalFields {
        title: line(TITLE_LINE),
        date_field: line(DATE_LINE),
        summary: line(SUMMARY_LINE),
        separator: line(SEPARATOR_LINE),
        content: content.trim().to_string(),
    }
}

/// Date line rule: `start[,end]`. An empty start means `today`, a missing end is the Sunday of the start week.
pub fn parse_date_field(date_field: &str, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), String> {
    let mut tokens = date_field.split(',').map(|t| t.trim());
    let start_token = tokens.next().unwrap_or("");
    let end_token = tokens.next().filter(|t| !t.is_empty());

    let start = if start_token.is_empty() {
        today
    } else {
        parse_iso_date(start_token)?
    };

    let end = match end_token {
        Some(end_token) => parse_iso_date(end_token)?,
        None => sunday_of(&monday_of(&start)),
    };

    Ok((start, end))
}

pub fn serialize_positional(title: &str, start: &NaiveDate, end: &NaiveDate, summary: &str, content: &str) -> String {
    format!("{}\n{},{}\n{}\n\n{}\n", title, format_iso_date(start), format_iso_date(end), summary, content)
}

/// Metadata block of a structured document. Keys follow the camelCase used on disk.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatter {
    pub title: Option<String>,
    pub week: Option<u32>,
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub summary: Option<String>,
    pub slug: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Splits `---` (YAML) or `+++` (TOML) front matter from the body.
pub fn parse_front_matter(content: &str) -> Result<(FrontMatter, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    if let Some((meta, body)) = split_block(content, "---") {
        let front_matter = if meta.trim().is_empty() {
            FrontMatter::default()
        } else {
            serde_yaml::from_str::<FrontMatter>(meta).map_err(|e| format!("Invalid YAML front matter: {}", e))?
        };
        return Ok((front_matter, body));
    }

    if let Some((meta, body)) = split_block(content, "+++") {
        let table = toml::from_str::<toml::Table>(meta).map_err(|e| format!("Invalid TOML front matter: {}", e))?;
        let front_matter = dates_as_strings(toml::Value::Table(table))
            .try_into::<FrontMatter>()
            .map_err(|e| format!("Invalid TOML front matter: {}", e))?;
        return Ok((front_matter, body));
    }

    Err("Missing front matter block".to_string())
}

fn split_block<'a>(content: &'a str, fence: &str) -> Option<(&'a str, &'a str)> {
    let rest = content.strip_prefix(fence)?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    // The closing fence may be the very first line when the block is empty
    let (meta, after) = if let Some(after) = rest.strip_prefix(fence) {
        ("", after)
    } else {
        let end = rest.find(&format!("\n{}", fence))?;
        (&rest[..end + 1], &rest[end + 1 + fence.len()..])
    };

    let body = after.strip_prefix("\r\n").or_else(|| after.strip_prefix('\n')).unwrap_or(after);
    Some((meta, body))
}

// TOML dates are their own type, the metadata block wants them as text
fn dates_as_strings(value: toml::Value) -> toml::Value {
    match value {
        toml::Value::Datetime(dt) => toml::Value::String(dt.to_string()),
        toml::Value::Table(table) => toml::Value::Table(
            table.into_iter().map(|(k, v)| (k, dates_as_strings(v))).collect()
        ),
        other => other,
    }
}
