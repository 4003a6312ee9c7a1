//! Column codecs shared by the SQLite submodules.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::Row;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Fixed-width RFC 3339 so that text comparison orders timestamps correctly.
pub(super) fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn ts_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(super) fn json_col<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(super) fn opt_json_col<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

pub(super) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// `extras` is stored as an object even when the caller left it null.
pub(super) fn extras_json(value: &serde_json::Value) -> Result<String> {
    if value.is_null() {
        return Ok("{}".to_string());
    }
    to_json(value)
}

/// `?, ?, ?` for an `IN (...)` list of `count` values.
pub(super) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub(super) fn text_values(values: &[String]) -> Vec<Value> {
    values.iter().map(|v| Value::Text(v.clone())).collect()
}

pub(super) fn int(value: usize) -> Value {
    Value::Integer(value as i64)
}

/// Turn free text into an FTS5 query matching every term, quoting each term so
/// user input can't inject FTS syntax.
pub(super) fn fts_query(raw: &str) -> Option<String> {
    let terms: Vec<String> = raw
        .split_whitespace()
        .map(|term| term.replace('"', ""))
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{term}\""))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_sort_as_text() {
        let early = DateTime::parse_from_rfc3339("2018-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let late = DateTime::parse_from_rfc3339("2018-01-01T00:00:00.5Z").unwrap().with_timezone(&Utc);
        assert!(fmt_ts(&early) < fmt_ts(&late));
        assert_eq!(fmt_ts(&early), "2018-01-01T00:00:00.000000Z");
    }

    #[test]
    fn fts_terms_are_quoted() {
        assert_eq!(fts_query("moose  freedom").as_deref(), Some("\"moose\" \"freedom\""));
        assert_eq!(fts_query("gorgon\"zola OR").as_deref(), Some("\"gorgonzola\" \"OR\""));
        assert_eq!(fts_query("   "), None);
    }

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(3), "?, ?, ?");
        assert_eq!(placeholders(1), "?");
    }
}
