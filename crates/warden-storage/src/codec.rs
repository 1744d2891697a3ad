// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column encodings shared by the entity mappings.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with nanosecond
//! precision in UTC, so lexicographic order equals chronological order and a
//! value read back compares equal to the value written. That holds only for
//! four-digit years, so [`encode_time`] refuses anything outside 0000-9999
//! before it reaches a row.

use std::str::FromStr;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use rusqlite::Row;
use rusqlite::types::{Type, Value};
use uuid::Uuid;
use warden_core::WardenError;

pub fn encode_time(t: &DateTime<Utc>) -> Result<Value, WardenError> {
    if !(0..=9999).contains(&t.year()) {
        return Err(WardenError::Storage {
            source: format!("timestamp {t} is outside years 0000-9999").into(),
        });
    }
    Ok(Value::Text(t.to_rfc3339_opts(SecondsFormat::Nanos, true)))
}

pub fn encode_uuid(id: &Uuid) -> Value {
    Value::Text(id.to_string())
}

/// Encode any serializable value as a JSON text column.
pub fn encode_json<T: serde::Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_string(value).map(Value::Text)
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

pub fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

pub fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_err(idx, e))
}

pub fn json_at<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_err(idx, e))
}

pub fn opt_json_at<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| conversion_err(idx, e)),
        None => Ok(None),
    }
}

/// Decode a strum-backed enum stored by its lowercase name.
pub fn enum_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = strum::ParseError>,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw).map_err(|e| conversion_err(idx, e))
}
