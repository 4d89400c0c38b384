//! Response checks for API scenarios
//!
//! Every check returns an `E2eError` wrapped in `anyhow` so the runner can
//! report which kind of assertion failed.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use super::client::ApiResponse;
use crate::error::E2eError;

fn id_format() -> &'static Regex {
    static ID_FORMAT: OnceLock<Regex> = OnceLock::new();
    ID_FORMAT.get_or_init(|| Regex::new(r"^[A-Za-z0-9\-_]+$").expect("static regex"))
}

pub fn expect_status(response: &ApiResponse, allowed: &[u16], context: &str) -> Result<()> {
    if allowed.contains(&response.status) {
        return Ok(());
    }
    let expected = allowed
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(" or ");
    Err(E2eError::HttpStatus {
        context: context.to_string(),
        expected,
        actual: response.status,
    }
    .into())
}

pub fn expect_success(response: &ApiResponse, context: &str) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(E2eError::HttpStatus {
            context: context.to_string(),
            expected: "2xx".to_string(),
            actual: response.status,
        }
        .into())
    }
}

pub fn expect_response_time(response: &ApiResponse, limit_ms: u64) -> Result<()> {
    let elapsed_ms = response.elapsed_ms();
    if elapsed_ms < limit_ms {
        Ok(())
    } else {
        Err(E2eError::ResponseTime {
            elapsed_ms,
            limit_ms,
        }
        .into())
    }
}

/// The body must be a JSON object
pub fn as_object<'a>(data: &'a Value, context: &str) -> Result<&'a Map<String, Value>> {
    data.as_object()
        .ok_or_else(|| E2eError::schema(context, format!("expected an object, got {}", data)).into())
}

pub fn require_string<'a>(body: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    match body.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(E2eError::schema(field, format!("expected a string, got {}", other)).into()),
        None => Err(E2eError::schema(field, "missing").into()),
    }
}

/// Non-empty and `^[A-Za-z0-9\-_]+$`
pub fn expect_valid_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(E2eError::schema("id", "empty").into());
    }
    if !id_format().is_match(id) {
        return Err(E2eError::schema("id", format!("'{}' has unexpected characters", id)).into());
    }
    Ok(())
}

pub fn expect_field_eq(body: &Map<String, Value>, field: &str, expected: &str) -> Result<()> {
    let actual = require_string(body, field)?;
    if actual == expected {
        Ok(())
    } else {
        Err(E2eError::schema(field, format!("expected '{}', got '{}'", expected, actual)).into())
    }
}

/// Absent or null is fine; present must be a string
pub fn optional_string<'a>(body: &'a Map<String, Value>, field: &str) -> Result<Option<&'a str>> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(E2eError::schema(field, format!("expected a string, got {}", other)).into()),
    }
}

pub fn optional_object<'a>(
    body: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a Map<String, Value>>> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(E2eError::schema(field, format!("expected an object, got {}", other)).into()),
    }
}

/// Accepts RFC 3339, naive date-times and plain dates
pub fn validate_timestamp(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(E2eError::schema(field, "empty timestamp").into());
    }
    let parsed = DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok();
    if parsed {
        Ok(())
    } else {
        Err(E2eError::schema(field, format!("'{}' is not a date", value)).into())
    }
}

/// Case-insensitive membership check for a lifecycle status
pub fn expect_status_value(status: &str, allowed: &[&str]) -> Result<()> {
    let lower = status.to_lowercase();
    if allowed.iter().any(|a| *a == lower) {
        Ok(())
    } else {
        Err(E2eError::schema(
            "status",
            format!("'{}' not one of {}", status, allowed.join(", ")),
        )
        .into())
    }
}
