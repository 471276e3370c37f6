//! Local checks run before any request is sent.

use chrono::{DateTime, SecondsFormat};

use crate::error::{ProviderError, Result};

/// Reject `value` unless it is one of `allowed`
pub fn check_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(ProviderError::validation(
        field,
        format!(
            "\"{}\" is not a valid value, expected one of ( {} )",
            value,
            allowed.join(" | ")
        ),
    ))
}

/// Parse an RFC 3339 timestamp into Unix seconds
pub fn parse_timestamp(field: &str, value: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .map_err(|_| {
            ProviderError::validation(
                field,
                format!("can't convert \"{}\" to a time, expected an RFC 3339 timestamp", value),
            )
        })
}

/// Format Unix seconds as an RFC 3339 UTC timestamp
pub fn format_timestamp(timestamp: i64) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}
