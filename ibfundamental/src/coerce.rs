// ibfundamental/src/coerce.rs
//! Conversion of attribute and text tokens into typed values.
//!
//! Every extractor goes through these helpers so that the empty/sentinel
//! rules and error reporting stay uniform:
//! - `""` and `"0"` are absent dates, never errors.
//! - Numeric tokens have no implicit default; an empty token is a `Format` error.

use crate::base::FundamentalError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// The provider's token for "no date".
pub const SENTINEL_DATE: &str = "0";

// Extended form first; basic form (`20230331`) second.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];
const NAIVE_TIMESTAMP_FORMATS: [&str; 5] = [
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M",
  "%Y%m%dT%H%M%S",
];

static CAMEL_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap());
static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

fn is_absent_date(token: &str) -> bool {
  token.is_empty() || token == SENTINEL_DATE
}

fn parse_naive_date(token: &str) -> Option<NaiveDate> {
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
}

fn parse_naive_timestamp(token: &str) -> Option<NaiveDateTime> {
  NAIVE_TIMESTAMP_FORMATS
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(token, fmt).ok())
}

/// Parses an ISO-8601 date or timestamp, keeping only the calendar date.
pub fn parse_date(token: &str) -> Result<Option<NaiveDate>, FundamentalError> {
  let token = token.trim();
  if is_absent_date(token) {
    return Ok(None);
  }
  if let Some(date) = parse_naive_date(token) {
    return Ok(Some(date));
  }
  if let Some(ts) = parse_naive_timestamp(token) {
    return Ok(Some(ts.date()));
  }
  DateTime::parse_from_rfc3339(token)
    .map(|dt| Some(dt.date_naive()))
    .map_err(|_| FundamentalError::Format(format!("Invalid ISO-8601 date: '{}'", token)))
}

/// Parses an ISO-8601 timestamp into UTC. Offsets are honoured; naive
/// timestamps and bare dates are taken to be UTC.
pub fn parse_timestamp(token: &str) -> Result<Option<DateTime<Utc>>, FundamentalError> {
  let token = token.trim();
  if is_absent_date(token) {
    return Ok(None);
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
    return Ok(Some(dt.with_timezone(&Utc)));
  }
  if let Some(ts) = parse_naive_timestamp(token) {
    return Ok(Some(Utc.from_utc_datetime(&ts)));
  }
  parse_naive_date(token)
    .map(|d| Some(Utc.from_utc_datetime(&d.and_time(chrono::NaiveTime::MIN))))
    .ok_or_else(|| FundamentalError::Format(format!("Invalid ISO-8601 timestamp: '{}'", token)))
}

/// Parses a finite decimal number. `NaN` and infinities are rejected.
pub fn parse_float(token: &str) -> Result<f64, FundamentalError> {
  let token = token.trim();
  match token.parse::<f64>() {
    Ok(value) if value.is_finite() => Ok(value),
    _ => Err(FundamentalError::Format(format!("Invalid number: '{}'", token))),
  }
}

pub fn parse_int(token: &str) -> Result<i64, FundamentalError> {
  let token = token.trim();
  token
    .parse::<i64>()
    .map_err(|_| FundamentalError::Format(format!("Invalid integer: '{}'", token)))
}

/// Parses a non-negative count such as a share total.
pub fn parse_count(token: &str) -> Result<u64, FundamentalError> {
  let token = token.trim();
  token
    .parse::<u64>()
    .map_err(|_| FundamentalError::Format(format!("Invalid non-negative integer: '{}'", token)))
}

/// Converts a mixed/camel-case identifier to snake case.
///
/// `ProjLTGrowthRate` becomes `proj_lt_growth_rate`; already-normalized
/// names come back unchanged.
pub fn normalize_field_name(name: &str) -> String {
  let words = CAMEL_WORD.replace_all(name, "${1}_${2}");
  CAMEL_BOUNDARY.replace_all(&words, "${1}_${2}").to_lowercase()
}
