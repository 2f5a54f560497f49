use crate::constants::LATEST;
use crate::errors::{AppError, AppResult};
use crate::models::DateSpec;
use chrono::NaiveDate;

/// Validates a dump date token (`latest` or `YYYYMMDD`).
///
/// Checks that the token is either the literal `latest` or exactly 8 ASCII
/// digits naming a real calendar date (no month 13, no February 30).
///
/// Returns the parsed [`DateSpec`], or `InvalidDateFormat` otherwise.
pub fn validate_date(token: &str) -> AppResult<DateSpec> {
    if token == LATEST {
        return Ok(DateSpec::Latest);
    }
    parse_day(token)
        .map(DateSpec::Day)
        .ok_or_else(|| AppError::InvalidDateFormat(token.to_string()))
}

/// Parses `YYYYMMDD` into a calendar date.
fn parse_day(token: &str) -> Option<NaiveDate> {
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = token[..4].parse().ok()?;
    let month: u32 = token[4..6].parse().ok()?;
    let day: u32 = token[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
