//! Coercions from raw spreadsheet cells to the output's semantic types.
//!
//! None of these fail: a value that cannot be coerced degrades to `None`,
//! its original text, or `false`, depending on the target type.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::emptiness::IsEmpty;
use crate::types::RawCell;

static PARTIAL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?$").expect("partial date pattern"));

const TRUTHY: &[&str] = &["true", "1", "1.0", "t", "yes", "y"];

/// Largest integer an f64 holds exactly
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;
const EPOCH_MILLIS_FLOOR: f64 = 1e12;
const EPOCH_SECONDS_FLOOR: f64 = 1e9;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Slash dates are month-first, matching what spreadsheet readers emit for
// formatted date cells.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
];

fn format_date(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Render a cell as an identifier: integral numbers lose their decimal part.
///
/// `123.0` becomes `"123"`, text is trimmed, dates become `YYYY-MM-DD`.
pub fn to_identifier_string(cell: &RawCell) -> Option<String> {
    if cell.is_empty_value() {
        return None;
    }
    match cell {
        RawCell::Null => None,
        RawCell::Text(s) => Some(s.trim().to_string()),
        RawCell::Number(n) => Some(format_number(*n)),
        RawCell::Bool(b) => Some(b.to_string()),
        RawCell::Date(d) => Some(format_date(d)),
    }
}

/// Split a cell into a list of trimmed, non-blank strings on `,` and `;`
pub fn to_string_list(cell: &RawCell) -> Vec<String> {
    if cell.is_empty_value() {
        return Vec::new();
    }
    match cell {
        RawCell::Text(s) => s
            .split([',', ';'])
            .map(str::trim)
            .filter(|piece| !piece.is_empty_value())
            .map(str::to_string)
            .collect(),
        other => to_identifier_string(other).into_iter().collect(),
    }
}

/// Explicit truthy match; anything unrecognised, including empty, is false
pub fn to_boolean(cell: &RawCell) -> bool {
    match cell {
        RawCell::Bool(b) => *b,
        RawCell::Number(n) => *n == 1.0,
        RawCell::Text(s) => {
            let lowered = s.trim().to_lowercase();
            TRUTHY.contains(&lowered.as_str())
        }
        RawCell::Null | RawCell::Date(_) => false,
    }
}

/// Exact case-insensitive match of the cell's text against `"true"`
pub fn is_true_literal(cell: &RawCell) -> bool {
    to_identifier_string(cell).is_some_and(|s| s.eq_ignore_ascii_case("true"))
}

/// Normalize a date while keeping the precision it was given with.
///
/// `YYYY`, `YYYY-MM` and `YYYY-MM-DD` pass through untouched; other text is
/// parsed and re-emitted as `YYYY-MM-DD`; text that does not parse is
/// returned trimmed rather than dropped.
pub fn to_partial_date(cell: &RawCell) -> Option<String> {
    if cell.is_empty_value() {
        return None;
    }
    match cell {
        RawCell::Null => None,
        RawCell::Date(d) => Some(format_date(d)),
        // A year typed into a numeric column comes out as a bare year
        RawCell::Number(n) => Some(format_number(*n)),
        RawCell::Bool(b) => Some(b.to_string()),
        RawCell::Text(s) => {
            let trimmed = s.trim();
            if PARTIAL_DATE.is_match(trimmed) {
                return Some(trimmed.to_string());
            }
            Some(
                parse_datetime(trimmed)
                    .map(|dt| dt.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| trimmed.to_string()),
            )
        }
    }
}

/// Convert a cell to milliseconds since the Unix epoch (UTC).
///
/// Numbers above 10^12 are taken as milliseconds, above 10^9 as seconds.
/// Anything else goes through date parsing; failure yields `None`.
pub fn to_epoch_millis(cell: &RawCell) -> Option<i64> {
    if cell.is_empty_value() {
        return None;
    }
    match cell {
        RawCell::Null | RawCell::Bool(_) => None,
        RawCell::Date(d) => Some(d.and_utc().timestamp_millis()),
        RawCell::Number(n) => epoch_from_number(*n)
            .or_else(|| parse_instant(&format_number(*n)).map(|dt| dt.timestamp_millis())),
        RawCell::Text(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(epoch_from_number)
                .or_else(|| parse_instant(trimmed).map(|dt| dt.timestamp_millis()))
        }
    }
}

fn epoch_from_number(n: f64) -> Option<i64> {
    if !n.is_finite() {
        None
    } else if n > EPOCH_MILLIS_FLOOR {
        Some(n.round() as i64)
    } else if n > EPOCH_SECONDS_FLOOR {
        Some((n * 1000.0).round() as i64)
    } else {
        None
    }
}

/// Parse a full date or date-time, keeping the calendar date as written
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a point in time; zone-less values are read as UTC and partial
/// dates resolve to the start of their period
fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(caps) = PARTIAL_DATE.captures(s) {
        let year = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2).map_or(Some(1), |m| m.as_str().parse().ok())?;
        let day = caps.get(3).map_or(Some(1), |d| d.as_str().parse().ok())?;
        return NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
    }
    parse_datetime(s).map(|dt| dt.and_utc())
}

/// Strip the `.0` a numeric-typed postcode column leaves behind
pub fn strip_decimal_suffix(s: &str) -> &str {
    s.strip_suffix(".0").unwrap_or(s)
}

/// Upper-cased, then cut to the first two characters
pub fn to_country_code(s: &str) -> String {
    s.trim().to_uppercase().chars().take(2).collect()
}
