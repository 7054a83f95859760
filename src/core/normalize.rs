//! Field normalizers for raw workbook cells.
//!
//! Every function here is total: dirty or missing data resolves to a safe
//! default instead of an error, so a bad cell can never block a
//! recommendation.

use crate::models::CellValue;
use chrono::{NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use std::sync::OnceLock;

/// Marker for facilities that never close
pub const ALWAYS_OPEN_MARKER: &str = "24/7";

/// Time layouts tried in order, after AM/PM spacing has been normalized away
const TIME_FORMATS: &[&str] = &["%I:%M%p", "%I:%M:%S%p", "%H:%M", "%H:%M:%S"];

/// Date-time layouts for cells exported with a date component
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

fn rate_pattern() -> &'static Regex {
    static RATE_RE: OnceLock<Regex> = OnceLock::new();
    RATE_RE.get_or_init(|| Regex::new(r"(\d+(\.\d+)?)").expect("rate pattern is valid"))
}

/// Convert a YES/NO-like cell to 1/0
///
/// Text is trimmed and upper-cased; a leading `Y` is 1 and a leading `N` is 0.
/// Numbers are 1 when non-zero, NaN included. A blank cell in a present column
/// counts as 1, matching the encoding the model was trained on; a missing
/// column is 0.
pub fn yesno_to_bit(value: &CellValue) -> u8 {
    match value {
        CellValue::Text(s) => {
            let s = s.trim().to_uppercase();
            u8::from(s.starts_with('Y'))
        }
        CellValue::Number(n) => u8::from(*n != 0.0),
        CellValue::Bool(b) => u8::from(*b),
        CellValue::Blank => 1,
        CellValue::Empty => 0,
    }
}

/// Convert a PWD/SC discount annotation to 1/0
pub fn discount_to_bit(value: &CellValue) -> u8 {
    match value {
        CellValue::Text(s) => {
            let s = s.trim().to_uppercase();
            u8::from(["EXEMPT", "DISCOUNT", "YES"].iter().any(|k| s.contains(k)))
        }
        _ => 0,
    }
}

/// Extract a numeric initial rate, or 0.0 when none can be found
///
/// Thousands separators are stripped before the first integer or decimal
/// number in the text is taken, so `"PHP 1,200.50 / 3hrs"` gives `1200.5`.
pub fn rate_to_number(value: &CellValue) -> f64 {
    match value {
        CellValue::Number(n) if n.is_nan() => 0.0,
        CellValue::Number(n) => *n,
        CellValue::Bool(b) => f64::from(u8::from(*b)),
        CellValue::Text(s) => {
            let cleaned = s.replace(',', "");
            rate_pattern()
                .find(&cleaned)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0)
        }
        CellValue::Empty | CellValue::Blank => 0.0,
    }
}

/// Parse the hour (0-23) out of a free-text schedule cell
///
/// Returns `None` for non-text, blank or `N/A` cells and for anything that
/// does not look like a time. A `24/7` cell yields `Some(0)`; callers are
/// expected to check for the marker before relying on the hour.
pub fn parse_hour(value: &CellValue) -> Option<u8> {
    let s = value.as_text()?.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("N/A") {
        return None;
    }
    if s.contains(ALWAYS_OPEN_MARKER) {
        return Some(0);
    }
    parse_time(s).and_then(|t| u8::try_from(t.hour()).ok())
}

/// Whether a schedule cell carries the always-open marker
pub fn is_always_open(value: &CellValue) -> bool {
    value
        .as_text()
        .map(|s| s.to_uppercase().contains(ALWAYS_OPEN_MARKER))
        .unwrap_or(false)
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let compact = normalize_meridiem(s);

    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&compact, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.time())
        })
}

/// Upper-case, drop dots from `a.m.`/`p.m.` and glue the meridiem to the time
///
/// A bare hour such as `6AM` gains explicit minutes (`6:00AM`) since chrono
/// will not build a time without them.
fn normalize_meridiem(s: &str) -> String {
    let upper = s.trim().to_uppercase().replace('.', "");
    let compact = upper
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" AM", "AM")
        .replace(" PM", "PM");

    let bare_hour = compact
        .strip_suffix("AM")
        .or_else(|| compact.strip_suffix("PM"))
        .filter(|hour| !hour.is_empty() && !hour.contains(':'))
        .map(str::len);

    match bare_hour {
        Some(len) => {
            let (hour, meridiem) = compact.split_at(len);
            format!("{hour}:00{meridiem}")
        }
        None => compact,
    }
}
