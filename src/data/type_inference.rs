//! Column type detection and cell value parsing
//!
//! A column is classified from a small sample of its raw cell values. The
//! parsers never fail loudly: anything they cannot read comes back as `None`,
//! which the comparators treat as "sort last".

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Rows sampled when autodetecting a column type
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Share of the sample that must parse before a stronger type wins
pub const DEFAULT_THRESHOLD: f64 = 0.7;

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").unwrap());

/// Date layouts tried in order, each with an optional `[ T]HH:MM[:SS]` suffix.
/// Capture groups are normalised to (year, month, day) by `DateLayout`.
static DATE_PATTERNS: LazyLock<Vec<(DateLayout, Regex)>> = LazyLock::new(|| {
    const TIME_SUFFIX: &str = r"(?:[ T](\d{1,2}):(\d{2})(?::(\d{2}))?)?$";
    vec![
        // DD.MM.YYYY
        (
            DateLayout::DayMonthYear,
            Regex::new(&format!(r"^(\d{{1,2}})\.(\d{{1,2}})\.(\d{{4}}){}", TIME_SUFFIX)).unwrap(),
        ),
        // YYYY-MM-DD
        (
            DateLayout::YearMonthDay,
            Regex::new(&format!(r"^(\d{{4}})-(\d{{1,2}})-(\d{{1,2}}){}", TIME_SUFFIX)).unwrap(),
        ),
        // MM/DD/YYYY
        (
            DateLayout::MonthDayYear,
            Regex::new(&format!(r"^(\d{{1,2}})/(\d{{1,2}})/(\d{{4}}){}", TIME_SUFFIX)).unwrap(),
        ),
    ]
});

/// Formats accepted by the general fallback parser
const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d %B %Y %H:%M",
    "%B %d, %Y %H:%M",
];

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y"];

#[derive(Debug, Clone, Copy)]
enum DateLayout {
    DayMonthYear,
    YearMonthDay,
    MonthDayYear,
}

/// Value type of a column, which selects its comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Time,
    Date,
}

impl ColumnType {
    /// Parse a header-declared type (`data-type`)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Some(ColumnType::Text),
            "number" | "numeric" => Some(ColumnType::Number),
            "time" => Some(ColumnType::Time),
            "date" | "datetime" => Some(ColumnType::Date),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Time => "time",
            ColumnType::Date => "date",
        };
        write!(f, "{}", name)
    }
}

/// Parse a number after removing whitespace and turning a decimal comma into a dot
pub fn parse_number(value: &str) -> Option<f64> {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    compact.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse `H:MM` or `H:MM:SS` into seconds since midnight
pub fn parse_time(value: &str) -> Option<u32> {
    let caps = TIME_PATTERN.captures(value.trim())?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    let seconds: u32 = match caps.get(3) {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };
    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Parse a date or date-time.
///
/// Tries `DD.MM.YYYY`, `YYYY-MM-DD` and `MM/DD/YYYY` (each with an optional
/// time suffix), then a bare time anchored at 0000-01-01, then a handful of
/// general formats. `None` is the invalid-date sentinel.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for (layout, pattern) in DATE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(value) {
            return date_from_captures(*layout, &caps);
        }
    }

    if let Some(seconds) = parse_time(value) {
        let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;
        return NaiveDate::from_ymd_opt(0, 1, 1).map(|d| d.and_time(time));
    }

    parse_general_date(value)
}

fn date_from_captures(layout: DateLayout, caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let field = |i: usize| -> Option<u32> { caps.get(i).and_then(|m| m.as_str().parse().ok()) };
    let (year, month, day) = match layout {
        DateLayout::DayMonthYear => (field(3)?, field(2)?, field(1)?),
        DateLayout::YearMonthDay => (field(1)?, field(2)?, field(3)?),
        DateLayout::MonthDayYear => (field(3)?, field(1)?, field(2)?),
    };
    let hour = field(4).unwrap_or(0);
    let minute = field(5).unwrap_or(0);
    let second = field(6).unwrap_or(0);

    NaiveDate::from_ymd_opt(year as i32, month, day)?.and_hms_opt(hour, minute, second)
}

fn parse_general_date(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.naive_utc());
    }
    for format in FALLBACK_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    for format in FALLBACK_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Column type autodetection
#[derive(Debug, Clone, Copy)]
pub struct TypeInference {
    sample_size: usize,
    threshold: f64,
}

impl Default for TypeInference {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE, DEFAULT_THRESHOLD)
    }
}

impl TypeInference {
    pub fn new(sample_size: usize, threshold: f64) -> Self {
        Self {
            sample_size: sample_size.max(1),
            threshold,
        }
    }

    /// Classify a column from its extracted raw values.
    ///
    /// Precedence is time, date, number, text. Time and date need more than
    /// `threshold` of the sample to parse, and time wins a tie with date. A
    /// number column needs every value to parse, not only the sampled ones.
    pub fn detect<S: AsRef<str>>(&self, values: &[S]) -> ColumnType {
        let sample = &values[..values.len().min(self.sample_size)];
        if sample.is_empty() {
            return ColumnType::Text;
        }

        let total = sample.len() as f64;
        let times = sample
            .iter()
            .filter(|v| parse_time(v.as_ref()).is_some())
            .count();
        let dates = sample
            .iter()
            .filter(|v| parse_date(v.as_ref()).is_some())
            .count();

        if times as f64 / total > self.threshold && times >= dates {
            return ColumnType::Time;
        }
        if dates as f64 / total > self.threshold {
            return ColumnType::Date;
        }
        if values.iter().all(|v| parse_number(v.as_ref()).is_some()) {
            return ColumnType::Number;
        }
        ColumnType::Text
    }
}
