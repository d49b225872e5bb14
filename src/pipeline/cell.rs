//! The tri-state cell value shared by the loader, aggregators and writer
//!
//! A cell is either a present numeric/date value, a present categorical value,
//! or absent. Coercion never fails: anything that does not parse becomes
//! [`Cell::Absent`].

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Date formats tried in order by [`parse_date_lenient`]
///
/// Ambiguous day/month dates are read month-first; day-first only matches
/// once the first field cannot be a month.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
];

/// Datetime formats tried after the plain date formats
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A single typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Integer(i64),
    Number(f64),
    Date(NaiveDate),
    Flag(bool),
    Text(String),
    Absent,
}

impl Cell {
    /// Coerce raw text to a number, absent on failure
    pub fn number(raw: Option<&str>) -> Self {
        raw.and_then(parse_number_lenient)
            .map(Cell::Number)
            .unwrap_or(Cell::Absent)
    }

    /// Coerce raw text to a date, absent on failure
    pub fn date(raw: Option<&str>) -> Self {
        raw.and_then(parse_date_lenient)
            .map(Cell::Date)
            .unwrap_or(Cell::Absent)
    }

    /// Keep raw text as a label; empty text is absent
    pub fn text(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if !s.is_empty() => Cell::Text(s.to_string()),
            _ => Cell::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Cell::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render for CSV output: absent becomes an empty field
    pub fn to_field(&self) -> Option<String> {
        match self {
            Cell::Absent => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Number(v) => write!(f, "{}", format_number(*v)),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Flag(b) => write!(f, "{}", b),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Absent => write!(f, "NA"),
        }
    }
}

/// Whole values keep one decimal (`52.0`); others print in shortest form
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Parse a number, tolerating surrounding whitespace; rejects NaN and infinities
pub fn parse_number_lenient(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a date from the common registry spellings
///
/// Plain dates are tried first, then datetimes (the date part is kept).
pub fn parse_date_lenient(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Round to one decimal place, half away from zero
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
