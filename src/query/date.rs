//! Date handling for the publish and last-modified windows.
//!
//! The NVD API expects timestamps shaped like `2024-01-01T00:00:00.000`
//! (milliseconds, no timezone suffix). Callers can hand in chrono values
//! directly or text in one of two shapes:
//!
//! - `YYYY-MM-DD` (midnight is assumed)
//! - `YYYY-MM-DDTHH:MM:SS.mmm`
//!
//! Text must also be a real calendar date, so `2024-02-30` is rejected.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use nvd_client::query::{convert_date_to_iso, DateInput};
//!
//! let text = convert_date_to_iso(&DateInput::from("2024-01-15")).unwrap();
//! assert_eq!(text, "2024-01-15T00:00:00.000");
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! assert_eq!(convert_date_to_iso(&date.into()).unwrap(), text);
//! ```

use crate::error::NvdError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use regex::Regex;
use std::sync::LazyLock;

/// Output format of every converted date.
const NVD_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

static PLAIN_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

static MILLIS_DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}$").expect("date-time pattern is valid")
});

/// A date accepted by the query builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    /// Unparsed text, validated when converted.
    Text(String),
    /// An already-structured wall-clock date-time.
    DateTime(NaiveDateTime),
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        DateInput::Text(value)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        DateInput::DateTime(value)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::DateTime(value.and_time(chrono::NaiveTime::MIN))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(value: DateTime<Tz>) -> Self {
        DateInput::DateTime(value.naive_local())
    }
}

/// Returns true if `text` is `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS.mmm` and
/// names a real calendar date.
pub fn validate_date_format(text: &str) -> bool {
    parse_date_text(text).is_some()
}

fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    if PLAIN_DATE.is_match(text) {
        return NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .map(|d| d.and_time(chrono::NaiveTime::MIN));
    }
    if MILLIS_DATE_TIME.is_match(text) {
        return NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .filter(is_representable);
    }
    None
}

/// Four-digit year and no leap second, so the value fits the fixed-width
/// output format.
fn is_representable(dt: &NaiveDateTime) -> bool {
    (0..=9999).contains(&dt.year()) && dt.nanosecond() < 1_000_000_000
}

/// Converts a date into the fixed `YYYY-MM-DDTHH:MM:SS.mmm` form the API
/// expects. Sub-millisecond precision is truncated.
pub fn convert_date_to_iso(date: &DateInput) -> Result<String, NvdError> {
    let date_time = match date {
        DateInput::DateTime(dt) if is_representable(dt) => *dt,
        DateInput::DateTime(dt) => {
            return Err(NvdError::InvalidDateFormat {
                value: dt.to_string(),
            })
        }
        DateInput::Text(text) => parse_date_text(text).ok_or_else(|| NvdError::InvalidDateFormat {
            value: text.clone(),
        })?,
    };
    Ok(date_time.format(NVD_DATE_FORMAT).to_string())
}

/// Resolves a start/end pair that must be given together.
///
/// Both present converts both, both absent yields `(None, None)`, and a
/// half-specified pair fails with [`NvdError::InvalidParameters`] naming both
/// entries of `names`.
pub fn resolve_date_range(
    start: Option<&DateInput>,
    end: Option<&DateInput>,
    names: [&str; 2],
) -> Result<(Option<String>, Option<String>), NvdError> {
    match (start, end) {
        (Some(start), Some(end)) => Ok((
            Some(convert_date_to_iso(start)?),
            Some(convert_date_to_iso(end)?),
        )),
        (None, None) => Ok((None, None)),
        _ => Err(NvdError::InvalidParameters {
            params: names.iter().map(|n| n.to_string()).collect(),
        }),
    }
}

/// Optional publish and last-modified windows for CVE searches.
///
/// ```
/// use nvd_client::query::DateFilters;
///
/// let filters = DateFilters::default().published("2024-01-01", "2024-01-31");
/// assert!(filters.publish_start_date.is_some());
/// assert!(filters.modify_start_date.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFilters {
    pub publish_start_date: Option<DateInput>,
    pub publish_end_date: Option<DateInput>,
    pub modify_start_date: Option<DateInput>,
    pub modify_end_date: Option<DateInput>,
}

/// Converted windows, ready to be pushed into a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDates {
    pub published: Option<(String, String)>,
    pub modified: Option<(String, String)>,
}

impl DateFilters {
    pub fn published(mut self, start: impl Into<DateInput>, end: impl Into<DateInput>) -> Self {
        self.publish_start_date = Some(start.into());
        self.publish_end_date = Some(end.into());
        self
    }

    pub fn modified(mut self, start: impl Into<DateInput>, end: impl Into<DateInput>) -> Self {
        self.modify_start_date = Some(start.into());
        self.modify_end_date = Some(end.into());
        self
    }

    /// Validates and converts both windows, publish window first.
    pub fn resolve(&self) -> Result<ResolvedDates, NvdError> {
        let published = resolve_date_range(
            self.publish_start_date.as_ref(),
            self.publish_end_date.as_ref(),
            ["publish_start_date", "publish_end_date"],
        )?;
        let modified = resolve_date_range(
            self.modify_start_date.as_ref(),
            self.modify_end_date.as_ref(),
            ["modify_start_date", "modify_end_date"],
        )?;

        Ok(ResolvedDates {
            published: both(published),
            modified: both(modified),
        })
    }
}

fn both(pair: (Option<String>, Option<String>)) -> Option<(String, String)> {
    match pair {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    }
}
