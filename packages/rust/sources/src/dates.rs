//! Release-date parsing for vendor headings and paragraphs.
//!
//! Everything resolves to a [`NaiveDate`]; there is no time-of-day or
//! timezone involved, so the result never depends on the process timezone.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// `"January 20, 2026"` at the start of a heading. Comma required.
static HEADING_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][a-z]+)\s+(\d{1,2}),\s+(\d{4})").expect("heading date regex")
});

/// Same as [`HEADING_DATE_RE`] but the comma is optional.
static LENIENT_HEADING_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][a-z]+)\s+(\d{1,2}),?\s+(\d{4})").expect("lenient heading date regex")
});

/// A paragraph that is nothing but a date, any case, optional comma.
static EXACT_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\w+)\s+(\d{1,2}),?\s+(\d{4})$").expect("exact date regex")
});

/// `YYYY.Q` inside a version string.
static VERSION_QUARTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})\.(\d+)").expect("version quarter regex"));

const FULL_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// How heading dates are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingDates {
    /// Full month names, comma after the day.
    Strict,
    /// Full or abbreviated month names (`Jan`, `Sept`, ...), optional comma.
    Lenient,
}

impl HeadingDates {
    /// Parse the date at the start of a heading's text.
    pub fn parse(self, text: &str) -> Option<NaiveDate> {
        let (re, lookup): (&Regex, fn(&str) -> Option<u32>) = match self {
            Self::Strict => (&HEADING_DATE_RE, full_month),
            Self::Lenient => (&LENIENT_HEADING_DATE_RE, any_month),
        };
        let caps = re.captures(text.trim())?;
        let month = lookup(&caps[1])?;
        ymd(&caps[3], month, &caps[2])
    }
}

/// Parse text that is exactly `"Month D, YYYY"` (full month name, any case).
pub fn parse_exact_date(text: &str) -> Option<NaiveDate> {
    let caps = EXACT_DATE_RE.captures(text.trim())?;
    let month = full_month_ignore_case(&caps[1])?;
    ymd(&caps[3], month, &caps[2])
}

/// Estimate a release date from a `YYYY.Q` version: quarter 1-4 maps to
/// month 2, 5, 8 or 11, day 15.
pub fn estimate_from_version(version: &str) -> Option<NaiveDate> {
    let caps = VERSION_QUARTER_RE.captures(version)?;
    let year: i32 = caps[1].parse().ok()?;
    let month = match caps[2].parse::<u32>().ok()? {
        1 => 2,
        2 => 5,
        3 => 8,
        4 => 11,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, 15)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}

fn full_month(name: &str) -> Option<u32> {
    FULL_MONTHS
        .iter()
        .position(|m| *m == name)
        .map(|i| i as u32 + 1)
}

fn full_month_ignore_case(name: &str) -> Option<u32> {
    FULL_MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

fn any_month(name: &str) -> Option<u32> {
    full_month(name).or(match name {
        "Jan" => Some(1),
        "Feb" => Some(2),
        "Mar" => Some(3),
        "Apr" => Some(4),
        "Jun" => Some(6),
        "Jul" => Some(7),
        "Aug" => Some(8),
        "Sep" | "Sept" => Some(9),
        "Oct" => Some(10),
        "Nov" => Some(11),
        "Dec" => Some(12),
        _ => None,
    })
}
