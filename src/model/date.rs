//! Calendar-day parsing for human-entered spreadsheet dates.
//!
//! Source rows arrive with dates in several shapes depending on who typed them
//! and which export produced them: `23-Nov-23`, `6/30/2025`, `2023-11-5`,
//! `11-5-2023`, or a raw spreadsheet serial number like `45000`. The parser
//! tries each known shape in a fixed order and reports failure as a value
//! (`None`), never as a panic, so that the sync pass can count the row as a
//! skip rather than aborting.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Day 0 of the originating spreadsheet engine's serial-date numbering.
///
/// The engine counts day 1 as 1900-01-01 but also believes 1900 was a leap
/// year, so serials on or after 1900-03-01 are offset by two from a true
/// 1900-01-01 epoch. Anchoring at 1899-12-30 reproduces the dates the
/// spreadsheet displays for the serials it actually contains.
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Two-digit years below this are 2000s, the rest 1900s.
const CENTURY_PIVOT: i32 = 50;

/// A calendar day with no time-of-day component.
///
/// The month abbreviation and year that the store carries redundantly are
/// always derived from this value via [`EntryDate::month_abbr`] and
/// [`EntryDate::year`]; they are never parsed or trusted independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryDate(NaiveDate);

impl EntryDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Attempts each supported date shape in order, returning `None` when the
    /// input matches none of them. Order matters: a bare number must reach the
    /// serial-date branch without being misread by the numeric-dash formats.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        parse_day_month_name(trimmed)
            .or_else(|| parse_slashed(trimmed))
            .or_else(|| parse_dashed_numeric(trimmed))
            .or_else(|| parse_serial(trimmed))
            .or_else(|| parse_calendar_fallback(trimmed))
            .map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Three-letter month abbreviation, e.g. `Nov`.
    pub fn month_abbr(&self) -> String {
        self.0.format("%b").to_string()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// ISO `YYYY-MM-DD`, the storage and wire representation.
    pub fn to_iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl Display for EntryDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso())
    }
}

impl FromStr for EntryDate {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| anyhow::anyhow!("Unparseable date '{s}'"))
    }
}

impl Serialize for EntryDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_iso())
    }
}

impl<'de> Deserialize<'de> for EntryDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EntryDate::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("bad date '{s}'")))
    }
}

fn pivot_year(two_digit: i32) -> i32 {
    if two_digit < CENTURY_PIVOT {
        2000 + two_digit
    } else {
        1900 + two_digit
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    let prefix = lower.get(..3)?;
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// `DD-MMM-YY` (or `DD-MMM-YYYY`), e.g. `23-Nov-23`.
fn parse_day_month_name(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 {
        return None;
    }
    let day: u32 = parts[0].trim().parse().ok()?;
    let month = month_from_name(parts[1].trim())?;
    let year = parse_year(parts[2].trim())?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `M/D/YYYY` or `M/D/YY`, e.g. `6/30/2025`.
fn parse_slashed(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let month: u32 = parts[0].trim().parse().ok()?;
    let day: u32 = parts[1].trim().parse().ok()?;
    let year = parse_year(parts[2].trim())?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `YYYY-M-D` or `M-D-YYYY`, all parts numeric.
fn parse_dashed_numeric(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 {
        return None;
    }
    let nums: Vec<i64> = parts
        .iter()
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if parts[0].trim().len() == 4 {
        NaiveDate::from_ymd_opt(nums[0] as i32, nums[1] as u32, nums[2] as u32)
    } else if parts[2].trim().len() == 4 {
        NaiveDate::from_ymd_opt(nums[2] as i32, nums[0] as u32, nums[1] as u32)
    } else {
        None
    }
}

/// Spreadsheet serial-date number, counted from [`SERIAL_EPOCH`]. Only
/// accepted when the value is plausible: greater than 1 and landing after
/// the year 1900.
fn parse_serial(s: &str) -> Option<NaiveDate> {
    let value: f64 = s.parse().ok()?;
    if value <= 1.0 {
        return None;
    }
    let days = value.trunc() as u64;
    let (y, m, d) = SERIAL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    let date = epoch.checked_add_days(Days::new(days))?;
    if date.year() <= 1900 {
        return None;
    }
    Some(date)
}

/// Last resort: a small set of written-out calendar strings.
fn parse_calendar_fallback(s: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%A, %B %d, %Y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// A year written with either four digits or two (pivoted).
fn parse_year(s: &str) -> Option<i32> {
    let n: i32 = s.parse().ok()?;
    if s.len() <= 2 {
        Some(pivot_year(n))
    } else if s.len() == 4 {
        Some(n)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_month_name_two_digit_year() {
        let date = EntryDate::parse("23-Nov-23").unwrap();
        assert_eq!(date.date(), ymd(2023, 11, 23));
        assert_eq!(date.month_abbr(), "Nov");
        assert_eq!(date.year(), 2023);
    }

    #[test]
    fn test_pivot_two_digit_year_is_2000s() {
        let date = EntryDate::parse("31-Oct-23").unwrap();
        assert_eq!(date.year(), 2023);
    }

    #[test]
    fn test_pivot_high_two_digit_year_is_1900s() {
        let date = EntryDate::parse("31-Oct-87").unwrap();
        assert_eq!(date.year(), 1987);
    }

    #[test]
    fn test_slashed_four_digit_year() {
        let date = EntryDate::parse("6/30/2025").unwrap();
        assert_eq!(date.date(), ymd(2025, 6, 30));
    }

    #[test]
    fn test_slashed_two_digit_year() {
        let date = EntryDate::parse("6/30/25").unwrap();
        assert_eq!(date.date(), ymd(2025, 6, 30));
    }

    #[test]
    fn test_iso_dashed() {
        let date = EntryDate::parse("2023-11-5").unwrap();
        assert_eq!(date.date(), ymd(2023, 11, 5));
    }

    #[test]
    fn test_month_day_year_dashed() {
        let date = EntryDate::parse("11-5-2023").unwrap();
        assert_eq!(date.date(), ymd(2023, 11, 5));
    }

    #[test]
    fn test_serial_number() {
        // 45000 days after 1899-12-30.
        let date = EntryDate::parse("45000").unwrap();
        assert_eq!(date.date(), ymd(2023, 3, 15));
    }

    #[test]
    fn test_serial_rejects_small_values() {
        assert!(EntryDate::parse("1").is_none());
        assert!(EntryDate::parse("0.5").is_none());
    }

    #[test]
    fn test_calendar_fallback() {
        let date = EntryDate::parse("November 23, 2023").unwrap();
        assert_eq!(date.date(), ymd(2023, 11, 23));
    }

    #[test]
    fn test_unparseable() {
        assert!(EntryDate::parse("").is_none());
        assert!(EntryDate::parse("not a date").is_none());
        assert!(EntryDate::parse("13/45/2023").is_none());
    }

    #[test]
    fn test_whitespace_tolerated() {
        let date = EntryDate::parse("  23-Nov-23  ").unwrap();
        assert_eq!(date.date(), ymd(2023, 11, 23));
    }

    #[test]
    fn test_serde_round_trip() {
        let date = EntryDate::parse("23-Nov-23").unwrap();
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"2023-11-23\"");
        let back: EntryDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, date);
    }
}
