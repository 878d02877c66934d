//! Date/time text to canonical UTC timestamps.
//!
//! Canonical form is `YYYY-MM-DDTHH:MM:SSZ`: UTC only, no fractional
//! seconds. Parsing prefers leaving already-correct input alone and only
//! falls back to generic calendar formats last:
//!
//! 1. Placeholder tokens (`TBD`, `n/a`, ...) are rejected outright
//! 2. A separate time cell is joined to the date with one space
//! 3. Trailing US zone abbreviations are rewritten to numeric offsets
//! 4. Strict canonical text (optionally with a fraction) is accepted as is
//! 5. Relaxed ISO text (seconds or zone optional) is parsed directly
//! 6. Anything else gets the assumed zone unless it carries its own, and is
//!    parsed against the generic format lists
//!
//! Years must be written with four digits. `09/20/25` is unparseable rather
//! than year 25; there is no two-digit year pivot.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc,
};
use intake_model::{DateOrder, ProcessingOptions};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Text containing any of these is never treated as a date.
const PLACEHOLDERS: &[&str] = &["tbd", "tba", "n/a", "unknown", "pending", "asap"];

/// Trailing US zone abbreviations and their standard offsets.
const US_ABBREVIATIONS: &[(&str, &str)] = &[
    ("AKST", "-09:00"),
    ("AKDT", "-08:00"),
    ("EST", "-05:00"),
    ("EDT", "-04:00"),
    ("CST", "-06:00"),
    ("CDT", "-05:00"),
    ("MST", "-07:00"),
    ("MDT", "-06:00"),
    ("PST", "-08:00"),
    ("PDT", "-07:00"),
    ("HST", "-10:00"),
];

/// Named zones understood as an assumed timezone. Fixed offsets, no DST.
const ZONE_OFFSETS: &[(&str, &str)] = &[
    ("America/New_York", "-05:00"),
    ("America/Chicago", "-06:00"),
    ("America/Denver", "-07:00"),
    ("America/Phoenix", "-07:00"),
    ("America/Los_Angeles", "-08:00"),
    ("America/Anchorage", "-09:00"),
    ("Pacific/Honolulu", "-10:00"),
    ("Europe/London", "+00:00"),
    ("Europe/Paris", "+01:00"),
    ("Europe/Berlin", "+01:00"),
    ("Asia/Kolkata", "+05:30"),
    ("Asia/Tokyo", "+09:00"),
    ("Australia/Sydney", "+10:00"),
];

/// Years the generic formats accept.
const FOUR_DIGIT_YEARS: std::ops::RangeInclusive<i32> = 1000..=9999;

static CANONICAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z$")
        .expect("Invalid canonical timestamp regex")
});

static STRICT_CANONICAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z$").expect("Invalid canonical timestamp regex")
});

static RELAXED_ISO_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})[Tt ](\d{1,2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?\s*((?i:Z|UTC|GMT)|[+-]\d{2}:?\d{2})?$",
    )
    .expect("Invalid relaxed ISO regex")
});

/// Explicit zone marker following a time of day.
static ZONE_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.*\d{1,2}:\d{2}(?::\d{2})?(?:\.\d+)?(?:\s*[AaPp][Mm])?)\s*((?i:Z|UTC|GMT)|[+-]\d{2}:?\d{2})$",
    )
    .expect("Invalid zone suffix regex")
});

static US_ABBREVIATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?[^A-Za-z])\s*(AKST|AKDT|EST|EDT|CST|CDT|MST|MDT|PST|PDT|HST)$")
        .expect("Invalid zone abbreviation regex")
});

static TIME_OF_DAY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}:\d{2}").expect("Invalid time of day regex"));

static NUMERIC_OFFSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-])(\d{2}):?(\d{2})$").expect("Invalid offset regex")
});

/// Errors from [`DateTimeNormalizer::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("date/time value is empty")]
    Empty,
    #[error("placeholder '{text}' is not a date/time")]
    Placeholder { text: String },
    #[error("unrecognized date/time '{text}'")]
    Unparseable { text: String },
}

impl NormalizeError {
    /// The offending source text.
    pub fn text(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::Placeholder { text } | Self::Unparseable { text } => text,
        }
    }
}

/// A successfully normalized timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDateTime {
    /// Canonical UTC text.
    pub canonical: String,
    /// True when the source text differed from `canonical`.
    pub normalized: bool,
}

/// Zone applied to date text that carries no offset of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssumedZone {
    Utc,
    Offset(FixedOffset),
    /// A zone name resolved through the built-in table; unknown names
    /// resolve to UTC.
    Named { name: String, offset: FixedOffset },
}

impl AssumedZone {
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() || ["UTC", "Z", "GMT"].iter().any(|z| trimmed.eq_ignore_ascii_case(z)) {
            return Self::Utc;
        }
        if NUMERIC_OFFSET_REGEX.is_match(trimmed) {
            return match parse_offset(trimmed) {
                Some(offset) => Self::Offset(offset),
                None => {
                    debug!(zone = %trimmed, "offset out of range, assuming UTC");
                    Self::Utc
                }
            };
        }
        let offset = ZONE_OFFSETS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
            .and_then(|(_, offset)| parse_offset(offset))
            .unwrap_or_else(|| {
                debug!(zone = %trimmed, "unknown zone name, assuming +00:00");
                utc_offset()
            });
        Self::Named {
            name: trimmed.to_string(),
            offset,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        match self {
            Self::Utc => utc_offset(),
            Self::Offset(offset) | Self::Named { offset, .. } => *offset,
        }
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parses `Z`, `UTC`, `GMT`, `+05:30` or `-0500`.
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let trimmed = text.trim();
    if ["Z", "UTC", "GMT"].iter().any(|z| trimmed.eq_ignore_ascii_case(z)) {
        return Some(utc_offset());
    }
    let caps = NUMERIC_OFFSET_REGEX.captures(trimmed)?;
    let hours: i32 = caps[2].parse().ok()?;
    let minutes: i32 = caps[3].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    let seconds = hours * 3600 + minutes * 60;
    let seconds = if &caps[1] == "-" { -seconds } else { seconds };
    FixedOffset::east_opt(seconds)
}

fn placeholder_token(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    PLACEHOLDERS.iter().copied().find(|token| lower.contains(token))
}

/// Replaces a trailing US abbreviation such as `EST` with its offset.
///
/// A bare date gets midnight in that zone so the offset has a time to
/// attach to.
fn rewrite_us_abbreviation(text: &str) -> String {
    let Some(caps) = US_ABBREVIATION_REGEX.captures(text) else {
        return text.to_string();
    };
    let abbreviation = caps[2].to_ascii_uppercase();
    let Some((_, offset)) = US_ABBREVIATIONS.iter().find(|(name, _)| *name == abbreviation)
    else {
        return text.to_string();
    };
    let body = caps[1].trim_end();
    if TIME_OF_DAY_REGEX.is_match(body) {
        format!("{body}{offset}")
    } else {
        format!("{body} 00:00{offset}")
    }
}

/// True for text in exact canonical form (no fraction) naming a real instant.
pub fn is_canonical_timestamp(text: &str) -> bool {
    STRICT_CANONICAL_REGEX.is_match(text) && DateTime::parse_from_rfc3339(text).is_ok()
}

fn build_formats(order: DateOrder) -> (Vec<String>, Vec<String>) {
    let numeric = match order {
        DateOrder::MonthFirst => ["%m/%d/%Y", "%d/%m/%Y"],
        DateOrder::DayFirst => ["%d/%m/%Y", "%m/%d/%Y"],
    };
    let mut dates: Vec<String> = vec!["%Y-%m-%d".to_string(), "%Y/%m/%d".to_string()];
    for separator in ["/", "-", "."] {
        for pattern in numeric {
            dates.push(pattern.replace('/', separator));
        }
    }
    dates.extend(
        ["%d-%b-%Y", "%d %b %Y", "%b %d, %Y", "%b %d %Y"]
            .iter()
            .map(|f| (*f).to_string()),
    );

    let times = ["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p", "%I:%M%p"];
    let datetimes = dates
        .iter()
        .flat_map(|date| times.iter().map(move |time| format!("{date} {time}")))
        .collect();
    (datetimes, dates)
}

/// Parses date/time text into canonical UTC timestamps.
#[derive(Debug, Clone)]
pub struct DateTimeNormalizer {
    zone: AssumedZone,
    date_order: DateOrder,
    datetime_formats: Vec<String>,
    date_formats: Vec<String>,
}

impl Default for DateTimeNormalizer {
    fn default() -> Self {
        Self::new("UTC", DateOrder::default())
    }
}

impl DateTimeNormalizer {
    /// `timezone` is `UTC`, a numeric offset, or a zone name.
    pub fn new(timezone: &str, date_order: DateOrder) -> Self {
        let (datetime_formats, date_formats) = build_formats(date_order);
        Self {
            zone: AssumedZone::parse(timezone),
            date_order,
            datetime_formats,
            date_formats,
        }
    }

    pub fn from_options(options: &ProcessingOptions) -> Self {
        Self::new(&options.timezone, options.date_order)
    }

    pub fn zone(&self) -> &AssumedZone {
        &self.zone
    }

    pub fn date_order(&self) -> DateOrder {
        self.date_order
    }

    /// Normalizes `date`, joined with a separate `time` cell when present.
    pub fn normalize(
        &self,
        date: &str,
        time: Option<&str>,
    ) -> Result<NormalizedDateTime, NormalizeError> {
        let date = date.trim();
        let time = time.map(str::trim).filter(|t| !t.is_empty());

        for part in std::iter::once(date).chain(time) {
            if placeholder_token(part).is_some() {
                return Err(NormalizeError::Placeholder {
                    text: part.to_string(),
                });
            }
        }
        if date.is_empty() {
            return Err(NormalizeError::Empty);
        }

        let source = match time {
            Some(time) => format!("{date} {time}"),
            None => date.to_string(),
        };
        let text = rewrite_us_abbreviation(&source);

        let parsed = if CANONICAL_REGEX.is_match(&text) {
            DateTime::parse_from_rfc3339(&text).ok()
        } else {
            None
        };
        let parsed = parsed
            .or_else(|| self.parse_relaxed_iso(&text))
            .or_else(|| self.parse_generic(&text));

        match parsed {
            Some(moment) => {
                let canonical = moment.with_timezone(&Utc).format(CANONICAL_FORMAT).to_string();
                let normalized = canonical != source;
                Ok(NormalizedDateTime {
                    canonical,
                    normalized,
                })
            }
            None => Err(NormalizeError::Unparseable { text: source }),
        }
    }

    fn parse_relaxed_iso(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        let caps = RELAXED_ISO_REGEX.captures(text)?;
        let number = |index: usize| -> Option<u32> {
            caps.get(index).map_or(Some(0), |m| m.as_str().parse().ok())
        };
        let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, number(2)?, number(3)?)?;
        let time = NaiveTime::from_hms_opt(number(4)?, number(5)?, number(6)?)?;
        let offset = match caps.get(7) {
            Some(zone) => parse_offset(zone.as_str())?,
            None => self.zone.offset(),
        };
        date.and_time(time).and_local_timezone(offset).single()
    }

    fn parse_generic(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        let (body, offset) = match ZONE_SUFFIX_REGEX.captures(text) {
            Some(caps) => (
                caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
                parse_offset(&caps[2])?,
            ),
            None => (text.to_string(), self.zone.offset()),
        };
        let body = body.split_whitespace().collect::<Vec<_>>().join(" ");

        // chrono's %Y also takes 1-3 digit years.
        let four_digit_year = |moment: &NaiveDateTime| FOUR_DIGIT_YEARS.contains(&moment.year());
        let naive = self
            .datetime_formats
            .iter()
            .find_map(|format| {
                NaiveDateTime::parse_from_str(&body, format)
                    .ok()
                    .filter(four_digit_year)
            })
            .or_else(|| {
                self.date_formats.iter().find_map(|format| {
                    NaiveDate::parse_from_str(&body, format)
                        .ok()
                        .map(|d| d.and_time(NaiveTime::MIN))
                        .filter(four_digit_year)
                })
            });
        if naive.is_none() {
            debug!(text = %text, "no generic date format matched");
        }
        naive?.and_local_timezone(offset).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> DateTimeNormalizer {
        DateTimeNormalizer::default()
    }

    #[test]
    fn canonical_input_is_untouched() {
        let result = utc().normalize("2025-09-20T08:00:00Z", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T08:00:00Z");
        assert!(!result.normalized);
    }

    #[test]
    fn fractional_seconds_are_stripped() {
        let result = utc().normalize("2025-09-20T08:00:00.250Z", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T08:00:00Z");
        assert!(result.normalized);
    }

    #[test]
    fn relaxed_iso_gets_seconds_and_zone() {
        let result = utc().normalize("2025-9-20T8:05", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T08:05:00Z");
        assert!(result.normalized);

        let result = utc().normalize("2025-09-20 08:05:00+05:30", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T02:35:00Z");
    }

    #[test]
    fn us_abbreviation_becomes_offset() {
        let result = utc().normalize("09/20/2025 08:00 EST", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T13:00:00Z");
        let result = utc().normalize("2025-09-20T08:00PDT", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T15:00:00Z");
    }

    #[test]
    fn bare_date_with_abbreviation_is_midnight_in_that_zone() {
        let result = utc().normalize("09/20/2025 EST", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T05:00:00Z");
        let result = utc().normalize("2025-09-20 PDT", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T07:00:00Z");
    }

    #[test]
    fn short_years_are_unparseable() {
        for text in ["09/20/25", "1/2/3", "20-Sep-25", "9/20/025"] {
            assert_eq!(
                utc().normalize(text, None),
                Err(NormalizeError::Unparseable {
                    text: text.to_string()
                }),
                "{text}"
            );
        }
        assert!(utc().normalize("09/20/25", Some("08:00")).is_err());
        assert_eq!(
            utc().normalize("09/20/2025", None).unwrap().canonical,
            "2025-09-20T00:00:00Z"
        );
    }

    #[test]
    fn split_cells_use_assumed_zone() {
        let normalizer = DateTimeNormalizer::new("America/Chicago", DateOrder::MonthFirst);
        let result = normalizer.normalize("09/20/2025", Some("8:00 AM")).unwrap();
        assert_eq!(result.canonical, "2025-09-20T14:00:00Z");
    }

    #[test]
    fn numeric_assumed_zone_is_used_verbatim() {
        let normalizer = DateTimeNormalizer::new("+09:00", DateOrder::MonthFirst);
        let result = normalizer.normalize("2025-09-20", Some("09:00")).unwrap();
        assert_eq!(result.canonical, "2025-09-20T00:00:00Z");
    }

    #[test]
    fn unknown_zone_name_falls_back_to_utc() {
        let normalizer = DateTimeNormalizer::new("Mars/Olympus", DateOrder::MonthFirst);
        assert_eq!(normalizer.zone().offset(), utc_offset());
        let result = normalizer.normalize("09/20/2025 08:00", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T08:00:00Z");
    }

    #[test]
    fn date_order_decides_ambiguous_numeric_dates() {
        let month_first = DateTimeNormalizer::new("UTC", DateOrder::MonthFirst);
        let day_first = DateTimeNormalizer::new("UTC", DateOrder::DayFirst);

        assert_eq!(
            month_first.normalize("03/04/2025", None).unwrap().canonical,
            "2025-03-04T00:00:00Z"
        );
        assert_eq!(
            day_first.normalize("03/04/2025", None).unwrap().canonical,
            "2025-04-03T00:00:00Z"
        );
        // Unambiguous either way.
        assert_eq!(
            month_first.normalize("20/09/2025 17:30", None).unwrap().canonical,
            "2025-09-20T17:30:00Z"
        );
    }

    #[test]
    fn month_names_parse() {
        let result = utc().normalize("Sep 20, 2025 2:15 PM", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T14:15:00Z");
        let result = utc().normalize("20-Sep-2025", None).unwrap();
        assert_eq!(result.canonical, "2025-09-20T00:00:00Z");
    }

    #[test]
    fn placeholders_are_rejected() {
        assert_eq!(
            utc().normalize("TBD", None),
            Err(NormalizeError::Placeholder {
                text: "TBD".to_string()
            })
        );
        assert!(matches!(
            utc().normalize("09/20/2025", Some("asap")),
            Err(NormalizeError::Placeholder { .. })
        ));
    }

    #[test]
    fn unparseable_text_is_named() {
        let err = utc().normalize("next tuesday", None).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"unrecognized date/time 'next tuesday'");
        assert_eq!(utc().normalize("  ", None), Err(NormalizeError::Empty));
    }

    #[test]
    fn invalid_calendar_dates_fail() {
        assert!(utc().normalize("2025-02-30T08:00:00Z", None).is_err());
        assert!(!is_canonical_timestamp("2025-02-30T08:00:00Z"));
        assert!(is_canonical_timestamp("2025-02-28T08:00:00Z"));
        assert!(!is_canonical_timestamp("2025-02-28T08:00:00.5Z"));
    }
}
