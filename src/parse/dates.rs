//! Permissive parsing of the timestamp strings forums render.
//!
//! The sites this tool scrapes format dates for humans, not machines:
//! "March 3rd, 2021", "Today at 5:30 PM", "Last edited; Yesterday at 09:12".
//! Parsing tries a fixed set of absolute formats first, then the relative
//! "Today"/"Yesterday" forms, and as a last resort falls back to the current
//! timestamp. The fallback is a deliberate data-quality tradeoff: dates are
//! cosmetic metadata, and an unparseable date must not fail a whole metadata
//! fetch.

use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

const ABSOLUTE_DATETIME_FORMATS: &[&str] = &[
    "%B %d, %Y, %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y, %I:%M %p",
    "%b %d, %Y %I:%M %p",
    "%m-%d-%Y, %I:%M %p",
    "%m-%d-%Y %I:%M %p",
    "%Y-%m-%d %H:%M",
];

const ABSOLUTE_DATE_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%m-%d-%Y",
    "%Y-%m-%d",
];

const TIME_FORMATS: &[&str] = &["%I:%M %p", "%H:%M:%S", "%H:%M"];

fn ordinal_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})(st|nd|rd|th)\b").expect("valid ordinal regex"))
}

/// Parses a forum-rendered date string, falling back to the current local
/// timestamp when nothing matches.
pub fn parse_flexible_date(raw: &str) -> NaiveDateTime {
    parse_flexible_date_at(raw, Local::now().naive_local())
}

/// Like [`parse_flexible_date`] but with an injected "now", so relative
/// tokens and the final fallback are deterministic under test.
pub fn parse_flexible_date_at(raw: &str, now: NaiveDateTime) -> NaiveDateTime {
    let text = normalize(raw);

    if let Some(parsed) = try_absolute(&text) {
        return parsed;
    }

    // Edited-date strings prefix the timestamp with a label, separated by a
    // semicolon ("Last edited by X; Today at 5:30 PM").
    let segment = text
        .split_once(';')
        .map(|(_, rest)| rest)
        .unwrap_or(&text)
        .trim();
    if let Some(parsed) = try_absolute(segment) {
        return parsed;
    }
    if let Some(parsed) = try_relative(segment, now) {
        return parsed;
    }

    now
}

/// Decodes the entity forms that survive HTML text extraction and collapses
/// whitespace runs into single spaces.
fn normalize(raw: &str) -> String {
    raw.replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn try_absolute(text: &str) -> Option<NaiveDateTime> {
    // "March 3rd, 2021" -> "March 3, 2021"; drop the stray "at" token from
    // forms like "March 3, 2021 at 5:30 PM".
    let stripped = ordinal_suffix_re().replace_all(text, "$1");
    let cleaned = stripped
        .split(' ')
        .filter(|token| !token.eq_ignore_ascii_case("at"))
        .collect::<Vec<_>>()
        .join(" ");

    for format in ABSOLUTE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Some(parsed);
        }
    }
    for format in ABSOLUTE_DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(&cleaned, format) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn try_relative(segment: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let (date, rest) = if segment.contains("Today") {
        (now.date(), segment.replace("Today at", "").replace("Today", ""))
    } else if segment.contains("Yesterday") {
        let yesterday = now.date().checked_sub_days(Days::new(1))?;
        (
            yesterday,
            segment.replace("Yesterday at", "").replace("Yesterday", ""),
        )
    } else {
        return None;
    };

    let time = parse_time(rest.trim())?;
    Some(date.and_time(time))
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
}
