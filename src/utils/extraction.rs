//! Best-effort extraction of matching signals from free-text fields
//!
//! Every helper here is pure and returns `None` instead of failing; a
//! purchase whose notes cannot be parsed just loses that scoring signal.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Deserializer};

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"[\w.-]+@[\w.-]+\.\w+").unwrap();
    // Tried in order; the first pattern that matches anywhere wins.
    static ref LAST_FOUR_RES: Vec<Regex> = [
        r"(?i)CC#\s*(\d{4})",
        r"(?i)CC:\s*(\d{4})",
        r"(?i)CC\s+(\d{4})",
        r"(?i)#(\d{4})",
        r"(?i)cc\s?(\d{4})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}

const KEYWORD_STOP_WORDS: &[&str] = &["at", "vs", "parking", "the", "a", "an", "and", "or"];

/// First email address found in the text
pub fn extract_email(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

/// Last four card digits written in the notes (`CC# 1234`, `#1234`, ...)
pub fn extract_last_four(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    LAST_FOUR_RES
        .iter()
        .find_map(|re| re.captures(text))
        .map(|cap| cap[1].to_string())
}

/// Up to three distinctive words from an event name
pub fn event_keywords(event_name: &str) -> Vec<String> {
    event_name
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.len() > 2 && !KEYWORD_STOP_WORDS.contains(w))
        .take(3)
        .map(str::to_string)
        .collect()
}

/// Parse a timestamp as sent by the ticketing system.
///
/// Accepts bare dates, naive date-times (with or without fractional
/// seconds) and RFC 3339 values; offsets are dropped, keeping the wall-clock
/// time as written.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Serde adapter for [`parse_timestamp`]
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

/// Serde adapter for posting dates: any value [`parse_timestamp`] accepts,
/// truncated to its calendar day
pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .map(|dt| dt.date())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}
