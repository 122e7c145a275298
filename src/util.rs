// Small parsing and formatting helpers shared by the aggregator, the
// exporter and the CLI.
use crate::error::{ReportError, Result};
use chrono::Month;
use num_format::{Locale, ToFormattedString};
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Zero-based month index of a `day/month/year` date string.
///
/// Returns `None` unless the text has exactly three `/`-separated parts and
/// the middle part is a number in 1..=12. Callers skip such records.
pub fn month_index(date: &str) -> Option<u32> {
    let parts: Vec<&str> = date.trim().split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let month: u32 = parts[1].trim().parse().ok()?;
    if (1..=12).contains(&month) {
        Some(month - 1)
    } else {
        None
    }
}

/// Parse user input for a month: `1`-`12` or an English month name or
/// abbreviation. Returns the zero-based index.
pub fn parse_month_arg(input: &str) -> Result<u32> {
    let s = input.trim();
    if let Ok(n) = s.parse::<u32>() {
        return if (1..=12).contains(&n) {
            Ok(n - 1)
        } else {
            Err(ReportError::InvalidMonth(input.to_string()))
        };
    }
    s.parse::<Month>()
        .map(|m| m.number_from_month() - 1)
        .map_err(|_| ReportError::InvalidMonth(input.to_string()))
}

pub fn month_name(index: u32) -> &'static str {
    u8::try_from(index + 1)
        .ok()
        .and_then(|n| Month::try_from(n).ok())
        .map(|m| m.name())
        .unwrap_or("Unknown")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityKind {
    pub visit: bool,
    pub call: bool,
}

/// Classify a free-text activity label. A label may be both a visit and a
/// call ("Visit Call"); each matching counter is incremented.
pub fn classify_activity(label: &str) -> ActivityKind {
    let s = label.trim().to_lowercase();
    ActivityKind {
        visit: s.contains("visit"),
        call: s.contains("call"),
    }
}

/// `round(actual / target * 100)%`. A zero target counts as met.
pub fn format_percent(actual: u32, target: u32) -> String {
    if target == 0 {
        return "100%".to_string();
    }
    let pct = (f64::from(actual) / f64::from(target) * 100.0).round();
    format!("{}%", pct as u64)
}

/// Name ordering for employee lists, close to a root-locale collator:
/// letters compare without accents or case first, then unaccented before
/// accented, then lowercase before uppercase.
pub fn collate_names(a: &str, b: &str) -> Ordering {
    base_key(a)
        .cmp(&base_key(b))
        .then_with(|| accent_key(a).cmp(&accent_key(b)))
        .then_with(|| case_key(a).cmp(&case_key(b)))
        .then_with(|| a.cmp(b))
}

fn base_key(s: &str) -> String {
    s.nfd().filter(|c| !is_combining_mark(*c)).collect::<String>().to_lowercase()
}

fn accent_key(s: &str) -> String {
    s.nfd().collect::<String>().to_lowercase()
}

fn case_key(s: &str) -> Vec<bool> {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(char::is_uppercase)
        .collect()
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
