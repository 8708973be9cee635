//! Display formatting for records: money, dates, phone numbers, names.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

/// Placeholder shown for a missing value.
pub const MISSING: &str = "N/A";

/// Default length limit for [`truncate`].
pub const DEFAULT_TRUNCATE_LEN: usize = 50;

fn non_digits() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9]").ok()).as_ref()
}

/// US dollars, whole units, thousands separated: `$12,500`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn currency(amount: f64) -> String {
    if !amount.is_finite() {
        return MISSING.to_string();
    }
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    // Saturates for magnitudes beyond i64.
    let whole = (rounded.abs() as i64).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}")
}

/// `Oct 05, 2026`, or `N/A`.
#[must_use]
pub fn date(value: Option<NaiveDate>) -> String {
    value.map_or_else(|| MISSING.to_string(), |d| d.format("%b %d, %Y").to_string())
}

/// `Oct 05, 2026 14:30` (UTC), or `N/A`.
#[must_use]
pub fn date_time(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || MISSING.to_string(),
        |ts| ts.format("%b %d, %Y %H:%M").to_string(),
    )
}

/// Formats 10-digit and `1`-prefixed 11-digit US numbers; anything else is
/// returned as typed. Empty input gives `N/A`.
#[must_use]
pub fn phone(raw: &str) -> String {
    if raw.trim().is_empty() {
        return MISSING.to_string();
    }
    let digits: String = match non_digits() {
        Some(re) => re.replace_all(raw, "").into_owned(),
        None => raw.chars().filter(char::is_ascii_digit).collect(),
    };
    match digits.len() {
        10 => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
        11 if digits.starts_with('1') => {
            format!("+1 ({}) {}-{}", &digits[1..4], &digits[4..7], &digits[7..])
        }
        _ => raw.to_string(),
    }
}

/// Upper-cased first letters of the two names.
#[must_use]
pub fn initials(first_name: &str, last_name: &str) -> String {
    first_name
        .chars()
        .next()
        .into_iter()
        .chain(last_name.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Cuts `text` to `max_len` characters and appends `...` when it was longer.
#[must_use]
pub fn truncate(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
