use chrono::{Duration, NaiveDate};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Upper-cases the first character, leaving the rest untouched.
pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn telegram_url(handle: &str) -> String {
    format!("https://t.me/{}", handle.replacen('@', "", 1))
}

pub fn mailto_url(email: &str) -> String {
    format!("mailto:{email}")
}

pub fn device_link(id: &str) -> String {
    format!("device.html?id={id}")
}

fn fraction_digits(version: &str) -> usize {
    version
        .split_once('.')
        .map(|(_, frac)| frac.len())
        .unwrap_or(0)
        .max(1)
}

/// Subtracts `delta` from a decimal version label such as "2.1".
/// Returns `None` for non-numeric labels or results that are not positive.
pub fn shift_version(version: &str, delta: f64) -> Option<String> {
    let trimmed = version.trim().trim_start_matches(['v', 'V']);
    let value: f64 = trimmed.parse().ok()?;
    let shifted = value - delta;
    let digits = fraction_digits(trimmed);
    let rendered = format!("{shifted:.digits$}");
    if rendered.parse::<f64>().ok()? <= 0.0 {
        return None;
    }
    Some(rendered)
}

/// Moves a `YYYY-MM-DD` date back by `days`.
pub fn shift_date(date: &str, days: i64) -> Option<String> {
    let parsed = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()?;
    let shifted = parsed.checked_sub_signed(Duration::days(days))?;
    Some(shifted.format(DATE_FORMAT).to_string())
}
