//! Normalisation of table cell text into numbers and dates.
//!
//! Every function returns `None` for a placeholder (`-`, empty) instead of
//! failing; callers decide whether a missing value is a warning or an error.

use chrono::NaiveDate;

const DATE_FORMATS: [&str; 5] = ["%b %d, %Y", "%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d", "%d %b %Y"];

fn is_placeholder(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.is_empty() || trimmed.chars().all(|c| c == '-' || c == '\u{2013}')
}

/// Integer count with any thousands separators: `"1.234"` -> `1234`.
#[must_use]
pub fn parse_count(text: &str) -> Option<u32> {
    if is_placeholder(text) {
        return None;
    }
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Count that defaults to zero for placeholders.
#[must_use]
pub fn count_or_zero(text: &str) -> u32 {
    parse_count(text).unwrap_or_default()
}

/// Decimal figure such as a mean age: `"26.4"` or `"26,4"`.
#[must_use]
pub fn parse_decimal(text: &str) -> Option<f32> {
    if is_placeholder(text) {
        return None;
    }
    text.trim().replace(',', ".").parse().ok()
}

/// Market value in euros: `"€1.50bn"` -> `1_500_000_000`, `"€500k"` -> `500_000`.
#[must_use]
pub fn parse_market_value(text: &str) -> Option<u64> {
    let lower = text.trim().to_lowercase();
    let stripped: String = lower
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£') && !c.is_whitespace())
        .collect();
    if is_placeholder(&stripped) {
        return None;
    }

    let (number, multiplier) = if let Some(n) = strip_any(&stripped, &["bn", "mrd."]) {
        (n, 1_000_000_000.0)
    } else if let Some(n) = strip_any(&stripped, &["m", "mio."]) {
        (n, 1_000_000.0)
    } else if let Some(n) = strip_any(&stripped, &["k", "th.", "tsd."]) {
        (n, 1_000.0)
    } else {
        (stripped.as_str(), 1.0)
    };

    let value: f64 = number.replace(',', ".").parse().ok()?;
    if value < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some((value * multiplier).round() as u64)
}

fn strip_any<'a>(text: &'a str, suffixes: &[&str]) -> Option<&'a str> {
    suffixes.iter().find_map(|suffix| text.strip_suffix(suffix))
}

/// Calendar date in any of the layouts the site uses.
///
/// A trailing parenthetical (an age, as in `"Jul 21, 2000 (23)"`) is ignored.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.split('(').next().unwrap_or_default().trim();
    if is_placeholder(trimmed) {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Minute of a match event: `"67'"` -> `67`, `"90'+3"` -> `90`.
#[must_use]
pub fn parse_minute(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Split a footer summary into `(key, value)` pairs.
///
/// Keys are lowercased; pairs whose value is not a number are dropped.
#[must_use]
pub fn parse_footer_pairs(text: &str) -> Vec<(String, u32)> {
    text.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once(':')?;
            let value = parse_count(value)?;
            Some((key.trim().to_lowercase(), value))
        })
        .collect()
}

/// Remove parenthetical qualifiers: `"Premier League (England)"` -> `"Premier League"`.
#[must_use]
pub fn strip_parentheticals(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
