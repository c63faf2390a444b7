//! Display formatting for prices, discounts, ratings, dates and labels.

use chrono::{DateTime, NaiveDate, Utc};

/// Format a price in en-US currency style with exactly two decimals.
///
/// ```
/// use storefront_feed::format::format_price;
///
/// assert_eq!(format_price(19.999, "USD"), "$20.00");
/// assert_eq!(format_price(1234.5, "USD"), "$1,234.50");
/// ```
pub fn format_price(price: f64, currency: &str) -> String {
    let prefix = currency_prefix(currency);
    if !price.is_finite() {
        return format!("{}{}", prefix, price);
    }

    let fixed = format!("{:.2}", price.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    // Negative values keep their sign even when they round to zero.
    let negative = price.is_sign_negative();

    format!(
        "{}{}{}.{}",
        if negative { "-" } else { "" },
        prefix,
        group_thousands(whole),
        fraction
    )
}

/// `12.4` → `"-12%"`. Halves round up.
pub fn format_discount(percentage: f64) -> String {
    format!("-{}%", round_half_up(percentage))
}

pub fn calculate_discounted_price(price: f64, discount_percentage: f64) -> f64 {
    price * (1.0 - discount_percentage / 100.0)
}

pub fn format_rating(rating: f64) -> String {
    format!("{:.1}", rating)
}

/// Format an RFC 3339 timestamp (or a bare `YYYY-MM-DD` date) as `Jan 5, 2025`.
///
/// Timestamps are rendered in UTC.
pub fn format_date(date: &str) -> Result<String, chrono::ParseError> {
    let day = match DateTime::parse_from_rfc3339(date) {
        Ok(parsed) => parsed.with_timezone(&Utc).date_naive(),
        Err(err) => NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| err)?,
    };
    Ok(day.format("%b %-d, %Y").to_string())
}

/// `"mens-shirts"` → `"Mens Shirts"`. Runs of `-`, `_` and whitespace
/// separate words.
pub fn capitalize_words(input: &str) -> String {
    split_words(input)
        .into_iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Cut `text` to `max_len` characters and append `...` when it was longer.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let head: String = text.chars().take(max_len).collect();
    format!("{}...", head.trim())
}

fn currency_prefix(currency: &str) -> String {
    match currency {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        "INR" => "₹".to_string(),
        "CAD" => "CA$".to_string(),
        "AUD" => "A$".to_string(),
        other => format!("{}\u{a0}", other),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

// Leading and trailing separators yield empty words, consecutive ones do not.
fn split_words(input: &str) -> Vec<&str> {
    let is_separator = |c: char| c == '-' || c == '_' || c.is_whitespace();
    let mut words = Vec::new();
    let mut start = 0;
    let mut in_separator = false;

    for (idx, ch) in input.char_indices() {
        if is_separator(ch) {
            if !in_separator {
                words.push(&input[start..idx]);
                in_separator = true;
            }
        } else if in_separator {
            start = idx;
            in_separator = false;
        }
    }
    words.push(if in_separator { "" } else { &input[start..] });
    words
}
