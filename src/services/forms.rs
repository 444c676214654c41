//! Numeric input normalization
//!
//! Volume/amount fields accept anything and keep only digits, redisplayed
//! with thousands separators. Price fields accept `[0-9,.]` keystrokes and
//! auto-scale on blur: a price under 1000 is assumed to be the "thousands of
//! VND" shorthand and is multiplied by 1000. The threshold is exclusive, so
//! 1000 and above pass through unchanged.

use crate::error::{AppError, Result};

/// Keep only ASCII digits.
pub fn strip_non_digits(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Group an integer with comma thousands separators.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Normalize a raw amount/volume keystroke buffer for redisplay:
/// `"1a2b34567"` becomes `"1,234,567"`. Empty input stays empty.
pub fn normalize_amount_input(input: &str) -> String {
    let digits = strip_non_digits(input);
    if digits.is_empty() {
        return String::new();
    }
    match digits.parse::<u64>() {
        Ok(value) => format_thousands(value),
        Err(_) => digits,
    }
}

/// Parse a formatted amount back to a number. Empty input is a validation
/// error surfaced before any network call.
pub fn parse_amount(input: &str) -> Result<u64> {
    let digits = strip_non_digits(input);
    if digits.is_empty() {
        return Err(AppError::Validation("Amount is required".to_string()));
    }
    digits
        .parse::<u64>()
        .map_err(|_| AppError::Validation(format!("Invalid amount: {}", input)))
}

/// Price fields ignore any keystroke outside `[0-9,.]`.
pub fn is_price_char(c: char) -> bool {
    c.is_ascii_digit() || c == ',' || c == '.'
}

/// Parse a formatted price string ("25,000" or "25.5").
pub fn parse_price(input: &str) -> Result<f64> {
    let cleaned: String = input.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Err(AppError::Validation("Price is required".to_string()));
    }
    cleaned
        .parse::<f64>()
        .map_err(|_| AppError::Validation(format!("Invalid price: {}", input)))
}

/// Blur heuristic: prices under 1000 were typed in thousands shorthand.
pub fn autoscale_price(price: f64) -> f64 {
    if price > 0.0 && price < 1000.0 {
        price * 1000.0
    } else {
        price
    }
}

/// Format a price for redisplay, grouping the integer part.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price >= 0.0 {
        format_thousands(price as u64)
    } else {
        let integer = price.trunc().abs() as u64;
        let sign = if price < 0.0 { "-" } else { "" };
        let fraction = format!("{:.2}", price.fract().abs());
        format!("{}{}{}", sign, format_thousands(integer), &fraction[1..])
    }
}
