//! Display formatting for prices, progress and dates (vi-VN conventions).

use chrono::{DateTime, Utc};

/// Format a VND amount as `1.000.000 ₫`. Missing or zero prices render as `0đ`
/// (lowercase d with stroke, not the currency sign).
#[must_use]
pub fn format_price(price: Option<u64>) -> String {
    match price {
        None | Some(0) => "0\u{111}".to_string(),
        Some(amount) => format!("{}\u{a0}₫", group_thousands(amount)),
    }
}

/// Format a 0-100 percentage, rounded half up like the storefront does.
#[must_use]
pub fn format_percent(percent: Option<f64>) -> String {
    match percent {
        Some(value) if value.is_finite() => format!("{}%", (value + 0.5).floor()),
        _ => "0%".to_string(),
    }
}

/// Format a date as `dd/mm/yyyy`.
#[must_use]
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn group_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    grouped
}
