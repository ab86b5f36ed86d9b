//! # Number Formatting
//!
//! Rounding happens only here, at the display and export boundaries.
//! Values in the model are never rounded.

/// Plain 2-decimal text for export rows (`7800000.00`). Negative zero prints as `0.00`.
pub fn format_export_number(value: f64) -> String {
    let text = format!("{:.2}", value);
    if text == "-0.00" {
        "0.00".to_string()
    } else {
        text
    }
}

/// On-screen currency with thousands grouping (`₦7,800,000.00`).
///
/// ```rust
/// use boq_core::format::format_currency;
///
/// assert_eq!(format_currency(7_800_000.0, "₦"), "₦7,800,000.00");
/// assert_eq!(format_currency(-1234.5, "$"), "-$1,234.50");
/// ```
pub fn format_currency(amount: f64, symbol: &str) -> String {
    let text = format_export_number(amount);
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));
    format!("{}{}{}.{}", sign, symbol, group_thousands(whole), fraction)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
