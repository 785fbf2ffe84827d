//! Rounding and money formatting shared by the calculators.
//!
//! All rounding is half-to-even so figures agree with the numbers clients
//! already display.

/// Rounds to the nearest integer, ties to even.
pub fn round_int(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Rounds the exact binary value to `digits` decimal places, ties to even.
/// `2.675` is stored just below the tie and rounds to `2.67`.
pub fn round_dp(value: f64, digits: usize) -> f64 {
    format!("{value:.digits$}").parse().unwrap_or(value)
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234.6` -> `"Rs.1,235"`.
pub fn rupees(amount: f64) -> String {
    format!("Rs.{}", group_thousands(round_int(amount)))
}

/// Whole floats keep a trailing `.0` (`30.0`, not `30`).
pub fn plain_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
