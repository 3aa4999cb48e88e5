//! Numeric coercion for raw text typed into quantity, price and tax fields.
//!
//! Input is read the way a lenient number field reads it: leading whitespace is
//! skipped, the longest numeric prefix is taken, and anything that yields no
//! number becomes zero. Nothing here fails.

use regex::Regex;
use std::sync::LazyLock;

static INT_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").unwrap());

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").unwrap()
});

/// Leading integer of `input`, or 0. `"3.7"` is 3, `"12abc"` is 12, `"abc"` is 0.
/// Values beyond the `i64` range saturate.
pub fn integer(input: &str) -> i64 {
    let Some(caps) = INT_PREFIX.captures(input) else {
        return 0;
    };
    let digits = &caps[1];
    digits.parse::<i64>().unwrap_or_else(|_| {
        if digits.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        }
    })
}

/// Leading decimal number of `input`, or 0.0. Non-finite results and negative
/// zero also come back as 0.0.
pub fn float(input: &str) -> f64 {
    let value = FLOAT_PREFIX
        .captures(input)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .unwrap_or(0.0);
    if !value.is_finite() || value == 0.0 {
        0.0
    } else {
        value
    }
}
