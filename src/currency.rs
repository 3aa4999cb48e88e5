use num_format::{Locale, ToFormattedString};

use crate::error::FormattingError;
use crate::model::Currency;

/// Cent counts at or beyond this no longer fit an `i64`.
const CENTS_LIMIT: f64 = i64::MAX as f64;

impl Currency {
    /// Formats `amount` as `-$1,234.50`-style text.
    ///
    /// The amount is first converted to whole cents with `f64::round` (half away
    /// from zero), so the result is always exactly two decimals. An amount that
    /// rounds to zero cents is printed without a sign.
    ///
    /// Amounts too large to count in cents, infinities included, print as
    /// `$∞` or `-$∞`. NaN prints as `$NaN`.
    pub fn format(self, amount: f64) -> String {
        if amount.is_nan() {
            return format!("{}NaN", self.symbol());
        }
        let cents = (amount * 100.0).round();
        if cents.abs() >= CENTS_LIMIT {
            let sign = if cents < 0.0 { "-" } else { "" };
            return format!("{sign}{}∞", self.symbol());
        }
        let cents = cents as i64;
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();
        let whole = (abs / 100).to_formatted_string(&Locale::en);
        format!("{sign}{}{whole}.{:02}", self.symbol(), abs % 100)
    }
}

/// Formats `amount` for the currency named by `code` (`"USD"`, `"MXN"`, `"EUR"`).
pub fn format_currency(amount: f64, code: &str) -> Result<String, FormattingError> {
    let currency: Currency = code.parse()?;
    Ok(currency.format(amount))
}
