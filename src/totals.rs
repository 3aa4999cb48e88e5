use serde::Serialize;

use crate::model::LineItem;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

/// Amount billed for one row. Negative quantities and prices are not clamped,
/// but a product too large for `f64` saturates at `±f64::MAX`.
pub fn line_amount(item: &LineItem) -> f64 {
    saturate(item.quantity as f64 * item.unit_price)
}

/// Totals stay finite: every sum and product saturates at `±f64::MAX`, so an
/// overflowing row can never turn into infinity or NaN further down.
pub fn compute_totals(items: &[LineItem], tax_rate_percent: f64) -> Totals {
    let subtotal = items
        .iter()
        .map(line_amount)
        .fold(0.0, |acc, amount| saturate(acc + amount));
    let tax_amount = saturate(subtotal * (saturate(tax_rate_percent) / 100.0));
    Totals {
        subtotal,
        tax_amount,
        total: saturate(subtotal + tax_amount),
    }
}

/// Clamps overflow to the largest finite value. NaN inputs become 0.
fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-f64::MAX, f64::MAX)
    }
}
