//! Order and cart totals.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use thiserror::Error;

use crate::settings::CheckoutSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TotalsError {
    #[error("monetary amount overflowed")]
    Overflow,
}

/// Monetary breakdown of an order, in minor units.
///
/// `total == subtotal + tax_amount + shipping_amount - discount_amount` always
/// holds for values produced by [`OrderTotals::compute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderTotals {
    pub subtotal: u64,
    pub tax_amount: u64,
    pub shipping_amount: u64,
    pub discount_amount: u64,
    pub total: u64,
}

impl OrderTotals {
    /// Price a subtotal under the configured tax and shipping rules.
    ///
    /// Discounts are always zero until a promotion source is wired in.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsError::Overflow`] if any intermediate amount overflows.
    pub fn compute(subtotal: u64, settings: &CheckoutSettings) -> Result<Self, TotalsError> {
        let tax_amount = tax_on(subtotal, settings.tax_rate)?;

        let shipping_amount = if subtotal == 0 || subtotal > settings.free_shipping_threshold {
            0
        } else {
            settings.flat_shipping
        };

        let discount_amount = 0;

        let total = subtotal
            .checked_add(tax_amount)
            .and_then(|sum| sum.checked_add(shipping_amount))
            .and_then(|sum| sum.checked_sub(discount_amount))
            .ok_or(TotalsError::Overflow)?;

        Ok(Self {
            subtotal,
            tax_amount,
            shipping_amount,
            discount_amount,
            total,
        })
    }
}

/// Extended price of a line.
///
/// # Errors
///
/// Returns [`TotalsError::Overflow`] if the product overflows.
pub fn line_total(unit_price: u64, quantity: u64) -> Result<u64, TotalsError> {
    unit_price
        .checked_mul(quantity)
        .ok_or(TotalsError::Overflow)
}

/// Sum of line totals.
///
/// # Errors
///
/// Returns [`TotalsError::Overflow`] if the sum overflows.
pub fn subtotal_of<I>(line_totals: I) -> Result<u64, TotalsError>
where
    I: IntoIterator<Item = u64>,
{
    line_totals
        .into_iter()
        .try_fold(0_u64, u64::checked_add)
        .ok_or(TotalsError::Overflow)
}

fn tax_on(subtotal: u64, rate: Decimal) -> Result<u64, TotalsError> {
    let applied = Decimal::from(subtotal)
        .checked_mul(rate)
        .ok_or(TotalsError::Overflow)?;

    applied
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(TotalsError::Overflow)
}
