//! Checkout pricing settings.

use rust_decimal::Decimal;

/// Pricing rules applied when a cart is totalled or an order is assembled.
///
/// All amounts are minor currency units (cents for USD).
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSettings {
    /// ISO 4217 currency code charged for every order.
    pub currency: String,

    /// Tax rate as a fraction, e.g. `0.08` for 8%.
    pub tax_rate: Decimal,

    /// Flat shipping fee charged below the free-shipping threshold.
    pub flat_shipping: u64,

    /// Subtotals strictly above this amount ship for free.
    pub free_shipping_threshold: u64,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            tax_rate: Decimal::new(8, 2),
            flat_shipping: 9_99,
            free_shipping_threshold: 100_00,
        }
    }
}
