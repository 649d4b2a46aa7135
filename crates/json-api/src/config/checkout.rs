//! Checkout Config

use clap::Args;
use rust_decimal::Decimal;

use storefront_app::settings::CheckoutSettings;

/// Checkout pricing settings. Amounts are minor currency units.
#[derive(Debug, Args)]
pub struct CheckoutConfig {
    /// ISO 4217 currency code charged for every order.
    #[arg(long, env = "CHECKOUT_CURRENCY", default_value = "USD")]
    pub currency: String,

    /// Tax rate as a fraction (0.08 for 8%).
    #[arg(long, env = "CHECKOUT_TAX_RATE", default_value = "0.08", value_parser = tax_rate)]
    pub tax_rate: Decimal,

    /// Flat shipping fee below the free-shipping threshold.
    #[arg(long, env = "CHECKOUT_FLAT_SHIPPING", default_value_t = 999_u64)]
    pub flat_shipping: u64,

    /// Subtotals strictly above this amount ship for free.
    #[arg(
        long,
        env = "CHECKOUT_FREE_SHIPPING_THRESHOLD",
        default_value_t = 10_000_u64
    )]
    pub free_shipping_threshold: u64,
}

impl CheckoutConfig {
    /// Pricing rules handed to the checkout services.
    #[must_use]
    pub fn settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            currency: self.currency.to_ascii_uppercase(),
            tax_rate: self.tax_rate,
            flat_shipping: self.flat_shipping,
            free_shipping_threshold: self.free_shipping_threshold,
        }
    }
}

fn tax_rate(value: &str) -> Result<Decimal, String> {
    let rate = value
        .trim()
        .parse::<Decimal>()
        .map_err(|source| format!("not a decimal: {source}"))?;

    if rate.is_sign_negative() && !rate.is_zero() {
        return Err("tax rate must be zero or more".to_string());
    }

    Ok(rate)
}
