//! Shared money payloads.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};

use storefront_app::domain::totals::OrderTotals;

/// Totals Response
///
/// Amounts are minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct TotalsResponse {
    pub subtotal: u64,
    pub tax_amount: u64,
    pub shipping_amount: u64,
    pub discount_amount: u64,
    pub total: u64,
}

impl From<OrderTotals> for TotalsResponse {
    fn from(totals: OrderTotals) -> Self {
        Self {
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            shipping_amount: totals.shipping_amount,
            discount_amount: totals.discount_amount,
            total: totals.total,
        }
    }
}
