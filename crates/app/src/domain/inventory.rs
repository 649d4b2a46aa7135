//! Inventory guard.
//!
//! Stateless availability checks shared by the cart store and the order
//! assembler. Nothing here writes; stock is only consumed inside checkout.

use std::num::NonZeroU32;

use thiserror::Error;

use crate::domain::products::records::{ProductRecord, ProductStatus};

/// A positive line quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("quantity must be a positive whole number")]
pub struct InvalidQuantity;

impl Quantity {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get() as u64
    }
}

impl TryFrom<i64> for Quantity {
    type Error = InvalidQuantity;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(InvalidQuantity)
    }
}

impl TryFrom<u64> for Quantity {
    type Error = InvalidQuantity;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(InvalidQuantity)
    }
}

/// Why a product cannot supply a requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryRejection {
    #[error("{name} is no longer available")]
    ProductUnavailable { name: String },

    #[error("insufficient stock for {name}, only {available} available")]
    InsufficientStock { name: String, available: u64 },
}

/// Check that `product` can supply `requested` units right now.
///
/// # Errors
///
/// - [`InventoryRejection::ProductUnavailable`] when the product is inactive.
/// - [`InventoryRejection::InsufficientStock`] when `requested` exceeds stock.
pub fn check_availability(
    product: &ProductRecord,
    requested: u64,
) -> Result<(), InventoryRejection> {
    if product.status != ProductStatus::Active {
        return Err(InventoryRejection::ProductUnavailable {
            name: product.name.clone(),
        });
    }

    if requested > product.stock {
        return Err(InventoryRejection::InsufficientStock {
            name: product.name.clone(),
            available: product.stock,
        });
    }

    Ok(())
}
