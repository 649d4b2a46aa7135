//! Order Data

use crate::domain::{
    inventory::Quantity,
    orders::{errors::OrdersServiceError, records::Address},
    owners::OwnerKey,
    products::records::ProductUuid,
};

/// One line of a buy-now request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRequest {
    pub product_uuid: ProductUuid,
    pub quantity: Quantity,
}

/// Where checkout takes its lines from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSource {
    /// The owner's live cart. The ordered cart rows are removed with the
    /// order.
    Cart,
    /// An explicit list, used verbatim. The cart is left alone.
    Items(Vec<LineRequest>),
}

/// New Order Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub owner: Option<OwnerKey>,
    pub customer_email: String,
    pub billing: Address,
    pub shipping: Address,
    pub source: OrderSource,
    /// Remember the shipping address for an authenticated owner.
    pub save_shipping_address: bool,
}

impl NewOrder {
    pub(crate) fn validate(&self) -> Result<(), OrdersServiceError> {
        let email = self.customer_email.trim();

        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));

        if !valid_email {
            return Err(OrdersServiceError::InvalidEmail);
        }

        validate_address("billing", &self.billing)?;
        validate_address("shipping", &self.shipping)?;

        Ok(())
    }
}

fn validate_address(kind: &'static str, address: &Address) -> Result<(), OrdersServiceError> {
    let required = [
        &address.name,
        &address.line1,
        &address.city,
        &address.postal_code,
        &address.country,
    ];

    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(OrdersServiceError::IncompleteAddress(kind));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            name: "Ada Lovelace".to_string(),
            line1: "12 St James's Square".to_string(),
            line2: None,
            city: "London".to_string(),
            region: None,
            postal_code: "SW1Y 4JH".to_string(),
            country: "GB".to_string(),
        }
    }

    fn order(email: &str) -> NewOrder {
        NewOrder {
            owner: None,
            customer_email: email.to_string(),
            billing: address(),
            shipping: address(),
            source: OrderSource::Cart,
            save_shipping_address: false,
        }
    }

    #[test]
    fn accepts_a_complete_order() {
        assert!(order("ada@example.com").validate().is_ok());
    }

    #[test]
    fn rejects_missing_or_malformed_email() {
        for email in ["", "   ", "ada", "@example.com", "ada@localhost"] {
            assert!(
                matches!(order(email).validate(), Err(OrdersServiceError::InvalidEmail)),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_blank_address_fields() {
        let mut incomplete = order("ada@example.com");
        incomplete.shipping.city = " ".to_string();

        assert!(matches!(
            incomplete.validate(),
            Err(OrdersServiceError::IncompleteAddress("shipping"))
        ));
    }
}
