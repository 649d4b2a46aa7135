//! Guest cart merge planning.

use rustc_hash::FxHashMap;

use crate::domain::{
    carts::records::{CartItemRecord, CartItemUuid, MergeSummary},
    products::records::ProductUuid,
};

/// Writes needed to fold a guest cart into a user cart.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct MergePlan {
    /// User lines to raise to a new quantity.
    pub raise: Vec<(CartItemUuid, u64)>,
    /// Guest lines to re-own as-is.
    pub transfer: Vec<CartItemUuid>,
    pub discarded: usize,
}

impl MergePlan {
    pub(crate) fn summary(&self) -> MergeSummary {
        MergeSummary {
            transferred: self.transfer.len(),
            raised: self.raise.len(),
            discarded: self.discarded,
        }
    }
}

/// Plan a merge with a max-quantity policy: when both carts hold a product the
/// surviving quantity is the larger of the two, otherwise the guest line moves
/// over unchanged. Guest lines not transferred are deleted afterwards.
pub(crate) fn plan_merge(user: &[CartItemRecord], guest: &[CartItemRecord]) -> MergePlan {
    let held: FxHashMap<ProductUuid, &CartItemRecord> =
        user.iter().map(|item| (item.product_uuid, item)).collect();

    let mut plan = MergePlan::default();

    for guest_item in guest {
        match held.get(&guest_item.product_uuid) {
            Some(user_item) if guest_item.quantity > user_item.quantity => {
                plan.raise.push((user_item.uuid, guest_item.quantity));
            }
            Some(_) => plan.discarded += 1,
            None => plan.transfer.push(guest_item.uuid),
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use crate::domain::owners::{OwnerKey, SessionId, UserUuid};

    use super::*;

    fn item(owner: &OwnerKey, product: ProductUuid, quantity: u64) -> CartItemRecord {
        CartItemRecord {
            uuid: CartItemUuid::new(),
            owner: owner.clone(),
            product_uuid: product,
            quantity,
            unit_price: 10_00,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn owners() -> (OwnerKey, OwnerKey) {
        (
            OwnerKey::User(UserUuid::new()),
            OwnerKey::Guest(SessionId::parse("guest-1").expect("valid session")),
        )
    }

    #[test]
    fn larger_guest_quantity_raises_the_user_line() {
        let (user, guest) = owners();
        let product = ProductUuid::new();

        let user_items = [item(&user, product, 2)];
        let guest_items = [item(&guest, product, 5)];

        let plan = plan_merge(&user_items, &guest_items);

        assert_eq!(plan.raise, vec![(user_items[0].uuid, 5)]);
        assert!(plan.transfer.is_empty());
    }

    #[test]
    fn smaller_guest_quantity_is_discarded() {
        let (user, guest) = owners();
        let product = ProductUuid::new();

        let plan = plan_merge(&[item(&user, product, 4)], &[item(&guest, product, 1)]);

        assert!(plan.raise.is_empty());
        assert!(plan.transfer.is_empty());
        assert_eq!(plan.discarded, 1);
    }

    #[test]
    fn guest_only_products_are_transferred() {
        let (user, guest) = owners();

        let guest_items = [item(&guest, ProductUuid::new(), 3)];

        let plan = plan_merge(&[item(&user, ProductUuid::new(), 1)], &guest_items);

        assert_eq!(plan.transfer, vec![guest_items[0].uuid]);
        assert_eq!(
            plan.summary(),
            MergeSummary {
                transferred: 1,
                raised: 0,
                discarded: 0,
            }
        );
    }

    #[test]
    fn empty_guest_cart_plans_nothing() {
        let (user, _) = owners();

        let plan = plan_merge(&[item(&user, ProductUuid::new(), 1)], &[]);

        assert_eq!(plan, MergePlan::default());
    }
}
