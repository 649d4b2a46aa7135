//! Carts service.

use async_trait::async_trait;
use mockall::automock;
use tracing::{Span, info};

use crate::{
    database::Db,
    domain::{
        carts::{
            data::{CartItemUpdate, NewCartItem},
            errors::CartsServiceError,
            merge::plan_merge,
            records::{CartItemRecord, CartItemUuid, CartRecord, MergeSummary},
            repository::PgCartItemsRepository,
        },
        inventory::check_availability,
        owners::{OwnerKey, SessionId, UserUuid},
        products::{records::ProductStatus, repository::PgProductsRepository},
        totals::{OrderTotals, subtotal_of},
    },
    settings::CheckoutSettings,
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    settings: CheckoutSettings,
    items: PgCartItemsRepository,
    products: PgProductsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db, settings: CheckoutSettings) -> Self {
        Self {
            db,
            settings,
            items: PgCartItemsRepository::new(),
            products: PgProductsRepository::new(),
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    #[tracing::instrument(
        name = "carts.service.get_cart",
        skip(self, owner),
        fields(owner_kind = owner.kind(), line_count = tracing::field::Empty),
        err
    )]
    async fn get_cart(&self, owner: OwnerKey) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let lines = self.items.list_lines(&mut tx, &owner).await?;

        tx.commit().await?;

        Span::current().record("line_count", lines.len());

        let subtotal = subtotal_of(lines.iter().map(|line| line.line_total))?;
        let totals = OrderTotals::compute(subtotal, &self.settings)?;
        let item_count = lines.iter().map(|line| line.item.quantity).sum();

        Ok(CartRecord {
            owner,
            lines,
            item_count,
            totals,
        })
    }

    #[tracing::instrument(
        name = "carts.service.add_item",
        skip(self, owner, item),
        fields(
            owner_kind = owner.kind(),
            product_uuid = %item.product_uuid,
            quantity = item.quantity.get()
        ),
        err
    )]
    async fn add_item(
        &self,
        owner: OwnerKey,
        item: NewCartItem,
    ) -> Result<CartItemRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let product = self
            .products
            .get_product(&mut tx, item.product_uuid)
            .await?;

        if product.status != ProductStatus::Active {
            return Err(CartsServiceError::NotFound);
        }

        let saved = self
            .items
            .upsert_item(
                &mut tx,
                &owner,
                product.uuid,
                item.quantity.get(),
                product.price,
            )
            .await?;

        // The upsert is rolled back with the transaction if the combined
        // quantity no longer fits.
        check_availability(&product, saved.quantity)?;

        tx.commit().await?;

        info!(item_uuid = %saved.uuid, quantity = saved.quantity, "added cart item");

        Ok(saved)
    }

    #[tracing::instrument(
        name = "carts.service.update_item",
        skip(self, owner, item, update),
        fields(owner_kind = owner.kind(), item_uuid = %item, quantity = update.quantity.get()),
        err
    )]
    async fn update_item(
        &self,
        owner: OwnerKey,
        item: CartItemUuid,
        update: CartItemUpdate,
    ) -> Result<CartItemRecord, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let existing = self.items.get_item(&mut tx, &owner, item).await?;

        let product = self
            .products
            .get_product(&mut tx, existing.product_uuid)
            .await?;

        check_availability(&product, update.quantity.get())?;

        let updated = self
            .items
            .set_quantity(&mut tx, item, update.quantity.get())
            .await?;

        tx.commit().await?;

        info!(item_uuid = %item, quantity = updated.quantity, "updated cart item");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self, owner, item),
        fields(owner_kind = owner.kind(), item_uuid = %item),
        err
    )]
    async fn remove_item(
        &self,
        owner: OwnerKey,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.items.delete_item(&mut tx, &owner, item).await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        info!(item_uuid = %item, "removed cart item");

        Ok(())
    }

    #[tracing::instrument(
        name = "carts.service.clear_cart",
        skip(self, owner),
        fields(owner_kind = owner.kind()),
        err
    )]
    async fn clear_cart(&self, owner: OwnerKey) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let removed = self.items.clear(&mut tx, &owner).await?;

        tx.commit().await?;

        info!(removed, "cleared cart");

        Ok(())
    }

    #[tracing::instrument(
        name = "carts.service.get_count",
        skip(self, owner),
        fields(owner_kind = owner.kind(), count = tracing::field::Empty),
        err
    )]
    async fn get_count(&self, owner: OwnerKey) -> Result<u64, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let count = self.items.count(&mut tx, &owner).await?;

        tx.commit().await?;

        Span::current().record("count", count);

        Ok(count)
    }

    #[tracing::instrument(
        name = "carts.service.merge_guest_cart",
        skip(self, user, session),
        fields(
            user_uuid = %user,
            transferred = tracing::field::Empty,
            raised = tracing::field::Empty
        ),
        err
    )]
    async fn merge_guest_cart(
        &self,
        user: UserUuid,
        session: SessionId,
    ) -> Result<MergeSummary, CartsServiceError> {
        let user_owner = OwnerKey::User(user);
        let guest_owner = OwnerKey::Guest(session);

        let mut tx = self.db.begin().await?;

        let user_items = self.items.lock_items(&mut tx, &user_owner).await?;
        let guest_items = self.items.lock_items(&mut tx, &guest_owner).await?;

        let plan = plan_merge(&user_items, &guest_items);

        for (item, quantity) in &plan.raise {
            self.items.set_quantity(&mut tx, *item, *quantity).await?;
        }

        if !plan.transfer.is_empty() {
            self.items
                .transfer_to_user(&mut tx, &plan.transfer, user)
                .await?;
        }

        self.items.clear(&mut tx, &guest_owner).await?;

        tx.commit().await?;

        let summary = plan.summary();

        let span = Span::current();

        span.record("transferred", summary.transferred);
        span.record("raised", summary.raised);

        info!(
            transferred = summary.transferred,
            raised = summary.raised,
            discarded = summary.discarded,
            "merged guest cart"
        );

        Ok(summary)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The owner's cart joined with live product data, priced at current
    /// catalog prices.
    async fn get_cart(&self, owner: OwnerKey) -> Result<CartRecord, CartsServiceError>;

    /// Add a product to the cart, incrementing an existing line for the same
    /// product.
    async fn add_item(
        &self,
        owner: OwnerKey,
        item: NewCartItem,
    ) -> Result<CartItemRecord, CartsServiceError>;

    /// Replace the quantity of one of the owner's lines.
    async fn update_item(
        &self,
        owner: OwnerKey,
        item: CartItemUuid,
        update: CartItemUpdate,
    ) -> Result<CartItemRecord, CartsServiceError>;

    async fn remove_item(
        &self,
        owner: OwnerKey,
        item: CartItemUuid,
    ) -> Result<(), CartsServiceError>;

    /// Remove every line. Clearing an empty cart succeeds.
    async fn clear_cart(&self, owner: OwnerKey) -> Result<(), CartsServiceError>;

    /// Total units across all lines.
    async fn get_count(&self, owner: OwnerKey) -> Result<u64, CartsServiceError>;

    /// Fold the guest cart for `session` into the user's cart.
    async fn merge_guest_cart(
        &self,
        user: UserUuid,
        session: SessionId,
    ) -> Result<MergeSummary, CartsServiceError>;
}
