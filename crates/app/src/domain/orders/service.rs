//! Orders service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use sqlx::{Postgres, Transaction};
use tracing::{Span, info, warn};

use crate::{
    database::Db,
    domain::{
        carts::{records::CartItemUuid, repository::PgCartItemsRepository},
        inventory::check_availability,
        orders::{
            data::{LineRequest, NewOrder, OrderSource},
            errors::OrdersServiceError,
            number,
            records::{Address, OrderItemRecord, OrderRecord, OrderUuid},
            repositories::{
                NewOrderLine, PendingOrder, PgAddressesRepository, PgOrderItemsRepository,
                PgOrdersRepository,
            },
            status::OrderStatus,
        },
        owners::{OwnerKey, UserUuid},
        products::{
            records::{ProductRecord, ProductUuid},
            repository::PgProductsRepository,
        },
        totals::{OrderTotals, line_total, subtotal_of},
    },
    settings::CheckoutSettings,
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    settings: CheckoutSettings,
    orders: PgOrdersRepository,
    items: PgOrderItemsRepository,
    addresses: PgAddressesRepository,
    cart_items: PgCartItemsRepository,
    products: PgProductsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, settings: CheckoutSettings) -> Self {
        Self {
            db,
            settings,
            orders: PgOrdersRepository::new(),
            items: PgOrderItemsRepository::new(),
            addresses: PgAddressesRepository::new(),
            cart_items: PgCartItemsRepository::new(),
            products: PgProductsRepository::new(),
        }
    }

    /// Resolve the requested (product, quantity) pairs and the cart rows they
    /// came from, locking the cart rows when checking out a cart.
    async fn requested_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: Option<&OwnerKey>,
        source: &OrderSource,
    ) -> Result<(Vec<(ProductUuid, u64)>, Vec<CartItemUuid>), OrdersServiceError> {
        match source {
            OrderSource::Items(lines) => Ok((coalesce(lines), Vec::new())),
            OrderSource::Cart => {
                let Some(owner) = owner else {
                    return Err(OrdersServiceError::EmptyCart);
                };

                let items = self.cart_items.lock_items(tx, owner).await?;

                let requested = items
                    .iter()
                    .map(|item| (item.product_uuid, item.quantity))
                    .collect();

                Ok((requested, items.iter().map(|item| item.uuid).collect()))
            }
        }
    }

    async fn attach_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &mut [OrderRecord],
    ) -> Result<(), OrdersServiceError> {
        if orders.is_empty() {
            return Ok(());
        }

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        let mut by_order: FxHashMap<OrderUuid, Vec<OrderItemRecord>> = FxHashMap::default();

        for item in self.items.list_items(tx, &uuids).await? {
            by_order.entry(item.order_uuid).or_default().push(item);
        }

        for order in orders.iter_mut() {
            order.items = by_order.remove(&order.uuid).unwrap_or_default();
        }

        Ok(())
    }

    async fn save_shipping_address(
        &self,
        user: UserUuid,
        address: &Address,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.db.begin().await?;

        self.addresses.save_address(&mut tx, user, address).await?;

        tx.commit().await
    }
}

/// Merge duplicate product lines, keeping first-seen order.
fn coalesce(lines: &[LineRequest]) -> Vec<(ProductUuid, u64)> {
    let mut merged: Vec<(ProductUuid, u64)> = Vec::with_capacity(lines.len());

    for line in lines {
        match merged
            .iter_mut()
            .find(|(product, _)| *product == line.product_uuid)
        {
            Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity.get()),
            None => merged.push((line.product_uuid, line.quantity.get())),
        }
    }

    merged
}

fn price_lines(
    requested: &[(ProductUuid, u64)],
    products: &FxHashMap<ProductUuid, ProductRecord>,
) -> Result<Vec<NewOrderLine>, OrdersServiceError> {
    let mut lines = Vec::with_capacity(requested.len());

    for &(uuid, quantity) in requested {
        let product = products
            .get(&uuid)
            .ok_or(OrdersServiceError::UnknownProduct(uuid))?;

        check_availability(product, quantity)?;

        lines.push(NewOrderLine {
            product_uuid: uuid,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            line_total: line_total(product.price, quantity)?,
        });
    }

    Ok(lines)
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(
            owner_kind = order.owner.as_ref().map_or("none", OwnerKey::kind),
            order_uuid = tracing::field::Empty,
            line_count = tracing::field::Empty,
            total = tracing::field::Empty
        ),
        err
    )]
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        order.validate()?;

        let mut tx = self.db.begin().await?;

        let (requested, cart_rows) = self
            .requested_lines(&mut tx, order.owner.as_ref(), &order.source)
            .await?;

        if requested.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        let product_uuids: Vec<ProductUuid> = requested.iter().map(|(uuid, _)| *uuid).collect();

        let products: FxHashMap<ProductUuid, ProductRecord> = self
            .products
            .lock_products(&mut tx, &product_uuids)
            .await?
            .into_iter()
            .map(|product| (product.uuid, product))
            .collect();

        let lines = price_lines(&requested, &products)?;

        let subtotal = subtotal_of(lines.iter().map(|line| line.line_total))?;
        let totals = OrderTotals::compute(subtotal, &self.settings)?;

        let mut created = self
            .orders
            .create_order(
                &mut tx,
                PendingOrder {
                    uuid: OrderUuid::new(),
                    order_number: number::generate(Timestamp::now()),
                    owner: order.owner.as_ref(),
                    customer_email: &order.customer_email,
                    currency: &self.settings.currency,
                    totals,
                    billing: &order.billing,
                    shipping: &order.shipping,
                },
            )
            .await?;

        created.items = self.items.create_items(&mut tx, created.uuid, &lines).await?;

        for line in &lines {
            let consumed = self
                .products
                .consume_stock(&mut tx, line.product_uuid, line.quantity)
                .await?;

            if !consumed {
                let available = products
                    .get(&line.product_uuid)
                    .map_or(0, |product| product.stock);

                return Err(OrdersServiceError::InsufficientStock {
                    name: line.product_name.clone(),
                    available,
                });
            }
        }

        if !cart_rows.is_empty() {
            self.cart_items.delete_items(&mut tx, &cart_rows).await?;
        }

        tx.commit().await?;

        let span = Span::current();

        span.record("order_uuid", tracing::field::display(created.uuid));
        span.record("line_count", created.items.len());
        span.record("total", created.totals.total);

        info!(
            order_uuid = %created.uuid,
            order_number = %created.order_number,
            total = created.totals.total,
            "created order"
        );

        if order.save_shipping_address
            && let Some(OwnerKey::User(user)) = &order.owner
            && let Err(error) = self.save_shipping_address(*user, &order.shipping).await
        {
            warn!(order_uuid = %created.uuid, %error, "failed to save shipping address");
        }

        Ok(created)
    }

    #[tracing::instrument(
        name = "orders.service.get_order",
        skip(self, owner, order),
        fields(owner_kind = owner.kind(), order_uuid = %order),
        err
    )]
    async fn get_order(
        &self,
        owner: OwnerKey,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let record = self.orders.get_owned_order(&mut tx, &owner, order).await?;

        let mut records = [record];

        self.attach_items(&mut tx, &mut records).await?;

        tx.commit().await?;

        let [record] = records;

        Ok(record)
    }

    #[tracing::instrument(
        name = "orders.service.list_orders",
        skip(self, owner),
        fields(owner_kind = owner.kind(), order_count = tracing::field::Empty),
        err
    )]
    async fn list_orders(&self, owner: OwnerKey) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut records = self.orders.list_owned_orders(&mut tx, &owner).await?;

        self.attach_items(&mut tx, &mut records).await?;

        tx.commit().await?;

        Span::current().record("order_count", records.len());

        Ok(records)
    }

    #[tracing::instrument(
        name = "orders.service.update_status",
        skip(self, order, next),
        fields(order_uuid = %order, next = %next),
        err
    )]
    async fn update_status(
        &self,
        order: OrderUuid,
        next: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let current = self.orders.lock_order(&mut tx, order).await?;

        if !current.status.can_transition_to(next) {
            return Err(OrdersServiceError::InvalidState {
                from: current.status,
                to: next,
            });
        }

        let updated = self
            .orders
            .update_status(&mut tx, order, current.status, next)
            .await?
            .ok_or(OrdersServiceError::InvalidState {
                from: current.status,
                to: next,
            })?;

        let mut records = [updated];

        self.attach_items(&mut tx, &mut records).await?;

        tx.commit().await?;

        let [updated] = records;

        info!(order_uuid = %order, from = %current.status, to = %next, "updated order status");

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Check out a cart (or an explicit item list) into a pending order.
    ///
    /// Stock validation, order and item inserts, the stock decrement and the
    /// removal of the ordered cart rows commit together or not at all.
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError>;

    /// A single order with its items. Orders belonging to someone else are
    /// reported as missing.
    async fn get_order(
        &self,
        owner: OwnerKey,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// The owner's orders, newest first.
    async fn list_orders(&self, owner: OwnerKey) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Advance an order along its fulfilment state machine.
    async fn update_status(
        &self,
        order: OrderUuid,
        next: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError>;
}
