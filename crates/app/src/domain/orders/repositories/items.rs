//! Order Items Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::{
    orders::records::{OrderItemRecord, OrderItemUuid, OrderUuid},
    products::{
        records::ProductUuid,
        repository::{to_bigint, try_get_amount},
    },
};

const CREATE_ORDER_ITEM_SQL: &str = include_str!("../sql/create_order_item.sql");
const LIST_ORDER_ITEMS_SQL: &str = include_str!("../sql/list_order_items.sql");

/// A priced line ready to be written under an order.
#[derive(Debug, Clone)]
pub(crate) struct NewOrderLine {
    pub product_uuid: ProductUuid,
    pub product_name: String,
    pub quantity: u64,
    pub unit_price: u64,
    pub line_total: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderItemsRepository;

impl PgOrderItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
        let mut items = Vec::with_capacity(lines.len());

        for line in lines {
            let item = query_as::<Postgres, OrderItemRecord>(CREATE_ORDER_ITEM_SQL)
                .bind(OrderItemUuid::new().into_uuid())
                .bind(order.into_uuid())
                .bind(line.product_uuid.into_uuid())
                .bind(&line.product_name)
                .bind(to_bigint("quantity", line.quantity)?)
                .bind(to_bigint("unit_price", line.unit_price)?)
                .bind(to_bigint("line_total", line.line_total)?)
                .fetch_one(&mut **tx)
                .await?;

            items.push(item);
        }

        Ok(items)
    }

    pub(crate) async fn list_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<OrderItemRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = orders.iter().map(|order| order.into_uuid()).collect();

        query_as::<Postgres, OrderItemRecord>(LIST_ORDER_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            product_name: row.try_get("product_name")?,
            quantity: try_get_amount(row, "quantity")?,
            unit_price: try_get_amount(row, "unit_price")?,
            line_total: try_get_amount(row, "line_total")?,
        })
    }
}
