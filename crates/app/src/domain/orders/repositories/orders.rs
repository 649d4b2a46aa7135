//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::{
    orders::{
        records::{Address, OrderRecord, OrderUuid},
        status::{OrderStatus, PaymentStatus},
    },
    owners::OwnerKey,
    products::repository::{to_bigint, try_get_amount},
    totals::OrderTotals,
};

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const GET_OWNED_ORDER_SQL: &str = include_str!("../sql/get_owned_order.sql");
const LIST_OWNED_ORDERS_SQL: &str = include_str!("../sql/list_owned_orders.sql");
const LOCK_ORDER_SQL: &str = include_str!("../sql/lock_order.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("../sql/update_order_status.sql");

/// Header values for an order about to be inserted.
#[derive(Debug)]
pub(crate) struct PendingOrder<'a> {
    pub uuid: OrderUuid,
    pub order_number: String,
    pub owner: Option<&'a OwnerKey>,
    pub customer_email: &'a str,
    pub currency: &'a str,
    pub totals: OrderTotals,
    pub billing: &'a Address,
    pub shipping: &'a Address,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: PendingOrder<'_>,
    ) -> Result<OrderRecord, sqlx::Error> {
        let totals = order.totals;

        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(&order.order_number)
            .bind(order.owner.and_then(OwnerKey::user_column))
            .bind(order.owner.and_then(OwnerKey::session_column))
            .bind(order.customer_email.trim())
            .bind(order.currency)
            .bind(to_bigint("subtotal", totals.subtotal)?)
            .bind(to_bigint("tax_amount", totals.tax_amount)?)
            .bind(to_bigint("shipping_amount", totals.shipping_amount)?)
            .bind(to_bigint("discount_amount", totals.discount_amount)?)
            .bind(to_bigint("total", totals.total)?)
            .bind(&order.billing.name)
            .bind(&order.billing.line1)
            .bind(order.billing.line2.as_deref())
            .bind(&order.billing.city)
            .bind(order.billing.region.as_deref())
            .bind(&order.billing.postal_code)
            .bind(&order.billing.country)
            .bind(&order.shipping.name)
            .bind(&order.shipping.line1)
            .bind(order.shipping.line2.as_deref())
            .bind(&order.shipping.city)
            .bind(order.shipping.region.as_deref())
            .bind(&order.shipping.postal_code)
            .bind(&order.shipping.country)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_owned_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &OwnerKey,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_OWNED_ORDER_SQL)
            .bind(owner.user_column())
            .bind(owner.session_column())
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_owned_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &OwnerKey,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_OWNED_ORDERS_SQL)
            .bind(owner.user_column())
            .bind(owner.session_column())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Move `order` from `from` to `to`. Returns `None` when the order is no
    /// longer in `from`.
    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&mut **tx)
            .await
    }
}

fn decode_status<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value: String = row.try_get(column)?;

    value.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn decode_address(row: &PgRow, prefix: &str) -> Result<Address, sqlx::Error> {
    let column = |name: &str| format!("{prefix}_{name}");

    Ok(Address {
        name: row.try_get(column("name").as_str())?,
        line1: row.try_get(column("line1").as_str())?,
        line2: row.try_get(column("line2").as_str())?,
        city: row.try_get(column("city").as_str())?,
        region: row.try_get(column("region").as_str())?,
        postal_code: row.try_get(column("postal_code").as_str())?,
        country: row.try_get(column("country").as_str())?,
    })
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            order_number: row.try_get("order_number")?,
            owner: OwnerKey::from_columns(
                row.try_get("owner_user_uuid")?,
                row.try_get("owner_session_id")?,
            ),
            customer_email: row.try_get("customer_email")?,
            status: decode_status::<OrderStatus>(row, "status")?,
            payment_status: decode_status::<PaymentStatus>(row, "payment_status")?,
            payment_session_id: row.try_get("payment_session_id")?,
            payment_id: row.try_get("payment_id")?,
            currency: row.try_get("currency")?,
            totals: OrderTotals {
                subtotal: try_get_amount(row, "subtotal")?,
                tax_amount: try_get_amount(row, "tax_amount")?,
                shipping_amount: try_get_amount(row, "shipping_amount")?,
                discount_amount: try_get_amount(row, "discount_amount")?,
                total: try_get_amount(row, "total")?,
            },
            billing: decode_address(row, "billing")?,
            shipping: decode_address(row, "shipping")?,
            items: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
