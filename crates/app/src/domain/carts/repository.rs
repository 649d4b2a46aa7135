//! Cart Items Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::{
    carts::records::{CartItemRecord, CartItemUuid, CartLine},
    owners::{OwnerKey, UserUuid},
    products::{
        records::{ProductStatus, ProductUuid},
        repository::{to_bigint, try_get_amount},
    },
    totals::line_total,
};

const LOCK_CART_ITEMS_SQL: &str = include_str!("sql/lock_cart_items.sql");
const LIST_CART_LINES_SQL: &str = include_str!("sql/list_cart_lines.sql");
const GET_CART_ITEM_SQL: &str = include_str!("sql/get_cart_item.sql");
const UPSERT_CART_ITEM_SQL: &str = include_str!("sql/upsert_cart_item.sql");
const SET_CART_ITEM_QUANTITY_SQL: &str = include_str!("sql/set_cart_item_quantity.sql");
const DELETE_CART_ITEM_SQL: &str = include_str!("sql/delete_cart_item.sql");
const CLEAR_CART_SQL: &str = include_str!("sql/clear_cart.sql");
const COUNT_CART_ITEMS_SQL: &str = include_str!("sql/count_cart_items.sql");
const TRANSFER_CART_ITEMS_SQL: &str = include_str!("sql/transfer_cart_items.sql");
const DELETE_CART_ITEMS_SQL: &str = include_str!("sql/delete_cart_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// The owner's cart rows, locked `FOR UPDATE` until the transaction ends
    /// so a concurrent checkout or merge cannot consume them twice.
    pub(crate) async fn lock_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &OwnerKey,
    ) -> Result<Vec<CartItemRecord>, sqlx::Error> {
        query_as::<Postgres, CartItemRecord>(LOCK_CART_ITEMS_SQL)
            .bind(owner.user_column())
            .bind(owner.session_column())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &OwnerKey,
    ) -> Result<Vec<CartLine>, sqlx::Error> {
        query_as::<Postgres, CartLine>(LIST_CART_LINES_SQL)
            .bind(owner.user_column())
            .bind(owner.session_column())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &OwnerKey,
        item: CartItemUuid,
    ) -> Result<CartItemRecord, sqlx::Error> {
        query_as::<Postgres, CartItemRecord>(GET_CART_ITEM_SQL)
            .bind(owner.user_column())
            .bind(owner.session_column())
            .bind(item.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Insert a line, or add `quantity` to the owner's existing line for the
    /// product. Returns the line as stored afterwards.
    pub(crate) async fn upsert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &OwnerKey,
        product: ProductUuid,
        quantity: u64,
        unit_price: u64,
    ) -> Result<CartItemRecord, sqlx::Error> {
        query_as::<Postgres, CartItemRecord>(UPSERT_CART_ITEM_SQL)
            .bind(owner.user_column())
            .bind(owner.session_column())
            .bind(CartItemUuid::new().into_uuid())
            .bind(product.into_uuid())
            .bind(to_bigint("quantity", quantity)?)
            .bind(to_bigint("unit_price", unit_price)?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: CartItemUuid,
        quantity: u64,
    ) -> Result<CartItemRecord, sqlx::Error> {
        query_as::<Postgres, CartItemRecord>(SET_CART_ITEM_QUANTITY_SQL)
            .bind(item.into_uuid())
            .bind(to_bigint("quantity", quantity)?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &OwnerKey,
        item: CartItemUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEM_SQL)
            .bind(owner.user_column())
            .bind(owner.session_column())
            .bind(item.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn clear(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &OwnerKey,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_CART_SQL)
            .bind(owner.user_column())
            .bind(owner.session_column())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn count(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner: &OwnerKey,
    ) -> Result<u64, sqlx::Error> {
        let count: i64 = query_scalar(COUNT_CART_ITEMS_SQL)
            .bind(owner.user_column())
            .bind(owner.session_column())
            .fetch_one(&mut **tx)
            .await?;

        u64::try_from(count).map_err(|e| sqlx::Error::ColumnDecode {
            index: "item_count".to_string(),
            source: Box::new(e),
        })
    }

    pub(crate) async fn transfer_to_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        items: &[CartItemUuid],
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(TRANSFER_CART_ITEMS_SQL)
            .bind(uuids(items))
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        items: &[CartItemUuid],
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEMS_SQL)
            .bind(uuids(items))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn uuids(items: &[CartItemUuid]) -> Vec<Uuid> {
    items.iter().map(|item| item.into_uuid()).collect()
}

fn decode_owner(row: &PgRow) -> Result<OwnerKey, sqlx::Error> {
    OwnerKey::from_columns(
        row.try_get("owner_user_uuid")?,
        row.try_get("owner_session_id")?,
    )
    .ok_or_else(|| sqlx::Error::ColumnDecode {
        index: "owner_user_uuid".to_string(),
        source: "cart item has no owner".into(),
    })
}

impl<'r> FromRow<'r, PgRow> for CartItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartItemUuid::from_uuid(row.try_get("uuid")?),
            owner: decode_owner(row)?,
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_amount(row, "quantity")?,
            unit_price: try_get_amount(row, "unit_price")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CartLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let item = CartItemRecord::from_row(row)?;

        let status: String = row.try_get("product_status")?;

        let product_status =
            status
                .parse::<ProductStatus>()
                .map_err(|e| sqlx::Error::ColumnDecode {
                    index: "product_status".to_string(),
                    source: Box::new(e),
                })?;

        let current_price = try_get_amount(row, "current_price")?;

        let line_total =
            line_total(current_price, item.quantity).map_err(|e| sqlx::Error::ColumnDecode {
                index: "current_price".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            product_name: row.try_get("product_name")?,
            product_status,
            current_price,
            stock: try_get_amount(row, "product_stock")?,
            line_total,
            item,
        })
    }
}
