//! Test Helpers

use sqlx::query;

use crate::{
    domain::{
        carts::{CartsService, CartsServiceError, data::NewCartItem, records::CartItemRecord},
        inventory::Quantity,
        orders::{
            data::{NewOrder, OrderSource},
            records::Address,
        },
        owners::{OwnerKey, SessionId, UserUuid},
        products::records::{ProductStatus, ProductUuid},
    },
    test::TestContext,
};

/// Insert an active catalog product.
pub(crate) async fn create_product(
    ctx: &TestContext,
    name: &str,
    price: u64,
    stock: u64,
) -> ProductUuid {
    let product = ProductUuid::new();

    query("INSERT INTO products (uuid, name, price, stock) VALUES ($1, $2, $3, $4)")
        .bind(product.into_uuid())
        .bind(name)
        .bind(i64::try_from(price).expect("price fits in BIGINT"))
        .bind(i64::try_from(stock).expect("stock fits in BIGINT"))
        .execute(ctx.db.pool())
        .await
        .expect("Failed to insert product");

    product
}

pub(crate) async fn set_product_status(
    ctx: &TestContext,
    product: ProductUuid,
    status: ProductStatus,
) {
    query("UPDATE products SET status = $2 WHERE uuid = $1")
        .bind(product.into_uuid())
        .bind(status.as_str())
        .execute(ctx.db.pool())
        .await
        .expect("Failed to update product status");
}

async fn product_counter(ctx: &TestContext, product: ProductUuid, column: &str) -> u64 {
    let value: i64 = sqlx::query_scalar(&format!("SELECT {column} FROM products WHERE uuid = $1"))
        .bind(product.into_uuid())
        .fetch_one(ctx.db.pool())
        .await
        .expect("Failed to read product");

    u64::try_from(value).expect("counter is non-negative")
}

pub(crate) async fn product_stock(ctx: &TestContext, product: ProductUuid) -> u64 {
    product_counter(ctx, product, "stock").await
}

pub(crate) async fn product_sales(ctx: &TestContext, product: ProductUuid) -> u64 {
    product_counter(ctx, product, "sales_count").await
}

async fn count_rows(ctx: &TestContext, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(ctx.db.pool())
        .await
        .expect("Failed to count rows")
}

pub(crate) async fn count_orders(ctx: &TestContext) -> i64 {
    count_rows(ctx, "orders").await
}

pub(crate) async fn count_addresses(ctx: &TestContext) -> i64 {
    count_rows(ctx, "addresses").await
}

pub(crate) fn guest(session: &str) -> OwnerKey {
    OwnerKey::Guest(SessionId::parse(session).expect("valid session id"))
}

pub(crate) fn user() -> OwnerKey {
    OwnerKey::User(UserUuid::new())
}

pub(crate) fn quantity(value: u64) -> Quantity {
    Quantity::try_from(value).expect("positive quantity")
}

pub(crate) async fn add_item(
    ctx: &TestContext,
    owner: &OwnerKey,
    product: ProductUuid,
    count: u64,
) -> Result<CartItemRecord, CartsServiceError> {
    ctx.carts
        .add_item(
            owner.clone(),
            NewCartItem {
                product_uuid: product,
                quantity: quantity(count),
            },
        )
        .await
}

pub(crate) fn address() -> Address {
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

pub(crate) fn new_order(owner: Option<OwnerKey>, source: OrderSource) -> NewOrder {
    NewOrder {
        owner,
        customer_email: "ada@example.com".to_string(),
        billing: address(),
        shipping: address(),
        source,
        save_shipping_address: false,
    }
}
