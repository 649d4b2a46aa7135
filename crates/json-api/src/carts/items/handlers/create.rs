//! Add Cart Item Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_app::domain::{
    carts::{CartsServiceError, data::NewCartItem},
    inventory::Quantity,
};

use crate::{
    carts::{errors::into_status_error, items::handlers::CartItemResponse},
    extensions::*,
    state::State,
};

/// Add Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddCartItemRequest {
    pub product_uuid: Uuid,

    /// Units to add; an existing line for the product is incremented
    #[serde(default = "one")]
    pub quantity: u64,
}

const fn one() -> u64 {
    1
}

impl TryFrom<AddCartItemRequest> for NewCartItem {
    type Error = CartsServiceError;

    fn try_from(request: AddCartItemRequest) -> Result<Self, Self::Error> {
        Ok(NewCartItem {
            product_uuid: request.product_uuid.into(),
            quantity: Quantity::try_from(request.quantity)?,
        })
    }
}

/// Add Cart Item Handler
#[endpoint(
    tags("cart"),
    summary = "Add Item to Cart",
    responses(
        (status_code = StatusCode::CREATED, description = "Cart item saved"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::CONFLICT, description = "Not enough stock"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid quantity"),
        (status_code = StatusCode::UNAUTHORIZED, description = "No user or session"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.items.create",
    skip(json, depot, res),
    fields(
        owner_kind = tracing::field::Empty,
        product_uuid = tracing::field::Empty,
        quantity = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<AddCartItemRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CartItemResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.owner_or_401()?;
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("owner_kind", owner.kind());
    span.record("product_uuid", tracing::field::display(request.product_uuid));
    span.record("quantity", request.quantity);

    let item = NewCartItem::try_from(request).map_err(into_status_error)?;

    let saved = state
        .carts
        .add_item(owner, item)
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/cart/items/{}", saved.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(saved.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use storefront_app::domain::{
        carts::{MockCartsService, records::CartItemUuid},
        products::records::ProductUuid,
    };

    use crate::{
        identity::SESSION_ID_HEADER,
        test_helpers::{TEST_SESSION_ID, carts_service, is_test_guest, make_cart_item},
    };

    use super::*;

    fn make_service(repo: MockCartsService) -> Service {
        carts_service(repo, Router::with_path("cart/items").post(handler))
    }

    #[tokio::test]
    async fn test_add_item_success() -> TestResult {
        let product = ProductUuid::new();
        let item = CartItemUuid::new();

        let mut repo = MockCartsService::new();

        repo.expect_add_item()
            .once()
            .withf(move |owner, new| {
                is_test_guest(owner) && new.product_uuid == product && new.quantity.get() == 2
            })
            .return_once(move |owner, _| Ok(make_cart_item(item, owner)));

        let mut res = TestClient::post("http://example.com/cart/items")
            .add_header(SESSION_ID_HEADER, TEST_SESSION_ID, true)
            .json(&json!({ "product_uuid": product.into_uuid(), "quantity": 2 }))
            .send(&make_service(repo))
            .await;

        let body: CartItemResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/cart/items/{item}").as_str()));
        assert_eq!(body.uuid, item.into_uuid());

        Ok(())
    }

    #[tokio::test]
    async fn test_add_item_defaults_to_one_unit() -> TestResult {
        let product = ProductUuid::new();

        let mut repo = MockCartsService::new();

        repo.expect_add_item()
            .once()
            .withf(|_, new| new.quantity.get() == 1)
            .return_once(|owner, _| Ok(make_cart_item(CartItemUuid::new(), owner)));

        let res = TestClient::post("http://example.com/cart/items")
            .add_header(SESSION_ID_HEADER, TEST_SESSION_ID, true)
            .json(&json!({ "product_uuid": product.into_uuid() }))
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_zero_quantity_returns_422() -> TestResult {
        let mut repo = MockCartsService::new();

        repo.expect_add_item().never();

        let res = TestClient::post("http://example.com/cart/items")
            .add_header(SESSION_ID_HEADER, TEST_SESSION_ID, true)
            .json(&json!({ "product_uuid": ProductUuid::new().into_uuid(), "quantity": 0 }))
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_beyond_stock_returns_409() -> TestResult {
        let mut repo = MockCartsService::new();

        repo.expect_add_item().once().return_once(|_, _| {
            Err(CartsServiceError::InsufficientStock {
                name: "Mug".to_string(),
                available: 3,
            })
        });

        let res = TestClient::post("http://example.com/cart/items")
            .add_header(SESSION_ID_HEADER, TEST_SESSION_ID, true)
            .json(&json!({ "product_uuid": ProductUuid::new().into_uuid(), "quantity": 4 }))
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_add_unknown_product_returns_404() -> TestResult {
        let mut repo = MockCartsService::new();

        repo.expect_add_item()
            .once()
            .return_once(|_, _| Err(CartsServiceError::NotFound));

        let res = TestClient::post("http://example.com/cart/items")
            .add_header(SESSION_ID_HEADER, TEST_SESSION_ID, true)
            .json(&json!({ "product_uuid": ProductUuid::new().into_uuid() }))
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
