//! List Orders Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    extensions::*,
    orders::{errors::into_status_error, handlers::OrderResponse},
    state::State,
};

/// Orders Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrdersResponse {
    /// The caller's orders, newest first
    pub orders: Vec<OrderResponse>,
}

/// List Orders Handler
#[endpoint(
    tags("orders"),
    summary = "List Orders",
    responses(
        (status_code = StatusCode::OK, description = "Orders returned"),
        (status_code = StatusCode::UNAUTHORIZED, description = "No user or session"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<OrdersResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.owner_or_401()?;

    let orders = state
        .orders
        .list_orders(owner)
        .await
        .map_err(into_status_error)?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::orders::{MockOrdersService, records::OrderUuid};

    use crate::{
        identity::SESSION_ID_HEADER,
        test_helpers::{TEST_SESSION_ID, is_test_guest, make_order, orders_service},
    };

    use super::*;

    fn make_service(repo: MockOrdersService) -> Service {
        orders_service(repo, Router::with_path("orders").get(handler))
    }

    #[tokio::test]
    async fn test_list_orders_keeps_service_order() -> TestResult {
        let newest = OrderUuid::new();
        let oldest = OrderUuid::new();

        let mut repo = MockOrdersService::new();

        repo.expect_list_orders()
            .once()
            .withf(is_test_guest)
            .return_once(move |owner| {
                Ok(vec![
                    make_order(newest, Some(owner.clone())),
                    make_order(oldest, Some(owner)),
                ])
            });

        let mut res = TestClient::get("http://example.com/orders")
            .add_header(SESSION_ID_HEADER, TEST_SESSION_ID, true)
            .send(&make_service(repo))
            .await;

        let body: OrdersResponse = res.take_json().await?;
        let uuids: Vec<_> = body.orders.iter().map(|order| order.uuid).collect();

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(uuids, vec![newest.into_uuid(), oldest.into_uuid()]);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_orders_without_identity_returns_401() -> TestResult {
        let mut repo = MockOrdersService::new();

        repo.expect_list_orders().never();

        let res = TestClient::get("http://example.com/orders")
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
