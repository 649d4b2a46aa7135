//! Merge Guest Cart Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use storefront_app::domain::carts::records::MergeSummary;

use crate::{carts::errors::into_status_error, extensions::*, state::State};

/// Merge Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MergeResponse {
    /// Guest lines moved into the user's cart
    pub transferred: usize,

    /// User lines whose quantity was raised to the guest's
    pub raised: usize,

    /// Guest lines dropped because the user's line already covered them
    pub discarded: usize,
}

impl From<MergeSummary> for MergeResponse {
    fn from(summary: MergeSummary) -> Self {
        Self {
            transferred: summary.transferred,
            raised: summary.raised,
            discarded: summary.discarded,
        }
    }
}

/// Merge Guest Cart Handler
///
/// Called right after login with both the verified user and the guest
/// session the shopper browsed with.
#[endpoint(
    tags("cart"),
    summary = "Merge Guest Cart",
    responses(
        (status_code = StatusCode::OK, description = "Guest cart merged"),
        (status_code = StatusCode::UNAUTHORIZED, description = "No verified user"),
        (status_code = StatusCode::BAD_REQUEST, description = "No guest session"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.merge",
    skip(depot),
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<MergeResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let identity = depot.identity();

    let user = identity
        .user
        .ok_or_else(|| StatusError::unauthorized().brief("Merging requires x-user-id"))?;

    let session = identity
        .session
        .ok_or_else(|| StatusError::bad_request().brief("Merging requires x-session-id"))?;

    tracing::Span::current().record("user_uuid", tracing::field::display(user));

    let summary = state
        .carts
        .merge_guest_cart(user, session)
        .await
        .map_err(into_status_error)?;

    Ok(Json(summary.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use storefront_app::domain::carts::MockCartsService;

    use crate::{
        identity::{SESSION_ID_HEADER, USER_ID_HEADER},
        test_helpers::{TEST_SESSION_ID, TEST_USER_UUID, carts_service},
    };

    use super::*;

    fn make_service(repo: MockCartsService) -> Service {
        carts_service(repo, Router::with_path("cart/merge").post(handler))
    }

    #[tokio::test]
    async fn test_merge_success() -> TestResult {
        let mut repo = MockCartsService::new();

        repo.expect_merge_guest_cart()
            .once()
            .withf(|user, session| *user == TEST_USER_UUID && session.as_str() == TEST_SESSION_ID)
            .return_once(|_, _| {
                Ok(MergeSummary {
                    transferred: 2,
                    raised: 1,
                    discarded: 0,
                })
            });

        let mut res = TestClient::post("http://example.com/cart/merge")
            .add_header(USER_ID_HEADER, TEST_USER_UUID.to_string(), true)
            .add_header(SESSION_ID_HEADER, TEST_SESSION_ID, true)
            .send(&make_service(repo))
            .await;

        let body: MergeResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.transferred, 2);
        assert_eq!(body.raised, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_merge_without_user_returns_401() -> TestResult {
        let mut repo = MockCartsService::new();

        repo.expect_merge_guest_cart().never();

        let res = TestClient::post("http://example.com/cart/merge")
            .add_header(SESSION_ID_HEADER, TEST_SESSION_ID, true)
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_merge_without_session_returns_400() -> TestResult {
        let mut repo = MockCartsService::new();

        repo.expect_merge_guest_cart().never();

        let res = TestClient::post("http://example.com/cart/merge")
            .add_header(USER_ID_HEADER, TEST_USER_UUID.to_string(), true)
            .send(&make_service(repo))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
