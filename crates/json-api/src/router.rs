//! App Router

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*, trailing_slash::remove_slash};

use crate::{
    carts, checkout, healthcheck, identity,
    observability::{metrics_handler, request_logging},
    orders, payments,
    state::State,
};

/// Every storefront route.
///
/// The payment webhook sits outside the identity middleware; it is
/// authenticated by its signature instead.
pub(crate) fn app_router(state: Arc<State>) -> Router {
    Router::new()
        .hoop(CatchPanic::new())
        .hoop(request_logging)
        .hoop(remove_slash())
        .hoop(inject(state))
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(metrics_handler))
        .push(Router::with_path("payments/webhook").post(payments::handlers::webhook::handler))
        .push(
            Router::new()
                .hoop(identity::middleware::handler)
                .push(
                    Router::with_path("cart")
                        .get(carts::handlers::get::handler)
                        .delete(carts::handlers::clear::handler)
                        .push(Router::with_path("count").get(carts::handlers::count::handler))
                        .push(Router::with_path("merge").post(carts::handlers::merge::handler))
                        .push(
                            Router::with_path("items")
                                .post(carts::items::handlers::create::handler)
                                .push(
                                    Router::with_path("{item}")
                                        .put(carts::items::handlers::update::handler)
                                        .delete(carts::items::handlers::delete::handler),
                                ),
                        ),
                )
                .push(Router::with_path("checkout").post(checkout::handler::handler))
                .push(
                    Router::with_path("orders")
                        .get(orders::handlers::index::handler)
                        .push(
                            Router::with_path("{order}")
                                .get(orders::handlers::get::handler)
                                .push(
                                    Router::with_path("payment")
                                        .post(orders::handlers::payment::handler),
                                ),
                        ),
                ),
        )
}
