//! State

use std::sync::Arc;

use storefront_app::{
    context::AppContext,
    domain::{carts::CartsService, orders::OrdersService, payments::PaymentsService},
};

/// Services shared by every handler, injected into the depot once per
/// request.
#[derive(Clone)]
pub(crate) struct State {
    pub(crate) carts: Arc<dyn CartsService>,
    pub(crate) orders: Arc<dyn OrdersService>,
    pub(crate) payments: Arc<dyn PaymentsService>,
}

impl From<AppContext> for State {
    fn from(app: AppContext) -> Self {
        Self {
            carts: app.carts,
            orders: app.orders,
            payments: app.payments,
        }
    }
}

impl State {
    #[must_use]
    pub(crate) fn from_app_context(app: AppContext) -> Arc<Self> {
        Arc::new(app.into())
    }
}
