//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        orders::{OrdersService, PgOrdersService},
        payments::{
            PaymentsService, PgPaymentsService, gateway::PaymentGateway,
            signature::WebhookVerifier,
        },
    },
    settings::CheckoutSettings,
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("failed to apply database migrations")]
    Migrations(#[source] sqlx::migrate::MigrateError),
}

/// Everything the engine needs beyond the database itself.
#[derive(Clone)]
pub struct AppOptions {
    pub max_connections: u32,
    pub run_migrations: bool,
    pub checkout: CheckoutSettings,
    pub gateway: Arc<dyn PaymentGateway>,
    pub verifier: WebhookVerifier,
}

#[derive(Clone)]
pub struct AppContext {
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub payments: Arc<dyn PaymentsService>,
}

impl AppContext {
    /// Wire the services over an existing database handle.
    #[must_use]
    pub fn new(
        db: &Db,
        checkout: CheckoutSettings,
        gateway: Arc<dyn PaymentGateway>,
        verifier: WebhookVerifier,
    ) -> Self {
        Self {
            carts: Arc::new(PgCartsService::new(db.clone(), checkout.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone(), checkout)),
            payments: Arc::new(PgPaymentsService::new(db.clone(), gateway, verifier)),
        }
    }

    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection or applying
    /// migrations fails.
    pub async fn from_database_url(url: &str, options: AppOptions) -> Result<Self, AppInitError> {
        let pool = database::connect(url, options.max_connections)
            .await
            .map_err(AppInitError::Database)?;

        if options.run_migrations {
            database::migrate(&pool)
                .await
                .map_err(AppInitError::Migrations)?;
        }

        let db = Db::new(pool);

        Ok(Self::new(
            &db,
            options.checkout,
            options.gateway,
            options.verifier,
        ))
    }
}
