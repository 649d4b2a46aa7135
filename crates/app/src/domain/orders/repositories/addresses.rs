//! Address Book Repository

use sqlx::{Postgres, Transaction, query};
use uuid::Uuid;

use crate::domain::{orders::records::Address, owners::UserUuid};

const SAVE_ADDRESS_SQL: &str = include_str!("../sql/save_address.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgAddressesRepository;

impl PgAddressesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Remember an address for a user. Saving the same address twice only
    /// touches `updated_at`.
    pub(crate) async fn save_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        address: &Address,
    ) -> Result<(), sqlx::Error> {
        query(SAVE_ADDRESS_SQL)
            .bind(Uuid::now_v7())
            .bind(user.into_uuid())
            .bind(&address.name)
            .bind(&address.line1)
            .bind(address.line2.as_deref())
            .bind(&address.city)
            .bind(address.region.as_deref())
            .bind(&address.postal_code)
            .bind(&address.country)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
