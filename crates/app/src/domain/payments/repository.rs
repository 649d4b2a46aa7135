//! Payments Repository

use sqlx::{Postgres, Transaction, query, query_as};

use crate::domain::{
    orders::records::{OrderRecord, OrderUuid},
    payments::events::OrderLookup,
};

const FIND_ORDER_BY_SESSION_SQL: &str = include_str!("sql/find_order_by_session.sql");
const FIND_ORDER_BY_NUMBER_SQL: &str = include_str!("sql/find_order_by_number.sql");
const FIND_ORDER_BY_UUID_SQL: &str = include_str!("sql/find_order_by_uuid.sql");
const RECORD_PAYMENT_SESSION_SQL: &str = include_str!("sql/record_payment_session.sql");
const MARK_ORDER_PAID_SQL: &str = include_str!("sql/mark_order_paid.sql");
const MARK_ORDER_PAYMENT_FAILED_SQL: &str = include_str!("sql/mark_order_payment_failed.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPaymentsRepository;

impl PgPaymentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Find and row-lock the order a lookup refers to.
    pub(crate) async fn find_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        lookup: &OrderLookup,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        match lookup {
            OrderLookup::SessionId(session) => {
                query_as::<Postgres, OrderRecord>(FIND_ORDER_BY_SESSION_SQL)
                    .bind(session)
                    .fetch_optional(&mut **tx)
                    .await
            }
            OrderLookup::OrderNumber(number) => {
                query_as::<Postgres, OrderRecord>(FIND_ORDER_BY_NUMBER_SQL)
                    .bind(number)
                    .fetch_optional(&mut **tx)
                    .await
            }
            OrderLookup::OrderUuid(uuid) => {
                query_as::<Postgres, OrderRecord>(FIND_ORDER_BY_UUID_SQL)
                    .bind(uuid.into_uuid())
                    .fetch_optional(&mut **tx)
                    .await
            }
        }
    }

    /// Attach a provider session to an order still awaiting payment.
    pub(crate) async fn record_session(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        session: &str,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(RECORD_PAYMENT_SESSION_SQL)
            .bind(order.into_uuid())
            .bind(session)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    /// `pending -> paid`. Returns `false` if the payment already left
    /// `pending`.
    pub(crate) async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        payment_reference: Option<&str>,
        session: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(MARK_ORDER_PAID_SQL)
            .bind(order.into_uuid())
            .bind(payment_reference)
            .bind(session)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }

    /// `pending -> failed`. Returns `false` if the payment already left
    /// `pending`.
    pub(crate) async fn mark_failed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<bool, sqlx::Error> {
        let rows_affected = query(MARK_ORDER_PAYMENT_FAILED_SQL)
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected == 1)
    }
}
