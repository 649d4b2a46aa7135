//! Payments service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::{Span, info, warn};

use crate::{
    database::Db,
    domain::{
        carts::repository::PgCartItemsRepository,
        orders::{
            records::{OrderRecord, OrderUuid},
            repositories::PgOrdersRepository,
            status::{OrderStatus, PaymentStatus},
        },
        owners::OwnerKey,
        payments::{
            errors::PaymentsServiceError,
            events::{EventEffect, WebhookEvent},
            gateway::{PaymentGateway, PaymentSessionRequest},
            repository::PgPaymentsRepository,
            signature::WebhookVerifier,
        },
    },
};

/// Where to send the customer to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRedirect {
    pub order_uuid: OrderUuid,
    pub session_id: String,
    pub url: String,
}

/// What a verified callback did. Every variant is acknowledged to the
/// provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Paid { order_uuid: OrderUuid },
    Failed { order_uuid: OrderUuid },
    AlreadyProcessed { order_uuid: OrderUuid },
    OrderNotFound,
    Ignored { kind: String },
}

impl CallbackOutcome {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paid { .. } => "paid",
            Self::Failed { .. } => "failed",
            Self::AlreadyProcessed { .. } => "already_processed",
            Self::OrderNotFound => "order_not_found",
            Self::Ignored { .. } => "ignored",
        }
    }
}

#[derive(Clone)]
pub struct PgPaymentsService {
    db: Db,
    gateway: Arc<dyn PaymentGateway>,
    verifier: WebhookVerifier,
    orders: PgOrdersRepository,
    payments: PgPaymentsRepository,
    cart_items: PgCartItemsRepository,
}

impl PgPaymentsService {
    #[must_use]
    pub fn new(db: Db, gateway: Arc<dyn PaymentGateway>, verifier: WebhookVerifier) -> Self {
        Self {
            db,
            gateway,
            verifier,
            orders: PgOrdersRepository::new(),
            payments: PgPaymentsRepository::new(),
            cart_items: PgCartItemsRepository::new(),
        }
    }
}

fn ensure_awaiting_payment(order: &OrderRecord) -> Result<(), PaymentsServiceError> {
    if order.payment_status != PaymentStatus::Pending || order.status == OrderStatus::Cancelled {
        return Err(PaymentsServiceError::InvalidState {
            status: order.status,
            payment_status: order.payment_status,
        });
    }

    Ok(())
}

#[async_trait]
impl PaymentsService for PgPaymentsService {
    #[tracing::instrument(
        name = "payments.service.initiate_payment",
        skip(self, owner, order),
        fields(order_uuid = %order, session_id = tracing::field::Empty),
        err
    )]
    async fn initiate_payment(
        &self,
        owner: Option<OwnerKey>,
        order: OrderUuid,
    ) -> Result<PaymentRedirect, PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let record = match &owner {
            Some(owner) => self.orders.get_owned_order(&mut tx, owner, order).await?,
            None => self.orders.lock_order(&mut tx, order).await?,
        };

        tx.commit().await?;

        ensure_awaiting_payment(&record)?;

        // No transaction is held open across the provider call; a failure
        // here leaves the order untouched and retryable.
        let session = self
            .gateway
            .create_session(PaymentSessionRequest {
                order_uuid: record.uuid,
                order_number: record.order_number.clone(),
                amount: record.totals.total,
                currency: record.currency.clone(),
                customer_email: record.customer_email.clone(),
                shipping: record.shipping.clone(),
            })
            .await?;

        let mut tx = self.db.begin().await?;

        let recorded = self
            .payments
            .record_session(&mut tx, record.uuid, &session.id)
            .await?;

        if !recorded {
            return Err(PaymentsServiceError::InvalidState {
                status: record.status,
                payment_status: record.payment_status,
            });
        }

        tx.commit().await?;

        Span::current().record("session_id", tracing::field::display(&session.id));

        info!(order_uuid = %record.uuid, session_id = %session.id, "initiated payment");

        Ok(PaymentRedirect {
            order_uuid: record.uuid,
            session_id: session.id,
            url: session.url,
        })
    }

    #[tracing::instrument(
        name = "payments.service.handle_payment_callback",
        skip(self, payload, signature),
        fields(
            payload_bytes = payload.len(),
            event_id = tracing::field::Empty,
            event_type = tracing::field::Empty,
            outcome = tracing::field::Empty
        ),
        err
    )]
    async fn handle_payment_callback(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<CallbackOutcome, PaymentsServiceError> {
        self.verifier.verify(payload, signature, Timestamp::now())?;

        let event: WebhookEvent =
            serde_json::from_slice(payload).map_err(PaymentsServiceError::InvalidPayload)?;

        let span = Span::current();

        span.record("event_id", tracing::field::display(&event.id));
        span.record("event_type", tracing::field::display(&event.kind));

        let effect = event.effect();

        if effect == EventEffect::Ignored {
            span.record("outcome", "ignored");

            return Ok(CallbackOutcome::Ignored { kind: event.kind });
        }

        let mut tx = self.db.begin().await?;

        let mut found = None;

        for lookup in event.lookups() {
            if let Some(order) = self.payments.find_order(&mut tx, &lookup).await? {
                found = Some(order);
                break;
            }
        }

        let Some(order) = found else {
            warn!(event_id = %event.id, "payment callback references no known order");

            span.record("outcome", "order_not_found");

            return Ok(CallbackOutcome::OrderNotFound);
        };

        let applied = match effect {
            EventEffect::Paid => {
                let paid = self
                    .payments
                    .mark_paid(
                        &mut tx,
                        order.uuid,
                        event.payment_reference(),
                        event.session_id(),
                    )
                    .await?;

                if paid && let Some(owner) = &order.owner {
                    self.cart_items.clear(&mut tx, owner).await?;
                }

                paid.then_some(CallbackOutcome::Paid {
                    order_uuid: order.uuid,
                })
            }
            EventEffect::Failed => self
                .payments
                .mark_failed(&mut tx, order.uuid)
                .await?
                .then_some(CallbackOutcome::Failed {
                    order_uuid: order.uuid,
                }),
            EventEffect::Ignored => None,
        };

        tx.commit().await?;

        let outcome = applied.unwrap_or(CallbackOutcome::AlreadyProcessed {
            order_uuid: order.uuid,
        });

        span.record("outcome", outcome.as_str());

        info!(
            order_uuid = %order.uuid,
            event_id = %event.id,
            outcome = outcome.as_str(),
            "processed payment callback"
        );

        Ok(outcome)
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Open a hosted payment session for an order still awaiting payment.
    ///
    /// With an owner the order must belong to them; without one the caller
    /// is trusted.
    async fn initiate_payment(
        &self,
        owner: Option<OwnerKey>,
        order: OrderUuid,
    ) -> Result<PaymentRedirect, PaymentsServiceError>;

    /// Verify and apply a provider callback. Replays of an already applied
    /// event succeed without changing anything.
    async fn handle_payment_callback(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<CallbackOutcome, PaymentsServiceError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::CartsService,
            orders::{OrdersService, data::OrderSource},
            payments::{
                gateway::{MockPaymentGateway, PaymentGatewayError, PaymentSession},
                signature::SignatureError,
            },
        },
        test::{
            TestContext,
            helpers::{add_item, create_product, guest, new_order},
        },
    };

    use super::*;

    fn gateway_returning(session: &'static str) -> MockPaymentGateway {
        let mut gateway = MockPaymentGateway::new();

        gateway.expect_create_session().returning(move |_| {
            Ok(PaymentSession {
                id: session.to_string(),
                url: format!("https://pay.invalid/{session}"),
            })
        });

        gateway
    }

    fn completed(session: &str, order: &OrderRecord) -> Vec<u8> {
        event_payload("checkout.session.completed", session, order)
    }

    fn event_payload(kind: &str, session: &str, order: &OrderRecord) -> Vec<u8> {
        json!({
            "id": format!("evt_{session}"),
            "type": kind,
            "data": {
                "object": {
                    "id": session,
                    "payment_intent": "pi_123",
                    "payment_status": "paid",
                    "metadata": {
                        "order_uuid": order.uuid.to_string(),
                        "order_number": order.order_number,
                    },
                },
            },
        })
        .to_string()
        .into_bytes()
    }

    async fn placed_order(ctx: &TestContext, owner: &OwnerKey) -> TestResult<OrderRecord> {
        let product = create_product(ctx, "Lamp", 40_00, 10).await;

        add_item(ctx, owner, product, 1).await?;

        Ok(ctx
            .orders
            .create_order(new_order(Some(owner.clone()), OrderSource::Cart))
            .await?)
    }

    #[tokio::test]
    async fn initiate_payment_records_the_session() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = guest("pay-initiate");
        let order = placed_order(&ctx, &owner).await?;

        let mut gateway = MockPaymentGateway::new();
        let expected_total = order.totals.total;

        gateway
            .expect_create_session()
            .withf(move |request| {
                request.amount == expected_total
                    && request.currency == "USD"
                    && request.customer_email == "ada@example.com"
            })
            .times(1)
            .returning(|_| {
                Ok(PaymentSession {
                    id: "cs_initiate".to_string(),
                    url: "https://pay.invalid/cs_initiate".to_string(),
                })
            });

        let redirect = ctx
            .payments(gateway)
            .initiate_payment(Some(owner.clone()), order.uuid)
            .await?;

        assert_eq!(redirect.url, "https://pay.invalid/cs_initiate");

        let stored = ctx.orders.get_order(owner, order.uuid).await?;

        assert_eq!(stored.payment_session_id.as_deref(), Some("cs_initiate"));
        assert_eq!(stored.payment_status, PaymentStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn initiate_payment_for_someone_elses_order_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let order = placed_order(&ctx, &guest("pay-owner")).await?;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_session().never();

        let result = ctx
            .payments(gateway)
            .initiate_payment(Some(guest("pay-stranger")), order.uuid)
            .await;

        assert!(matches!(result, Err(PaymentsServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn provider_failure_leaves_the_order_retryable() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = guest("pay-retry");
        let order = placed_order(&ctx, &owner).await?;

        let mut gateway = MockPaymentGateway::new();
        let mut calls = 0;

        gateway.expect_create_session().times(2).returning(move |_| {
            calls += 1;

            if calls == 1 {
                Err(PaymentGatewayError::UnexpectedResponse(
                    "503 Service Unavailable".to_string(),
                ))
            } else {
                Ok(PaymentSession {
                    id: "cs_retry".to_string(),
                    url: "https://pay.invalid/cs_retry".to_string(),
                })
            }
        });

        let payments = ctx.payments(gateway);

        let first = payments
            .initiate_payment(Some(owner.clone()), order.uuid)
            .await;

        assert!(matches!(first, Err(PaymentsServiceError::Gateway(_))));

        let untouched = ctx.orders.get_order(owner.clone(), order.uuid).await?;

        assert_eq!(untouched.payment_session_id, None);
        assert_eq!(untouched.payment_status, PaymentStatus::Pending);

        payments
            .initiate_payment(Some(owner.clone()), order.uuid)
            .await?;

        let retried = ctx.orders.get_order(owner, order.uuid).await?;

        assert_eq!(retried.payment_session_id.as_deref(), Some("cs_retry"));

        Ok(())
    }

    #[tokio::test]
    async fn completed_callback_marks_paid_and_clears_the_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = guest("pay-complete");
        let order = placed_order(&ctx, &owner).await?;
        let payments = ctx.payments(gateway_returning("cs_complete"));

        payments
            .initiate_payment(Some(owner.clone()), order.uuid)
            .await?;

        let later = create_product(&ctx, "Added Later", 5_00, 5).await;
        add_item(&ctx, &owner, later, 1).await?;

        let payload = completed("cs_complete", &order);
        let signature = ctx.sign(&payload);

        let outcome = payments
            .handle_payment_callback(&payload, &signature)
            .await?;

        assert_eq!(
            outcome,
            CallbackOutcome::Paid {
                order_uuid: order.uuid
            }
        );

        let paid = ctx.orders.get_order(owner.clone(), order.uuid).await?;

        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.payment_id.as_deref(), Some("pi_123"));
        assert_eq!(paid.status, OrderStatus::Pending);
        assert_eq!(ctx.carts.get_count(owner).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn replayed_callback_is_acknowledged_without_side_effects() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = guest("pay-replay");
        let order = placed_order(&ctx, &owner).await?;
        let payments = ctx.payments(gateway_returning("cs_replay"));

        payments
            .initiate_payment(Some(owner.clone()), order.uuid)
            .await?;

        let payload = completed("cs_replay", &order);
        let signature = ctx.sign(&payload);

        payments
            .handle_payment_callback(&payload, &signature)
            .await?;

        let product = create_product(&ctx, "Next Purchase", 5_00, 5).await;
        add_item(&ctx, &owner, product, 2).await?;

        let replay = payments
            .handle_payment_callback(&payload, &signature)
            .await?;

        assert_eq!(
            replay,
            CallbackOutcome::AlreadyProcessed {
                order_uuid: order.uuid
            }
        );
        assert_eq!(ctx.carts.get_count(owner.clone()).await?, 2);

        let stored = ctx.orders.get_order(owner, order.uuid).await?;

        assert_eq!(stored.payment_status, PaymentStatus::Paid);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deliveries_mark_paid_exactly_once() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = guest("pay-concurrent");
        let order = placed_order(&ctx, &owner).await?;
        let payments = Arc::new(ctx.payments(gateway_returning("cs_concurrent")));

        payments
            .initiate_payment(Some(owner.clone()), order.uuid)
            .await?;

        let payload = completed("cs_concurrent", &order);
        let signature = ctx.sign(&payload);

        let deliveries: Vec<_> = (0..8)
            .map(|_| {
                let payments = Arc::clone(&payments);
                let payload = payload.clone();
                let signature = signature.clone();

                tokio::spawn(async move {
                    payments
                        .handle_payment_callback(&payload, &signature)
                        .await
                })
            })
            .collect();

        let mut paid = 0;
        let mut already_processed = 0;

        for delivery in deliveries {
            match delivery.await?? {
                CallbackOutcome::Paid { order_uuid } => {
                    assert_eq!(order_uuid, order.uuid);
                    paid += 1;
                }
                CallbackOutcome::AlreadyProcessed { order_uuid } => {
                    assert_eq!(order_uuid, order.uuid);
                    already_processed += 1;
                }
                other => panic!("unexpected callback outcome: {other:?}"),
            }
        }

        assert_eq!(paid, 1, "only one delivery may mark the order paid");
        assert_eq!(already_processed, 7);
        assert_eq!(ctx.carts.get_count(owner.clone()).await?, 0);

        let stored = ctx.orders.get_order(owner, order.uuid).await?;

        assert_eq!(stored.payment_status, PaymentStatus::Paid);

        Ok(())
    }

    #[tokio::test]
    async fn callback_falls_back_to_the_order_number() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = guest("pay-by-number");
        let order = placed_order(&ctx, &owner).await?;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_session().never();

        let payload = completed("cs_never_recorded", &order);
        let signature = ctx.sign(&payload);

        let outcome = ctx
            .payments(gateway)
            .handle_payment_callback(&payload, &signature)
            .await?;

        assert_eq!(
            outcome,
            CallbackOutcome::Paid {
                order_uuid: order.uuid
            }
        );

        let stored = ctx.orders.get_order(owner, order.uuid).await?;

        assert_eq!(stored.payment_session_id.as_deref(), Some("cs_never_recorded"));

        Ok(())
    }

    #[tokio::test]
    async fn forged_callbacks_are_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = guest("pay-forged");
        let order = placed_order(&ctx, &owner).await?;

        let payload = completed("cs_forged", &order);
        let header = format!("t={},v1={}", Timestamp::now().as_second(), "ab".repeat(32));

        let result = ctx
            .payments(MockPaymentGateway::new())
            .handle_payment_callback(&payload, &header)
            .await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::SignatureInvalid(SignatureError::Mismatch))
        ));

        let stored = ctx.orders.get_order(owner, order.uuid).await?;

        assert_eq!(stored.payment_status, PaymentStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn expired_sessions_fail_the_payment_once() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = guest("pay-expired");
        let order = placed_order(&ctx, &owner).await?;
        let payments = ctx.payments(gateway_returning("cs_expired"));

        payments
            .initiate_payment(Some(owner.clone()), order.uuid)
            .await?;

        let payload = event_payload("checkout.session.expired", "cs_expired", &order);
        let signature = ctx.sign(&payload);

        let first = payments
            .handle_payment_callback(&payload, &signature)
            .await?;
        let second = payments
            .handle_payment_callback(&payload, &signature)
            .await?;

        assert_eq!(
            first,
            CallbackOutcome::Failed {
                order_uuid: order.uuid
            }
        );
        assert_eq!(
            second,
            CallbackOutcome::AlreadyProcessed {
                order_uuid: order.uuid
            }
        );

        let retry = payments.initiate_payment(Some(owner), order.uuid).await;

        assert!(matches!(
            retry,
            Err(PaymentsServiceError::InvalidState {
                payment_status: PaymentStatus::Failed,
                ..
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn paid_orders_cannot_start_another_payment() -> TestResult {
        let ctx = TestContext::new().await;
        let owner = guest("pay-twice");
        let order = placed_order(&ctx, &owner).await?;

        let payload = completed("cs_twice", &order);
        let signature = ctx.sign(&payload);

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_session().never();

        let payments = ctx.payments(gateway);

        payments
            .handle_payment_callback(&payload, &signature)
            .await?;

        let result = payments.initiate_payment(Some(owner), order.uuid).await;

        assert!(matches!(
            result,
            Err(PaymentsServiceError::InvalidState {
                payment_status: PaymentStatus::Paid,
                ..
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_orders_and_events_are_acknowledged() -> TestResult {
        let ctx = TestContext::new().await;
        let payments = ctx.payments(MockPaymentGateway::new());

        let orphan = json!({
            "id": "evt_orphan",
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_unknown" } },
        })
        .to_string()
        .into_bytes();

        let outcome = payments
            .handle_payment_callback(&orphan, &ctx.sign(&orphan))
            .await?;

        assert_eq!(outcome, CallbackOutcome::OrderNotFound);

        let unrelated = json!({
            "id": "evt_customer",
            "type": "customer.updated",
            "data": { "object": { "id": "cus_1" } },
        })
        .to_string()
        .into_bytes();

        let outcome = payments
            .handle_payment_callback(&unrelated, &ctx.sign(&unrelated))
            .await?;

        assert_eq!(
            outcome,
            CallbackOutcome::Ignored {
                kind: "customer.updated".to_string()
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn signed_but_malformed_payloads_are_reported() {
        let ctx = TestContext::new().await;
        let payload = b"not json".to_vec();

        let result = ctx
            .payments(MockPaymentGateway::new())
            .handle_payment_callback(&payload, &ctx.sign(&payload))
            .await;

        assert!(matches!(result, Err(PaymentsServiceError::InvalidPayload(_))));
    }
}
