//! Payment provider webhook events.

use serde::Deserialize;
use smallvec::SmallVec;

use crate::domain::orders::records::OrderUuid;

const COMPLETED_EVENTS: [&str; 2] = [
    "checkout.session.completed",
    "checkout.session.async_payment_succeeded",
];

const FAILED_EVENTS: [&str; 2] = [
    "checkout.session.expired",
    "checkout.session.async_payment_failed",
];

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: SessionObject,
}

/// The subset of a checkout session object we act on. Every field is
/// optional so that unrelated event types still parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionObject {
    pub id: Option<String>,

    pub payment_intent: Option<String>,

    pub payment_status: Option<String>,

    #[serde(default)]
    pub metadata: SessionMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionMetadata {
    pub order_uuid: Option<String>,
    pub order_number: Option<String>,
}

/// What an event means for the order it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventEffect {
    Paid,
    Failed,
    Ignored,
}

/// One way of finding the order an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLookup {
    SessionId(String),
    OrderNumber(String),
    OrderUuid(OrderUuid),
}

impl WebhookEvent {
    #[must_use]
    pub fn effect(&self) -> EventEffect {
        let kind = self.kind.as_str();

        if COMPLETED_EVENTS.contains(&kind) {
            // A completed session with a delayed payment method is settled by
            // a later async_payment_succeeded event.
            if kind == COMPLETED_EVENTS[0]
                && self.data.object.payment_status.as_deref() == Some("unpaid")
            {
                return EventEffect::Ignored;
            }

            return EventEffect::Paid;
        }

        if FAILED_EVENTS.contains(&kind) {
            return EventEffect::Failed;
        }

        EventEffect::Ignored
    }

    /// Lookups to try, in order: the provider session id, then the order
    /// number from metadata, then the order id from metadata.
    #[must_use]
    pub fn lookups(&self) -> SmallVec<[OrderLookup; 3]> {
        let object = &self.data.object;

        let mut lookups = SmallVec::new();

        if let Some(session) = non_empty(object.id.as_deref()) {
            lookups.push(OrderLookup::SessionId(session.to_string()));
        }

        if let Some(number) = non_empty(object.metadata.order_number.as_deref()) {
            lookups.push(OrderLookup::OrderNumber(number.to_string()));
        }

        if let Some(uuid) = object
            .metadata
            .order_uuid
            .as_deref()
            .and_then(|raw| raw.parse::<OrderUuid>().ok())
        {
            lookups.push(OrderLookup::OrderUuid(uuid));
        }

        lookups
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        non_empty(self.data.object.id.as_deref())
    }

    #[must_use]
    pub fn payment_reference(&self) -> Option<&str> {
        non_empty(self.data.object.payment_intent.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn event(kind: &str, object: serde_json::Value) -> Result<WebhookEvent, serde_json::Error> {
        serde_json::from_value(json!({
            "id": "evt_1",
            "type": kind,
            "data": { "object": object },
        }))
    }

    #[test]
    fn completed_sessions_mark_orders_paid() -> TestResult {
        let event = event(
            "checkout.session.completed",
            json!({ "id": "cs_1", "payment_status": "paid", "payment_intent": "pi_1" }),
        )?;

        assert_eq!(event.effect(), EventEffect::Paid);
        assert_eq!(event.payment_reference(), Some("pi_1"));

        Ok(())
    }

    #[test]
    fn unpaid_completions_wait_for_the_async_result() -> TestResult {
        let pending = event(
            "checkout.session.completed",
            json!({ "id": "cs_1", "payment_status": "unpaid" }),
        )?;
        let settled = event(
            "checkout.session.async_payment_succeeded",
            json!({ "id": "cs_1", "payment_status": "paid" }),
        )?;

        assert_eq!(pending.effect(), EventEffect::Ignored);
        assert_eq!(settled.effect(), EventEffect::Paid);

        Ok(())
    }

    #[test]
    fn expired_and_failed_sessions_fail_the_payment() -> TestResult {
        for kind in FAILED_EVENTS {
            assert_eq!(event(kind, json!({ "id": "cs_1" }))?.effect(), EventEffect::Failed);
        }

        Ok(())
    }

    #[test]
    fn unrelated_events_are_ignored_even_with_other_objects() -> TestResult {
        let event = event("customer.created", json!({ "id": "cus_1", "email": "a@b.co" }))?;

        assert_eq!(event.effect(), EventEffect::Ignored);

        Ok(())
    }

    #[test]
    fn lookups_prefer_session_then_number_then_uuid() -> TestResult {
        let uuid = OrderUuid::new();

        let event = event(
            "checkout.session.completed",
            json!({
                "id": "cs_1",
                "metadata": {
                    "order_number": "ORD-20260301-0000BEEF",
                    "order_uuid": uuid.to_string(),
                },
            }),
        )?;

        assert_eq!(
            event.lookups().into_vec(),
            vec![
                OrderLookup::SessionId("cs_1".to_string()),
                OrderLookup::OrderNumber("ORD-20260301-0000BEEF".to_string()),
                OrderLookup::OrderUuid(uuid),
            ]
        );

        Ok(())
    }

    #[test]
    fn blank_and_malformed_references_are_skipped() -> TestResult {
        let event = event(
            "checkout.session.completed",
            json!({
                "id": "  ",
                "metadata": { "order_number": "", "order_uuid": "nope" },
            }),
        )?;

        assert!(event.lookups().is_empty());
        assert_eq!(event.session_id(), None);

        Ok(())
    }
}
