//! Hosted checkout payment gateway.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroize;

use crate::domain::orders::records::{Address, OrderUuid};

/// Placeholder substituted with the order number in redirect URLs.
pub const ORDER_NUMBER_PLACEHOLDER: &str = "{order_number}";

/// API key for the payment provider.
#[derive(Clone)]
pub struct ProviderSecret(String);

impl ProviderSecret {
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProviderSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProviderSecret(**redacted**)")
    }
}

impl Drop for ProviderSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Configuration for the hosted checkout provider.
#[derive(Debug, Clone)]
pub struct PaymentProviderConfig {
    /// Provider API base, e.g. `"https://api.stripe.com"`.
    pub api_base: String,

    pub secret_key: ProviderSecret,

    /// Where the provider sends the customer after paying. May contain
    /// [`ORDER_NUMBER_PLACEHOLDER`].
    pub success_url: String,

    /// Where the provider sends the customer after abandoning payment. May
    /// contain [`ORDER_NUMBER_PLACEHOLDER`].
    pub cancel_url: String,
}

/// What the provider needs to collect payment for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSessionRequest {
    pub order_uuid: OrderUuid,
    pub order_number: String,
    /// Amount in minor units.
    pub amount: u64,
    pub currency: String,
    pub customer_email: String,
    pub shipping: Address,
}

/// A hosted payment page created by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub id: String,
    pub url: String,
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted payment session for an order.
    async fn create_session(
        &self,
        request: PaymentSessionRequest,
    ) -> Result<PaymentSession, PaymentGatewayError>;
}

/// HTTP client for a Stripe-compatible checkout sessions API.
#[derive(Debug, Clone)]
pub struct HostedCheckoutClient {
    config: PaymentProviderConfig,
    http: Client,
}

impl HostedCheckoutClient {
    #[must_use]
    pub fn new(config: PaymentProviderConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn form(&self, request: &PaymentSessionRequest) -> Vec<(&'static str, String)> {
        let redirect =
            |template: &str| template.replace(ORDER_NUMBER_PLACEHOLDER, &request.order_number);

        let shipping = &request.shipping;

        let mut form = vec![
            ("mode", "payment".to_string()),
            ("customer_email", request.customer_email.clone()),
            ("client_reference_id", request.order_uuid.to_string()),
            ("success_url", redirect(&self.config.success_url)),
            ("cancel_url", redirect(&self.config.cancel_url)),
            (
                "line_items[0][price_data][currency]",
                request.currency.to_ascii_lowercase(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.amount.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                format!("Order {}", request.order_number),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[order_uuid]", request.order_uuid.to_string()),
            ("metadata[order_number]", request.order_number.clone()),
            ("payment_intent_data[shipping][name]", shipping.name.clone()),
            (
                "payment_intent_data[shipping][address][line1]",
                shipping.line1.clone(),
            ),
            (
                "payment_intent_data[shipping][address][city]",
                shipping.city.clone(),
            ),
            (
                "payment_intent_data[shipping][address][postal_code]",
                shipping.postal_code.clone(),
            ),
            (
                "payment_intent_data[shipping][address][country]",
                shipping.country.clone(),
            ),
        ];

        if let Some(line2) = &shipping.line2 {
            form.push(("payment_intent_data[shipping][address][line2]", line2.clone()));
        }

        if let Some(region) = &shipping.region {
            form.push(("payment_intent_data[shipping][address][state]", region.clone()));
        }

        form
    }
}

#[async_trait]
impl PaymentGateway for HostedCheckoutClient {
    async fn create_session(
        &self,
        request: PaymentSessionRequest,
    ) -> Result<PaymentSession, PaymentGatewayError> {
        let url = format!(
            "{}/v1/checkout/sessions",
            self.config.api_base.trim_end_matches('/')
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.secret_key.expose())
            .form(&self.form(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(PaymentGatewayError::UnexpectedResponse(format!(
                "create session failed with status {status}: {text}"
            )));
        }

        let parsed: SessionResponse = response.json().await?;

        let url = parsed.url.ok_or_else(|| {
            PaymentGatewayError::UnexpectedResponse("session has no redirect url".to_string())
        })?;

        Ok(PaymentSession { id: parsed.id, url })
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

/// Errors that can occur when talking to the payment provider.
#[derive(Debug, Error)]
pub enum PaymentGatewayError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-2xx response or an unexpected body.
    #[error("unexpected response from payment provider: {0}")]
    UnexpectedResponse(String),
}
