//! Payments Config

use std::time::Duration;

use clap::Args;

use storefront_app::domain::payments::{
    gateway::{PaymentProviderConfig, ProviderSecret},
    signature::{BlankWebhookSecret, WebhookSecret, WebhookVerifier},
};

/// Hosted payment provider settings.
#[derive(Debug, Args)]
pub struct PaymentsConfig {
    /// Provider API base URL.
    #[arg(long, env = "PAYMENT_API_BASE", default_value = "https://api.stripe.com")]
    pub payment_api_base: String,

    /// Provider secret API key
    #[arg(long, env = "PAYMENT_API_KEY", hide_env_values = true, value_parser = non_blank)]
    pub payment_api_key: String,

    /// Shared secret used to sign payment callbacks
    #[arg(long, env = "PAYMENT_WEBHOOK_SECRET", hide_env_values = true, value_parser = non_blank)]
    pub payment_webhook_secret: String,

    /// Accepted clock skew for signed callbacks, in seconds.
    #[arg(long, env = "PAYMENT_WEBHOOK_TOLERANCE_SECONDS", default_value_t = 300_u64)]
    pub payment_webhook_tolerance_seconds: u64,

    /// Redirect after a completed payment. `{order_number}` is substituted.
    #[arg(long, env = "PAYMENT_SUCCESS_URL")]
    pub payment_success_url: String,

    /// Redirect after an abandoned payment. `{order_number}` is substituted.
    #[arg(long, env = "PAYMENT_CANCEL_URL")]
    pub payment_cancel_url: String,
}

impl PaymentsConfig {
    /// Outbound provider client settings.
    #[must_use]
    pub fn provider(&self) -> PaymentProviderConfig {
        PaymentProviderConfig {
            api_base: self.payment_api_base.trim_end_matches('/').to_string(),
            secret_key: ProviderSecret::new(self.payment_api_key.clone()),
            success_url: self.payment_success_url.clone(),
            cancel_url: self.payment_cancel_url.clone(),
        }
    }

    /// Verifier for inbound provider callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`BlankWebhookSecret`] if the secret is blank.
    pub fn verifier(&self) -> Result<WebhookVerifier, BlankWebhookSecret> {
        Ok(WebhookVerifier::new(
            WebhookSecret::new(self.payment_webhook_secret.as_bytes())?,
            Duration::from_secs(self.payment_webhook_tolerance_seconds),
        ))
    }
}

/// Secrets must carry something to sign or authenticate with.
fn non_blank(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Err("must not be blank".to_string());
    }

    Ok(value.to_string())
}
