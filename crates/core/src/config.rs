use serde::{Deserialize, Serialize};
use stripeform_driver_stripe::{DEFAULT_API_BASE, StripeClient};
use stripeform_types::{Attribute, AttributeType, Schema};

use crate::error::{ProviderError, Result};

pub const API_TOKEN_ENV: &str = "STRIPE_API_TOKEN";
pub const API_BASE_ENV: &str = "STRIPE_API_BASE";

/// Provider-level settings
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Secret or restricted API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Override for the API host, e.g. a local stripe-mock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: Some(api_token.into()),
            api_base: None,
        }
    }

    pub fn schema() -> Schema {
        Schema::new()
            .with_attribute("api_token", Attribute::optional(AttributeType::String))
            .with_attribute("api_base", Attribute::optional(AttributeType::String))
    }

    /// Fill unset fields from the process environment
    pub fn resolve(self) -> Self {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Fill unset (or empty) fields from `lookup`
    pub fn resolve_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        self.api_token = non_empty(self.api_token).or_else(|| non_empty(lookup(API_TOKEN_ENV)));
        self.api_base = non_empty(self.api_base).or_else(|| non_empty(lookup(API_BASE_ENV)));
        self
    }

    /// Build the authenticated client
    pub fn client(&self) -> Result<StripeClient> {
        let token = self.api_token.as_deref().ok_or_else(|| {
            ProviderError::Config(format!(
                "no API token configured; set api_token or {}",
                API_TOKEN_ENV
            ))
        })?;
        let api_base = self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE);

        tracing::info!(api_base, "Initializing Stripe client");
        let client = StripeClient::with_api_base(token, api_base)?;
        if !client.is_test_mode() {
            tracing::warn!("Using a live-mode Stripe key");
        }
        Ok(client)
    }
}
