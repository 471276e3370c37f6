use stripeform_driver_stripe::{FormParams, StripeApi, StripeObject, WebhookEndpoint};
use stripeform_types::{Attribute, AttributeType, ResourceData, Schema};

use super::{Resource, require_id};
use crate::{
    error::Result,
    helpers::{expand_string_list, flatten_string_list},
};

/// `stripe_webhook_endpoint`
pub struct WebhookEndpointResource;

impl Resource for WebhookEndpointResource {
    const TYPE_NAME: &'static str = "stripe_webhook_endpoint";
    const OBJECT: StripeObject = StripeObject::WebhookEndpoint;

    fn schema() -> Schema {
        Schema::new()
            .with_attribute("url", Attribute::required(AttributeType::String))
            .with_attribute("enabled_events", Attribute::required(AttributeType::List))
            .with_attribute("connect", Attribute::optional(AttributeType::Bool).force_new())
            .with_attribute("secret", Attribute::computed(AttributeType::String))
    }

    async fn create<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let url = d.get_str("url").unwrap_or_default().to_string();

        let mut params = FormParams::new();
        params.push("url", &url);
        params.push_list("enabled_events", &expand_string_list(d, "enabled_events"));
        params.push_opt("connect", d.get_bool("connect"));

        let endpoint: WebhookEndpoint = client.create(Self::OBJECT, &params).await?;
        tracing::info!(webhook_endpoint_id = %endpoint.id, %url, "Created webhook endpoint");

        d.set_id(endpoint.id);
        // the signing secret is only returned here
        d.set("secret", endpoint.secret);
        Self::read(client, d).await
    }

    async fn read<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        let endpoint: WebhookEndpoint = client.retrieve(Self::OBJECT, &id, &[]).await?;

        d.set("url", endpoint.url.as_str());
        d.set("enabled_events", flatten_string_list(&endpoint.enabled_events));
        d.set("connect", endpoint.application.is_some());
        if let Some(secret) = endpoint.secret {
            d.set("secret", secret);
        }
        Ok(())
    }

    async fn update<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;

        let mut params = FormParams::new();
        if d.has_change("url") {
            params.push("url", d.get_str("url").unwrap_or_default());
        }
        if d.has_change("enabled_events") {
            params.push_list("enabled_events", &expand_string_list(d, "enabled_events"));
        }

        if !params.is_empty() {
            let _: WebhookEndpoint = client.update(Self::OBJECT, &id, &params).await?;
            tracing::info!(webhook_endpoint_id = %id, fields = params.len(), "Updated webhook endpoint");
        }
        Self::read(client, d).await
    }

    async fn delete<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        client.delete(Self::OBJECT, &id).await?;
        tracing::info!(webhook_endpoint_id = %id, "Deleted webhook endpoint");
        d.clear_id();
        Ok(())
    }
}
