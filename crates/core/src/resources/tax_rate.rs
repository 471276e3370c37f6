use stripeform_driver_stripe::{FormParams, StripeApi, StripeObject, TaxRate};
use stripeform_types::{Attribute, AttributeType, ResourceData, Schema};

use super::{Resource, require_id};
use crate::{
    error::{ProviderError, Result},
    helpers::{flatten_string_map, push_changed_bool, push_changed_str, push_metadata, push_metadata_update},
};

/// `stripe_tax_rate`. Stripe has no delete endpoint for tax rates.
pub struct TaxRateResource;

impl Resource for TaxRateResource {
    const TYPE_NAME: &'static str = "stripe_tax_rate";
    const OBJECT: StripeObject = StripeObject::TaxRate;

    fn schema() -> Schema {
        Schema::new()
            .with_attribute("active", Attribute::required(AttributeType::Bool))
            .with_attribute("created", Attribute::computed(AttributeType::Int))
            .with_attribute("description", Attribute::optional(AttributeType::String))
            .with_attribute("display_name", Attribute::required(AttributeType::String))
            .with_attribute("inclusive", Attribute::required(AttributeType::Bool))
            .with_attribute("jurisdiction", Attribute::optional(AttributeType::String))
            .with_attribute("livemode", Attribute::computed(AttributeType::Bool))
            .with_attribute("metadata", Attribute::optional(AttributeType::Map))
            .with_attribute("percentage", Attribute::required(AttributeType::Float))
    }

    async fn create<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let mut params = FormParams::new();
        params
            .push("display_name", d.get_str("display_name").unwrap_or_default())
            .push("inclusive", d.get_bool("inclusive").unwrap_or(false))
            .push("percentage", d.get_f64("percentage").unwrap_or(0.0));
        params.push_opt("active", d.get_bool("active"));
        params.push_opt("description", d.get_str("description"));
        params.push_opt("jurisdiction", d.get_str("jurisdiction"));
        push_metadata(&mut params, d);

        let tax_rate: TaxRate = client.create(Self::OBJECT, &params).await?;
        tracing::info!(
            tax_rate_id = %tax_rate.id,
            percentage = tax_rate.percentage,
            "Created tax rate"
        );

        d.set_id(tax_rate.id);
        Self::read(client, d).await
    }

    async fn read<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        let tax_rate: TaxRate = client.retrieve(Self::OBJECT, &id, &[]).await?;

        d.set("active", tax_rate.active);
        d.set("created", tax_rate.created);
        d.set("description", tax_rate.description.clone());
        d.set("display_name", tax_rate.display_name.as_str());
        d.set("inclusive", tax_rate.inclusive);
        d.set("jurisdiction", tax_rate.jurisdiction.clone());
        d.set("livemode", tax_rate.livemode);
        d.set("metadata", flatten_string_map(&tax_rate.metadata));
        d.set("percentage", tax_rate.percentage);
        Ok(())
    }

    async fn update<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;

        let mut params = FormParams::new();
        push_changed_bool(&mut params, d, "active");
        push_changed_str(&mut params, d, "description");
        push_changed_str(&mut params, d, "display_name");
        push_changed_str(&mut params, d, "jurisdiction");
        if d.has_change("metadata") {
            push_metadata_update(&mut params, d);
        }

        if !params.is_empty() {
            let _: TaxRate = client.update(Self::OBJECT, &id, &params).await?;
            tracing::info!(tax_rate_id = %id, fields = params.len(), "Updated tax rate");
        }
        Self::read(client, d).await
    }

    /// Always fails; the ID is kept so the rate stays tracked until it is
    /// removed from state by hand.
    async fn delete<C: StripeApi>(_client: &C, d: &mut ResourceData) -> Result<()> {
        let display_name = d.get_str("display_name").unwrap_or_default();
        let id = d.id().unwrap_or_default();
        tracing::warn!(tax_rate_id = %id, display_name, "Refusing to delete tax rate");
        Err(ProviderError::Undeletable(format!(
            "Stripe doesn't allow deleting tax rates via the API. Tax rate \"{}\" ({}) needs \
             deletion; archive it in the Stripe dashboard and remove it from state manually.",
            display_name, id
        )))
    }
}
