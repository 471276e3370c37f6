use stripeform_driver_stripe::{FormParams, Product, StripeApi, StripeObject};
use stripeform_types::{Attribute, AttributeType, ResourceData, Schema};

use super::{Resource, require_id};
use crate::{
    error::Result,
    helpers::{
        expand_string_list, flatten_string_list, flatten_string_map, push_changed_bool,
        push_changed_str, push_metadata, push_metadata_update,
    },
    validation::check_one_of,
};

pub const PRODUCT_TYPES: &[&str] = &["good", "service"];

pub struct ProductResource;

impl Resource for ProductResource {
    const TYPE_NAME: &'static str = "stripe_product";
    const OBJECT: StripeObject = StripeObject::Product;

    fn schema() -> Schema {
        Schema::new()
            .with_attribute(
                "product_id",
                Attribute::optional(AttributeType::String)
                    .also_computed()
                    .force_new(),
            )
            .with_attribute("name", Attribute::required(AttributeType::String))
            .with_attribute(
                "type",
                Attribute::required(AttributeType::String).one_of(PRODUCT_TYPES),
            )
            .with_attribute(
                "active",
                Attribute::optional(AttributeType::Bool).with_default(true),
            )
            .with_attribute("attributes", Attribute::optional(AttributeType::List))
            .with_attribute("metadata", Attribute::optional(AttributeType::Map))
            .with_attribute(
                "statement_descriptor",
                Attribute::optional(AttributeType::String),
            )
            .with_attribute("unit_label", Attribute::optional(AttributeType::String))
    }

    async fn create<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let product_type = d.get_str("type").unwrap_or_default();
        check_one_of("type", product_type, PRODUCT_TYPES)?;

        let mut params = FormParams::new();
        params
            .push("name", d.get_str("name").unwrap_or_default())
            .push("type", product_type);
        params.push_opt("id", d.get_str("product_id"));
        params.push_opt("active", d.get_bool("active"));
        params.push_list("attributes", &expand_string_list(d, "attributes"));
        push_metadata(&mut params, d);
        params.push_opt("statement_descriptor", d.get_non_empty_str("statement_descriptor"));
        params.push_opt("unit_label", d.get_non_empty_str("unit_label"));

        let product: Product = client.create(Self::OBJECT, &params).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "Created product");

        d.set_id(product.id);
        Self::read(client, d).await
    }

    async fn read<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        let product: Product = client.retrieve(Self::OBJECT, &id, &[]).await?;

        d.set("product_id", product.id.as_str());
        d.set("name", product.name.as_str());
        d.set("type", product.product_type.clone());
        d.set("active", product.active);
        d.set("attributes", flatten_string_list(&product.attributes));
        d.set("metadata", flatten_string_map(&product.metadata));
        d.set("statement_descriptor", product.statement_descriptor.clone());
        d.set("unit_label", product.unit_label.clone());
        Ok(())
    }

    async fn update<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;

        let mut params = FormParams::new();
        push_changed_str(&mut params, d, "name");
        if d.has_change("type") {
            let product_type = d.get_str("type").unwrap_or_default();
            check_one_of("type", product_type, PRODUCT_TYPES)?;
            params.push("type", product_type);
        }
        push_changed_bool(&mut params, d, "active");
        if d.has_change("attributes") {
            let attributes = expand_string_list(d, "attributes");
            if attributes.is_empty() {
                params.push("attributes", "");
            } else {
                params.push_list("attributes", &attributes);
            }
        }
        if d.has_change("metadata") {
            push_metadata_update(&mut params, d);
        }
        push_changed_str(&mut params, d, "statement_descriptor");
        push_changed_str(&mut params, d, "unit_label");

        if !params.is_empty() {
            let _: Product = client.update(Self::OBJECT, &id, &params).await?;
            tracing::info!(product_id = %id, fields = params.len(), "Updated product");
        }
        Self::read(client, d).await
    }

    async fn delete<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        client.delete(Self::OBJECT, &id).await?;
        tracing::info!(product_id = %id, "Deleted product");
        d.clear_id();
        Ok(())
    }
}
