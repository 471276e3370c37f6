use indexmap::IndexMap;
use serde_json::Value;
use stripeform_driver_stripe::{FormParams, Price, Recurring, StripeApi, StripeObject};
use stripeform_types::{Attribute, AttributeType, ResourceData, Schema};

use super::{Resource, require_id};
use crate::{
    error::{ProviderError, Result},
    helpers::{
        expand_string_map, flatten_string_map, parse_decimal, push_changed_bool,
        push_changed_str, push_metadata, push_metadata_update,
    },
    tiers::{TIER_KEY, expand_tiers, flatten_tiers, pick_amount, push_amount, push_tiers, tier_schema},
    validation::check_one_of,
};

pub const TAX_BEHAVIORS: &[&str] = &["unspecified", "inclusive", "exclusive"];

const RECURRING_KEYS: &[&str] = &["aggregate_usage", "interval", "interval_count", "usage_type"];

/// `stripe_price`. Prices cannot be deleted, so delete deactivates them.
pub struct PriceResource;

impl Resource for PriceResource {
    const TYPE_NAME: &'static str = "stripe_price";
    const OBJECT: StripeObject = StripeObject::Price;

    fn schema() -> Schema {
        Schema::new()
            .with_attribute(
                "price_id",
                Attribute::optional(AttributeType::String)
                    .also_computed()
                    .force_new(),
            )
            .with_attribute(
                "active",
                Attribute::optional(AttributeType::Bool).with_default(true),
            )
            .with_attribute("currency", Attribute::required(AttributeType::String).force_new())
            .with_attribute("metadata", Attribute::optional(AttributeType::Map))
            .with_attribute("nickname", Attribute::optional(AttributeType::String))
            .with_attribute("product", Attribute::optional(AttributeType::String).force_new())
            .with_attribute(
                "recurring",
                Attribute::optional(AttributeType::Map)
                    .force_new()
                    .server_filled_keys(&["interval_count", "usage_type"]),
            )
            .with_attribute(
                "unit_amount",
                Attribute::optional(AttributeType::Int)
                    .also_computed()
                    .force_new(),
            )
            .with_attribute(
                "unit_amount_decimal",
                Attribute::optional(AttributeType::Float)
                    .also_computed()
                    .force_new(),
            )
            .with_attribute(
                "billing_scheme",
                Attribute::optional(AttributeType::String)
                    .also_computed()
                    .force_new(),
            )
            .with_attribute("created", Attribute::computed(AttributeType::Int))
            .with_attribute("livemode", Attribute::computed(AttributeType::Bool))
            .with_attribute(
                TIER_KEY,
                Attribute::optional(AttributeType::block(tier_schema())).force_new(),
            )
            .with_attribute("tiers_mode", Attribute::optional(AttributeType::String).force_new())
            .with_attribute(
                "tax_behavior",
                Attribute::optional(AttributeType::String)
                    .with_default("unspecified")
                    .one_of(TAX_BEHAVIORS),
            )
    }

    /// Stripe only lets `tax_behavior` be set once: changing it away from
    /// `unspecified` is in place, any other change needs a new price.
    fn customize_diff(d: &ResourceData, changed: &[String]) -> Vec<String> {
        let prior = d.get_prior("tax_behavior").and_then(Value::as_str);
        if changed.iter().any(|c| c == "tax_behavior") && prior != Some("unspecified") {
            vec!["tax_behavior".to_string()]
        } else {
            Vec::new()
        }
    }

    async fn create<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let params = create_params(d)?;
        let price: Price = client.create(Self::OBJECT, &params).await?;
        tracing::info!(price_id = %price.id, nickname = ?price.nickname, "Created price");

        d.set_id(price.id);
        Self::read(client, d).await
    }

    async fn read<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        let price: Price = client.retrieve(Self::OBJECT, &id, &["tiers"]).await?;
        flatten(d, &price);
        Ok(())
    }

    async fn update<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;

        let mut params = FormParams::new();
        push_changed_bool(&mut params, d, "active");
        if d.has_change("metadata") {
            push_metadata_update(&mut params, d);
        }
        push_changed_str(&mut params, d, "nickname");
        if d.has_change("tax_behavior") {
            let tax_behavior = d.get_str("tax_behavior").unwrap_or("unspecified");
            check_one_of("tax_behavior", tax_behavior, TAX_BEHAVIORS)?;
            params.push("tax_behavior", tax_behavior);
        }

        if !params.is_empty() {
            let _: Price = client.update(Self::OBJECT, &id, &params).await?;
            tracing::info!(price_id = %id, fields = params.len(), "Updated price");
        }
        Self::read(client, d).await
    }

    async fn delete<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        let mut params = FormParams::new();
        params.push("active", false);
        let _: Price = client.update(Self::OBJECT, &id, &params).await?;
        tracing::info!(price_id = %id, "Deactivated price");
        d.clear_id();
        Ok(())
    }
}

fn expand_recurring(d: &ResourceData) -> Result<FormParams> {
    let recurring = expand_string_map(d.get("recurring"));
    let mut params = FormParams::new();
    for key in RECURRING_KEYS {
        let Some(value) = recurring.get(*key) else {
            continue;
        };
        if *key == "interval_count" {
            let count = value.parse::<i64>().map_err(|_| {
                ProviderError::validation(
                    "recurring.interval_count",
                    "must be a string representing an integer (e.g. \"52\")",
                )
            })?;
            params.push(*key, count);
        } else {
            params.push(*key, value);
        }
    }
    Ok(params)
}

fn create_params(d: &ResourceData) -> Result<FormParams> {
    let tiers = expand_tiers(d)?;
    let recurring = expand_recurring(d)?;
    let tax_behavior = d.get_str("tax_behavior");
    if let Some(tax_behavior) = tax_behavior {
        check_one_of("tax_behavior", tax_behavior, TAX_BEHAVIORS)?;
    }
    let unit_amount = pick_amount(
        "unit_amount",
        d.get_i64("unit_amount"),
        d.get_f64("unit_amount_decimal"),
    )?;

    let mut params = FormParams::new();
    params.push("currency", d.get_str("currency").unwrap_or_default());
    params.push_opt("active", d.get_bool("active"));
    push_metadata(&mut params, d);
    params.push_opt("nickname", d.get_str("nickname"));
    params.push_opt("tiers_mode", d.get_str("tiers_mode"));
    push_tiers(&mut params, &tiers);
    params.push_opt("product", d.get_str("product"));
    if !recurring.is_empty() {
        params.push_object("recurring", recurring);
    }
    push_amount(&mut params, "unit_amount", unit_amount);
    params.push_opt("billing_scheme", d.get_str("billing_scheme"));
    params.push_opt("tax_behavior", tax_behavior);
    Ok(params)
}

fn flatten_recurring(recurring: Option<&Recurring>) -> Value {
    let Some(recurring) = recurring else {
        return Value::Null;
    };
    let mut map = IndexMap::new();
    if let Some(aggregate_usage) = &recurring.aggregate_usage {
        map.insert("aggregate_usage".to_string(), aggregate_usage.clone());
    }
    map.insert("interval".to_string(), recurring.interval.clone());
    map.insert(
        "interval_count".to_string(),
        recurring.interval_count.to_string(),
    );
    if let Some(usage_type) = &recurring.usage_type {
        map.insert("usage_type".to_string(), usage_type.clone());
    }
    flatten_string_map(&map)
}

fn flatten(d: &mut ResourceData, price: &Price) {
    d.set("price_id", price.id.as_str());
    d.set("active", price.active);
    d.set("created", price.created);
    d.set("currency", price.currency.as_str());
    d.set("livemode", price.livemode);
    d.set("metadata", flatten_string_map(&price.metadata));
    d.set("nickname", price.nickname.clone());
    if let Some(product) = &price.product {
        d.set("product", product.id());
    }
    d.set("recurring", flatten_recurring(price.recurring.as_ref()));
    d.set("unit_amount", price.unit_amount);
    d.set(
        "unit_amount_decimal",
        parse_decimal(price.unit_amount_decimal.as_deref()),
    );
    d.set("tiers_mode", price.tiers_mode.clone());
    d.set(TIER_KEY, flatten_tiers(&price.tiers));
    d.set("billing_scheme", price.billing_scheme.clone());
    d.set("tax_behavior", price.tax_behavior.clone());
}
