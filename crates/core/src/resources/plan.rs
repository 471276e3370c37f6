use serde_json::{Value, json};
use stripeform_driver_stripe::{FormParams, Plan, StripeApi, StripeObject, TransformUsage};
use stripeform_types::{Attribute, AttributeType, ResourceData, Schema};

use super::{Resource, require_id};
use crate::{
    error::Result,
    helpers::{
        flatten_string_map, parse_decimal, push_changed_bool, push_changed_str, push_metadata,
        push_metadata_update,
    },
    tiers::{TIER_KEY, expand_tiers, flatten_tiers, push_tiers, tier_schema},
    validation::check_one_of,
};

const ROUNDING: &[&str] = &["down", "up"];

/// `stripe_plan`, the legacy recurring price object
pub struct PlanResource;

fn transform_usage_schema() -> Schema {
    Schema::new()
        .with_attribute("divide_by", Attribute::required(AttributeType::Int).force_new())
        .with_attribute(
            "round",
            Attribute::required(AttributeType::String)
                .force_new()
                .one_of(ROUNDING),
        )
}

impl Resource for PlanResource {
    const TYPE_NAME: &'static str = "stripe_plan";
    const OBJECT: StripeObject = StripeObject::Plan;

    fn schema() -> Schema {
        Schema::new()
            .with_attribute(
                "plan_id",
                Attribute::optional(AttributeType::String)
                    .also_computed()
                    .force_new(),
            )
            .with_attribute(
                "active",
                Attribute::optional(AttributeType::Bool).with_default(true),
            )
            .with_attribute(
                "amount",
                Attribute::optional(AttributeType::Int)
                    .force_new()
                    .also_computed()
                    .conflicts_with(&["amount_decimal"]),
            )
            .with_attribute(
                "amount_decimal",
                Attribute::optional(AttributeType::Float)
                    .force_new()
                    .also_computed()
                    .conflicts_with(&["amount"]),
            )
            .with_attribute("currency", Attribute::required(AttributeType::String).force_new())
            .with_attribute("interval", Attribute::required(AttributeType::String).force_new())
            .with_attribute("product", Attribute::required(AttributeType::String))
            .with_attribute(
                "aggregate_usage",
                Attribute::optional(AttributeType::String).force_new(),
            )
            .with_attribute(
                "billing_scheme",
                Attribute::optional(AttributeType::String)
                    .force_new()
                    .with_default("per_unit"),
            )
            .with_attribute(
                "interval_count",
                Attribute::optional(AttributeType::Int)
                    .force_new()
                    .with_default(1),
            )
            .with_attribute("metadata", Attribute::optional(AttributeType::Map))
            .with_attribute("nickname", Attribute::optional(AttributeType::String))
            .with_attribute(
                TIER_KEY,
                Attribute::optional(AttributeType::block(tier_schema())).force_new(),
            )
            .with_attribute("tiers_mode", Attribute::optional(AttributeType::String).force_new())
            .with_attribute(
                "transform_usage",
                Attribute::optional(AttributeType::single_block(transform_usage_schema()))
                    .force_new(),
            )
            .with_attribute("trial_period_days", Attribute::optional(AttributeType::Int))
            .with_attribute(
                "usage_type",
                Attribute::optional(AttributeType::String)
                    .force_new()
                    .with_default("licensed"),
            )
    }

    async fn create<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let params = create_params(d)?;
        let plan: Plan = client.create(Self::OBJECT, &params).await?;
        match plan.nickname.as_deref().filter(|n| !n.is_empty()) {
            Some(nickname) => tracing::info!(plan_id = %plan.id, nickname, "Created plan"),
            None => tracing::info!(plan_id = %plan.id, "Created anonymous plan"),
        }

        d.set_id(plan.id);
        Self::read(client, d).await
    }

    async fn read<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        let plan: Plan = client.retrieve(Self::OBJECT, &id, &["tiers"]).await?;
        flatten(d, &plan);
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
        if d.has_change("trial_period_days") {
            params.push("trial_period_days", d.get_i64("trial_period_days").unwrap_or(0));
        }

        if !params.is_empty() {
            let _: Plan = client.update(Self::OBJECT, &id, &params).await?;
            tracing::info!(plan_id = %id, fields = params.len(), "Updated plan");
        }
        Self::read(client, d).await
    }

    async fn delete<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        client.delete(Self::OBJECT, &id).await?;
        tracing::info!(plan_id = %id, "Deleted plan");
        d.clear_id();
        Ok(())
    }
}

fn create_params(d: &ResourceData) -> Result<FormParams> {
    let tiers = expand_tiers(d)?;

    let mut params = FormParams::new();
    params
        .push("interval", d.get_str("interval").unwrap_or_default())
        .push("product", d.get_str("product").unwrap_or_default())
        .push("currency", d.get_str("currency").unwrap_or_default());

    let billing_scheme = d.get_str("billing_scheme");
    if billing_scheme != Some("tiered") {
        match d.get_f64("amount_decimal").filter(|v| *v > 0.0) {
            Some(decimal) => params.push("amount_decimal", decimal),
            None => params.push("amount", d.get_i64("amount").unwrap_or(0)),
        };
    }

    params.push_opt("id", d.get_str("plan_id"));
    params.push_opt("active", d.get_bool("active"));
    params.push_opt("aggregate_usage", d.get_str("aggregate_usage"));
    params.push_opt("billing_scheme", billing_scheme);
    params.push_opt("interval_count", d.get_i64("interval_count"));
    push_metadata(&mut params, d);
    params.push_opt("nickname", d.get_str("nickname"));
    params.push_opt("tiers_mode", d.get_str("tiers_mode"));
    push_tiers(&mut params, &tiers);

    if let Some(divide_by) = d.get_i64("transform_usage.0.divide_by") {
        let round = d.get_str("transform_usage.0.round").unwrap_or_default();
        check_one_of("transform_usage.0.round", round, ROUNDING)?;
        let mut transform = FormParams::new();
        transform.push("divide_by", divide_by).push("round", round);
        params.push_object("transform_usage", transform);
    }

    params.push_opt("trial_period_days", d.get_i64("trial_period_days"));
    params.push_opt("usage_type", d.get_str("usage_type"));
    Ok(params)
}

fn flatten_transform_usage(transform: Option<&TransformUsage>) -> Value {
    match transform {
        Some(t) => json!([{"divide_by": t.divide_by, "round": t.round}]),
        None => Value::Null,
    }
}

fn flatten(d: &mut ResourceData, plan: &Plan) {
    d.set("plan_id", plan.id.as_str());
    d.set("active", plan.active);
    d.set("aggregate_usage", plan.aggregate_usage.clone());
    d.set("amount", plan.amount);
    d.set("amount_decimal", parse_decimal(plan.amount_decimal.as_deref()));
    d.set("billing_scheme", plan.billing_scheme.clone());
    d.set("currency", plan.currency.as_str());
    d.set("interval", plan.interval.as_str());
    d.set("interval_count", plan.interval_count);
    d.set("metadata", flatten_string_map(&plan.metadata));
    d.set("nickname", plan.nickname.clone());
    d.set(
        "product",
        plan.product.as_ref().map(|p| p.id().to_string()),
    );
    d.set("tiers_mode", plan.tiers_mode.clone());
    d.set(TIER_KEY, flatten_tiers(&plan.tiers));
    d.set(
        "transform_usage",
        flatten_transform_usage(plan.transform_usage.as_ref()),
    );
    d.set("trial_period_days", plan.trial_period_days);
    d.set("usage_type", plan.usage_type.clone());
}
