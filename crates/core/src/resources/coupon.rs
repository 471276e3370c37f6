use serde_json::Value;
use stripeform_driver_stripe::{Coupon, FormParams, StripeApi, StripeObject};
use stripeform_types::{Attribute, AttributeType, ResourceData, Schema};

use super::{Resource, require_id};
use crate::{
    error::{ProviderError, Result},
    helpers::{flatten_string_map, push_changed_str, push_metadata, push_metadata_update},
    validation::{check_one_of, format_timestamp, parse_timestamp},
};

pub const DURATIONS: &[&str] = &["forever", "once", "repeating"];

/// `stripe_coupon`; the user-chosen `code` becomes the coupon ID
pub struct CouponResource;

impl Resource for CouponResource {
    const TYPE_NAME: &'static str = "stripe_coupon";
    const OBJECT: StripeObject = StripeObject::Coupon;

    fn schema() -> Schema {
        Schema::new()
            .with_attribute("code", Attribute::required(AttributeType::String).force_new())
            .with_attribute("amount_off", Attribute::optional(AttributeType::Int).force_new())
            .with_attribute("currency", Attribute::optional(AttributeType::String).force_new())
            .with_attribute(
                "duration",
                Attribute::required(AttributeType::String)
                    .force_new()
                    .one_of(DURATIONS),
            )
            .with_attribute(
                "duration_in_months",
                Attribute::optional(AttributeType::Int).force_new(),
            )
            .with_attribute(
                "max_redemptions",
                Attribute::optional(AttributeType::Int).force_new(),
            )
            .with_attribute("metadata", Attribute::optional(AttributeType::Map))
            .with_attribute("name", Attribute::optional(AttributeType::String))
            .with_attribute("percent_off", Attribute::optional(AttributeType::Float).force_new())
            .with_attribute("redeem_by", Attribute::optional(AttributeType::String).force_new())
            .with_attribute("valid", Attribute::computed(AttributeType::Bool))
            .with_attribute("created", Attribute::computed(AttributeType::Int))
            .with_attribute("livemode", Attribute::computed(AttributeType::Bool))
            .with_attribute("times_redeemed", Attribute::computed(AttributeType::Int))
    }

    async fn create<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let params = create_params(d)?;
        let coupon: Coupon = client.create(Self::OBJECT, &params).await?;
        tracing::info!(coupon_id = %coupon.id, name = ?coupon.name, "Created coupon");

        d.set_id(coupon.id);
        Self::read(client, d).await
    }

    async fn read<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        let coupon: Coupon = client.retrieve(Self::OBJECT, &id, &[]).await?;
        flatten(d, &coupon);
        Ok(())
    }

    async fn update<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;

        let mut params = FormParams::new();
        if d.has_change("metadata") {
            push_metadata_update(&mut params, d);
        }
        push_changed_str(&mut params, d, "name");

        if !params.is_empty() {
            let _: Coupon = client.update(Self::OBJECT, &id, &params).await?;
            tracing::info!(coupon_id = %id, fields = params.len(), "Updated coupon");
        }
        Self::read(client, d).await
    }

    async fn delete<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()> {
        let id = require_id::<Self>(d)?;
        client.delete(Self::OBJECT, &id).await?;
        tracing::info!(coupon_id = %id, "Deleted coupon");
        d.clear_id();
        Ok(())
    }
}

fn create_params(d: &ResourceData) -> Result<FormParams> {
    let duration = d.get_str("duration").unwrap_or_default();
    check_one_of("duration", duration, DURATIONS)?;

    let code = d
        .get_str("code")
        .ok_or_else(|| ProviderError::validation("code", "required attribute is missing"))?;

    let mut params = FormParams::new();
    params.push("id", code).push("duration", duration);

    if let Some(name) = d.get_str("name") {
        params.push("name", name);
    }
    if let Some(months) = d.get_i64("duration_in_months") {
        if duration != "repeating" {
            return Err(ProviderError::validation(
                "duration_in_months",
                "can only be set when duration is \"repeating\"",
            ));
        }
        params.push("duration_in_months", months);
    }
    params.push_opt("percent_off", d.get_f64("percent_off"));
    params.push_opt("amount_off", d.get_i64("amount_off"));
    params.push_opt("max_redemptions", d.get_i64("max_redemptions"));

    if let Some(currency) = d.get_str("currency") {
        if !d.is_set("amount_off") {
            return Err(ProviderError::validation(
                "currency",
                "can only be set when using amount_off",
            ));
        }
        params.push("currency", currency);
    }
    if let Some(redeem_by) = d.get_str("redeem_by") {
        params.push("redeem_by", parse_timestamp("redeem_by", redeem_by)?);
    }
    push_metadata(&mut params, d);
    Ok(params)
}

fn flatten(d: &mut ResourceData, coupon: &Coupon) {
    d.set("code", coupon.id.as_str());
    d.set("amount_off", coupon.amount_off);
    d.set("currency", coupon.currency.clone());
    d.set("duration", coupon.duration.as_str());
    d.set("duration_in_months", coupon.duration_in_months);
    d.set("livemode", coupon.livemode);
    d.set("max_redemptions", coupon.max_redemptions);
    d.set("metadata", flatten_string_map(&coupon.metadata));
    d.set("name", coupon.name.clone());
    d.set("percent_off", coupon.percent_off);
    d.set(
        "redeem_by",
        coupon
            .redeem_by
            .and_then(format_timestamp)
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    d.set("times_redeemed", coupon.times_redeemed);
    d.set("valid", coupon.valid);
    d.set("created", coupon.created);
}
