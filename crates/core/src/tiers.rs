//! Tier lists shared by prices and plans.
//!
//! Tiers are positional: element `i` of the `tier` attribute becomes
//! `tiers[i]` in the request and comes back as element `i` of the response.

use serde_json::{Value, json};
use stripeform_driver_stripe::{FormParams, Tier};
use stripeform_types::{Attribute, AttributeType, ResourceData, Schema};

use crate::{
    error::{ProviderError, Result},
    helpers::parse_decimal,
};

pub const TIER_KEY: &str = "tier";

/// Nested schema of one `tier` element
pub fn tier_schema() -> Schema {
    let amount = |kind| Attribute::optional(kind).force_new().also_computed();
    Schema::new()
        .with_attribute("up_to", Attribute::optional(AttributeType::Int).force_new())
        .with_attribute(
            "up_to_inf",
            Attribute::optional(AttributeType::Bool).force_new(),
        )
        .with_attribute("flat_amount", amount(AttributeType::Int))
        .with_attribute("flat_amount_decimal", amount(AttributeType::Float))
        .with_attribute("unit_amount", amount(AttributeType::Int))
        .with_attribute("unit_amount_decimal", amount(AttributeType::Float))
}

/// Upper bound of a tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TierBound {
    UpTo(i64),
    Inf,
}

/// An amount given either in integer minor units or as a decimal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Integer(i64),
    Decimal(f64),
}

/// Request-side tier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierParams {
    pub up_to: Option<TierBound>,
    pub flat_amount: Option<Amount>,
    pub unit_amount: Option<Amount>,
}

impl TierParams {
    pub fn to_form(&self) -> FormParams {
        let mut params = FormParams::new();
        match self.up_to {
            Some(TierBound::UpTo(n)) => {
                params.push("up_to", n);
            }
            Some(TierBound::Inf) => {
                params.push("up_to", "inf");
            }
            None => {}
        }
        push_amount(&mut params, "flat_amount", self.flat_amount);
        push_amount(&mut params, "unit_amount", self.unit_amount);
        params
    }
}

pub(crate) fn push_amount(params: &mut FormParams, key: &str, amount: Option<Amount>) {
    match amount {
        Some(Amount::Integer(n)) => {
            params.push(key, n);
        }
        Some(Amount::Decimal(d)) => {
            params.push(format!("{}_decimal", key), d);
        }
        None => {}
    }
}

/// Pick between an integer and a decimal amount of the same tier.
///
/// Zero counts as "not meaningfully set" when the other side is non-zero, and
/// a decimal equal to the integer (as Stripe reports both) is not a conflict.
pub(crate) fn pick_amount(
    field: &str,
    integer: Option<i64>,
    decimal: Option<f64>,
) -> Result<Option<Amount>> {
    match (integer, decimal) {
        (Some(i), Some(d)) if i != 0 && d != 0.0 && (i as f64) != d => Err(
            ProviderError::validation(field, format!("conflicts with {}_decimal", last_segment(field))),
        ),
        (Some(i), Some(d)) if i == 0 && d != 0.0 => Ok(Some(Amount::Decimal(d))),
        (Some(i), _) => Ok(Some(Amount::Integer(i))),
        (None, Some(d)) => Ok(Some(Amount::Decimal(d))),
        (None, None) => Ok(None),
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Expand element `idx` of the `tier` list
pub fn expand_tier(d: &ResourceData, idx: usize) -> Result<TierParams> {
    let path = |field: &str| format!("{}.{}.{}", TIER_KEY, idx, field);

    let up_to = d.get_i64(&path("up_to"));
    let up_to_inf = d.get_bool(&path("up_to_inf"));

    let bound = match (up_to, up_to_inf) {
        (Some(n), Some(_)) if n != 0 => {
            return Err(ProviderError::validation(
                path("up_to"),
                "conflicts with up_to_inf",
            ));
        }
        (_, Some(true)) | (Some(0), _) => Some(TierBound::Inf),
        (Some(n), _) => Some(TierBound::UpTo(n)),
        (None, _) => None,
    };

    Ok(TierParams {
        up_to: bound,
        flat_amount: pick_amount(
            &path("flat_amount"),
            d.get_i64(&path("flat_amount")),
            d.get_f64(&path("flat_amount_decimal")),
        )?,
        unit_amount: pick_amount(
            &path("unit_amount"),
            d.get_i64(&path("unit_amount")),
            d.get_f64(&path("unit_amount_decimal")),
        )?,
    })
}

/// Expand the whole `tier` list, preserving order
pub fn expand_tiers(d: &ResourceData) -> Result<Vec<TierParams>> {
    (0..d.list_len(TIER_KEY))
        .map(|idx| expand_tier(d, idx))
        .collect()
}

/// Append `tiers[i][...]` pairs for every tier
pub fn push_tiers(params: &mut FormParams, tiers: &[TierParams]) {
    for (idx, tier) in tiers.iter().enumerate() {
        params.push_list_item("tiers", idx, tier.to_form());
    }
}

/// Resource value for the tiers Stripe returned.
/// A missing or zero upper bound reads as `up_to_inf = true`.
pub fn flatten_tiers(tiers: &[Tier]) -> Value {
    if tiers.is_empty() {
        return Value::Null;
    }
    Value::Array(
        tiers
            .iter()
            .map(|tier| {
                let up_to = tier.up_to.unwrap_or(0);
                json!({
                    "up_to": up_to,
                    "up_to_inf": up_to == 0,
                    "flat_amount": tier.flat_amount,
                    "flat_amount_decimal": parse_decimal(tier.flat_amount_decimal.as_deref()),
                    "unit_amount": tier.unit_amount,
                    "unit_amount_decimal": parse_decimal(tier.unit_amount_decimal.as_deref()),
                })
            })
            .collect(),
    )
}
