//! Response models for the Stripe objects Stripeform manages.
//!
//! Only the fields mirrored into resource state are modelled; anything else
//! Stripe returns is ignored on deserialization.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// The kinds of Stripe objects the driver can manage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripeObject {
    Coupon,
    Plan,
    Price,
    Product,
    TaxRate,
    WebhookEndpoint,
}

impl StripeObject {
    /// Collection path under `/v1`
    pub fn path(&self) -> &'static str {
        match self {
            StripeObject::Coupon => "coupons",
            StripeObject::Plan => "plans",
            StripeObject::Price => "prices",
            StripeObject::Product => "products",
            StripeObject::TaxRate => "tax_rates",
            StripeObject::WebhookEndpoint => "webhook_endpoints",
        }
    }
}

impl std::fmt::Display for StripeObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StripeObject::Coupon => "coupon",
            StripeObject::Plan => "plan",
            StripeObject::Price => "price",
            StripeObject::Product => "product",
            StripeObject::TaxRate => "tax rate",
            StripeObject::WebhookEndpoint => "webhook endpoint",
        };
        write!(f, "{}", name)
    }
}

/// Stripe sends `null` for some maps and lists; treat it as empty
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A reference that Stripe returns either as a bare ID or as an expanded object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: String,
    pub amount_off: Option<i64>,
    pub currency: Option<String>,
    pub duration: String,
    pub duration_in_months: Option<i64>,
    #[serde(default)]
    pub livemode: bool,
    pub max_redemptions: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: IndexMap<String, String>,
    pub name: Option<String>,
    pub percent_off: Option<f64>,
    pub redeem_by: Option<i64>,
    #[serde(default)]
    pub times_redeemed: i64,
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub created: i64,
}

/// One pricing tier as returned for prices and plans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub flat_amount: Option<i64>,
    pub flat_amount_decimal: Option<String>,
    pub unit_amount: Option<i64>,
    pub unit_amount_decimal: Option<String>,
    /// `None` means the tier is unbounded
    pub up_to: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformUsage {
    pub divide_by: i64,
    pub round: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    pub aggregate_usage: Option<String>,
    pub amount: Option<i64>,
    pub amount_decimal: Option<String>,
    pub billing_scheme: Option<String>,
    #[serde(default)]
    pub created: i64,
    pub currency: String,
    pub interval: String,
    #[serde(default)]
    pub interval_count: i64,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: IndexMap<String, String>,
    pub nickname: Option<String>,
    pub product: Option<Expandable>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tiers: Vec<Tier>,
    pub tiers_mode: Option<String>,
    pub transform_usage: Option<TransformUsage>,
    pub trial_period_days: Option<i64>,
    pub usage_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurring {
    pub aggregate_usage: Option<String>,
    pub interval: String,
    #[serde(default)]
    pub interval_count: i64,
    pub usage_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    pub billing_scheme: Option<String>,
    #[serde(default)]
    pub created: i64,
    pub currency: String,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: IndexMap<String, String>,
    pub nickname: Option<String>,
    pub product: Option<Expandable>,
    pub recurring: Option<Recurring>,
    pub tax_behavior: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tiers: Vec<Tier>,
    pub tiers_mode: Option<String>,
    pub unit_amount: Option<i64>,
    pub unit_amount_decimal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: IndexMap<String, String>,
    pub name: String,
    pub statement_descriptor: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub unit_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub created: i64,
    pub description: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub inclusive: bool,
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: IndexMap<String, String>,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEndpoint {
    pub id: String,
    /// Set for endpoints that receive events from connected accounts
    pub application: Option<String>,
    #[serde(default)]
    pub created: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled_events: Vec<String>,
    #[serde(default)]
    pub livemode: bool,
    /// Signing secret, only returned when the endpoint is created
    pub secret: Option<String>,
    pub status: Option<String>,
    pub url: String,
}

/// Body of a successful DELETE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deleted {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_price_with_expanded_product_and_null_tiers() {
        let price: Price = serde_json::from_value(json!({
            "id": "price_123",
            "object": "price",
            "active": true,
            "currency": "usd",
            "metadata": null,
            "product": {"id": "prod_1", "object": "product"},
            "recurring": {"interval": "month", "interval_count": 1, "usage_type": "licensed", "aggregate_usage": null},
            "tiers": null,
            "unit_amount": 0,
            "unit_amount_decimal": "0"
        }))
        .unwrap();
        assert_eq!(price.product.as_ref().map(Expandable::id), Some("prod_1"));
        assert!(price.tiers.is_empty());
        assert!(price.metadata.is_empty());
        assert_eq!(price.unit_amount, Some(0));
        assert_eq!(price.recurring.unwrap().interval, "month");
    }

    #[test]
    fn test_unbounded_tier() {
        let tier: Tier = serde_json::from_value(json!({
            "flat_amount": null, "flat_amount_decimal": null,
            "unit_amount": 50, "unit_amount_decimal": "50", "up_to": null
        }))
        .unwrap();
        assert_eq!(tier.up_to, None);
        assert_eq!(tier.unit_amount, Some(50));
    }

    #[test]
    fn test_product_type_rename() {
        let product: Product = serde_json::from_value(json!({
            "id": "prod_1", "name": "Pro", "type": "service", "active": true
        }))
        .unwrap();
        assert_eq!(product.product_type.as_deref(), Some("service"));
    }

    #[test]
    fn test_object_paths() {
        assert_eq!(StripeObject::TaxRate.path(), "tax_rates");
        assert_eq!(StripeObject::WebhookEndpoint.to_string(), "webhook endpoint");
    }
}
