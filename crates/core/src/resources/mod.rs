//! Managed Stripe resources.
//!
//! Every resource follows the same template: a schema plus create, read,
//! update and delete against a [`StripeApi`]. Create and update always finish
//! with a read so computed fields reflect what Stripe stored.

use stripeform_driver_stripe::{StripeApi, StripeObject};
use stripeform_types::{ResourceData, Schema};

use crate::error::{ProviderError, Result};

pub mod coupon;
pub mod plan;
pub mod price;
pub mod product;
pub mod tax_rate;
pub mod webhook_endpoint;

pub use coupon::CouponResource;
pub use plan::PlanResource;
pub use price::PriceResource;
pub use product::ProductResource;
pub use tax_rate::TaxRateResource;
pub use webhook_endpoint::WebhookEndpointResource;

#[allow(async_fn_in_trait)]
pub trait Resource {
    /// Name the resource is registered under, e.g. `stripe_coupon`
    const TYPE_NAME: &'static str;
    const OBJECT: StripeObject;

    fn schema() -> Schema;

    /// Create the remote object from the values in `d`, then store its ID and
    /// read it back
    async fn create<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()>;

    /// Overwrite every attribute of `d` with what Stripe reports
    async fn read<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()>;

    /// Send the attributes that changed since the prior state, then read back
    async fn update<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()>;

    async fn delete<C: StripeApi>(client: &C, d: &mut ResourceData) -> Result<()>;

    /// Attributes that must force replacement beyond the schema's `force_new`
    /// flags, given a pending change set
    fn customize_diff(_d: &ResourceData, _changed: &[String]) -> Vec<String> {
        Vec::new()
    }
}

/// The ID of a resource that must already exist remotely
pub(crate) fn require_id<R: Resource>(d: &ResourceData) -> Result<String> {
    d.id()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(ProviderError::MissingId(R::TYPE_NAME))
}

/// Every managed resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Coupon,
    Plan,
    Price,
    Product,
    TaxRate,
    WebhookEndpoint,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Coupon,
        ResourceKind::Plan,
        ResourceKind::Price,
        ResourceKind::Product,
        ResourceKind::TaxRate,
        ResourceKind::WebhookEndpoint,
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::Coupon => CouponResource::TYPE_NAME,
            ResourceKind::Plan => PlanResource::TYPE_NAME,
            ResourceKind::Price => PriceResource::TYPE_NAME,
            ResourceKind::Product => ProductResource::TYPE_NAME,
            ResourceKind::TaxRate => TaxRateResource::TYPE_NAME,
            ResourceKind::WebhookEndpoint => WebhookEndpointResource::TYPE_NAME,
        }
    }

    pub fn from_type_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == name)
            .ok_or_else(|| ProviderError::UnknownResourceType(name.to_string()))
    }

    pub fn schema(&self) -> Schema {
        match self {
            ResourceKind::Coupon => CouponResource::schema(),
            ResourceKind::Plan => PlanResource::schema(),
            ResourceKind::Price => PriceResource::schema(),
            ResourceKind::Product => ProductResource::schema(),
            ResourceKind::TaxRate => TaxRateResource::schema(),
            ResourceKind::WebhookEndpoint => WebhookEndpointResource::schema(),
        }
    }

    pub fn customize_diff(&self, d: &ResourceData, changed: &[String]) -> Vec<String> {
        match self {
            ResourceKind::Coupon => CouponResource::customize_diff(d, changed),
            ResourceKind::Plan => PlanResource::customize_diff(d, changed),
            ResourceKind::Price => PriceResource::customize_diff(d, changed),
            ResourceKind::Product => ProductResource::customize_diff(d, changed),
            ResourceKind::TaxRate => TaxRateResource::customize_diff(d, changed),
            ResourceKind::WebhookEndpoint => WebhookEndpointResource::customize_diff(d, changed),
        }
    }

    pub async fn create<C: StripeApi>(&self, client: &C, d: &mut ResourceData) -> Result<()> {
        match self {
            ResourceKind::Coupon => CouponResource::create(client, d).await,
            ResourceKind::Plan => PlanResource::create(client, d).await,
            ResourceKind::Price => PriceResource::create(client, d).await,
            ResourceKind::Product => ProductResource::create(client, d).await,
            ResourceKind::TaxRate => TaxRateResource::create(client, d).await,
            ResourceKind::WebhookEndpoint => WebhookEndpointResource::create(client, d).await,
        }
    }

    pub async fn read<C: StripeApi>(&self, client: &C, d: &mut ResourceData) -> Result<()> {
        match self {
            ResourceKind::Coupon => CouponResource::read(client, d).await,
            ResourceKind::Plan => PlanResource::read(client, d).await,
            ResourceKind::Price => PriceResource::read(client, d).await,
            ResourceKind::Product => ProductResource::read(client, d).await,
            ResourceKind::TaxRate => TaxRateResource::read(client, d).await,
            ResourceKind::WebhookEndpoint => WebhookEndpointResource::read(client, d).await,
        }
    }

    pub async fn update<C: StripeApi>(&self, client: &C, d: &mut ResourceData) -> Result<()> {
        match self {
            ResourceKind::Coupon => CouponResource::update(client, d).await,
            ResourceKind::Plan => PlanResource::update(client, d).await,
            ResourceKind::Price => PriceResource::update(client, d).await,
            ResourceKind::Product => ProductResource::update(client, d).await,
            ResourceKind::TaxRate => TaxRateResource::update(client, d).await,
            ResourceKind::WebhookEndpoint => WebhookEndpointResource::update(client, d).await,
        }
    }

    pub async fn delete<C: StripeApi>(&self, client: &C, d: &mut ResourceData) -> Result<()> {
        match self {
            ResourceKind::Coupon => CouponResource::delete(client, d).await,
            ResourceKind::Plan => PlanResource::delete(client, d).await,
            ResourceKind::Price => PriceResource::delete(client, d).await,
            ResourceKind::Product => ProductResource::delete(client, d).await,
            ResourceKind::TaxRate => TaxRateResource::delete(client, d).await,
            ResourceKind::WebhookEndpoint => WebhookEndpointResource::delete(client, d).await,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_type_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_type_name(kind.type_name()).unwrap(), kind);
        }
        assert_eq!(
            "stripe_tax_rate".parse::<ResourceKind>().unwrap(),
            ResourceKind::TaxRate
        );
        assert!(matches!(
            ResourceKind::from_type_name("stripe_customer"),
            Err(ProviderError::UnknownResourceType(_))
        ));
    }

    #[test]
    fn test_missing_id() {
        let d = ResourceData::default();
        let err = require_id::<CouponResource>(&d).unwrap_err();
        assert_eq!(err.to_string(), "stripe_coupon has no ID; create or import it first");
    }
}
