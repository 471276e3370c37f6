//! Stripe driver for Stripeform.
//!
//! Provides the [`StripeApi`] seam used by every resource, a reqwest-backed
//! [`StripeClient`] implementing it, Stripe's bracketed form encoding
//! ([`FormParams`]) and typed models of the managed objects.

use serde::de::DeserializeOwned;

pub mod client;
pub mod error;
pub mod objects;
pub mod params;

pub use client::{DEFAULT_API_BASE, StripeClient};
pub use error::{ApiError, Result, StripeError};
pub use objects::{
    Coupon, Deleted, Expandable, Plan, Price, Product, Recurring, StripeObject, TaxRate, Tier,
    TransformUsage, WebhookEndpoint,
};
pub use params::FormParams;

/// Object-management calls keyed by object kind and ID.
///
/// One call per CRUD verb; errors are returned as reported by Stripe.
#[allow(async_fn_in_trait)]
pub trait StripeApi {
    /// `POST /v1/<objects>`
    async fn create<T: DeserializeOwned>(
        &self,
        object: StripeObject,
        params: &FormParams,
    ) -> Result<T>;

    /// `GET /v1/<objects>/<id>`, expanding the listed fields
    async fn retrieve<T: DeserializeOwned>(
        &self,
        object: StripeObject,
        id: &str,
        expand: &[&str],
    ) -> Result<T>;

    /// `POST /v1/<objects>/<id>` with only the given fields
    async fn update<T: DeserializeOwned>(
        &self,
        object: StripeObject,
        id: &str,
        params: &FormParams,
    ) -> Result<T>;

    /// `DELETE /v1/<objects>/<id>`
    async fn delete(&self, object: StripeObject, id: &str) -> Result<Deleted>;
}
