//! Stripe objects managed as declarative resources.
//!
//! Each resource type pairs a [`stripeform_types::Schema`] with create, read,
//! update and delete operations against the Stripe API. [`StripeProvider`]
//! registers all of them under their type names and adds planning and import
//! on top.

pub mod config;
pub mod error;
pub mod helpers;
pub mod provider;
pub mod resources;
pub mod tiers;
pub mod validation;

#[cfg(test)]
mod test;

pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use provider::{PlanAction, PlanResult, StripeProvider};
pub use resources::{Resource, ResourceKind};
