use stripeform_driver_stripe::StripeError;
use stripeform_types::ValidationError;
use thiserror::Error;

/// Errors surfaced by provider operations.
///
/// Validation variants are raised before any request reaches Stripe;
/// [`ProviderError::Remote`] carries the driver's error unchanged.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// A field failed a local check
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Values did not match the resource schema
    #[error("invalid configuration: {0}")]
    Schema(#[from] ValidationError),

    /// Error reported by Stripe or the HTTP layer
    #[error(transparent)]
    Remote(#[from] StripeError),

    #[error("{0} has no ID; create or import it first")]
    MissingId(&'static str),

    #[error("unknown resource type '{0}'")]
    UnknownResourceType(String),

    /// The remote object cannot be removed through the API
    #[error("{0}")]
    Undeletable(String),

    #[error("changes to {} require replacing the resource", .0.join(", "))]
    RequiresReplacement(Vec<String>),

    #[error("provider configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the error was detected locally, before any remote call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProviderError::Validation { .. } | ProviderError::Schema(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
