use serde::Deserialize;
use thiserror::Error;

/// The `error` object of a failed Stripe request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub param: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiError,
}

/// Errors returned by the Stripe driver
#[derive(Error, Debug)]
pub enum StripeError {
    /// Stripe answered with a non-success status
    #[error("Stripe API error ({status}): {}", api_error_message(.error))]
    Api { status: u16, error: ApiError },

    /// HTTP error from reqwest
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected object
    #[error("Failed to decode Stripe response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request parameters could not be encoded
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    /// Client could not be constructed
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

fn api_error_message(error: &ApiError) -> String {
    let message = error.message.as_deref().unwrap_or("unknown error");
    match &error.param {
        Some(param) => format!("{} [param: {}]", message, param),
        None => message.to_string(),
    }
}

impl StripeError {
    /// Whether Stripe reported that the object does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            StripeError::Api { status, error } => {
                *status == 404 || error.code.as_deref() == Some("resource_missing")
            }
            _ => false,
        }
    }
}

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, StripeError>;
