use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    StripeApi,
    error::{ApiError, ApiErrorEnvelope, Result, StripeError},
    objects::{Deleted, StripeObject},
    params::FormParams,
};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// HTTP client for the Stripe REST API.
///
/// Cloning is cheap: the underlying `reqwest::Client` is reference counted.
/// The client performs exactly one request per call, without retries.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_key: String,
    api_base: Url,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_base", &self.api_base.as_str())
            .field("test_mode", &self.is_test_mode())
            .finish()
    }
}

impl StripeClient {
    /// Client for the public Stripe API
    ///
    /// # Example
    /// ```no_run
    /// use stripeform_driver_stripe::StripeClient;
    ///
    /// let api_key = std::env::var("STRIPE_API_TOKEN").unwrap_or_default();
    /// let client = StripeClient::new(api_key).expect("valid key");
    /// assert!(client.is_test_mode());
    /// ```
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_api_base(api_key, DEFAULT_API_BASE)
    }

    /// Client pointed at another endpoint, such as a local stripe-mock
    pub fn with_api_base(api_key: impl Into<String>, api_base: &str) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StripeError::Config("API key is empty".to_string()));
        }

        let mut api_base = Url::parse(api_base).map_err(|e| {
            StripeError::Config(format!("invalid API base URL '{}': {}", api_base, e))
        })?;
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("stripeform/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_key,
            api_base,
        })
    }

    /// Whether the key targets Stripe's test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_") || self.api_key.starts_with("rk_test_")
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    fn endpoint(&self, object: StripeObject, id: Option<&str>) -> Result<Url> {
        let mut path = format!("v1/{}", object.path());
        if let Some(id) = id {
            path.push('/');
            path.push_str(&urlencoding::encode(id));
        }
        self.api_base
            .join(&path)
            .map_err(|e| StripeError::Config(format!("invalid endpoint '{}': {}", path, e)))
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error)
                .unwrap_or_else(|_| ApiError {
                    message: Some(body),
                    ..Default::default()
                });
            tracing::debug!(status = status.as_u16(), ?error, "Stripe request failed");
            return Err(StripeError::Api {
                status: status.as_u16(),
                error,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn post_form<T: DeserializeOwned>(&self, url: Url, params: &FormParams) -> Result<T> {
        let body = params.encode()?;
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        self.execute(request).await
    }
}

impl StripeApi for StripeClient {
    async fn create<T: DeserializeOwned>(
        &self,
        object: StripeObject,
        params: &FormParams,
    ) -> Result<T> {
        let url = self.endpoint(object, None)?;
        tracing::debug!(%object, params = params.len(), "POST {}", url);
        self.post_form(url, params).await
    }

    async fn retrieve<T: DeserializeOwned>(
        &self,
        object: StripeObject,
        id: &str,
        expand: &[&str],
    ) -> Result<T> {
        let mut url = self.endpoint(object, Some(id))?;
        if !expand.is_empty() {
            let mut query = url.query_pairs_mut();
            for field in expand {
                query.append_pair("expand[]", field);
            }
        }
        tracing::debug!(%object, id, "GET {}", url);
        self.execute(self.http.get(url)).await
    }

    async fn update<T: DeserializeOwned>(
        &self,
        object: StripeObject,
        id: &str,
        params: &FormParams,
    ) -> Result<T> {
        let url = self.endpoint(object, Some(id))?;
        tracing::debug!(%object, id, params = params.len(), "POST {}", url);
        self.post_form(url, params).await
    }

    async fn delete(&self, object: StripeObject, id: &str) -> Result<Deleted> {
        let url = self.endpoint(object, Some(id))?;
        tracing::debug!(%object, id, "DELETE {}", url);
        self.execute(self.http.delete(url)).await
    }
}
