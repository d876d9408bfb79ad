//! HTTP implementation of the cart repository.
//!
//! Talks to the marketplace REST API with `reqwest`. Every endpoint
//! answers the standard `{success, data, message}` envelope; raw payloads
//! pass through the ingestion boundary in [`payloads`] before anything
//! else sees them.
//!
//! HTTP 401 maps to [`RepositoryError::Unauthorized`]; session recovery
//! belongs to the authentication collaborator, never to this client.

pub mod payloads;

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;
use url::Url;
use vietmarket_core::{ProductId, Quantity, UserId};

use crate::config::MarketApiConfig;
use crate::model::CartItem;
use crate::repository::{CartRepository, CartSummary, RepositoryError};

use payloads::{ApiEnvelope, CartItemPayload, CartSummaryPayload, UpdateQuantityBody};

/// Error constructing a [`MarketApiClient`].
#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Client for the marketplace cart API.
#[derive(Clone)]
pub struct MarketApiClient {
    inner: Arc<MarketApiClientInner>,
}

struct MarketApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: String,
}

impl MarketApiClient {
    /// Create a new cart API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(config: &MarketApiConfig) -> Result<Self, ApiClientError> {
        let base_url = Url::parse(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(MarketApiClientInner {
                client,
                base_url,
                api_token: config.api_token.expose_secret().to_string(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RepositoryError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| RepositoryError::Transport(e.to_string()))
    }

    /// Send a request and unwrap the `{success, data, message}` envelope.
    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RepositoryError> {
        let envelope = Self::read_raw::<T>(response).await?;
        envelope
            .data
            .ok_or_else(|| RepositoryError::Api("response envelope had no data".to_string()))
    }

    /// Send a request and check the envelope without requiring data.
    async fn read_ack<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<(), RepositoryError> {
        Self::read_raw::<T>(response).await.map(|_| ())
    }

    async fn read_raw<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiEnvelope<T>, RepositoryError> {
        match response.status().as_u16() {
            401 | 403 => return Err(RepositoryError::Unauthorized),
            404 => return Err(RepositoryError::NotFound(response.url().path().to_string())),
            _ => {}
        }

        let response = response.error_for_status()?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        if !envelope.success {
            return Err(RepositoryError::Api(
                envelope
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl CartRepository for MarketApiClient {
    #[instrument(skip(self))]
    async fn cart_items(&self, user: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let url = self.endpoint(&format!("users/{user}/cart"))?;
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(&self.inner.api_token)
            .send()
            .await?;

        let lines: Vec<CartItemPayload> = Self::read_envelope(response).await?;
        Ok(lines.into_iter().map(CartItemPayload::normalize).collect())
    }

    #[instrument(skip(self))]
    async fn update_item(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let url = self.endpoint(&format!("users/{user}/cart/{product}"))?;
        let response = self
            .inner
            .client
            .put(url)
            .bearer_auth(&self.inner.api_token)
            .json(&UpdateQuantityBody { quantity })
            .send()
            .await?;

        // The server may echo the canonical line back, or just acknowledge
        let envelope = Self::read_raw::<CartItemPayload>(response).await?;
        Ok(envelope.data.map(CartItemPayload::normalize))
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, user: UserId, product: ProductId) -> Result<(), RepositoryError> {
        let url = self.endpoint(&format!("users/{user}/cart/{product}"))?;
        let response = self
            .inner
            .client
            .delete(url)
            .bearer_auth(&self.inner.api_token)
            .send()
            .await?;

        Self::read_ack::<serde_json::Value>(response).await
    }

    #[instrument(skip(self))]
    async fn clear(&self, user: UserId) -> Result<(), RepositoryError> {
        let url = self.endpoint(&format!("users/{user}/cart"))?;
        let response = self
            .inner
            .client
            .delete(url)
            .bearer_auth(&self.inner.api_token)
            .send()
            .await?;

        Self::read_ack::<serde_json::Value>(response).await
    }

    #[instrument(skip(self))]
    async fn summary(&self, user: UserId) -> Result<CartSummary, RepositoryError> {
        let url = self.endpoint(&format!("users/{user}/cart/summary"))?;
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(&self.inner.api_token)
            .send()
            .await?;

        let payload: CartSummaryPayload = Self::read_envelope(response).await?;
        Ok(payload.normalize())
    }
}
