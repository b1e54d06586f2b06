//! Product API client for the admin's mutations.
//!
//! The admin never caches: every read goes to the Product API, and the only
//! local copy of the catalog is the [`MutationGateway`](crate::gateway)
//! snapshot. Mutations carry the signed-in admin's bearer token.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use oropallos_core::{
    ErrorResponse, FavoriteUpdate, Product, ProductDraft, ProductId, ProductResponse,
    ProductsResponse,
};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

/// Errors that can occur when calling the Product API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The access token was missing, invalid or expired.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("Product API returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// A provider-issued access token, sent as `Authorization: Bearer`.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Parameters for one signed upload, minted by the Product API.
///
/// A signature covers a single timestamp; request a new one per upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSignature {
    pub signature: String,
    pub timestamp: i64,
    pub api_key: String,
    pub upload_preset: String,
    pub folder: String,
}

/// The Product API operations the admin depends on.
#[async_trait]
pub trait ProductApi: Send + Sync + 'static {
    /// Fetch every product.
    async fn list_products(&self) -> Result<Vec<Product>, ApiError>;

    /// Create a product, returning it with its assigned id.
    async fn create_product(
        &self,
        token: &AccessToken,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError>;

    /// Replace a product's editable fields.
    async fn update_product(
        &self,
        token: &AccessToken,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), ApiError>;

    /// Set a product's favorite flag.
    async fn update_favorite(
        &self,
        token: &AccessToken,
        id: &ProductId,
        favorite: bool,
    ) -> Result<(), ApiError>;

    /// Delete a product.
    async fn delete_product(&self, token: &AccessToken, id: &ProductId) -> Result<(), ApiError>;

    /// Mint a signature for a single image upload.
    async fn upload_signature(&self, token: &AccessToken) -> Result<UploadSignature, ApiError>;
}

/// reqwest-backed [`ProductApi`].
///
/// Cheap to clone; clones share the HTTP connection pool.
#[derive(Clone)]
pub struct ProductApiClient {
    inner: Arc<ProductApiClientInner>,
}

struct ProductApiClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl ProductApiClient {
    #[must_use]
    pub fn new(base_url: &Url) -> Self {
        Self {
            inner: Arc::new(ProductApiClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.as_str().trim_end_matches('/').to_string(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    fn id_path(prefix: &str, id: &ProductId) -> String {
        format!("{prefix}/{}", urlencoding::encode(id.as_str()))
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: reqwest::RequestBuilder, path: &str) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorResponse>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| body.chars().take(200).collect());

        tracing::warn!(
            status = %status,
            path,
            message = %message,
            "Product API returned non-success status"
        );

        Err(match status {
            reqwest::StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            reqwest::StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Status {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        let body = self.send(request, path).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Product API response"
            );
            ApiError::Parse(e)
        })
    }

    fn authorized(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &AccessToken,
    ) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, self.url(path))
            .bearer_auth(token.expose())
    }

    /// Check that the Product API answers.
    #[instrument(skip(self))]
    pub async fn is_reachable(&self) -> bool {
        match self
            .inner
            .client
            .get(self.url("/api/products/get"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "Product API unreachable");
                false
            }
        }
    }
}

#[async_trait]
impl ProductApi for ProductApiClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let path = "/api/products/get";
        let response: ProductsResponse = self
            .send_json(self.inner.client.get(self.url(path)), path)
            .await?;
        Ok(response.products)
    }

    #[instrument(skip_all, fields(name = %draft.name))]
    async fn create_product(
        &self,
        token: &AccessToken,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        let path = "/api/products/create";
        let request = self
            .authorized(reqwest::Method::POST, path, token)
            .json(draft);
        let response: ProductResponse = self.send_json(request, path).await?;
        response.product.ok_or_else(|| ApiError::Status {
            status: 201,
            message: "Product API did not return the created product".to_string(),
        })
    }

    #[instrument(skip_all, fields(product_id = %id))]
    async fn update_product(
        &self,
        token: &AccessToken,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<(), ApiError> {
        let path = Self::id_path("/api/products/update", id);
        let request = self
            .authorized(reqwest::Method::PUT, &path, token)
            .json(draft);
        self.send(request, &path).await?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(product_id = %id))]
    async fn update_favorite(
        &self,
        token: &AccessToken,
        id: &ProductId,
        favorite: bool,
    ) -> Result<(), ApiError> {
        let path = Self::id_path("/api/products/update/favorite", id);
        let request = self
            .authorized(reqwest::Method::PUT, &path, token)
            .json(&FavoriteUpdate { favorite });
        self.send(request, &path).await?;
        Ok(())
    }

    #[instrument(skip(self, token), fields(product_id = %id))]
    async fn delete_product(&self, token: &AccessToken, id: &ProductId) -> Result<(), ApiError> {
        let path = Self::id_path("/api/products/remove", id);
        let request = self.authorized(reqwest::Method::DELETE, &path, token);
        self.send(request, &path).await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn upload_signature(&self, token: &AccessToken) -> Result<UploadSignature, ApiError> {
        let path = "/api/cloudinary-signature";
        let request = self.authorized(reqwest::Method::POST, path, token);
        self.send_json(request, path).await
    }
}
