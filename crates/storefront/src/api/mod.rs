//! Read-only Product API client.
//!
//! # Architecture
//!
//! - The Product API is the source of truth - no local persistence
//! - In-memory caching via `moka` for list and detail reads
//! - No retries; a failed read surfaces as [`ApiError`]

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use oropallos_core::{ErrorResponse, Product, ProductId, ProductResponse, ProductsResponse};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use cache::{CacheKey, CacheValue};

/// Errors that can occur when calling the Product API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API rejected our credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("Product API returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Client for the public read endpoints of the Product API.
///
/// Cheap to clone; clones share the HTTP connection pool and cache.
#[derive(Clone)]
pub struct ProductApiClient {
    inner: Arc<ProductApiClientInner>,
}

struct ProductApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl ProductApiClient {
    /// Create a new client with the given cache TTL.
    #[must_use]
    pub fn new(base_url: &Url, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(cache_ttl)
            .build();

        Self {
            inner: Arc::new(ProductApiClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Execute a GET request and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| body.chars().take(200).collect());

            tracing::error!(
                status = %status,
                path,
                message = %message,
                "Product API returned non-success status"
            );

            return Err(match status {
                reqwest::StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
                reqwest::StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => ApiError::Status {
                    status: status.as_u16(),
                    message,
                },
            });
        }

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

    async fn cached_list(&self, key: CacheKey, path: &str) -> Result<Arc<Vec<Product>>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!(?key, "Cache hit for product list");
            return Ok(products);
        }

        let response: ProductsResponse = self.get_json(path).await?;
        let products = Arc::new(response.products);

        self.inner
            .cache
            .insert(key, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get every product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        self.cached_list(CacheKey::Products, "/api/products/get").await
    }

    /// Get the owner's favorite products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_favorites(&self) -> Result<Arc<Vec<Product>>, ApiError> {
        self.cached_list(CacheKey::Favorites, "/api/products/get/favorites")
            .await
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!("/api/products/get/{}", urlencoding::encode(id.as_str()));
        let response: ProductResponse = self.get_json(&path).await?;
        let product = response
            .product
            .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Check that the Product API answers, bypassing the cache.
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> ProductApiClient {
        ProductApiClient::new(&Url::parse(&server.uri()).unwrap(), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn test_list_products_is_cached() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/products/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [
                    { "id": "a", "name": "Merlot", "price": 12.99 },
                    { "id": "b", "name": "Gin", "price": 25 }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server);
        let first = api.list_products().await.unwrap();
        let second = api.list_products().await.unwrap();

        assert_eq!(first.len(), 2);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_get_product_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/products/get/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Product not found" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .get_product(&ProductId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "Product not found"));
    }

    #[tokio::test]
    async fn test_get_product_null_body_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/products/get/x"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "product": null })))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_product(&ProductId::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/products/get/favorites"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server).list_favorites().await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Status { status: 500, ref message } if message == "boom"
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/products/get"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server).list_products().await.unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }
}
