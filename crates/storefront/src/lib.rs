//! Oropallo's Storefront library.
//!
//! This crate provides the public catalog as a library, allowing the router
//! to be tested without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use state::AppState;

/// Build the complete storefront application.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::StorefrontConfig;

    fn catalog_json(count: usize) -> serde_json::Value {
        let products: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "id": format!("p{i:02}"),
                    "name": format!("Bottle {i:02}"),
                    "price": 10 + i,
                    "category": if i % 2 == 0 { "Red_Wine" } else { "Liquor" },
                    "subcategory": if i % 2 == 0 { "Dry" } else { "Vodka" },
                    "type": "",
                    "favorite": i < 2,
                })
            })
            .collect();
        json!({ "products": products })
    }

    fn test_app(server: &MockServer) -> Router {
        let base = server.uri();
        let config = StorefrontConfig::from_lookup(|key| match key {
            "PRODUCT_API_URL" => Some(base.clone()),
            _ => None,
        })
        .unwrap();
        app(AppState::new(config))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn mount_catalog(server: &MockServer, count: usize) {
        Mock::given(method("GET"))
            .and(path("/api/products/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalog_json(count)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        let (status, body) = get(test_app(&server), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_readiness_reflects_product_api() {
        let server = MockServer::start().await;
        let (status, _) = get(test_app(&server), "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        mount_catalog(&server, 1).await;
        let (status, _) = get(test_app(&server), "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_catalog_first_page() {
        let server = MockServer::start().await;
        mount_catalog(&server, 20).await;

        let (status, body) = get(test_app(&server), "/products").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Showing 15 of 20"));
        assert!(body.contains("Bottle 14"));
        assert!(!body.contains("Bottle 15"));
    }

    #[tokio::test]
    async fn test_catalog_filters_and_clamps_page() {
        let server = MockServer::start().await;
        mount_catalog(&server, 20).await;

        let (status, body) = get(
            test_app(&server),
            "/products?categories=Liquor&sort=price-desc&page=9",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Showing 10 of 10"));
        assert!(body.contains("Bottle 19"));
        assert!(!body.contains("Bottle 18"));
    }

    #[tokio::test]
    async fn test_catalog_no_matches_placeholder() {
        let server = MockServer::start().await;
        mount_catalog(&server, 4).await;

        let (status, body) = get(test_app(&server), "/products?q=absinthe").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No products match"));
    }

    #[tokio::test]
    async fn test_catalog_degrades_when_api_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/get"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (status, body) = get(test_app(&server), "/products").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Showing 0 of 0"));
    }

    #[tokio::test]
    async fn test_product_detail_with_related() {
        let server = MockServer::start().await;
        mount_catalog(&server, 10).await;
        Mock::given(method("GET"))
            .and(path("/api/products/get/p01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "product": {
                    "id": "p01",
                    "name": "Bottle 01",
                    "price": 11,
                    "category": "Liquor",
                    "subcategory": "Vodka",
                    "abv": 40
                }
            })))
            .mount(&server)
            .await;

        let (status, body) = get(test_app(&server), "/products/p01").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("$11.00"));
        assert!(body.contains("40%"));
        // Same subcategory, excluding the product itself, three per page
        assert!(body.contains("Bottle 03"));
        assert!(body.contains("Bottle 07"));
        assert!(!body.contains("Bottle 09"));
        assert!(!body.contains("Bottle 02"));
        assert!(body.contains("related_page=2"));
    }

    #[tokio::test]
    async fn test_missing_product_is_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/get/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (status, _) = get(test_app(&server), "/products/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_home_shows_favorites() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/get/favorites"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "products": [
                    { "id": "f1", "name": "Owner's Pick Cabernet", "favorite": true },
                    { "id": "f2", "name": "Unflagged Pinot", "favorite": false }
                ]
            })))
            .mount(&server)
            .await;

        let (status, body) = get(test_app(&server), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Owner&#x27;s Pick Cabernet") || body.contains("Owner&#39;s Pick Cabernet"));
        assert!(!body.contains("Unflagged Pinot"));
    }
}
