//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page with the owner's picks
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (Product API reachable)
//!
//! # Products
//! GET  /products               - Catalog (categories, subcategories, types, q, sort, page)
//! GET  /products/{id}          - Product detail with related products (related_page)
//! ```

pub mod health;
pub mod home;
pub mod products;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
}
