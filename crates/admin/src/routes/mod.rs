//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (Product API reachable)
//! GET  /                          - Redirect to the spreadsheet
//!
//! # Auth (pasted access token)
//! GET  /auth/login                - Login page
//! POST /auth/login                - Store token in session
//! POST /auth/logout               - Logout
//!
//! # Products
//! GET  /products                  - Spreadsheet (categories, q, sort, page, refresh)
//! POST /products                  - Create product
//! GET  /products/new              - Add form
//! GET  /products/form-options     - Cascading select fragment (HTMX)
//! GET  /products/{id}/edit        - Edit form
//! POST /products/{id}             - Update product
//! POST /products/{id}/delete      - Delete product
//! POST /products/{id}/favorite    - Toggle favorite
//!
//! # Media
//! POST /media/upload              - Upload image, returns image field fragment
//! ```

pub mod auth;
pub mod health;
pub mod media;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Largest accepted image upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the product routes router.
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/form-options", get(products::form_options))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
        .route("/{id}/favorite", post(products::favorite))
}

/// Create all routes for the admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth::router())
        .nest("/products", product_routes())
        .route(
            "/media/upload",
            post(media::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}
