//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use oropallos_core::{CatalogFilter, SortKey, taxonomy};
use tracing::instrument;

use super::products::{ProductCard, catalog_href};
use crate::state::AppState;

/// Shortcut tile linking to one category of the catalog.
#[derive(Debug, Clone)]
pub struct CategoryTile {
    pub label: &'static str,
    pub href: String,
}

fn category_tiles() -> Vec<CategoryTile> {
    taxonomy::categories()
        .iter()
        .map(|c| {
            let mut filter = CatalogFilter::new();
            filter.toggle_category(c.value);
            CategoryTile {
                label: c.name,
                href: catalog_href(&filter, SortKey::default(), 1),
            }
        })
        .collect()
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// The owner's picks.
    pub favorites: Vec<ProductCard>,
    pub categories: Vec<CategoryTile>,
}

/// Display the home page with the favorites gallery.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let favorites = match state.api().list_favorites().await {
        Ok(products) => oropallos_core::favorites(&products)
            .into_iter()
            .map(ProductCard::from_product)
            .collect(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch favorites");
            Vec::new()
        }
    };

    HomeTemplate {
        favorites,
        categories: category_tiles(),
    }
}
