//! Product records and the editable draft sent to the Product API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::taxonomy::{self, TaxonomyError};
use crate::types::{Price, ProductId};

/// Default bottle size offered by the admin form.
pub const DEFAULT_SIZE: &str = "750mL";

/// A product listing as returned by the Product API.
///
/// The list endpoint omits several fields (`size`, `abv`, `createdAt`), so
/// everything beyond the name defaults when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Assigned by storage; `None` before creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    /// May be empty when the subcategory declares no types.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    /// Alcohol by volume, percent.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub abv: Option<Decimal>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// The product's image URL, treating an empty string as absent.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Products flagged as the owner's favorites, in input order.
#[must_use]
pub fn favorites(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| p.favorite).collect()
}

/// A client-side validation failure, caught before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
}

/// Editable product fields, sent as the body of create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Price,
    pub category: String,
    pub subcategory: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub abv: Option<Decimal>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub favorite: bool,
}

impl ProductDraft {
    /// Check the fields the add form requires.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid field.
    pub fn validate_for_create(&self) -> Result<(), ValidationError> {
        self.validate_common()?;
        if self.size.trim().is_empty() {
            return Err(ValidationError::MissingField("size"));
        }
        Ok(())
    }

    /// Check the fields the edit form requires.
    ///
    /// Size is not required here: the list endpoint never returns it, so an
    /// edit seeded from the list has nothing to send.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid field.
    pub fn validate_for_update(&self) -> Result<(), ValidationError> {
        self.validate_common()
    }

    /// Check that the draft's triple exists in the taxonomy.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Taxonomy`] for an unknown level.
    pub fn validate_taxonomy(&self) -> Result<(), ValidationError> {
        taxonomy::resolve(&self.category, &self.subcategory, &self.kind)?;
        Ok(())
    }

    fn validate_common(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.price.is_zero() {
            return Err(ValidationError::MissingField("price"));
        }
        if self.category.is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        if self.subcategory.is_empty() {
            return Err(ValidationError::MissingField("subcategory"));
        }
        if let Some(abv) = self.abv
            && (abv.is_sign_negative() || abv > Decimal::ONE_HUNDRED)
        {
            return Err(ValidationError::InvalidField {
                field: "abv",
                reason: "must be between 0 and 100".to_string(),
            });
        }
        self.validate_taxonomy()
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
            kind: product.kind.clone(),
            image_url: product.image_url.clone(),
            abv: product.abv,
            size: product.size.clone(),
            favorite: product.favorite,
        }
    }
}

/// Body of the favorite toggle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteUpdate {
    pub favorite: bool,
}

/// `{ "products": [...] }` envelope of the list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<Product>,
}

/// `{ "product": {...} }` envelope of the single-product endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    #[serde(default)]
    pub product: Option<Product>,
}

/// Error body returned by the Product API on failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, alias = "error")]
    pub message: Option<String>,
}
