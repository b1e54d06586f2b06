//! Field state for the admin add/edit product form.
//!
//! The category, subcategory and type selects cascade: choosing a value
//! clears every field below it, and the option lists for a level come from
//! the value selected above it.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::product::{DEFAULT_SIZE, Product, ProductDraft, ValidationError};
use crate::taxonomy::{self, Category, ProductType, Subcategory};
use crate::types::{Price, PriceError};

/// Raw form input. Numeric fields stay text until [`ProductForm::to_draft`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
    pub subcategory: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub image_url: String,
    pub abv: String,
    pub size: String,
    #[serde(deserialize_with = "checkbox")]
    pub favorite: bool,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: String::new(),
            category: String::new(),
            subcategory: String::new(),
            kind: String::new(),
            image_url: String::new(),
            abv: String::new(),
            size: DEFAULT_SIZE.to_string(),
            favorite: false,
        }
    }
}

/// HTML checkboxes submit `on` when checked and nothing otherwise.
fn checkbox<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(matches!(raw.as_deref(), Some("on" | "true" | "1")))
}

impl ProductForm {
    /// Empty add form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit form seeded from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.amount().to_string(),
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
            kind: product.kind.clone(),
            image_url: product.image_url.clone().unwrap_or_default(),
            abv: product.abv.map(|abv| abv.to_string()).unwrap_or_default(),
            size: product.size.clone(),
            favorite: product.favorite,
        }
    }

    /// Choose a category; clears subcategory and type.
    pub fn select_category(&mut self, value: impl Into<String>) {
        self.category = value.into();
        self.subcategory.clear();
        self.kind.clear();
    }

    /// Choose a subcategory; clears type.
    pub fn select_subcategory(&mut self, value: impl Into<String>) {
        self.subcategory = value.into();
        self.kind.clear();
    }

    pub fn select_type(&mut self, value: impl Into<String>) {
        self.kind = value.into();
    }

    #[must_use]
    pub fn category_options(&self) -> &'static [Category] {
        taxonomy::categories()
    }

    /// Subcategories of the selected category; empty when none is selected.
    #[must_use]
    pub fn subcategory_options(&self) -> &'static [Subcategory] {
        taxonomy::category(&self.category).map_or(&[], |c| c.subcategories)
    }

    /// Types of the selected subcategory; empty when none is selected.
    #[must_use]
    pub fn type_options(&self) -> &'static [ProductType] {
        taxonomy::category(&self.category)
            .and_then(|c| c.subcategory(&self.subcategory))
            .map_or(&[], |s| s.types)
    }

    /// Parse the text fields into a draft. Required-field checks are left to
    /// [`ProductDraft::validate_for_create`] and
    /// [`ProductDraft::validate_for_update`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidField`] if price or ABV is not a
    /// number.
    pub fn to_draft(&self) -> Result<ProductDraft, ValidationError> {
        let price = if self.price.trim().is_empty() {
            Price::ZERO
        } else {
            Price::from_str(&self.price).map_err(|e| ValidationError::InvalidField {
                field: "price",
                reason: match e {
                    PriceError::Negative => "cannot be negative".to_string(),
                    PriceError::Invalid(_) => "must be a number".to_string(),
                },
            })?
        };

        let abv = match self.abv.trim() {
            "" => None,
            raw => Some(Decimal::from_str(raw.trim_end_matches('%')).map_err(|_| {
                ValidationError::InvalidField {
                    field: "abv",
                    reason: "must be a number".to_string(),
                }
            })?),
        };

        Ok(ProductDraft {
            name: self.name.trim().to_string(),
            description: non_empty(&self.description),
            price,
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            kind: self.kind.clone(),
            image_url: non_empty(&self.image_url),
            abv,
            size: self.size.trim().to_string(),
            favorite: self.favorite,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults() {
        let form = ProductForm::new();
        assert_eq!(form.size, "750mL");
        assert!(!form.favorite);
        assert!(form.subcategory_options().is_empty());
        assert!(form.type_options().is_empty());
        assert_eq!(form.category_options().len(), 6);
    }

    #[test]
    fn test_category_change_resets_dependents() {
        let mut form = ProductForm::new();
        form.select_category("Liquor");
        form.select_subcategory("Tequila");
        form.select_type("Reposado");
        assert_eq!(form.type_options().len(), 5);

        form.select_category("Red_Wine");
        assert_eq!(form.category, "Red_Wine");
        assert!(form.subcategory.is_empty());
        assert!(form.kind.is_empty());
        assert!(form.type_options().is_empty());
        assert_eq!(form.subcategory_options().len(), 3);
    }

    #[test]
    fn test_subcategory_change_resets_type() {
        let mut form = ProductForm::new();
        form.select_category("White_Wine");
        form.select_subcategory("Dry");
        form.select_type("Chardonnay");

        form.select_subcategory("Sweet");
        assert!(form.kind.is_empty());
        assert_eq!(form.category, "White_Wine");
        assert!(form.type_options().iter().any(|t| t.value == "Moscato"));
    }

    #[test]
    fn test_unknown_selection_yields_no_options() {
        let mut form = ProductForm::new();
        form.select_category("Beer");
        assert!(form.subcategory_options().is_empty());
        form.select_subcategory("Lager");
        assert!(form.type_options().is_empty());
    }

    #[test]
    fn test_to_draft_parses_numbers() {
        let form = ProductForm {
            name: "  Don Julio 1942 ".to_string(),
            price: "$189.99".to_string(),
            category: "Liquor".to_string(),
            subcategory: "Tequila".to_string(),
            kind: "Anejo".to_string(),
            abv: "40%".to_string(),
            ..ProductForm::new()
        };

        let draft = form.to_draft().unwrap();
        assert_eq!(draft.name, "Don Julio 1942");
        assert_eq!(draft.price, Price::from_cents(18_999));
        assert_eq!(draft.abv, Some(Decimal::new(40, 0)));
        assert_eq!(draft.size, "750mL");
        assert!(draft.description.is_none());
        assert!(draft.validate_for_create().is_ok());
    }

    #[test]
    fn test_to_draft_rejects_bad_numbers() {
        let form = ProductForm {
            price: "twenty".to_string(),
            ..ProductForm::new()
        };
        assert!(matches!(
            form.to_draft(),
            Err(ValidationError::InvalidField { field: "price", .. })
        ));

        let form = ProductForm {
            abv: "strong".to_string(),
            ..ProductForm::new()
        };
        assert!(matches!(
            form.to_draft(),
            Err(ValidationError::InvalidField { field: "abv", .. })
        ));
    }

    #[test]
    fn test_blank_price_is_missing_on_validate() {
        let draft = ProductForm::new().to_draft().unwrap();
        assert_eq!(draft.price, Price::ZERO);
        assert_eq!(
            draft.validate_for_create(),
            Err(ValidationError::MissingField("name"))
        );
    }

    #[test]
    fn test_edit_form_round_trips_product() {
        let product: Product = serde_json::from_value(json!({
            "id": "x1",
            "name": "Merlot",
            "price": 12.99,
            "category": "Red_Wine",
            "subcategory": "Dry",
            "type": "Merlot",
            "abv": 13.5,
            "favorite": true
        }))
        .unwrap();

        let form = ProductForm::from_product(&product);
        assert_eq!(form.price, "12.99");
        assert_eq!(form.abv, "13.5");
        assert!(form.size.is_empty());

        let draft = form.to_draft().unwrap();
        assert_eq!(draft, ProductDraft::from(&product));
    }

    #[test]
    fn test_checkbox_deserialization() {
        let checked: ProductForm =
            serde_json::from_value(json!({ "name": "A", "favorite": "on" })).unwrap();
        assert!(checked.favorite);
        assert_eq!(checked.size, "750mL");

        let unchecked: ProductForm = serde_json::from_value(json!({ "name": "A" })).unwrap();
        assert!(!unchecked.favorite);
    }
}
