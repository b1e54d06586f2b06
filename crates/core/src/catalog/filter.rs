//! Toggle filters and free-text search over the product list.

use std::collections::BTreeSet;

use super::sort::fold;
use crate::product::Product;

/// Active category/subcategory/type toggles plus a search query.
///
/// Each set is independent: an empty set lets every value through, a
/// non-empty set requires membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    categories: BTreeSet<String>,
    subcategories: BTreeSet<String>,
    types: BTreeSet<String>,
    query: String,
}

/// Flip membership of `value` in `set`.
fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

impl CatalogFilter {
    /// An empty filter; matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from comma-separated URL parameters.
    #[must_use]
    pub fn from_params(
        categories: Option<&str>,
        subcategories: Option<&str>,
        types: Option<&str>,
        query: Option<&str>,
    ) -> Self {
        Self {
            categories: split_list(categories),
            subcategories: split_list(subcategories),
            types: split_list(types),
            query: query.unwrap_or_default().to_string(),
        }
    }

    pub fn toggle_category(&mut self, value: &str) {
        toggle(&mut self.categories, value);
    }

    pub fn toggle_subcategory(&mut self, value: &str) {
        toggle(&mut self.subcategories, value);
    }

    pub fn toggle_type(&mut self, value: &str) {
        toggle(&mut self.types, value);
    }

    /// Keep only the type toggles `keep` accepts.
    pub fn retain_types(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.types.retain(|t| keep(t));
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Drop every toggle and the search text.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub const fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    #[must_use]
    pub const fn subcategories(&self) -> &BTreeSet<String> {
        &self.subcategories
    }

    #[must_use]
    pub const fn types(&self) -> &BTreeSet<String> {
        &self.types
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn has_category(&self, value: &str) -> bool {
        self.categories.contains(value)
    }

    #[must_use]
    pub fn has_subcategory(&self, value: &str) -> bool {
        self.subcategories.contains(value)
    }

    #[must_use]
    pub fn has_type(&self, value: &str) -> bool {
        self.types.contains(value)
    }

    /// Whether any toggle or search text is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.categories.is_empty()
            || !self.subcategories.is_empty()
            || !self.types.is_empty()
            || !self.query.trim().is_empty()
    }

    /// Test a single product.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if !self.categories.is_empty() && !self.categories.contains(&product.category) {
            return false;
        }
        if !self.subcategories.is_empty() && !self.subcategories.contains(&product.subcategory) {
            return false;
        }
        if !self.types.is_empty() && !self.types.contains(&product.kind) {
            return false;
        }

        let needle = fold(self.query.trim());
        if needle.is_empty() {
            return true;
        }

        [
            product.name.as_str(),
            product.category.as_str(),
            product.subcategory.as_str(),
            product.kind.as_str(),
        ]
        .iter()
        .filter(|field| !field.is_empty())
        .any(|field| fold(field).contains(&needle))
    }

    /// Keep matching products, preserving input order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }

    /// Encode as URL query pairs; empty parts are omitted.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(",");

        let mut pairs = Vec::new();
        if !self.categories.is_empty() {
            pairs.push(("categories", join(&self.categories)));
        }
        if !self.subcategories.is_empty() {
            pairs.push(("subcategories", join(&self.subcategories)));
        }
        if !self.types.is_empty() {
            pairs.push(("types", join(&self.types)));
        }
        if !self.query.trim().is_empty() {
            pairs.push(("q", self.query.trim().to_string()));
        }
        pairs
    }

    /// Encode as a query string without the leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.to_query_pairs()
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(name: &str, category: &str, subcategory: &str, kind: &str) -> Product {
        serde_json::from_value(json!({
            "id": name,
            "name": name,
            "price": 10,
            "category": category,
            "subcategory": subcategory,
            "type": kind,
        }))
        .unwrap()
    }

    fn sample() -> Vec<Product> {
        vec![
            product("Tito's Vodka", "Liquor", "Vodka", "Plain"),
            product("Merlot", "Red_Wine", "Dry", "Merlot"),
            product("Moscato", "White_Wine", "Sweet", "Moscato"),
            product("Hendrick's", "Liquor", "Gin", ""),
            product("Chardonnay", "White_Wine", "Dry", "Chardonnay"),
        ]
    }

    fn names<'a>(products: &[&'a Product]) -> Vec<&'a str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_search_vodka() {
        let list = vec![
            product("Tito's Vodka", "", "", ""),
            product("Merlot", "", "", ""),
        ];
        let mut filter = CatalogFilter::new();
        filter.set_query("vodka");
        assert_eq!(names(&filter.apply(&list)), ["Tito's Vodka"]);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let list = sample();
        let mut filter = CatalogFilter::new();

        filter.set_query("  WHITE_wine ");
        assert_eq!(names(&filter.apply(&list)), ["Moscato", "Chardonnay"]);

        filter.set_query("gin");
        assert_eq!(names(&filter.apply(&list)), ["Hendrick's"]);

        filter.set_query("merlot");
        assert_eq!(names(&filter.apply(&list)), ["Merlot"]);
    }

    #[test]
    fn test_search_ignores_accents() {
        let list = vec![
            product("Don Julio Añejo", "Liquor", "Tequila", "Anejo"),
            product("Rosé de Provence", "Rose_Wine", "Dry", ""),
        ];
        let mut filter = CatalogFilter::new();

        filter.set_query("julio anejo");
        assert_eq!(names(&filter.apply(&list)), ["Don Julio Añejo"]);

        filter.set_query("ROSE DE");
        assert_eq!(names(&filter.apply(&list)), ["Rosé de Provence"]);

        filter.set_query("añejo");
        assert_eq!(names(&filter.apply(&list)), ["Don Julio Añejo"]);
    }

    #[test]
    fn test_retain_types() {
        let mut filter = CatalogFilter::from_params(None, None, Some("Blanco,Plain"), None);
        filter.retain_types(|t| t == "Plain");
        assert!(filter.has_type("Plain"));
        assert!(!filter.has_type("Blanco"));
    }

    #[test]
    fn test_empty_fields_never_match() {
        let list = vec![product("Plain Jane", "", "", "")];
        let mut filter = CatalogFilter::new();
        filter.set_query("");
        assert_eq!(filter.apply(&list).len(), 1);

        filter.set_query("liquor");
        assert!(filter.apply(&list).is_empty());
    }

    #[test]
    fn test_category_and_subcategory_sets_combine() {
        let list = sample();
        let mut filter = CatalogFilter::new();

        filter.toggle_category("White_Wine");
        filter.toggle_category("Red_Wine");
        assert_eq!(filter.apply(&list).len(), 3);

        filter.toggle_subcategory("Dry");
        assert_eq!(names(&filter.apply(&list)), ["Merlot", "Chardonnay"]);

        filter.toggle_type("Chardonnay");
        assert_eq!(names(&filter.apply(&list)), ["Chardonnay"]);
    }

    #[test]
    fn test_toggle_twice_restores_unfiltered() {
        let list = sample();
        let mut filter = CatalogFilter::new();

        filter.toggle_category("Liquor");
        assert!(filter.is_active());
        assert_eq!(filter.apply(&list).len(), 2);

        filter.toggle_category("Liquor");
        assert_eq!(filter, CatalogFilter::new());
        assert_eq!(filter.apply(&list).len(), list.len());
    }

    #[test]
    fn test_output_partitions_input() {
        let list = sample();
        let mut filter = CatalogFilter::new();
        filter.toggle_category("White_Wine");
        filter.set_query("o");

        let kept = filter.apply(&list);
        for p in &list {
            let included = kept.iter().any(|k| std::ptr::eq(*k, p));
            assert_eq!(included, filter.matches(p), "{}", p.name);
        }
        assert!(kept.iter().all(|p| p.category == "White_Wine"));
    }

    #[test]
    fn test_query_pairs_roundtrip_through_params() {
        let mut filter = CatalogFilter::new();
        filter.toggle_category("Liquor");
        filter.toggle_category("Red_Wine");
        filter.toggle_subcategory("Dry");
        filter.set_query("tito");

        let pairs = filter.to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("categories", "Liquor,Red_Wine".to_string()),
                ("subcategories", "Dry".to_string()),
                ("q", "tito".to_string()),
            ]
        );

        let parsed = CatalogFilter::from_params(Some("Liquor,Red_Wine"), Some("Dry"), None, Some("tito"));
        assert_eq!(parsed, filter);

        filter.set_query("tito's");
        assert_eq!(
            filter.to_query_string(),
            "categories=Liquor%2CRed_Wine&subcategories=Dry&q=tito%27s"
        );
    }

    #[test]
    fn test_from_params_ignores_blank_entries() {
        let filter = CatalogFilter::from_params(Some(",Liquor,, "), Some(""), None, None);
        assert_eq!(filter.categories().len(), 1);
        assert!(filter.subcategories().is_empty());
        assert_eq!(filter.query(), "");
    }
}
