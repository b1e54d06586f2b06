//! Catalog view state: snapshot plus filter, sort and page cursor.

use crate::product::Product;
use crate::types::ProductId;

use super::filter::CatalogFilter;
use super::page::{Page, clamp_page};
use super::sort::{SortKey, sort_products};

/// Browsing state over a product snapshot.
///
/// The visible page is re-derived on every [`CatalogView::page`] call. The
/// page number is kept inside `[1, max(1, total_pages)]` after every change
/// to the snapshot or the filter.
#[derive(Debug, Clone)]
pub struct CatalogView {
    products: Vec<Product>,
    filter: CatalogFilter,
    sort: SortKey,
    page: usize,
    page_size: usize,
}

impl CatalogView {
    #[must_use]
    pub fn new(products: Vec<Product>, page_size: usize) -> Self {
        Self {
            products,
            filter: CatalogFilter::new(),
            sort: SortKey::default(),
            page: 1,
            page_size,
        }
    }

    /// Restore a view from request parameters; the page is clamped.
    #[must_use]
    pub fn with_state(
        products: Vec<Product>,
        page_size: usize,
        filter: CatalogFilter,
        sort: SortKey,
        page: usize,
    ) -> Self {
        let mut view = Self {
            products,
            filter,
            sort,
            page,
            page_size,
        };
        view.reclamp();
        view
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    #[must_use]
    pub const fn sort_key(&self) -> SortKey {
        self.sort
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Filtered and sorted products, before pagination.
    #[must_use]
    pub fn derived(&self) -> Vec<&Product> {
        let mut visible = self.filter.apply(&self.products);
        sort_products(&mut visible, self.sort);
        visible
    }

    /// The current page of the derived list.
    #[must_use]
    pub fn page(&self) -> Page<&Product> {
        Page::new(self.derived(), self.page, self.page_size)
    }

    pub fn replace_products(&mut self, products: Vec<Product>) {
        self.products = products;
        self.reclamp();
    }

    /// Append a newly created product.
    pub fn push_product(&mut self, product: Product) {
        self.products.push(product);
        self.reclamp();
    }

    /// Remove a product by id, returning it if present.
    pub fn remove_product(&mut self, id: &ProductId) -> Option<Product> {
        let index = self
            .products
            .iter()
            .position(|p| p.id.as_ref() == Some(id))?;
        let removed = self.products.remove(index);
        self.reclamp();
        Some(removed)
    }

    pub fn toggle_category(&mut self, value: &str) {
        self.filter.toggle_category(value);
        self.page = 1;
    }

    pub fn toggle_subcategory(&mut self, value: &str) {
        self.filter.toggle_subcategory(value);
        self.page = 1;
    }

    pub fn toggle_type(&mut self, value: &str) {
        self.filter.toggle_type(value);
        self.page = 1;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.set_query(query);
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page;
        self.reclamp();
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.page.saturating_add(1));
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.page.saturating_sub(1));
    }

    fn reclamp(&mut self) {
        let len = self.products.iter().filter(|p| self.filter.matches(p)).count();
        self.page = clamp_page(self.page, len, self.page_size);
    }
}
