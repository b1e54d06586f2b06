//! Cache types for Product API responses.

use std::sync::Arc;

use oropallos_core::{Product, ProductId};

/// Cache key for Product API reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Favorites,
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
}
