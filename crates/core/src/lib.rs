//! Oropallo's Core - Shared catalog library.
//!
//! This crate holds everything the storefront and the admin back office agree
//! on:
//! - the product data model exchanged with the Product API
//! - the static category taxonomy
//! - the catalog view engine (filter, sort, pagination)
//! - the cascading admin product form
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. Both binaries render the same derived catalog pages
//! from it.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs and prices
//! - [`taxonomy`] - Category → subcategory → type tree
//! - [`product`] - Product records, drafts and validation
//! - [`catalog`] - Filter, sort, paginate and related products
//! - [`form`] - Admin form state with cascading selects

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod form;
pub mod product;
pub mod taxonomy;
pub mod types;

pub use catalog::{CatalogFilter, CatalogView, Page, SortKey};
pub use form::ProductForm;
pub use product::{
    DEFAULT_SIZE, ErrorResponse, FavoriteUpdate, Product, ProductDraft, ProductResponse,
    ProductsResponse, ValidationError, favorites,
};
pub use taxonomy::{TaxonomyError, TaxonomyPath};
pub use types::*;
