//! Catalog view engine.
//!
//! A pure pipeline over a product snapshot: [`filter`] keeps matching
//! products, [`sort`] orders them stably, and [`page`] slices one page.
//! [`view`] holds the browsing state that drives the pipeline.

pub mod filter;
pub mod page;
pub mod related;
pub mod sort;
pub mod view;

pub use filter::CatalogFilter;
pub use page::{ADMIN_PAGE_SIZE, Page, RELATED_PAGE_SIZE, STOREFRONT_PAGE_SIZE, paginate};
pub use related::{related, related_page};
pub use sort::{SortKey, UnknownSortKey, sort_products};
pub use view::CatalogView;
