//! Product catalog and detail handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use oropallos_core::catalog::{self, CatalogFilter, CatalogView, Page, SortKey};
use oropallos_core::{Product, ProductId, taxonomy};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::state::AppState;

/// Product card data for grid templates.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub href: String,
    pub name: String,
    pub price: String,
    /// Empty when the product has no image.
    pub image_url: String,
    pub category: String,
    pub subcategory: String,
}

impl ProductCard {
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            href: product_href(product),
            name: product.name.clone(),
            price: product.price.to_string(),
            image_url: product.image().unwrap_or_default().to_string(),
            category: taxonomy::category_label(&product.category).to_string(),
            subcategory: taxonomy::subcategory_label(&product.category, &product.subcategory)
                .to_string(),
        }
    }
}

fn product_href(product: &Product) -> String {
    product.id.as_ref().map_or_else(
        || "/products".to_string(),
        |id| format!("/products/{}", urlencoding::encode(id.as_str())),
    )
}

/// One toggle in the filter sidebar.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub label: String,
    pub active: bool,
    /// Catalog URL with this option toggled.
    pub href: String,
}

/// One entry of the sort dropdown.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Hidden input carried by the search form.
#[derive(Debug, Clone)]
pub struct HiddenField {
    pub name: &'static str,
    pub value: String,
}

/// Numbered link in a pager.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: usize,
    pub href: String,
    pub current: bool,
}

/// Pager controls; hrefs are empty when the control is disabled.
#[derive(Debug, Clone, Default)]
pub struct Pager {
    pub previous_href: String,
    pub next_href: String,
    pub links: Vec<PageLink>,
}

impl Pager {
    fn new<T>(page: &Page<T>, href: impl Fn(usize) -> String) -> Self {
        Self {
            previous_href: if page.has_previous() {
                href(page.previous_number())
            } else {
                String::new()
            },
            next_href: if page.has_next() {
                href(page.next_number())
            } else {
                String::new()
            },
            links: page
                .numbers()
                .map(|number| PageLink {
                    number,
                    href: href(number),
                    current: number == page.number,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn is_needed(&self) -> bool {
        self.links.len() > 1
    }
}

/// Catalog query parameters.
///
/// Everything is optional and parsed leniently: unknown sort keys fall back
/// to the default and bad page numbers to page 1.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub categories: Option<String>,
    pub subcategories: Option<String>,
    pub types: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

impl CatalogQuery {
    fn filter(&self) -> CatalogFilter {
        CatalogFilter::from_params(
            self.categories.as_deref(),
            self.subcategories.as_deref(),
            self.types.as_deref(),
            self.q.as_deref(),
        )
    }

    fn sort(&self) -> SortKey {
        self.sort
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    fn page(&self) -> usize {
        parse_page(self.page.as_deref())
    }
}

fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(|p| p.trim().parse().ok()).unwrap_or(1)
}

/// Catalog URL for a filter, sort and page. Defaults are left out.
#[must_use]
pub fn catalog_href(filter: &CatalogFilter, sort: SortKey, page: usize) -> String {
    let mut params = filter.to_query_string();
    let mut push = |pair: String| {
        if !params.is_empty() {
            params.push('&');
        }
        params.push_str(&pair);
    };
    if sort != SortKey::default() {
        push(format!("sort={sort}"));
    }
    if page > 1 {
        push(format!("page={page}"));
    }

    if params.is_empty() {
        "/products".to_string()
    } else {
        format!("/products?{params}")
    }
}

fn toggled_href(
    filter: &CatalogFilter,
    sort: SortKey,
    toggle: impl FnOnce(&mut CatalogFilter),
) -> String {
    let mut next = filter.clone();
    toggle(&mut next);
    catalog_href(&next, sort, 1)
}

fn category_options(filter: &CatalogFilter, sort: SortKey) -> Vec<FilterOption> {
    taxonomy::categories()
        .iter()
        .map(|c| FilterOption {
            label: c.name.to_string(),
            active: filter.has_category(c.value),
            href: toggled_href(filter, sort, |f| {
                f.toggle_category(c.value);
                drop_orphan_types(f);
            }),
        })
        .collect()
}

/// Subcategories of the selected categories, or of every category.
fn subcategory_options(filter: &CatalogFilter, sort: SortKey) -> Vec<FilterOption> {
    let candidates: Vec<&taxonomy::Subcategory> = if filter.categories().is_empty() {
        taxonomy::subcategory_values()
    } else {
        let mut seen: Vec<&taxonomy::Subcategory> = Vec::new();
        for sub in taxonomy::categories()
            .iter()
            .filter(|c| filter.has_category(c.value))
            .flat_map(|c| c.subcategories.iter())
        {
            if !seen.iter().any(|s| s.value == sub.value) {
                seen.push(sub);
            }
        }
        seen
    };

    candidates
        .into_iter()
        .map(|s| FilterOption {
            label: s.name.to_string(),
            active: filter.has_subcategory(s.value),
            href: toggled_href(filter, sort, |f| {
                f.toggle_subcategory(s.value);
                drop_orphan_types(f);
            }),
        })
        .collect()
}

/// Types offered under the selected subcategories, deduplicated by value.
fn offered_types(filter: &CatalogFilter) -> Vec<&'static taxonomy::ProductType> {
    let mut seen: Vec<&taxonomy::ProductType> = Vec::new();
    for product_type in taxonomy::categories()
        .iter()
        .filter(|c| filter.categories().is_empty() || filter.has_category(c.value))
        .flat_map(|c| c.subcategories.iter())
        .filter(|s| filter.has_subcategory(s.value))
        .flat_map(|s| s.types.iter())
    {
        if !seen.iter().any(|t| t.value == product_type.value) {
            seen.push(product_type);
        }
    }
    seen
}

/// Clear type toggles that no selected subcategory offers any more.
fn drop_orphan_types(filter: &mut CatalogFilter) {
    let offered = offered_types(filter);
    filter.retain_types(|t| offered.iter().any(|o| o.value == t));
}

/// Types of the selected subcategories; none until a subcategory is chosen.
///
/// An active type outside that list (from a hand-written URL) is still
/// shown so it can be switched off.
fn type_options(filter: &CatalogFilter, sort: SortKey) -> Vec<FilterOption> {
    let offered = offered_types(filter);
    let mut options: Vec<FilterOption> = offered
        .iter()
        .map(|t| FilterOption {
            label: t.name.to_string(),
            active: filter.has_type(t.value),
            href: toggled_href(filter, sort, |f| f.toggle_type(t.value)),
        })
        .collect();

    for value in filter.types() {
        if offered.iter().any(|t| t.value == value.as_str()) {
            continue;
        }
        options.push(FilterOption {
            label: value.replace('_', " "),
            active: true,
            href: toggled_href(filter, sort, |f| f.toggle_type(value)),
        });
    }
    options
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductCard>,
    pub categories: Vec<FilterOption>,
    pub subcategories: Vec<FilterOption>,
    pub types: Vec<FilterOption>,
    pub sort_options: Vec<SortOption>,
    pub hidden_fields: Vec<HiddenField>,
    pub query: String,
    pub filter_active: bool,
    pub summary: String,
    pub pager: Pager,
}

/// Display the filtered, sorted, paginated catalog.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> impl IntoResponse {
    // Degrade to an empty catalog rather than an error page
    let products = match state.api().list_products().await {
        Ok(products) => products.as_ref().clone(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch products");
            Vec::new()
        }
    };

    let filter = query.filter();
    let sort = query.sort();
    let view = CatalogView::with_state(
        products,
        state.config().page_size,
        filter.clone(),
        sort,
        query.page(),
    );
    let page = view.page();

    let mut hidden_fields: Vec<HiddenField> = filter
        .to_query_pairs()
        .into_iter()
        .filter(|(name, _)| *name != "q")
        .map(|(name, value)| HiddenField { name, value })
        .collect();
    if sort != SortKey::default() {
        hidden_fields.push(HiddenField {
            name: "sort",
            value: sort.to_string(),
        });
    }

    ProductsIndexTemplate {
        categories: category_options(&filter, sort),
        subcategories: subcategory_options(&filter, sort),
        types: type_options(&filter, sort),
        sort_options: SortKey::ALL
            .into_iter()
            .map(|key| SortOption {
                value: key.as_str(),
                label: key.label(),
                selected: key == sort,
            })
            .collect(),
        hidden_fields,
        query: filter.query().to_string(),
        filter_active: filter.is_active(),
        summary: page.summary(),
        pager: Pager::new(&page, |n| catalog_href(&filter, sort, n)),
        products: page.items.iter().map(|p| ProductCard::from_product(p)).collect(),
    }
}

/// Product detail data for templates.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub name: String,
    pub price: String,
    pub description: String,
    pub image_url: String,
    pub category: String,
    pub category_href: String,
    pub subcategory: String,
    pub product_type: String,
    pub abv: String,
    pub size: String,
}

impl ProductDetail {
    fn from_product(product: &Product) -> Self {
        let mut category_filter = CatalogFilter::new();
        category_filter.toggle_category(&product.category);

        Self {
            name: product.name.clone(),
            price: product.price.to_string(),
            description: product.description.clone().unwrap_or_default(),
            image_url: product.image().unwrap_or_default().to_string(),
            category: taxonomy::category_label(&product.category).to_string(),
            category_href: catalog_href(&category_filter, SortKey::default(), 1),
            subcategory: taxonomy::subcategory_label(&product.category, &product.subcategory)
                .to_string(),
            product_type: taxonomy::type_label(
                &product.category,
                &product.subcategory,
                &product.kind,
            )
            .to_string(),
            abv: product.abv.map(|abv| format!("{}%", abv.normalize())).unwrap_or_default(),
            size: product.size.clone(),
        }
    }
}

/// Related-products carousel parameters.
#[derive(Debug, Default, Deserialize)]
pub struct RelatedQuery {
    pub related_page: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetail,
    pub related: Vec<ProductCard>,
    pub related_pager: Pager,
}

/// Display product detail page.
///
/// # Errors
///
/// Returns a 404 if the product does not exist, or a 502 if the Product API
/// fails.
#[instrument(skip(state, query))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RelatedQuery>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let product = state.api().get_product(&id).await?;

    add_breadcrumb(
        "navigation",
        "Viewed product page",
        Some(&[("product_id", id.as_str())]),
    );

    let all = match state.api().list_products().await {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch related products");
            std::sync::Arc::default()
        }
    };

    let related = catalog::related_page(&product, &all, parse_page(query.related_page.as_deref()));
    let base = product_href(&product);

    Ok(ProductShowTemplate {
        related_pager: Pager::new(&related, |n| format!("{base}?related_page={n}")),
        related: related.items.iter().map(|p| ProductCard::from_product(p)).collect(),
        product: ProductDetail::from_product(&product),
    })
}
