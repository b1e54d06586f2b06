//! Product spreadsheet and mutation handlers.
//!
//! Every mutation redirects back to the spreadsheet with a flash
//! notification, except validation failures of the add/edit form, which
//! re-render the form with the admin's input intact.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use oropallos_core::catalog::{CatalogFilter, Page, SortKey};
use oropallos_core::{Product, ProductForm, ProductId, taxonomy};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::gateway::Notification;
use crate::middleware::{RequireAdminAuth, clear_current_admin, set_flash, take_flash};
use crate::state::AppState;

// =============================================================================
// View types
// =============================================================================

/// Rendered notification banner.
#[derive(Debug, Clone)]
pub struct NotificationView {
    pub kind: &'static str,
    pub message: String,
}

impl From<Notification> for NotificationView {
    fn from(notification: Notification) -> Self {
        Self {
            kind: notification.kind.as_str(),
            message: notification.message,
        }
    }
}

/// One spreadsheet row.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub price: String,
    pub category: String,
    pub subcategory: String,
    pub product_type: String,
    pub size: String,
    pub favorite: bool,
    /// Empty when the product has no image.
    pub image_url: String,
    /// Base path for this row's actions; empty for rows without an id.
    pub href: String,
}

impl ProductRow {
    fn from_product(product: &Product) -> Self {
        let id = product.id.as_ref().map(ProductId::to_string).unwrap_or_default();
        Self {
            href: if id.is_empty() {
                String::new()
            } else {
                format!("/products/{}", urlencoding::encode(&id))
            },
            id,
            name: product.name.clone(),
            price: product.price.to_string(),
            category: taxonomy::category_label(&product.category).to_string(),
            subcategory: taxonomy::subcategory_label(&product.category, &product.subcategory)
                .to_string(),
            product_type: taxonomy::type_label(
                &product.category,
                &product.subcategory,
                &product.kind,
            )
            .to_string(),
            size: product.size.clone(),
            favorite: product.favorite,
            image_url: product.image().unwrap_or_default().to_string(),
        }
    }
}

/// Category toggle above the spreadsheet.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub label: &'static str,
    pub active: bool,
    pub href: String,
}

/// One entry of the sort dropdown.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Numbered link in the pager.
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

/// One `<option>` of a taxonomy select.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// The cascading category, subcategory and type selects.
#[derive(Debug, Clone)]
pub struct FormOptions {
    pub category: String,
    pub subcategory: String,
    pub categories: Vec<SelectOption>,
    pub subcategories: Vec<SelectOption>,
    pub types: Vec<SelectOption>,
}

impl FormOptions {
    fn from_form(form: &ProductForm) -> Self {
        Self {
            category: form.category.clone(),
            subcategory: form.subcategory.clone(),
            categories: form
                .category_options()
                .iter()
                .map(|c| SelectOption {
                    value: c.value,
                    label: c.name,
                    selected: c.value == form.category,
                })
                .collect(),
            subcategories: form
                .subcategory_options()
                .iter()
                .map(|s| SelectOption {
                    value: s.value,
                    label: s.name,
                    selected: s.value == form.subcategory,
                })
                .collect(),
            types: form
                .type_options()
                .iter()
                .map(|t| SelectOption {
                    value: t.value,
                    label: t.name,
                    selected: t.value == form.kind,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Spreadsheet
// =============================================================================

/// Spreadsheet query parameters, parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct SpreadsheetQuery {
    pub categories: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    /// Any value forces a re-fetch from the Product API.
    pub refresh: Option<String>,
}

impl SpreadsheetQuery {
    fn filter(&self) -> CatalogFilter {
        CatalogFilter::from_params(self.categories.as_deref(), None, None, self.q.as_deref())
    }

    fn sort(&self) -> SortKey {
        self.sort
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

/// Spreadsheet URL for a filter, sort and page. Defaults are left out.
#[must_use]
pub fn spreadsheet_href(filter: &CatalogFilter, sort: SortKey, page: usize) -> String {
    let mut params = filter.to_query_string();
    for pair in [
        (sort != SortKey::default()).then(|| format!("sort={sort}")),
        (page > 1).then(|| format!("page={page}")),
    ]
    .into_iter()
    .flatten()
    {
        if !params.is_empty() {
            params.push('&');
        }
        params.push_str(&pair);
    }

    if params.is_empty() {
        "/products".to_string()
    } else {
        format!("/products?{params}")
    }
}

fn category_toggles(filter: &CatalogFilter, sort: SortKey) -> Vec<FilterOption> {
    taxonomy::categories()
        .iter()
        .map(|c| {
            let mut next = filter.clone();
            next.toggle_category(c.value);
            FilterOption {
                label: c.name,
                active: filter.has_category(c.value),
                href: spreadsheet_href(&next, sort, 1),
            }
        })
        .collect()
}

/// Spreadsheet page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub notification: Option<NotificationView>,
    pub rows: Vec<ProductRow>,
    pub categories: Vec<FilterOption>,
    pub sort_options: Vec<SortOption>,
    pub categories_param: String,
    pub sort_param: String,
    pub query: String,
    pub summary: String,
    pub pager: Pager,
    /// Where row actions return to.
    pub return_to: String,
}

/// Display the product spreadsheet.
#[instrument(skip_all)]
pub async fn index(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SpreadsheetQuery>,
) -> impl IntoResponse {
    let gateway = state.gateway();

    let load_error = if query.refresh.is_some() {
        let outcome = gateway.refresh().await;
        (!outcome.is_success()).then_some(outcome.notification)
    } else {
        gateway.ensure_loaded().await
    };
    let notification = match take_flash(&session).await {
        Some(flash) => Some(flash),
        None => load_error,
    };

    let filter = query.filter();
    let sort = query.sort();
    let view = gateway
        .view(state.config().page_size, filter.clone(), sort, query.page())
        .await;
    let page = view.page();

    ProductsIndexTemplate {
        notification: notification.map(NotificationView::from),
        rows: page.items.iter().map(|p| ProductRow::from_product(p)).collect(),
        categories: category_toggles(&filter, sort),
        sort_options: SortKey::ALL
            .into_iter()
            .map(|key| SortOption {
                value: key.as_str(),
                label: key.label(),
                selected: key == sort,
            })
            .collect(),
        categories_param: filter
            .categories()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(","),
        sort_param: if sort == SortKey::default() {
            String::new()
        } else {
            sort.to_string()
        },
        query: filter.query().to_string(),
        summary: page.summary(),
        pager: Pager::new(&page, |n| spreadsheet_href(&filter, sort, n)),
        return_to: spreadsheet_href(&filter, sort, view.current_page()),
    }
}

// =============================================================================
// Add / edit form
// =============================================================================

/// Add/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub title: String,
    pub action: String,
    pub submit_label: &'static str,
    pub notification: Option<NotificationView>,
    pub form: ProductForm,
    pub options: FormOptions,
}

impl ProductFormTemplate {
    fn add(form: ProductForm, notification: Option<Notification>) -> Self {
        Self {
            title: "Add product".to_string(),
            action: "/products".to_string(),
            submit_label: "Add product",
            notification: notification.map(NotificationView::from),
            options: FormOptions::from_form(&form),
            form,
        }
    }

    fn edit(id: &ProductId, form: ProductForm, notification: Option<Notification>) -> Self {
        Self {
            title: format!("Edit {}", form.name),
            action: format!("/products/{}", urlencoding::encode(id.as_str())),
            submit_label: "Save changes",
            notification: notification.map(NotificationView::from),
            options: FormOptions::from_form(&form),
            form,
        }
    }
}

/// Cascading select fragment, swapped in by HTMX.
#[derive(Template, WebTemplate)]
#[template(path = "partials/form_options.html")]
pub struct FormOptionsTemplate {
    pub options: FormOptions,
}

/// Current select values, plus the values they had when last rendered.
///
/// Comparing the two tells which select the admin just changed.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FormOptionsQuery {
    pub category: String,
    pub subcategory: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub prev_category: String,
    pub prev_subcategory: String,
}

impl FormOptionsQuery {
    /// Replay the change so every dependent field is reset.
    fn into_form(self) -> ProductForm {
        let mut form = ProductForm::new();
        form.select_category(self.category.clone());
        if self.category != self.prev_category {
            return form;
        }
        form.select_subcategory(self.subcategory.clone());
        if self.subcategory != self.prev_subcategory {
            return form;
        }
        form.select_type(self.kind);
        form
    }
}

/// Empty add form.
pub async fn new(RequireAdminAuth(_admin): RequireAdminAuth) -> impl IntoResponse {
    ProductFormTemplate::add(ProductForm::new(), None)
}

/// Re-render the taxonomy selects after one of them changed.
pub async fn form_options(
    RequireAdminAuth(_admin): RequireAdminAuth,
    Query(query): Query<FormOptionsQuery>,
) -> impl IntoResponse {
    FormOptionsTemplate {
        options: FormOptions::from_form(&query.into_form()),
    }
}

/// Edit form seeded from the snapshot.
///
/// # Errors
///
/// Returns a 404 if the product is not in the snapshot.
#[instrument(skip(_admin, state))]
pub async fn edit(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = ProductId::new(id);
    let gateway = state.gateway();
    let notification = gateway.ensure_loaded().await;

    let product = gateway
        .find(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductFormTemplate::edit(
        &id,
        ProductForm::from_product(&product),
        notification,
    ))
}

/// Create a product.
#[instrument(skip_all, fields(name = %form.name))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Response {
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                ProductFormTemplate::add(form, Some(Notification::from(&e))),
            )
                .into_response();
        }
    };

    let outcome = state
        .gateway()
        .create(&admin.access_token(), draft)
        .await;

    if outcome.is_success() || outcome.requires_sign_in() {
        return finish(&session, outcome.notification, "/products").await;
    }
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        ProductFormTemplate::add(form, Some(outcome.notification)),
    )
        .into_response()
}

/// Save an edited product.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Response {
    let id = ProductId::new(id);
    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                ProductFormTemplate::edit(&id, form, Some(Notification::from(&e))),
            )
                .into_response();
        }
    };

    let outcome = state
        .gateway()
        .edit(&admin.access_token(), &id, draft)
        .await;

    if outcome.is_success() || outcome.requires_sign_in() {
        return finish(&session, outcome.notification, "/products").await;
    }
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        ProductFormTemplate::edit(&id, form, Some(outcome.notification)),
    )
        .into_response()
}

// =============================================================================
// Row actions
// =============================================================================

/// Hidden fields posted by row action buttons.
#[derive(Debug, Default, Deserialize)]
pub struct RowActionForm {
    #[serde(default)]
    pub return_to: String,
    /// Favorite flag as currently displayed.
    #[serde(default)]
    pub current: String,
}

impl RowActionForm {
    /// The spreadsheet URL to return to; anything else falls back to the
    /// unfiltered spreadsheet.
    fn return_to(&self) -> &str {
        let target = self.return_to.as_str();
        if target == "/products" || target.starts_with("/products?") {
            target
        } else {
            "/products"
        }
    }
}

/// Delete a product.
#[instrument(skip(admin, state, session, form))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<RowActionForm>,
) -> Response {
    let outcome = state
        .gateway()
        .delete(&admin.access_token(), &ProductId::new(id))
        .await;
    finish(&session, outcome.notification, form.return_to()).await
}

/// Toggle a product's favorite flag.
#[instrument(skip(admin, state, session, form))]
pub async fn favorite(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<RowActionForm>,
) -> Response {
    let current = form.current == "true";
    let outcome = state
        .gateway()
        .toggle_favorite(&admin.access_token(), &ProductId::new(id), current)
        .await;
    finish(&session, outcome.notification, form.return_to()).await
}

/// Flash the notification and redirect; a blocking one signs the admin out.
async fn finish(session: &Session, notification: Notification, to: &str) -> Response {
    let to = if notification.is_blocking() {
        if let Err(e) = clear_current_admin(session).await {
            tracing::warn!(error = %e, "Failed to clear expired admin session");
        }
        "/auth/login"
    } else {
        to
    };
    set_flash(session, &notification).await;
    Redirect::to(to).into_response()
}
