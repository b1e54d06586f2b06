//! Mutation gateway: every admin write to the catalog goes through here.
//!
//! The gateway owns the admin's local snapshot of the product list and
//! reconciles it with each mutation's result:
//!
//! | Operation         | Validation              | On success                |
//! |-------------------|-------------------------|---------------------------|
//! | `create`          | `validate_for_create`   | append the returned row   |
//! | `edit`            | `validate_for_update`   | full re-fetch             |
//! | `delete`          | none                    | remove the row            |
//! | `toggle_favorite` | none                    | full re-fetch             |
//!
//! Failures never escape as errors. Each operation returns an [`Outcome`]
//! whose [`Notification`] is shown to the admin, and the snapshot stays at
//! its last known good state. The lock is never held across a network call.

use std::sync::atomic::{AtomicBool, Ordering};

use oropallos_core::{
    CatalogFilter, CatalogView, Product, ProductDraft, ProductId, SortKey, ValidationError,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::api::{AccessToken, ApiError, ProductApi};

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    /// The admin must sign in again before continuing.
    Blocking,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Blocking => "blocking",
        }
    }
}

/// A message for the admin about the result of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn blocking(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Blocking,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(self.kind, NotificationKind::Blocking)
    }
}

impl From<&ValidationError> for Notification {
    fn from(err: &ValidationError) -> Self {
        Self::error(format!("Please fix the form: {err}"))
    }
}

impl From<&ApiError> for Notification {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::blocking("Your session has expired. Sign in again."),
            ApiError::NotFound(_) => Self::error("Product not found"),
            ApiError::Status { status, message } if !message.is_empty() => {
                Self::error(format!("Product API error ({status}): {message}"))
            }
            ApiError::Status { status, .. } => Self::error(format!("Product API error ({status})")),
            ApiError::Http(_) | ApiError::Parse(_) => {
                Self::error("Couldn't reach the Product API. Try again.")
            }
        }
    }
}

/// Result of a gateway operation.
#[derive(Debug, Clone)]
pub struct Outcome<T = ()> {
    pub notification: Notification,
    /// Present only on success.
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            notification: Notification::success(message),
            data: Some(data),
        }
    }

    const fn failure(notification: Notification) -> Self {
        Self {
            notification,
            data: None,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.data.is_some()
    }

    /// Whether the admin must sign in again.
    #[must_use]
    pub const fn requires_sign_in(&self) -> bool {
        self.notification.is_blocking()
    }
}

/// Owns the admin's product snapshot and performs mutations against `A`.
pub struct MutationGateway<A> {
    api: A,
    snapshot: RwLock<Vec<Product>>,
    loaded: AtomicBool,
}

impl<A: ProductApi> MutationGateway<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            snapshot: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(false),
        }
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Whether a refresh has ever succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// A copy of the current snapshot.
    pub async fn snapshot(&self) -> Vec<Product> {
        self.snapshot.read().await.clone()
    }

    /// Look up a product in the snapshot.
    pub async fn find(&self, id: &ProductId) -> Option<Product> {
        self.snapshot
            .read()
            .await
            .iter()
            .find(|p| p.id.as_ref() == Some(id))
            .cloned()
    }

    /// Build a catalog view over the snapshot.
    pub async fn view(
        &self,
        page_size: usize,
        filter: CatalogFilter,
        sort: SortKey,
        page: usize,
    ) -> CatalogView {
        CatalogView::with_state(self.snapshot().await, page_size, filter, sort, page)
    }

    /// Re-fetch the full product list.
    ///
    /// On failure the previous snapshot is kept.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Outcome<usize> {
        match self.api.list_products().await {
            Ok(products) => {
                let count = products.len();
                *self.snapshot.write().await = products;
                self.loaded.store(true, Ordering::Release);
                tracing::debug!(count, "Snapshot refreshed");
                Outcome::success(format!("Loaded {count} products"), count)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to refresh products");
                Outcome::failure(Notification::from(&e))
            }
        }
    }

    /// Refresh only if no refresh has succeeded yet.
    pub async fn ensure_loaded(&self) -> Option<Notification> {
        if self.is_loaded() {
            return None;
        }
        let outcome = self.refresh().await;
        (!outcome.is_success()).then_some(outcome.notification)
    }

    /// Create a product and append it to the snapshot.
    #[instrument(skip_all, fields(name = %draft.name))]
    pub async fn create(&self, token: &AccessToken, draft: ProductDraft) -> Outcome<Product> {
        if let Err(e) = draft.validate_for_create() {
            return Outcome::failure(Notification::from(&e));
        }

        match self.api.create_product(token, &draft).await {
            Ok(product) => {
                self.snapshot.write().await.push(product.clone());
                tracing::info!(product_id = ?product.id, "Product created");
                Outcome::success(format!("Product {} added successfully!", product.name), product)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create product");
                Outcome::failure(Notification::from(&e))
            }
        }
    }

    /// Update a product, then re-fetch the full list.
    #[instrument(skip(self, token, draft), fields(product_id = %id))]
    pub async fn edit(&self, token: &AccessToken, id: &ProductId, draft: ProductDraft) -> Outcome {
        if let Err(e) = draft.validate_for_update() {
            return Outcome::failure(Notification::from(&e));
        }

        if let Err(e) = self.api.update_product(token, id, &draft).await {
            tracing::error!(error = %e, "Failed to update product");
            return Outcome::failure(Notification::from(&e));
        }

        self.refetch_after_write().await;
        tracing::info!("Product updated");
        Outcome::success(format!("Product {} edited successfully!", draft.name), ())
    }

    /// Delete a product; the snapshot changes only on success.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete(&self, token: &AccessToken, id: &ProductId) -> Outcome<Option<Product>> {
        match self.api.delete_product(token, id).await {
            Ok(()) => {
                let removed = {
                    let mut products = self.snapshot.write().await;
                    products
                        .iter()
                        .position(|p| p.id.as_ref() == Some(id))
                        .map(|index| products.remove(index))
                };
                tracing::info!("Product deleted");
                Outcome::success("Product deleted successfully", removed)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to delete product");
                let notification = Notification::from(&e);
                if notification.is_blocking() {
                    return Outcome::failure(notification);
                }
                Outcome::failure(Notification::error(format!(
                    "Failed to delete product: {}",
                    notification.message
                )))
            }
        }
    }

    /// Invert a product's favorite flag, then re-fetch the full list.
    ///
    /// Returns the new flag.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn toggle_favorite(
        &self,
        token: &AccessToken,
        id: &ProductId,
        current: bool,
    ) -> Outcome<bool> {
        let favorite = !current;

        if let Err(e) = self.api.update_favorite(token, id, favorite).await {
            tracing::error!(error = %e, "Failed to update favorite");
            return Outcome::failure(Notification::from(&e));
        }

        self.refetch_after_write().await;
        let message = if favorite {
            "Added to favorites"
        } else {
            "Removed from favorites"
        };
        Outcome::success(message, favorite)
    }

    async fn refetch_after_write(&self) {
        let refreshed = self.refresh().await;
        if !refreshed.is_success() {
            tracing::warn!(
                message = %refreshed.notification.message,
                "Write succeeded but the list could not be re-fetched"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicU64;

    use async_trait::async_trait;
    use oropallos_core::Price;
    use tokio::sync::Mutex;

    use super::*;
    use crate::api::UploadSignature;

    /// In-memory Product API that counts every call.
    #[derive(Default)]
    struct FakeApi {
        products: Mutex<Vec<Product>>,
        calls: AtomicU64,
        next_id: AtomicU64,
        fail_with: Mutex<Option<fn() -> ApiError>>,
    }

    impl FakeApi {
        fn with(products: Vec<Product>) -> Self {
            Self {
                products: Mutex::new(products),
                ..Self::default()
            }
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::Relaxed)
        }

        async fn enter(&self) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match *self.fail_with.lock().await {
                Some(make) => Err(make()),
                None => Ok(()),
            }
        }

        async fn fail(&self, make: fn() -> ApiError) {
            *self.fail_with.lock().await = Some(make);
        }

        async fn position(&self, id: &ProductId) -> Result<usize, ApiError> {
            self.products
                .lock()
                .await
                .iter()
                .position(|p| p.id.as_ref() == Some(id))
                .ok_or_else(|| ApiError::NotFound(id.to_string()))
        }
    }

    #[async_trait]
    impl ProductApi for FakeApi {
        async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
            self.enter().await?;
            Ok(self.products.lock().await.clone())
        }

        async fn create_product(
            &self,
            _token: &AccessToken,
            draft: &ProductDraft,
        ) -> Result<Product, ApiError> {
            self.enter().await?;
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let product = Product {
                id: Some(ProductId::new(format!("srv-{id}"))),
                ..product_from(draft)
            };
            self.products.lock().await.push(product.clone());
            Ok(product)
        }

        async fn update_product(
            &self,
            _token: &AccessToken,
            id: &ProductId,
            draft: &ProductDraft,
        ) -> Result<(), ApiError> {
            self.enter().await?;
            let index = self.position(id).await?;
            if let Some(slot) = self.products.lock().await.get_mut(index) {
                *slot = Product {
                    id: Some(id.clone()),
                    ..product_from(draft)
                };
            }
            Ok(())
        }

        async fn update_favorite(
            &self,
            _token: &AccessToken,
            id: &ProductId,
            favorite: bool,
        ) -> Result<(), ApiError> {
            self.enter().await?;
            let index = self.position(id).await?;
            if let Some(product) = self.products.lock().await.get_mut(index) {
                product.favorite = favorite;
            }
            Ok(())
        }

        async fn delete_product(&self, _token: &AccessToken, id: &ProductId) -> Result<(), ApiError> {
            self.enter().await?;
            let index = self.position(id).await?;
            self.products.lock().await.remove(index);
            Ok(())
        }

        async fn upload_signature(&self, _token: &AccessToken) -> Result<UploadSignature, ApiError> {
            self.enter().await?;
            Err(ApiError::NotFound("unused".to_string()))
        }
    }

    fn product_from(draft: &ProductDraft) -> Product {
        Product {
            id: None,
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            category: draft.category.clone(),
            subcategory: draft.subcategory.clone(),
            kind: draft.kind.clone(),
            image_url: draft.image_url.clone(),
            favorite: draft.favorite,
            abv: draft.abv,
            size: draft.size.clone(),
            created_at: None,
        }
    }

    fn draft(name: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: None,
            price: Price::from_cents(2499),
            category: "Liquor".to_string(),
            subcategory: "Vodka".to_string(),
            kind: String::new(),
            image_url: None,
            abv: None,
            size: "750mL".to_string(),
            favorite: false,
        }
    }

    fn stocked(id: &str, name: &str) -> Product {
        Product {
            id: Some(ProductId::new(id)),
            ..product_from(&draft(name))
        }
    }

    fn token() -> AccessToken {
        AccessToken::new("tok")
    }

    async fn loaded_gateway(products: Vec<Product>) -> MutationGateway<FakeApi> {
        let gateway = MutationGateway::new(FakeApi::with(products));
        assert!(gateway.refresh().await.is_success());
        gateway
    }

    #[tokio::test]
    async fn test_invalid_drafts_make_no_calls() {
        let gateway = MutationGateway::new(FakeApi::default());

        let mut missing_price = draft("Ketel One");
        missing_price.price = Price::ZERO;
        let outcome = gateway.create(&token(), missing_price).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.notification.kind, NotificationKind::Error);
        assert!(outcome.notification.message.contains("price"));

        let mut missing_size = draft("Ketel One");
        missing_size.size = String::new();
        assert!(!gateway.create(&token(), missing_size).await.is_success());

        let outcome = gateway
            .edit(&token(), &ProductId::new("p1"), draft(" "))
            .await;
        assert!(!outcome.is_success());

        assert_eq!(gateway.api().calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_taxonomy_triple_makes_no_calls() {
        let gateway = loaded_gateway(vec![stocked("p1", "Absolut")]).await;
        let calls_before = gateway.api().calls();

        // Category changed without the dependent selects being reset
        let mut stale = draft("Casa Blanco");
        stale.category = "Red_Wine".to_string();
        stale.subcategory = "Tequila".to_string();
        stale.kind = "Blanco".to_string();

        let outcome = gateway.create(&token(), stale.clone()).await;
        assert!(!outcome.is_success());
        assert!(outcome.notification.message.starts_with("Please fix the form"));

        let outcome = gateway.edit(&token(), &ProductId::new("p1"), stale).await;
        assert!(!outcome.is_success());

        assert_eq!(gateway.api().calls(), calls_before);
        let snapshot = gateway.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.first().map(|p| p.category.as_str()), Some("Liquor"));
    }

    #[tokio::test]
    async fn test_create_appends_server_assigned_id() {
        let gateway = loaded_gateway(vec![stocked("p1", "Absolut")]).await;
        let calls_before = gateway.api().calls();

        let outcome = gateway.create(&token(), draft("Grey Goose")).await;
        assert!(outcome.is_success());
        assert_eq!(
            outcome.notification.message,
            "Product Grey Goose added successfully!"
        );

        let snapshot = gateway.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.last().unwrap().id, Some(ProductId::new("srv-0")));
        // Appended locally, not re-fetched
        assert_eq!(gateway.api().calls(), calls_before + 1);
    }

    #[tokio::test]
    async fn test_delete_not_found_leaves_snapshot() {
        let gateway = loaded_gateway(vec![stocked("p1", "Absolut")]).await;

        let outcome = gateway.delete(&token(), &ProductId::new("nope")).await;
        assert!(!outcome.is_success());
        assert_eq!(outcome.notification.kind, NotificationKind::Error);
        assert_eq!(gateway.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let gateway =
            loaded_gateway(vec![stocked("p1", "Absolut"), stocked("p2", "Belvedere")]).await;

        let outcome = gateway.delete(&token(), &ProductId::new("p1")).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.data.unwrap().unwrap().name, "Absolut");

        let snapshot = gateway.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert!(gateway.find(&ProductId::new("p1")).await.is_none());
    }

    #[tokio::test]
    async fn test_edit_refetches() {
        let gateway = loaded_gateway(vec![stocked("p1", "Absolut")]).await;
        let calls_before = gateway.api().calls();

        let outcome = gateway
            .edit(&token(), &ProductId::new("p1"), draft("Absolut Citron"))
            .await;
        assert!(outcome.is_success());

        // update + list
        assert_eq!(gateway.api().calls(), calls_before + 2);
        let product = gateway.find(&ProductId::new("p1")).await.unwrap();
        assert_eq!(product.name, "Absolut Citron");
    }

    #[tokio::test]
    async fn test_toggle_favorite_inverts_and_refetches() {
        let gateway = loaded_gateway(vec![stocked("p1", "Absolut")]).await;

        let outcome = gateway
            .toggle_favorite(&token(), &ProductId::new("p1"), false)
            .await;
        assert_eq!(outcome.data, Some(true));
        assert!(gateway.find(&ProductId::new("p1")).await.unwrap().favorite);

        let outcome = gateway
            .toggle_favorite(&token(), &ProductId::new("p1"), true)
            .await;
        assert_eq!(outcome.data, Some(false));
        assert!(!gateway.find(&ProductId::new("p1")).await.unwrap().favorite);
    }

    #[tokio::test]
    async fn test_unauthorized_is_blocking() {
        let gateway = loaded_gateway(vec![stocked("p1", "Absolut")]).await;
        gateway.api().fail(|| ApiError::Unauthorized).await;

        let outcome = gateway.create(&token(), draft("Stoli")).await;
        assert!(outcome.requires_sign_in());
        assert_eq!(outcome.notification.kind, NotificationKind::Blocking);

        let outcome = gateway.delete(&token(), &ProductId::new("p1")).await;
        assert!(outcome.requires_sign_in());
        assert_eq!(gateway.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_known_good() {
        let gateway = loaded_gateway(vec![stocked("p1", "Absolut")]).await;
        gateway
            .api()
            .fail(|| ApiError::Status {
                status: 503,
                message: "maintenance".to_string(),
            })
            .await;

        let outcome = gateway.refresh().await;
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.notification.message,
            "Product API error (503): maintenance"
        );
        assert_eq!(gateway.snapshot().await.len(), 1);
        assert!(gateway.is_loaded());
    }

    #[tokio::test]
    async fn test_ensure_loaded_fetches_once() {
        let gateway = MutationGateway::new(FakeApi::with(vec![stocked("p1", "Absolut")]));

        assert!(gateway.ensure_loaded().await.is_none());
        assert!(gateway.ensure_loaded().await.is_none());
        assert_eq!(gateway.api().calls(), 1);
    }

    #[tokio::test]
    async fn test_view_pages_the_snapshot() {
        let products = (0..30)
            .map(|i| stocked(&format!("p{i:02}"), &format!("Bottle {i:02}")))
            .collect();
        let gateway = loaded_gateway(products).await;

        let view = gateway
            .view(24, CatalogFilter::new(), SortKey::NameAsc, 7)
            .await;
        assert_eq!(view.current_page(), 2);
        assert_eq!(view.page().items.len(), 6);
    }
}
