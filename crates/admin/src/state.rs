//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::ProductApiClient;
use crate::config::AdminConfig;
use crate::gateway::MutationGateway;
use crate::media::ImageUploader;

/// Application state shared across all handlers.
///
/// The gateway's product snapshot is shared by every signed-in admin.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    gateway: MutationGateway<ProductApiClient>,
    media: ImageUploader,
}

impl AppState {
    #[must_use]
    pub fn new(config: AdminConfig) -> Self {
        let gateway = MutationGateway::new(ProductApiClient::new(&config.product_api_url));
        let media = ImageUploader::new(&config.cdn);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway,
                media,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn gateway(&self) -> &MutationGateway<ProductApiClient> {
        &self.inner.gateway
    }

    #[must_use]
    pub fn media(&self) -> &ImageUploader {
        &self.inner.media
    }
}
