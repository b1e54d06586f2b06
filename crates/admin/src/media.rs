//! Signed image uploads to the CDN.
//!
//! Each upload asks the Product API for a fresh signature first; signatures
//! are single-use and are never cached.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::api::{AccessToken, ApiError, ProductApi};
use crate::config::CdnConfig;
use crate::gateway::Notification;

/// Errors from the upload flow.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The Product API refused or failed to sign the upload.
    #[error("Could not sign upload: {0}")]
    Signature(#[from] ApiError),

    /// The CDN request failed in transit.
    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The CDN answered with a non-success status.
    #[error("CDN rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The CDN answered 2xx without a `secure_url`.
    #[error("CDN response had no secure_url")]
    MissingUrl,
}

impl From<&UploadError> for Notification {
    fn from(err: &UploadError) -> Self {
        match err {
            UploadError::Signature(api) => Self::from(api),
            other => Self::error(format!("Image upload failed: {other}")),
        }
    }
}

/// An image received from the admin's browser.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(serde::Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(serde::Deserialize)]
struct CdnError {
    error: Option<CdnErrorBody>,
}

#[derive(serde::Deserialize)]
struct CdnErrorBody {
    message: String,
}

/// Uploads images to `{upload_url}/v1_1/{cloud_name}/image/upload`.
#[derive(Clone)]
pub struct ImageUploader {
    inner: Arc<ImageUploaderInner>,
}

struct ImageUploaderInner {
    client: reqwest::Client,
    endpoint: String,
}

impl ImageUploader {
    #[must_use]
    pub fn new(config: &CdnConfig) -> Self {
        Self {
            inner: Arc::new(ImageUploaderInner {
                client: reqwest::Client::new(),
                endpoint: upload_endpoint(&config.upload_url, &config.cloud_name),
            }),
        }
    }

    /// Upload an image and return its HTTPS URL.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError`] if signing fails, the CDN rejects the file,
    /// or the response has no `secure_url`.
    #[instrument(skip_all, fields(file_name = %file.file_name, size = file.bytes.len()))]
    pub async fn upload<A: ProductApi>(
        &self,
        api: &A,
        token: &AccessToken,
        file: ImageFile,
    ) -> Result<String, UploadError> {
        let signature = api.upload_signature(token).await?;

        let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", signature.api_key)
            .text("timestamp", signature.timestamp.to_string())
            .text("signature", signature.signature)
            .text("upload_preset", signature.upload_preset)
            .text("folder", signature.folder);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<CdnError>(&body)
                .ok()
                .and_then(|e| e.error)
                .map_or_else(|| body.chars().take(200).collect(), |e| e.message);
            tracing::warn!(status = %status, message = %message, "CDN rejected upload");
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let url = serde_json::from_str::<UploadResponse>(&body)
            .ok()
            .and_then(|r| r.secure_url)
            .filter(|url| !url.is_empty())
            .ok_or(UploadError::MissingUrl)?;

        tracing::info!(url = %url, "Image uploaded");
        Ok(url)
    }
}

fn upload_endpoint(base: &Url, cloud_name: &str) -> String {
    format!(
        "{}/v1_1/{}/image/upload",
        base.as_str().trim_end_matches('/'),
        urlencoding::encode(cloud_name)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ProductApiClient;

    fn uploader(server: &MockServer) -> ImageUploader {
        ImageUploader::new(&CdnConfig {
            cloud_name: "oropallos".to_string(),
            upload_url: Url::parse(&server.uri()).unwrap(),
        })
    }

    fn api(server: &MockServer) -> ProductApiClient {
        ProductApiClient::new(&Url::parse(&server.uri()).unwrap())
    }

    fn image() -> ImageFile {
        ImageFile {
            file_name: "bottle.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: b"PNGDATA".to_vec(),
        }
    }

    async fn mount_signature(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/api/cloudinary-signature"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "signature": "sig",
                "timestamp": 1_700_000_000,
                "apiKey": "key-1",
                "uploadPreset": "ml_default",
                "folder": "oropallos"
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[test]
    fn test_upload_endpoint() {
        let base = Url::parse("https://api.cloudinary.com").unwrap();
        assert_eq!(
            upload_endpoint(&base, "oropallos"),
            "https://api.cloudinary.com/v1_1/oropallos/image/upload"
        );
    }

    #[tokio::test]
    async fn test_each_upload_fetches_a_new_signature() {
        let server = MockServer::start().await;
        mount_signature(&server, 2).await;

        Mock::given(method("POST"))
            .and(path("/v1_1/oropallos/image/upload"))
            .and(body_string_contains("ml_default"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secure_url": "https://res.cloudinary.com/oropallos/bottle.png"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let uploader = uploader(&server);
        let api = api(&server);
        let token = AccessToken::new("tok");

        for _ in 0..2 {
            let url = uploader.upload(&api, &token, image()).await.unwrap();
            assert_eq!(url, "https://res.cloudinary.com/oropallos/bottle.png");
        }
    }

    #[tokio::test]
    async fn test_missing_secure_url() {
        let server = MockServer::start().await;
        mount_signature(&server, 1).await;

        Mock::given(method("POST"))
            .and(path("/v1_1/oropallos/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "public_id": "x" })))
            .mount(&server)
            .await;

        let err = uploader(&server)
            .upload(&api(&server), &AccessToken::new("tok"), image())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::MissingUrl));
    }

    #[tokio::test]
    async fn test_cdn_rejection_carries_message() {
        let server = MockServer::start().await;
        mount_signature(&server, 1).await;

        Mock::given(method("POST"))
            .and(path("/v1_1/oropallos/image/upload"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid Signature" }
            })))
            .mount(&server)
            .await;

        let err = uploader(&server)
            .upload(&api(&server), &AccessToken::new("tok"), image())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            UploadError::Rejected { status: 400, ref message } if message == "Invalid Signature"
        ));
    }

    #[tokio::test]
    async fn test_signature_failure_skips_cdn() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/cloudinary-signature"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1_1/oropallos/image/upload"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = uploader(&server)
            .upload(&api(&server), &AccessToken::new("tok"), image())
            .await
            .unwrap_err();
        assert!(Notification::from(&err).is_blocking());
    }
}
