//! Image upload handler for the product form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::gateway::Notification;
use crate::media::ImageFile;
use crate::middleware::{RequireAdminAuth, clear_current_admin, set_flash};
use crate::routes::products::NotificationView;
use crate::state::AppState;

/// Multipart field carrying the image.
const IMAGE_FIELD: &str = "image";

/// Hidden field holding the image URL already on the form.
const CURRENT_URL_FIELD: &str = "image_url";

/// Image preview and hidden `image_url` input, swapped into the form.
#[derive(Template, WebTemplate)]
#[template(path = "partials/image.html")]
pub struct ImageFieldTemplate {
    pub image_url: String,
    pub notification: Option<NotificationView>,
}

/// The parts of the upload request this handler reads.
#[derive(Debug, Default)]
struct UploadForm {
    image: Option<ImageFile>,
    /// Kept in the fragment when the upload fails.
    current_image_url: String,
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some(IMAGE_FIELD) if form.image.is_none() => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !bytes.is_empty() {
                    form.image = Some(ImageFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            Some(CURRENT_URL_FIELD) if form.current_image_url.is_empty() => {
                form.current_image_url = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .trim()
                    .to_string();
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Upload an image and return the image field fragment.
///
/// POST /media/upload
///
/// # Errors
///
/// Returns a 400 if the request carries no image. A failed upload is not an
/// error: the fragment comes back with the previous image and a notification.
#[instrument(skip_all)]
pub async fn upload(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response> {
    let form = read_upload(multipart).await?;
    let file = form
        .image
        .ok_or_else(|| AppError::BadRequest("no image selected".to_string()))?;

    match state
        .media()
        .upload(state.gateway().api(), &admin.access_token(), file)
        .await
    {
        Ok(image_url) => Ok(ImageFieldTemplate {
            image_url,
            notification: None,
        }
        .into_response()),
        Err(e) => {
            tracing::error!(error = %e, "Image upload failed");
            let notification = Notification::from(&e);

            if notification.is_blocking() {
                clear_current_admin(&session).await?;
                set_flash(&session, &notification).await;
                let mut response = StatusCode::UNAUTHORIZED.into_response();
                response
                    .headers_mut()
                    .insert("hx-redirect", HeaderValue::from_static("/auth/login"));
                return Ok(response);
            }

            Ok(ImageFieldTemplate {
                image_url: form.current_image_url,
                notification: Some(notification.into()),
            }
            .into_response())
        }
    }
}
