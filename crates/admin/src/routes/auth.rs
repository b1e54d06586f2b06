//! Authentication route handlers for admin.
//!
//! Admins sign in by pasting the access token issued to them by the
//! identity provider. The token is not checked here; the Product API
//! rejects a bad one on the first mutation, which signs the admin out.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::Result;
use crate::gateway::Notification;
use crate::middleware::{clear_current_admin, set_current_admin, set_flash, take_flash};
use crate::models::CurrentAdmin;
use crate::routes::products::NotificationView;
use crate::state::AppState;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginPageTemplate {
    pub notification: Option<NotificationView>,
}

/// Sign-in form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub token: String,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page.
///
/// GET /auth/login
async fn login_page(session: Session) -> impl IntoResponse {
    LoginPageTemplate {
        notification: take_flash(&session).await.map(NotificationView::from),
    }
}

/// Store the pasted token in the session.
///
/// POST /auth/login
async fn login(session: Session, Form(form): Form<LoginForm>) -> Result<Response> {
    let token = form.token.trim();
    if token.is_empty() {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginPageTemplate {
                notification: Some(Notification::error("Paste your access token to sign in").into()),
            },
        )
            .into_response());
    }

    set_current_admin(&session, &CurrentAdmin::new(token)).await?;
    tracing::info!("Admin signed in");

    Ok(Redirect::to("/products").into_response())
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    set_flash(&session, &Notification::success("Signed out")).await;

    Redirect::to("/auth/login")
}
