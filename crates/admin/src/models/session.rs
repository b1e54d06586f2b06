//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AccessToken;

/// Session-stored admin identity.
///
/// The admin signs in by pasting an access token issued by the identity
/// provider. The token is only ever forwarded to the Product API.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    token: String,
    /// When the token was stored.
    pub signed_in_at: DateTime<Utc>,
}

impl CurrentAdmin {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            signed_in_at: Utc::now(),
        }
    }

    /// The bearer token for Product API mutations.
    #[must_use]
    pub fn access_token(&self) -> AccessToken {
        AccessToken::new(self.token.clone())
    }
}

impl fmt::Debug for CurrentAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentAdmin")
            .field("token", &"[REDACTED]")
            .field("signed_in_at", &self.signed_in_at)
            .finish()
    }
}

/// Session keys for admin data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the one-shot notification shown on the next page.
    pub const FLASH: &str = "flash";
}
