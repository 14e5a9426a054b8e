use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single local user profile. At most one exists per document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub username: String,
    pub locale: String,
    pub picture: Option<String>,
    pub provider: String,
    pub email_verified: bool,
    pub two_factor_enabled: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Typed merge input for `PATCH /user/me`. Enumerates exactly which fields a
/// caller may override; everything omitted is preserved.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub username: Option<String>,
    pub locale: Option<String>,
    pub picture: Option<String>,
    pub provider: Option<String>,
    pub email_verified: Option<bool>,
    pub two_factor_enabled: Option<bool>,
    pub role: Option<String>,
}

impl User {
    /// Merges a patch, stamping `updatedAt`. `id` and `createdAt` are immutable.
    pub fn apply_patch(&mut self, patch: UserPatch) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(locale) = patch.locale {
            self.locale = locale;
        }
        if let Some(picture) = patch.picture {
            self.picture = Some(picture);
        }
        if let Some(provider) = patch.provider {
            self.provider = provider;
        }
        if let Some(email_verified) = patch.email_verified {
            self.email_verified = email_verified;
        }
        if let Some(two_factor_enabled) = patch.two_factor_enabled {
            self.two_factor_enabled = two_factor_enabled;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        self.updated_at = Utc::now();
    }
}

/// Session-shaped payload returned by login/register for API-shape
/// compatibility. The tokens are opaque placeholders — no remote authority
/// exists to validate against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: String,
}
