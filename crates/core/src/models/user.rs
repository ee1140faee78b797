use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Admins can see every user and the trend reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// A registered account.
///
/// Accounts are never removed; deletion only sets `is_deleted`, so growth
/// reports can still count them under `deleted_accounts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,

    /// Normalized (trimmed, lower-cased) and unique
    pub email: String,

    /// Argon2id PHC string; `None` for accounts created through Google sign-in
    pub password_hash: Option<String>,

    #[serde(default)]
    pub google_id: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub is_deleted: bool,

    #[serde(default)]
    pub role: Role,
}

impl User {
    pub fn new(
        full_name: impl Into<String>,
        email: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            email: normalize_email(&email.into()),
            password_hash: None,
            google_id: None,
            created_at,
            is_deleted: false,
            role: Role::User,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Project this account onto the aggregator's input shape.
    #[must_use]
    pub fn signup_event(&self) -> SignupEvent {
        SignupEvent {
            occurred_at: self.created_at,
            is_deleted: self.is_deleted,
        }
    }

    #[must_use]
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            is_deleted: self.is_deleted,
            role: self.role,
        }
    }
}

/// Aggregator input: an account-creation moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupEvent {
    pub occurred_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// Row of the admin users table. Never exposes the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub role: Role,
}

/// Identity returned by the external Google OAuth handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleProfile {
    /// Google subject identifier
    pub sub: String,
    pub email: String,
    pub name: String,
}

/// Canonical form used for email uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
