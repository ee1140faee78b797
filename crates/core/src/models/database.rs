use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::activity::ActivityLog;
use super::prediction::Prediction;
use super::settings::Settings;
use super::user::{Role, User};

/// An issued login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// The main data container. Everything in here gets serialized,
/// encrypted, and saved to the portable database file.
///
/// Users, predictions and logs are kept in insertion order, which is also
/// chronological order because records are stamped at insertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    pub users: Vec<User>,
    pub predictions: Vec<Prediction>,
    pub logs: Vec<ActivityLog>,

    /// Active sessions keyed by token
    #[serde(default)]
    pub sessions: HashMap<Uuid, Session>,

    pub settings: Settings,
}

impl Database {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    /// Look up a user by email (normalized before comparison).
    #[must_use]
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let email = super::user::normalize_email(email);
        self.users.iter().find(|u| u.email == email)
    }
}
