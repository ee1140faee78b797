use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A free-form client activity record ("opened dashboard", "viewed tips", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(user_id: Option<Uuid>, action: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            action: action.into(),
            timestamp,
        }
    }
}
