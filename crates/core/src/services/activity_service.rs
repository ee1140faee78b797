use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::activity::ActivityLog;
use crate::models::database::Database;

/// Records and lists client activity logs.
pub struct ActivityService;

impl ActivityService {
    pub fn new() -> Self {
        Self
    }

    /// Append an activity entry for `user_id`.
    pub fn add_log(
        &self,
        db: &mut Database,
        user_id: Uuid,
        action: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid, CoreError> {
        let action = action.trim();
        if action.is_empty() {
            return Err(CoreError::ValidationError("Action required".into()));
        }
        let entry = ActivityLog::new(Some(user_id), action, now);
        let id = entry.id;
        debug!(%user_id, log_id = %id, "recorded activity");
        db.logs.push(entry);
        Ok(id)
    }

    /// All of a user's activity entries, newest first.
    pub fn logs_for<'a>(&self, db: &'a Database, user_id: Uuid) -> Vec<&'a ActivityLog> {
        let mut logs: Vec<&ActivityLog> = db
            .logs
            .iter()
            .filter(|l| l.user_id == Some(user_id))
            .collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        logs
    }
}

impl Default for ActivityService {
    fn default() -> Self {
        Self::new()
    }
}
