use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::storage::encryption::KdfParams;

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Runtime configuration, stored inside the encrypted database file and
/// loadable from a JSON config file. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lifetime of a login session token, in hours.
    pub session_ttl_hours: i64,

    /// Longest report range accepted by the trend aggregator, in days.
    pub max_trend_days: i64,

    /// URL of the model server used by `RemoteRiskModel`, if any.
    pub model_endpoint: Option<String>,

    /// Request timeout for the model server, in seconds.
    pub model_timeout_secs: u64,

    /// Argon2id cost used when hashing account passwords.
    pub password_kdf: KdfParams,

    /// Argon2id cost used when deriving the database file key.
    pub storage_kdf: KdfParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24,
            max_trend_days: 3650,
            model_endpoint: None,
            model_timeout_secs: 30,
            password_kdf: KdfParams::password_default(),
            storage_kdf: KdfParams::default(),
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document and validate them.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON config file (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: &str) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values that would make sessions or reports meaningless.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return Err(CoreError::ValidationError(format!(
                "session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}, got {}",
                self.session_ttl_hours
            )));
        }
        if self.max_trend_days <= 0 {
            return Err(CoreError::ValidationError(format!(
                "max_trend_days must be positive, got {}",
                self.max_trend_days
            )));
        }
        if self.model_timeout_secs == 0 {
            return Err(CoreError::ValidationError(
                "model_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}
