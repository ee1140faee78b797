pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{DateTime, Utc};
use models::{
    activity::ActivityLog,
    database::{Database, Session},
    prediction::{Prediction, PredictionInput},
    report::{AdminOverview, PredictionListing},
    settings::Settings,
    trend::TrendQuery,
    user::{GoogleProfile, UserSummary},
};
use providers::{remote::RemoteRiskModel, traits::RiskModel};
use services::{
    activity_service::ActivityService, admin_service::AdminService, auth_service::AuthService,
    prediction_service::PredictionService, trend_aggregator::TrendAggregator,
};
use storage::manager::StorageManager;
use uuid::Uuid;

use errors::CoreError;

/// Main entry point for the fatigue-risk core library.
/// Holds the database and all services needed to operate on it.
///
/// Every time-dependent operation takes `now` from the caller, so request
/// handlers stamp a single instant per request and tests stay deterministic.
#[must_use]
pub struct FatigueBackend {
    db: Database,
    model: Box<dyn RiskModel>,
    auth_service: AuthService,
    prediction_service: PredictionService,
    activity_service: ActivityService,
    admin_service: AdminService,
    trend_aggregator: TrendAggregator,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for FatigueBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FatigueBackend")
            .field("users", &self.db.users.len())
            .field("predictions", &self.db.predictions.len())
            .field("logs", &self.db.logs.len())
            .field("sessions", &self.db.sessions.len())
            .field("model", &self.model.name())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl FatigueBackend {
    /// Create a brand new empty database with the given settings and model.
    pub fn create_new(settings: Settings, model: Box<dyn RiskModel>) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self::build(Database::new(settings), model))
    }

    /// Create a new database backed by the model server named in
    /// `settings.model_endpoint`.
    pub fn with_remote_model(settings: Settings) -> Result<Self, CoreError> {
        let endpoint = settings.model_endpoint.clone().ok_or_else(|| {
            CoreError::ValidationError("model_endpoint is not configured".into())
        })?;
        let model = RemoteRiskModel::new(endpoint, settings.model_timeout_secs);
        Self::create_new(settings, Box::new(model))
    }

    /// Load an existing database from encrypted bytes (password required).
    pub fn load_from_bytes(
        encrypted: &[u8],
        password: &str,
        model: Box<dyn RiskModel>,
    ) -> Result<Self, CoreError> {
        let db = StorageManager::load_from_bytes(encrypted, password)?;
        Ok(Self::build(db, model))
    }

    /// Save the database to encrypted bytes.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_bytes(&mut self, password: &str, now: DateTime<Utc>) -> Result<Vec<u8>, CoreError> {
        let kdf = self.db.settings.storage_kdf;
        let bytes = StorageManager::save_to_bytes(&self.db, password, &kdf, now)?;
        self.dirty = false;
        Ok(bytes)
    }

    /// Load from an encrypted file on disk (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(
        path: &str,
        password: &str,
        model: Box<dyn RiskModel>,
    ) -> Result<Self, CoreError> {
        let db = StorageManager::load_from_file(path, password)?;
        Ok(Self::build(db, model))
    }

    /// Save to an encrypted file on disk (native only, not WASM).
    /// Clears the unsaved-changes flag on success.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(
        &mut self,
        path: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let kdf = self.db.settings.storage_kdf;
        StorageManager::save_to_file(&self.db, path, password, &kdf, now)?;
        self.dirty = false;
        Ok(())
    }

    // ── Accounts ────────────────────────────────────────────────────

    /// Sign up with email + password. Returns a session for the new account.
    pub fn register(
        &mut self,
        full_name: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        let session = self
            .auth_service
            .register(&mut self.db, full_name, email, password, now)?;
        self.dirty = true;
        Ok(session)
    }

    /// Create an administrator account. Returns a session for it.
    pub fn register_admin(
        &mut self,
        full_name: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        let session = self
            .auth_service
            .register_admin(&mut self.db, full_name, email, password, now)?;
        self.dirty = true;
        Ok(session)
    }

    /// Email + password login.
    pub fn login(
        &mut self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        let session = self.auth_service.login(&mut self.db, email, password, now)?;
        self.dirty = true;
        Ok(session)
    }

    /// Login restricted to admin accounts.
    pub fn admin_login(
        &mut self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        let session = self
            .auth_service
            .admin_login(&mut self.db, email, password, now)?;
        self.dirty = true;
        Ok(session)
    }

    /// Sign in with a Google profile verified by the OAuth layer.
    pub fn login_with_google(
        &mut self,
        profile: &GoogleProfile,
        now: DateTime<Utc>,
    ) -> Result<Session, CoreError> {
        let session = self
            .auth_service
            .login_with_google(&mut self.db, profile, now)?;
        self.dirty = true;
        Ok(session)
    }

    /// Revoke a session token. Returns whether it was active.
    pub fn logout(&mut self, token: Uuid) -> bool {
        let removed = self.auth_service.logout(&mut self.db, token);
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// The account behind a session token.
    pub fn current_user(&mut self, token: Uuid, now: DateTime<Utc>) -> Result<UserSummary, CoreError> {
        let user_id = self.caller(token, now)?;
        self.db
            .user(user_id)
            .map(|u| u.summary())
            .ok_or(CoreError::Unauthorized)
    }

    // ── Predictions ─────────────────────────────────────────────────

    /// Classify the input with the risk model and store the result.
    pub async fn predict(
        &mut self,
        token: Uuid,
        input: PredictionInput,
        now: DateTime<Utc>,
    ) -> Result<Prediction, CoreError> {
        let user_id = self.caller(token, now)?;
        let prediction = self
            .prediction_service
            .predict(&mut self.db, self.model.as_ref(), Some(user_id), &input, now)
            .await?;
        self.dirty = true;
        Ok(prediction)
    }

    /// The caller's prediction history, newest first, optionally bounded
    /// by ISO-8601 `start`/`end` (inclusive).
    pub fn history(
        &mut self,
        token: Uuid,
        start: Option<&str>,
        end: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Prediction>, CoreError> {
        let user_id = self.caller(token, now)?;
        let records = self
            .prediction_service
            .history(&self.db, user_id, start, end)?;
        Ok(records.into_iter().cloned().collect())
    }

    // ── Activity Logs ───────────────────────────────────────────────

    /// Record a client action for the caller.
    pub fn add_log(&mut self, token: Uuid, action: &str, now: DateTime<Utc>) -> Result<Uuid, CoreError> {
        let user_id = self.caller(token, now)?;
        let id = self
            .activity_service
            .add_log(&mut self.db, user_id, action, now)?;
        self.dirty = true;
        Ok(id)
    }

    /// The caller's activity entries, newest first.
    pub fn logs(&mut self, token: Uuid, now: DateTime<Utc>) -> Result<Vec<ActivityLog>, CoreError> {
        let user_id = self.caller(token, now)?;
        Ok(self
            .activity_service
            .logs_for(&self.db, user_id)
            .into_iter()
            .cloned()
            .collect())
    }

    // ── Admin ───────────────────────────────────────────────────────

    /// Totals and day-bucketed trends for the admin dashboard.
    pub fn admin_overview(
        &mut self,
        token: Uuid,
        query: &TrendQuery,
        now: DateTime<Utc>,
    ) -> Result<AdminOverview, CoreError> {
        self.admin_caller(token, now)?;
        self.admin_service
            .overview(&self.db, &self.trend_aggregator, query, now)
    }

    /// The admin users table.
    pub fn admin_users(&mut self, token: Uuid, now: DateTime<Utc>) -> Result<Vec<UserSummary>, CoreError> {
        self.admin_caller(token, now)?;
        Ok(self.admin_service.users(&self.db))
    }

    /// Soft-delete an account and revoke its sessions.
    pub fn admin_delete_user(
        &mut self,
        token: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.admin_caller(token, now)?;
        self.admin_service.delete_user(&mut self.db, user_id)?;
        self.auth_service.revoke_user_sessions(&mut self.db, user_id);
        self.dirty = true;
        Ok(())
    }

    /// Restore a soft-deleted account.
    pub fn admin_restore_user(
        &mut self,
        token: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.admin_caller(token, now)?;
        self.admin_service.restore_user(&mut self.db, user_id)?;
        self.dirty = true;
        Ok(())
    }

    /// Predictions in the requested range, grouped by label.
    pub fn admin_predictions(
        &mut self,
        token: Uuid,
        query: &TrendQuery,
        now: DateTime<Utc>,
    ) -> Result<PredictionListing, CoreError> {
        self.admin_caller(token, now)?;
        self.admin_service
            .predictions(&self.db, &self.trend_aggregator, query, now)
    }

    // ── Settings & State ────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.db.settings
    }

    /// Replace the settings after validating them.
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), CoreError> {
        settings.validate()?;
        self.trend_aggregator = TrendAggregator::with_max_days(settings.max_trend_days);
        self.db.settings = settings;
        self.dirty = true;
        Ok(())
    }

    /// Swap the risk model (e.g. after the model server moves).
    pub fn set_model(&mut self, model: Box<dyn RiskModel>) {
        self.model = model;
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn prune_sessions(&mut self, now: DateTime<Utc>) -> usize {
        let removed = self.auth_service.prune_sessions(&mut self.db, now);
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Returns `true` if the database has been modified since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Id of the live user behind `token`.
    ///
    /// Authenticating can evict an expired session, which counts as a change.
    fn caller(&mut self, token: Uuid, now: DateTime<Utc>) -> Result<Uuid, CoreError> {
        let sessions = self.db.sessions.len();
        let result = self
            .auth_service
            .authenticate(&mut self.db, token, now)
            .map(|u| u.id);
        self.note_evictions(sessions);
        result
    }

    /// Like [`FatigueBackend::caller`], but the user must be an admin.
    fn admin_caller(&mut self, token: Uuid, now: DateTime<Utc>) -> Result<Uuid, CoreError> {
        let sessions = self.db.sessions.len();
        let result = self
            .auth_service
            .require_admin(&mut self.db, token, now)
            .map(|u| u.id);
        self.note_evictions(sessions);
        result
    }

    fn note_evictions(&mut self, sessions_before: usize) {
        if self.db.sessions.len() != sessions_before {
            self.dirty = true;
        }
    }

    fn build(db: Database, model: Box<dyn RiskModel>) -> Self {
        let trend_aggregator = TrendAggregator::with_max_days(db.settings.max_trend_days);
        Self {
            db,
            model,
            auth_service: AuthService::new(),
            prediction_service: PredictionService::new(),
            activity_service: ActivityService::new(),
            admin_service: AdminService::new(),
            trend_aggregator,
            dirty: false,
        }
    }
}
