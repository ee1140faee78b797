use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::database::Database;
use crate::models::prediction::{Prediction, PredictionEvent, RiskLabel};
use crate::models::report::{AdminOverview, PredictionListing};
use crate::models::trend::TrendQuery;
use crate::models::user::{SignupEvent, UserSummary};
use crate::services::trend_aggregator::TrendAggregator;

/// Admin dashboard reports and account moderation.
///
/// Callers are expected to have checked admin rights already.
pub struct AdminService;

impl AdminService {
    pub fn new() -> Self {
        Self
    }

    /// Headline totals and daily trend charts for the requested range.
    pub fn overview(
        &self,
        db: &Database,
        aggregator: &TrendAggregator,
        query: &TrendQuery,
        now: DateTime<Utc>,
    ) -> Result<AdminOverview, CoreError> {
        let signups: Vec<SignupEvent> = db.users.iter().map(|u| u.signup_event()).collect();
        let predictions: Vec<PredictionEvent> =
            db.predictions.iter().map(Prediction::event).collect();

        let report = aggregator.aggregate(query, now, &signups, &predictions)?;
        let total_logs = db
            .logs
            .iter()
            .filter(|l| report.range.contains(l.timestamp))
            .count() as u64;

        Ok(AdminOverview {
            period: query.period_name().to_string(),
            total_users: report.totals.total_users,
            deleted_accounts: report.totals.deleted_accounts,
            total_predictions: report.totals.total_predictions,
            total_logs,
            user_trend: report.user_trend,
            prediction_trend: report.prediction_trend,
        })
    }

    /// Every account in signup order.
    #[must_use]
    pub fn users(&self, db: &Database) -> Vec<UserSummary> {
        db.users.iter().map(|u| u.summary()).collect()
    }

    /// Soft-delete an account. Idempotent.
    pub fn delete_user(&self, db: &mut Database, user_id: Uuid) -> Result<(), CoreError> {
        self.set_deleted(db, user_id, true)
    }

    /// Undo a soft delete. Idempotent.
    pub fn restore_user(&self, db: &mut Database, user_id: Uuid) -> Result<(), CoreError> {
        self.set_deleted(db, user_id, false)
    }

    /// Predictions with `start <= timestamp <= end`, grouped by label.
    pub fn predictions(
        &self,
        db: &Database,
        aggregator: &TrendAggregator,
        query: &TrendQuery,
        now: DateTime<Utc>,
    ) -> Result<PredictionListing, CoreError> {
        let range = aggregator.resolve_range(query, now)?;

        let mut grouped: BTreeMap<RiskLabel, Vec<Prediction>> = BTreeMap::new();
        for prediction in db
            .predictions
            .iter()
            .filter(|p| p.timestamp >= range.start && p.timestamp <= range.end)
        {
            grouped
                .entry(prediction.label)
                .or_default()
                .push(prediction.clone());
        }

        Ok(PredictionListing {
            period: query.period_name().to_string(),
            prediction_counts: grouped,
        })
    }

    fn set_deleted(&self, db: &mut Database, user_id: Uuid, deleted: bool) -> Result<(), CoreError> {
        let user = db
            .user_mut(user_id)
            .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()))?;
        user.is_deleted = deleted;
        info!(%user_id, deleted, "changed account deletion flag");
        Ok(())
    }
}

impl Default for AdminService {
    fn default() -> Self {
        Self::new()
    }
}
