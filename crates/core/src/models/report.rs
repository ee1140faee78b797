use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::prediction::{Prediction, RiskLabel};
use super::trend::{LabeledTrendSeries, TrendSeries};

/// Admin dashboard overview: headline totals plus the two trend charts.
///
/// The core computes all the numbers; the dashboard only renders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminOverview {
    /// Period keyword as requested (echoed back for the dashboard)
    pub period: String,

    /// Non-deleted accounts created in the window
    pub total_users: u64,

    /// Deleted accounts created in the window
    pub deleted_accounts: u64,

    pub total_predictions: u64,

    /// Activity log entries recorded in the window
    pub total_logs: u64,

    pub user_trend: TrendSeries,
    pub prediction_trend: LabeledTrendSeries,
}

/// Admin predictions table: every prediction in range, grouped by label.
///
/// Labels with no predictions in range are absent from the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionListing {
    pub period: String,
    pub prediction_counts: BTreeMap<RiskLabel, Vec<Prediction>>,
}

impl PredictionListing {
    /// Total number of listed predictions across all labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prediction_counts.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
