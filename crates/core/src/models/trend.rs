use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::prediction::RiskLabel;
use crate::errors::CoreError;

/// Named granularity used to derive a default report range from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    /// From today's midnight to now
    #[default]
    Daily,
    /// From the most recent Monday's midnight to now
    Weekly,
    /// From the first day of the month to now
    Monthly,
}

impl std::fmt::Display for TrendPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendPeriod::Daily => write!(f, "daily"),
            TrendPeriod::Weekly => write!(f, "weekly"),
            TrendPeriod::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for TrendPeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(TrendPeriod::Daily),
            "weekly" => Ok(TrendPeriod::Weekly),
            "monthly" => Ok(TrendPeriod::Monthly),
            other => Err(CoreError::InvalidPeriod(other.to_string())),
        }
    }
}

/// Raw report parameters as they arrive from a request's query string.
///
/// `start` and `end` override `period` only when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendQuery {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl TrendQuery {
    pub fn period(period: impl Into<String>) -> Self {
        Self {
            period: Some(period.into()),
            ..Self::default()
        }
    }

    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            period: None,
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// The period keyword as supplied, defaulting to `"daily"`.
    #[must_use]
    pub fn period_name(&self) -> &str {
        self.period.as_deref().unwrap_or("daily")
    }
}

/// A report range. Ranges produced by `TrendAggregator::resolve_range` are
/// already checked; `TrendAggregator::aggregate_range` re-checks any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    #[must_use]
    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    #[must_use]
    pub fn last_day(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// Number of calendar-day buckets, counting both end days.
    /// Zero when `end`'s day precedes `start`'s.
    #[must_use]
    pub fn day_count(&self) -> usize {
        let days = (self.last_day() - self.first_day()).num_days() + 1;
        usize::try_from(days).unwrap_or(0)
    }

    /// Exclusive upper bound of the counted window: midnight after `end`'s day.
    ///
    /// `None` when `end` falls on the last representable date.
    #[must_use]
    pub fn window_end(&self) -> Option<DateTime<Utc>> {
        let next = self.last_day().succ_opt()?;
        Some(next.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    /// Whether `instant` falls inside `[start, window_end)`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && self.window_end().map_or(true, |end| instant < end)
    }
}

/// Day-bucketed counts for a single series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSeries {
    /// One `YYYY-MM-DD` label per bucket, ascending
    pub labels: Vec<String>,
    pub values: Vec<u64>,
}

impl TrendSeries {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.values.iter().sum()
    }
}

/// One count series per risk label. Every label is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSeries {
    #[serde(rename = "Low")]
    pub low: Vec<u64>,
    #[serde(rename = "Moderate")]
    pub moderate: Vec<u64>,
    #[serde(rename = "High")]
    pub high: Vec<u64>,
    #[serde(rename = "Very High")]
    pub very_high: Vec<u64>,
}

impl LabelSeries {
    /// Zero-filled series of `len` buckets for every label.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self {
            low: vec![0; len],
            moderate: vec![0; len],
            high: vec![0; len],
            very_high: vec![0; len],
        }
    }

    #[must_use]
    pub fn get(&self, label: RiskLabel) -> &[u64] {
        match label {
            RiskLabel::Low => &self.low,
            RiskLabel::Moderate => &self.moderate,
            RiskLabel::High => &self.high,
            RiskLabel::VeryHigh => &self.very_high,
        }
    }

    pub fn get_mut(&mut self, label: RiskLabel) -> &mut Vec<u64> {
        match label {
            RiskLabel::Low => &mut self.low,
            RiskLabel::Moderate => &mut self.moderate,
            RiskLabel::High => &mut self.high,
            RiskLabel::VeryHigh => &mut self.very_high,
        }
    }

    /// Counts of every label in bucket `idx`, laid out by [`RiskLabel::index`].
    #[must_use]
    pub fn bucket(&self, idx: usize) -> Option<[u64; 4]> {
        let mut counts = [0u64; 4];
        for label in RiskLabel::ALL {
            counts[label.index()] = *self.get(label).get(idx)?;
        }
        Some(counts)
    }

    /// Sum across all labels and buckets.
    #[must_use]
    pub fn total(&self) -> u64 {
        RiskLabel::ALL
            .iter()
            .map(|l| self.get(*l).iter().sum::<u64>())
            .sum()
    }
}

/// Day-bucketed prediction counts, partitioned by label.
///
/// Serializes flat: `{"labels": [...], "Low": [...], ..., "Very High": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledTrendSeries {
    pub labels: Vec<String>,
    #[serde(flatten)]
    pub series: LabelSeries,
}

/// Range-filtered totals (not bucketed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendTotals {
    pub total_users: u64,
    pub total_predictions: u64,
    pub deleted_accounts: u64,
}

/// Full aggregator result for one range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendReport {
    pub range: DateRange,
    pub user_trend: TrendSeries,
    pub prediction_trend: LabeledTrendSeries,
    pub totals: TrendTotals,
}
