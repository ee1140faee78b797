use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::debug;

use crate::errors::CoreError;
use crate::models::prediction::PredictionEvent;
use crate::models::trend::{
    DateRange, LabelSeries, LabeledTrendSeries, TrendPeriod, TrendQuery, TrendReport,
    TrendSeries, TrendTotals,
};
use crate::models::user::SignupEvent;

/// Longest accepted report range in days (10 years).
pub const DEFAULT_MAX_TREND_DAYS: i64 = 3650;

/// Date-time layouts carrying an explicit UTC offset, tried after RFC 3339.
const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Offset-less layouts; these are read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Buckets signups and predictions into per-day trend series for the admin
/// dashboard.
///
/// Pure business logic: the caller supplies `now` and the event slices, so
/// the same inputs always give the same report.
#[derive(Debug, Clone, Copy)]
pub struct TrendAggregator {
    max_days: i64,
}

impl TrendAggregator {
    pub fn new() -> Self {
        Self {
            max_days: DEFAULT_MAX_TREND_DAYS,
        }
    }

    /// Aggregator that rejects ranges spanning more than `max_days` buckets.
    pub fn with_max_days(max_days: i64) -> Self {
        Self { max_days }
    }

    /// Resolve a query into a concrete `[start, end]` range.
    ///
    /// Explicit bounds win when both are non-blank; otherwise `end = now` and
    /// `start` is derived from the period keyword.
    pub fn resolve_range(
        &self,
        query: &TrendQuery,
        now: DateTime<Utc>,
    ) -> Result<DateRange, CoreError> {
        let explicit_start = query.start.as_deref().filter(|s| !s.trim().is_empty());
        let explicit_end = query.end.as_deref().filter(|s| !s.trim().is_empty());

        let (start, end) = match (explicit_start, explicit_end) {
            (Some(start), Some(end)) => (parse_timestamp(start)?, parse_timestamp(end)?),
            _ => {
                let period: TrendPeriod = query.period_name().parse()?;
                (period_start(period, now), now)
            }
        };

        let range = DateRange { start, end };
        let days = self.check_range(&range)?;

        debug!(%start, %end, days, "resolved trend range");
        Ok(range)
    }

    /// Resolve the query and bucket both event streams over the result.
    ///
    /// Either returns a fully bucketed report or fails; there is no partial result.
    pub fn aggregate(
        &self,
        query: &TrendQuery,
        now: DateTime<Utc>,
        signups: &[SignupEvent],
        predictions: &[PredictionEvent],
    ) -> Result<TrendReport, CoreError> {
        let range = self.resolve_range(query, now)?;
        self.aggregate_range(range, signups, predictions)
    }

    /// Bucket events over an already resolved range.
    ///
    /// Buckets are UTC calendar days from `range.start`'s day through
    /// `range.end`'s day. An event is counted when
    /// `range.start <= occurred_at < midnight after range.end`, in the bucket
    /// of its own calendar day, so an event at exactly midnight belongs to
    /// the day it opens. Each event is indexed straight to its bucket:
    /// O(days + events).
    ///
    /// The range gets the same checks as [`TrendAggregator::resolve_range`].
    pub fn aggregate_range(
        &self,
        range: DateRange,
        signups: &[SignupEvent],
        predictions: &[PredictionEvent],
    ) -> Result<TrendReport, CoreError> {
        self.check_range(&range)?;
        let day_count = range.day_count();
        let first_day = range.first_day();

        let bucket_of = |instant: DateTime<Utc>| -> Option<usize> {
            if !range.contains(instant) {
                return None;
            }
            usize::try_from((instant.date_naive() - first_day).num_days()).ok()
        };

        let mut totals = TrendTotals::default();

        let mut user_values = vec![0u64; day_count];
        for signup in signups {
            let Some(idx) = bucket_of(signup.occurred_at) else {
                continue;
            };
            if signup.is_deleted {
                totals.deleted_accounts += 1;
            } else {
                user_values[idx] += 1;
                totals.total_users += 1;
            }
        }

        let mut series = LabelSeries::zeroed(day_count);
        for prediction in predictions {
            if let Some(idx) = bucket_of(prediction.occurred_at) {
                series.get_mut(prediction.label)[idx] += 1;
                totals.total_predictions += 1;
            }
        }

        let labels = bucket_labels(first_day, day_count);

        Ok(TrendReport {
            range,
            user_trend: TrendSeries {
                labels: labels.clone(),
                values: user_values,
            },
            prediction_trend: LabeledTrendSeries { labels, series },
            totals,
        })
    }

    /// Reject reversed ranges, ranges ending on the last representable day,
    /// and ranges longer than `max_days`. Returns the bucket count.
    fn check_range(&self, range: &DateRange) -> Result<i64, CoreError> {
        if range.end < range.start {
            return Err(CoreError::InvalidRange(format!(
                "end ({}) is before start ({})",
                range.end, range.start
            )));
        }
        if range.window_end().is_none() {
            return Err(CoreError::InvalidRange(format!(
                "end ({}) is past the last supported date",
                range.end
            )));
        }

        let days = (range.last_day() - range.first_day()).num_days() + 1;
        if days > self.max_days {
            return Err(CoreError::InvalidRange(format!(
                "range of {days} days exceeds maximum of {} days",
                self.max_days
            )));
        }
        Ok(days)
    }
}

impl Default for TrendAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Start of the default range for `period`, anchored at `now` (UTC midnight).
#[must_use]
pub fn period_start(period: TrendPeriod, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let first = match period {
        TrendPeriod::Daily => today,
        TrendPeriod::Weekly => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        }
        TrendPeriod::Monthly => today - Duration::days(i64::from(today.day0())),
    };
    midnight(first)
}

/// Parse an ISO-8601 date or date-time. Offset-less values are taken as UTC;
/// a bare `YYYY-MM-DD` means midnight of that day.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(midnight(date));
    }

    Err(CoreError::InvalidDateFormat(raw.to_string()))
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn bucket_labels(first_day: NaiveDate, day_count: usize) -> Vec<String> {
    first_day
        .iter_days()
        .take(day_count)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect()
}

