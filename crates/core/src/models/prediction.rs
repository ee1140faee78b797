use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Risk classification produced by the pretrained fatigue model.
///
/// Ordering follows severity, so `BTreeMap<RiskLabel, _>` iterates from
/// `Low` to `VeryHigh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLabel {
    /// Every label, in severity order.
    pub const ALL: [RiskLabel; 4] = [
        RiskLabel::Low,
        RiskLabel::Moderate,
        RiskLabel::High,
        RiskLabel::VeryHigh,
    ];

    /// Position of this label in [`RiskLabel::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            RiskLabel::Low => 0,
            RiskLabel::Moderate => 1,
            RiskLabel::High => 2,
            RiskLabel::VeryHigh => 3,
        }
    }

    /// Map the classifier's numeric output to a label.
    ///
    /// The model was trained with alphabetically encoded targets, hence the
    /// non-monotonic table: 0 = High, 1 = Low, 2 = Moderate, 3 = Very High.
    #[must_use]
    pub fn from_model_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(RiskLabel::High),
            1 => Some(RiskLabel::Low),
            2 => Some(RiskLabel::Moderate),
            3 => Some(RiskLabel::VeryHigh),
            _ => None,
        }
    }

    /// Inverse of [`RiskLabel::from_model_class`].
    #[must_use]
    pub fn model_class(self) -> u8 {
        match self {
            RiskLabel::High => 0,
            RiskLabel::Low => 1,
            RiskLabel::Moderate => 2,
            RiskLabel::VeryHigh => 3,
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLabel::Low => write!(f, "Low"),
            RiskLabel::Moderate => write!(f, "Moderate"),
            RiskLabel::High => write!(f, "High"),
            RiskLabel::VeryHigh => write!(f, "Very High"),
        }
    }
}

impl std::str::FromStr for RiskLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Low" => Ok(RiskLabel::Low),
            "Moderate" => Ok(RiskLabel::Moderate),
            "High" => Ok(RiskLabel::High),
            "Very High" | "VeryHigh" => Ok(RiskLabel::VeryHigh),
            other => Err(format!("unknown risk label '{other}'")),
        }
    }
}

/// Feature values submitted by a user for a risk prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    /// Age in years (must be non-negative)
    pub age: i32,

    /// Average daily screen time in hours (must be non-negative)
    pub screen_time: f64,

    /// Whether there is a family history of eye strain / fatigue conditions
    pub family_history: bool,
}

/// A stored classifier invocation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,

    /// Owner; `None` for predictions whose account no longer resolves
    pub user_id: Option<Uuid>,

    pub age: i32,
    pub screen_time: f64,
    pub family_history: bool,

    /// Label derived from `risk_class`
    #[serde(rename = "predicted_label")]
    pub label: RiskLabel,

    /// Raw numeric class returned by the model (kept for charting)
    #[serde(rename = "risk_numeric")]
    pub risk_class: u8,

    pub timestamp: DateTime<Utc>,
}

impl Prediction {
    pub fn new(
        user_id: Option<Uuid>,
        input: &PredictionInput,
        label: RiskLabel,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            age: input.age,
            screen_time: input.screen_time,
            family_history: input.family_history,
            label,
            risk_class: label.model_class(),
            timestamp,
        }
    }

    /// Project this record onto the aggregator's input shape.
    #[must_use]
    pub fn event(&self) -> PredictionEvent {
        PredictionEvent {
            occurred_at: self.timestamp,
            label: self.label,
        }
    }
}

/// Aggregator input: one prediction outcome at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionEvent {
    pub occurred_at: DateTime<Utc>,
    pub label: RiskLabel,
}
