use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::prediction::PredictionInput;

/// Feature row in the exact column layout the classifier was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFeatures {
    #[serde(rename = "Age")]
    pub age: i32,

    #[serde(rename = "Screen_Time")]
    pub screen_time: f64,

    /// 0 or 1
    #[serde(rename = "Family_History")]
    pub family_history: u8,
}

impl From<&PredictionInput> for ModelFeatures {
    fn from(input: &PredictionInput) -> Self {
        Self {
            age: input.age,
            screen_time: input.screen_time,
            family_history: u8::from(input.family_history),
        }
    }
}

/// Abstraction over the pretrained fatigue-risk classifier.
///
/// The model artifact is produced outside this crate; implementations only
/// ship features to it and return its raw numeric class. Mapping the class to
/// a `RiskLabel` is the prediction service's job.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RiskModel: Send + Sync {
    /// Human-readable name of this model (for logs/errors).
    fn name(&self) -> &str;

    /// Classify one feature row.
    async fn predict_class(&self, features: &ModelFeatures) -> Result<u8, CoreError>;
}
