use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::database::Database;
use crate::models::prediction::{Prediction, PredictionInput, RiskLabel};
use crate::providers::traits::{ModelFeatures, RiskModel};
use crate::services::trend_aggregator::parse_timestamp;

/// Runs the risk model on user input and keeps the prediction history.
pub struct PredictionService;

impl PredictionService {
    pub fn new() -> Self {
        Self
    }

    /// Reject feature values the model was never trained on.
    pub fn validate_input(&self, input: &PredictionInput) -> Result<(), CoreError> {
        if input.age < 0 || input.screen_time < 0.0 {
            return Err(CoreError::ValidationError(
                "Age and screen time must be non-negative".into(),
            ));
        }
        if !input.screen_time.is_finite() {
            return Err(CoreError::ValidationError(
                "Screen time must be a finite number".into(),
            ));
        }
        Ok(())
    }

    /// Classify `input`, store the outcome for `user_id`, and return it.
    ///
    /// Nothing is stored when validation or the model call fails.
    pub async fn predict(
        &self,
        db: &mut Database,
        model: &dyn RiskModel,
        user_id: Option<Uuid>,
        input: &PredictionInput,
        now: DateTime<Utc>,
    ) -> Result<Prediction, CoreError> {
        self.validate_input(input)?;

        let features = ModelFeatures::from(input);
        let class = model.predict_class(&features).await?;
        let label = RiskLabel::from_model_class(class).ok_or_else(|| {
            warn!(model = model.name(), class, "model returned an unknown class");
            CoreError::Model {
                model: model.name().into(),
                message: format!("unknown risk class {class}"),
            }
        })?;

        let prediction = Prediction::new(user_id, input, label, now);
        info!(
            prediction_id = %prediction.id,
            label = %label,
            "stored prediction"
        );
        db.predictions.push(prediction.clone());
        Ok(prediction)
    }

    /// A user's predictions, newest first, optionally limited to
    /// `start <= timestamp <= end`. Each bound is an ISO-8601 string.
    pub fn history<'a>(
        &self,
        db: &'a Database,
        user_id: Uuid,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<&'a Prediction>, CoreError> {
        let start = start.map(parse_timestamp).transpose()?;
        let end = end.map(parse_timestamp).transpose()?;

        let mut records: Vec<&Prediction> = db
            .predictions
            .iter()
            .filter(|p| p.user_id == Some(user_id))
            .filter(|p| start.map_or(true, |s| p.timestamp >= s))
            .filter(|p| end.map_or(true, |e| p.timestamp <= e))
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}

impl Default for PredictionService {
    fn default() -> Self {
        Self::new()
    }
}
