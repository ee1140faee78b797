use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
use tracing::debug;

use crate::errors::CoreError;
use super::traits::{ModelFeatures, RiskModel};

/// Client for a model server hosting the pretrained classifier.
///
/// - **Request**: `POST {endpoint}` with one feature row as JSON,
///   e.g. `{"Age": 29, "Screen_Time": 7.5, "Family_History": 1}`
/// - **Response**: `{"prediction": <class>}` where class is 0..=3
pub struct RemoteRiskModel {
    client: Client,
    endpoint: String,
}

impl RemoteRiskModel {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(timeout_secs));
        #[cfg(target_arch = "wasm32")]
        let _ = timeout_secs;
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Turn a model server reply into a raw class.
    ///
    /// Non-success statuses, bodies without an integer `prediction` and
    /// classes outside `0..=255` are all `CoreError::Model`.
    pub fn class_from_response(&self, status: StatusCode, body: &str) -> Result<u8, CoreError> {
        if !status.is_success() {
            return Err(self.model_error(format!("model server returned HTTP {status}")));
        }

        let reply: PredictResponse = serde_json::from_str(body)
            .map_err(|e| self.model_error(format!("Failed to parse model response: {e}")))?;
        debug!(class = reply.prediction, "model server responded");

        u8::try_from(reply.prediction)
            .map_err(|_| self.model_error(format!("class {} out of range", reply.prediction)))
    }

    fn model_error(&self, message: String) -> CoreError {
        CoreError::Model {
            model: self.name().into(),
            message,
        }
    }
}

// ── Model server response types ─────────────────────────────────────

#[derive(Deserialize)]
struct PredictResponse {
    prediction: i64,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RiskModel for RemoteRiskModel {
    fn name(&self) -> &str {
        "RemoteRiskModel"
    }

    async fn predict_class(&self, features: &ModelFeatures) -> Result<u8, CoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(features)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        self.class_from_response(status, &body)
    }
}
