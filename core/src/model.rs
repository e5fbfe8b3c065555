//! The external numerical model, seen from this side of the wire.
//!
//! RULE: the orchestrator talks to the model only through
//! `SimulationModel`. The simulation maths behind it is opaque.

use crate::{
    config::{ClientConfig, ScenarioSchema},
    error::{ScenarioError, ScenarioResult},
    parameters::ParameterSnapshot,
    result::{DecodedResult, SimulationResult},
};
use async_trait::async_trait;

/// One request = one full result. No streaming, no pagination.
#[async_trait]
pub trait SimulationModel: Send + Sync {
    /// Stable name for log lines.
    fn name(&self) -> &str;

    /// Run the model for `params`. Transport-level failures are errors;
    /// a readable but incomplete body is a `DecodedResult` with
    /// `malformed` entries.
    async fn simulate(&self, params: &ParameterSnapshot) -> ScenarioResult<DecodedResult>;
}

/// POSTs the flat parameter object to the variant's endpoint.
pub struct HttpModel {
    client: reqwest::Client,
    url:    String,
}

impl HttpModel {
    pub fn new(config: &ClientConfig, endpoint: &str) -> ScenarioResult<Self> {
        Ok(Self {
            client: config.http_client()?,
            url:    config.url(endpoint),
        })
    }

    pub fn for_schema(config: &ClientConfig, schema: &ScenarioSchema) -> ScenarioResult<Self> {
        Self::new(config, &schema.endpoint)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SimulationModel for HttpModel {
    fn name(&self) -> &str {
        &self.url
    }

    async fn simulate(&self, params: &ParameterSnapshot) -> ScenarioResult<DecodedResult> {
        let response = self
            .client
            .post(&self.url)
            .json(params)
            .send()
            .await
            .map_err(|e| ScenarioError::Transport(format!("POST {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScenarioError::Status {
                status: status.as_u16(),
                url:    self.url.clone(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        Ok(SimulationResult::decode(&body))
    }
}
