//! ScenarioSession: one mounted simulator view.
//!
//! WIRING (fixed):
//!   1. ParameterStore is created at mount with the variant's defaults.
//!   2. RequestOrchestrator subscribes to the store and owns the
//!      request lifecycle against the model.
//!   3. The view reads ScenarioView / ResultViewModel from the
//!      orchestrator and renders via the adapters.
//!
//! The store and the orchestrator never call each other; the watch
//! channel between them is the only link.

use crate::{
    adapters::{dashboard_panels, DashboardPanels},
    command::ScenarioCommand,
    config::{ClientConfig, OrchestratorConfig, ScenarioSchema},
    error::ScenarioResult,
    event::OrchestratorEvent,
    model::{HttpModel, SimulationModel},
    orchestrator::{OrchestratorHandle, RequestOrchestrator, ScenarioView},
    parameters::{ParamValue, ParameterSnapshot, ParameterStore},
    view_model::ResultViewModel,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

pub struct ScenarioSession {
    store:        ParameterStore,
    orchestrator: OrchestratorHandle,
}

impl ScenarioSession {
    /// Mount a view at the schema defaults. Must run inside a Tokio runtime.
    pub fn start(
        schema: Arc<ScenarioSchema>,
        model: Arc<dyn SimulationModel>,
        config: OrchestratorConfig,
    ) -> Self {
        Self::start_with(ParameterStore::new(schema), model, config, None)
    }

    /// Mount a view against the HTTP model for the schema's endpoint.
    pub fn connect(
        schema: Arc<ScenarioSchema>,
        client: &ClientConfig,
        config: OrchestratorConfig,
    ) -> ScenarioResult<Self> {
        let model = HttpModel::for_schema(client, &schema)?;
        log::info!("scenario '{}' posting to {}", schema.id, model.url());
        Ok(Self::start(schema, Arc::new(model), config))
    }

    pub fn start_with(
        store: ParameterStore,
        model: Arc<dyn SimulationModel>,
        config: OrchestratorConfig,
        events: Option<mpsc::UnboundedSender<OrchestratorEvent>>,
    ) -> Self {
        let mut orchestrator = RequestOrchestrator::new(model, config, store.subscribe());
        if let Some(tx) = events {
            orchestrator = orchestrator.with_events(tx);
        }
        Self {
            orchestrator: orchestrator.spawn(),
            store,
        }
    }

    pub fn update(&mut self, key: &str, value: impl Into<ParamValue>) -> ScenarioResult<ParameterSnapshot> {
        self.store.update(key, value)
    }

    pub fn update_display(&mut self, key: &str, shown: f64) -> ScenarioResult<ParameterSnapshot> {
        self.store.update_display(key, shown)
    }

    pub fn apply_preset(&mut self, name: &str) -> ScenarioResult<ParameterSnapshot> {
        self.store.apply_preset(name)
    }

    pub fn apply(&mut self, command: ScenarioCommand) -> ScenarioResult<ParameterSnapshot> {
        match command {
            ScenarioCommand::Set { key, value }        => self.store.update(&key, value),
            ScenarioCommand::SetDisplay { key, value } => self.store.update_display(&key, value),
            ScenarioCommand::ApplyPreset { name }      => self.store.apply_preset(&name),
        }
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        self.store.snapshot()
    }

    pub fn view(&self) -> ScenarioView {
        self.orchestrator.view()
    }

    /// Receives every published view state.
    pub fn subscribe(&self) -> watch::Receiver<ScenarioView> {
        self.orchestrator.subscribe()
    }

    pub fn view_model(&self) -> ResultViewModel {
        self.view().view_model()
    }

    pub fn panels(&self) -> DashboardPanels {
        dashboard_panels(&self.view_model())
    }

    /// Wait until the current parameters have a settled outcome
    /// (accepted result or failure).
    pub async fn settled(&mut self) -> ScenarioView {
        let revision = self.store.revision();
        self.orchestrator.settled_for(revision).await
    }

    /// Unmount. No view state changes after this returns.
    pub async fn teardown(self) {
        self.orchestrator.teardown().await;
    }
}
