//! RequestOrchestrator: turns parameter changes into model round trips.
//!
//! STATES: Idle → Scheduled → InFlight → Resolved | Failed, and back to
//! Scheduled on any further change. TornDown is terminal.
//!
//! RULES:
//!   - A change restarts the debounce timer; a burst yields one request
//!     carrying the snapshot as of the last change.
//!   - Every request gets a strictly increasing token.
//!   - A response is applied only if its token is the highest issued.
//!     Older responses are dropped whenever they arrive.
//!   - Superseded requests are not aborted; their results are inert.
//!   - A failure keeps the last accepted result and marks it stale.
//!   - After teardown nothing is published.
//!
//! The orchestrator runs as one task. Requests are polled from a
//! `FuturesUnordered` inside that task, so all state below is owned by
//! a single cooperative loop and needs no locking.

use crate::{
    config::OrchestratorConfig,
    error::ScenarioResult,
    event::OrchestratorEvent,
    model::SimulationModel,
    parameters::StoreChange,
    result::{DecodedResult, MalformedField, SimulationResult},
    types::Token,
    view_model::ResultViewModel,
};
use futures::{future::BoxFuture, stream::FuturesUnordered, FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::{sleep_until, Instant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Idle,
    Scheduled,
    InFlight,
    Resolved,
    Failed,
    TornDown,
}

/// What the view layer sees. Published on every state transition.
#[derive(Debug, Clone)]
pub struct ScenarioView {
    pub status:            QueryStatus,
    /// Latest store revision the orchestrator has observed.
    pub observed_revision: u64,
    /// Token of the result currently shown.
    pub accepted_token:    Option<Token>,
    /// Store revision that result was computed for.
    pub result_revision:   Option<u64>,
    pub result:            Option<Arc<SimulationResult>>,
    pub malformed:         Vec<MalformedField>,
    /// The last round trip failed; `result` predates the current input.
    pub stale:             bool,
    pub last_error:        Option<String>,
}

impl ScenarioView {
    fn initial() -> Self {
        Self {
            status:            QueryStatus::Idle,
            observed_revision: 0,
            accepted_token:    None,
            result_revision:   None,
            result:            None,
            malformed:         Vec::new(),
            stale:             false,
            last_error:        None,
        }
    }

    pub fn loading(&self) -> bool {
        matches!(self.status, QueryStatus::Scheduled | QueryStatus::InFlight)
    }

    pub fn view_model(&self) -> ResultViewModel {
        ResultViewModel::from_view(self)
    }
}

/// The single "latest accepted result" slot.
///
/// `issued` only grows. A result is stored only when its token equals
/// `issued`, which is the compare-and-set the ordering guarantee rests on.
#[derive(Debug)]
pub struct ResultSlot {
    issued: Token,
    view:   ScenarioView,
}

impl Default for ResultSlot {
    fn default() -> Self {
        Self { issued: 0, view: ScenarioView::initial() }
    }
}

impl ResultSlot {
    /// Reserve the next token. Every earlier token is superseded.
    pub fn issue(&mut self) -> Token {
        self.issued += 1;
        self.issued
    }

    pub fn latest_issued(&self) -> Token {
        self.issued
    }

    pub fn is_current(&self, token: Token) -> bool {
        token == self.issued
    }

    /// Store `decoded` if `token` is still the latest. Returns whether it was.
    pub fn try_accept(&mut self, token: Token, revision: u64, decoded: DecodedResult) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.view.accepted_token = Some(token);
        self.view.result_revision = Some(revision);
        self.view.result = Some(Arc::new(decoded.result));
        self.view.malformed = decoded.malformed;
        self.view.stale = false;
        self.view.last_error = None;
        true
    }

    /// Record a failure if `token` is still the latest. The stored result stays.
    pub fn try_fail(&mut self, token: Token, error: String) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.view.stale = self.view.result.is_some();
        self.view.last_error = Some(error);
        true
    }

    pub fn view(&self) -> &ScenarioView {
        &self.view
    }
}

type InFlight = BoxFuture<'static, (Token, u64, ScenarioResult<DecodedResult>)>;

pub struct RequestOrchestrator {
    model:     Arc<dyn SimulationModel>,
    config:    OrchestratorConfig,
    changes:   watch::Receiver<StoreChange>,
    view_tx:   watch::Sender<ScenarioView>,
    view_rx:   watch::Receiver<ScenarioView>,
    events:    Option<mpsc::UnboundedSender<OrchestratorEvent>>,
    slot:      ResultSlot,
    deadline:  Option<Instant>,
    in_flight: FuturesUnordered<InFlight>,
}

impl RequestOrchestrator {
    pub fn new(
        model: Arc<dyn SimulationModel>,
        config: OrchestratorConfig,
        mut changes: watch::Receiver<StoreChange>,
    ) -> Self {
        // Everything published after this point is a change to react to.
        let mounted = changes.borrow_and_update().revision;
        let mut slot = ResultSlot::default();
        slot.view.observed_revision = mounted;
        if config.fetch_on_start {
            // The mount fetch is pending from the moment the view exists.
            slot.view.status = QueryStatus::Scheduled;
        }
        let (view_tx, view_rx) = watch::channel(slot.view.clone());
        Self {
            model,
            config,
            changes,
            view_tx,
            view_rx,
            events: None,
            slot,
            deadline: None,
            in_flight: FuturesUnordered::new(),
        }
    }

    /// Mirror lifecycle events onto `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<OrchestratorEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Start the loop on the current runtime.
    pub fn spawn(self) -> OrchestratorHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let view = self.view_rx.clone();
        let task = tokio::spawn(self.run(shutdown_rx));
        OrchestratorHandle {
            view,
            shutdown: Some(shutdown_tx),
            task:     Some(task),
        }
    }

    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        log::debug!("orchestrator started against {}", self.model.name());
        if self.config.fetch_on_start {
            self.schedule(self.slot.view.observed_revision);
        }

        loop {
            let deadline = self.deadline;
            tokio::select! {
                // Teardown wins over anything else ready in the same poll.
                biased;

                _ = &mut shutdown => break,

                changed = self.changes.changed() => match changed {
                    Ok(()) => {
                        let revision = self.changes.borrow_and_update().revision;
                        self.schedule(revision);
                    }
                    // Store dropped: the view is gone.
                    Err(_) => break,
                },

                _ = wait_until(deadline) => self.issue(),

                Some((token, revision, outcome)) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.resolve(token, revision, outcome);
                }
            }
        }

        self.tear_down();
    }

    fn schedule(&mut self, revision: u64) {
        self.deadline = Some(Instant::now() + self.config.debounce);
        self.slot.view.observed_revision = revision;
        self.slot.view.status = QueryStatus::Scheduled;
        self.publish();
        self.emit(OrchestratorEvent::Scheduled { revision });
    }

    fn issue(&mut self) {
        self.deadline = None;
        let change = self.changes.borrow().clone();
        let token = self.slot.issue();
        let revision = change.revision;
        let model = Arc::clone(&self.model);
        let snapshot = change.snapshot;

        self.in_flight.push(
            async move {
                let outcome = model.simulate(&snapshot).await;
                (token, revision, outcome)
            }
            .boxed(),
        );

        log::debug!("request #{token} issued for r{revision}");
        self.slot.view.status = QueryStatus::InFlight;
        self.publish();
        self.emit(OrchestratorEvent::RequestIssued { token, revision });
    }

    fn resolve(&mut self, token: Token, revision: u64, outcome: ScenarioResult<DecodedResult>) {
        let latest = self.slot.latest_issued();
        match outcome {
            Ok(decoded) => {
                let malformed = decoded.malformed.len();
                if self.slot.try_accept(token, revision, decoded) {
                    log::debug!("request #{token} accepted");
                    self.slot.view.status = self.settled_status(QueryStatus::Resolved);
                    self.publish();
                    self.emit(OrchestratorEvent::ResponseAccepted { token, malformed });
                } else {
                    log::debug!("request #{token} superseded by #{latest}, discarded");
                    self.emit(OrchestratorEvent::ResponseDiscarded { token, latest });
                }
            }
            Err(e) => {
                if self.slot.try_fail(token, e.to_string()) {
                    log::warn!("request #{token} to {} failed: {e}", self.model.name());
                    self.slot.view.status = self.settled_status(QueryStatus::Failed);
                    self.publish();
                    self.emit(OrchestratorEvent::RequestFailed { token, error: e.to_string() });
                } else {
                    log::debug!("request #{token} failed after being superseded: {e}");
                    self.emit(OrchestratorEvent::FailureIgnored { token, latest });
                }
            }
        }
    }

    /// A newer change may already be waiting on the timer.
    fn settled_status(&self, outcome: QueryStatus) -> QueryStatus {
        if self.deadline.is_some() {
            QueryStatus::Scheduled
        } else {
            outcome
        }
    }

    fn tear_down(&mut self) {
        self.deadline = None;
        self.in_flight.clear();
        let last_token = self.slot.latest_issued();
        self.slot.view.status = QueryStatus::TornDown;
        self.publish();
        self.emit(OrchestratorEvent::TornDown { last_token });
        log::debug!("orchestrator torn down after {last_token} requests");
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.slot.view.clone());
    }

    fn emit(&self, event: OrchestratorEvent) {
        log::trace!("event: {}", event.type_name());
        if let Some(tx) = &self.events {
            // Nobody listening is fine.
            let _ = tx.send(event);
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Owned by the view. Dropping it stops the orchestrator.
pub struct OrchestratorHandle {
    view:     watch::Receiver<ScenarioView>,
    shutdown: Option<oneshot::Sender<()>>,
    task:     Option<JoinHandle<()>>,
}

impl OrchestratorHandle {
    pub fn view(&self) -> ScenarioView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScenarioView> {
        self.view.clone()
    }

    /// Wait until the orchestrator has seen `revision` and nothing is
    /// pending for it. Returns the view at that point.
    pub async fn settled_for(&mut self, revision: u64) -> ScenarioView {
        let waited = self
            .view
            .wait_for(|v| {
                v.status == QueryStatus::TornDown
                    || (v.observed_revision >= revision && !v.loading())
            })
            .await
            .map(|v| v.clone());
        match waited {
            Ok(view) => view,
            Err(_) => self.view.borrow().clone(),
        }
    }

    /// Stop the loop and wait for it to finish. Pending timers and
    /// tokens are invalidated; the final published status is TornDown.
    pub async fn teardown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("orchestrator task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for OrchestratorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
