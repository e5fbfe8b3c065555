//! Scripted stand-in for the external model.
//!
//! Drives the integration tests in place of `HttpModel`.
//! Latency is either scripted per call or drawn from a seeded RNG, so a
//! reordering scenario replays identically every time.
//!
//! RULE: nothing here may call a platform RNG. Jitter comes from
//! `LatencyRng`, seeded explicitly by the caller.

use crate::{
    error::{ScenarioError, ScenarioResult},
    model::SimulationModel,
    parameters::ParameterSnapshot,
    result::{DecodedResult, SimulationResult},
};
use async_trait::async_trait;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde_json::Value;
use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

/// Deterministic latency source.
pub struct LatencyRng {
    inner: Pcg64Mcg,
}

impl LatencyRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: Pcg64Mcg::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform duration in [min, max).
    pub fn between(&mut self, min: Duration, max: Duration) -> Duration {
        if max <= min {
            return min;
        }
        min + (max - min).mul_f64(self.next_f64())
    }
}

pub enum LatencyPlan {
    Fixed(Duration),
    /// One entry per call; the last entry repeats.
    PerCall(Vec<Duration>),
    Jitter { rng: LatencyRng, min: Duration, max: Duration },
}

impl LatencyPlan {
    fn next(&mut self, call: usize) -> Duration {
        match self {
            Self::Fixed(d) => *d,
            Self::PerCall(list) => list
                .get(call)
                .or_else(|| list.last())
                .copied()
                .unwrap_or_default(),
            Self::Jitter { rng, min, max } => rng.between(*min, *max),
        }
    }
}

type Responder = Box<dyn Fn(usize, &ParameterSnapshot) -> ScenarioResult<Value> + Send + Sync>;

pub struct ScriptedModel {
    responder: Responder,
    latency:   Mutex<LatencyPlan>,
    calls:     Mutex<Vec<ParameterSnapshot>>,
}

impl ScriptedModel {
    /// `responder` gets the zero-based call index and the parameters
    /// and returns the response body (or a transport error).
    pub fn new(
        responder: impl Fn(usize, &ParameterSnapshot) -> ScenarioResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            latency:   Mutex::new(LatencyPlan::Fixed(Duration::ZERO)),
            calls:     Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `body`.
    pub fn constant(body: Value) -> Self {
        Self::new(move |_, _| Ok(body.clone()))
    }

    /// Fails every call as an unreachable endpoint would.
    pub fn unreachable() -> Self {
        Self::new(|call, _| Err(ScenarioError::Transport(format!("call {call}: connection refused"))))
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.with_plan(LatencyPlan::Fixed(latency))
    }

    pub fn with_latencies(self, latencies: Vec<Duration>) -> Self {
        self.with_plan(LatencyPlan::PerCall(latencies))
    }

    pub fn with_jitter(self, seed: u64, min: Duration, max: Duration) -> Self {
        self.with_plan(LatencyPlan::Jitter { rng: LatencyRng::new(seed), min, max })
    }

    fn with_plan(self, plan: LatencyPlan) -> Self {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = plan;
        self
    }

    /// Parameters of every call received, in order.
    pub fn calls(&self) -> Vec<ParameterSnapshot> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl SimulationModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn simulate(&self, params: &ParameterSnapshot) -> ScenarioResult<DecodedResult> {
        let (call, latency) = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            calls.push(params.clone());
            let call = calls.len() - 1;
            let latency = self.latency.lock().unwrap_or_else(PoisonError::into_inner).next(call);
            (call, latency)
        };
        tokio::time::sleep(latency).await;
        let body = (self.responder)(call, params)?;
        Ok(SimulationResult::decode(&body))
    }
}
