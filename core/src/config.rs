//! Scenario variant configuration: parameter schema, presets, endpoint.
//!
//! A variant ("business_impact", "global_climate") is data, not code.
//! Each lives in `data/scenarios/<id>.json` and is validated on load;
//! the two built-ins are embedded so tests and the runner need no files.

use crate::{
    error::{ScenarioError, ScenarioResult},
    parameters::ParamValue,
    types::{ParamKey, VariantId},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, time::Duration};

/// Quiet period before a burst of edits turns into one request.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Where the dashboard backend is served during development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

const BUSINESS_IMPACT_JSON: &str = include_str!("../../data/scenarios/business_impact.json");
const GLOBAL_CLIMATE_JSON: &str = include_str!("../../data/scenarios/global_climate.json");

// ── Parameter schema ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamKind {
    Bounded { min: f64, max: f64, step: f64 },
    /// Stored as a fraction; widgets show and edit it ×100.
    Percentage { min: f64, max: f64, step: f64 },
    Choice { options: Vec<String> },
    /// A number restricted to a fixed set, e.g. forecast horizons 5, 7, 10.
    /// Other numbers snap to the nearest option, the lower one on a tie.
    Discrete { options: Vec<f64> },
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bounded { .. }    => "bounded",
            Self::Percentage { .. } => "percentage",
            Self::Choice { .. }     => "choice",
            Self::Discrete { .. }   => "discrete",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterSpec {
    pub key:     ParamKey,
    pub label:   String,
    #[serde(flatten)]
    pub kind:    ParamKind,
    pub default: ParamValue,
}

impl ParameterSpec {
    /// Bring `value` into this parameter's domain.
    ///
    /// - `Ok(Some(v))`: store `v` (numeric values are clamped to [min, max]).
    /// - `Ok(None)`:    nothing sensible to store; keep the current value.
    /// - `Err(..)`:     wrong value kind for this parameter.
    pub fn admit(&self, value: &ParamValue) -> ScenarioResult<Option<ParamValue>> {
        match (&self.kind, value) {
            (
                ParamKind::Bounded { min, max, .. } | ParamKind::Percentage { min, max, .. },
                ParamValue::Number(v),
            ) => {
                if v.is_nan() {
                    log::warn!("{}: NaN rejected, keeping current value", self.key);
                    return Ok(None);
                }
                let clamped = v.clamp(*min, *max);
                if clamped != *v {
                    log::debug!("{}: {v} outside [{min}, {max}], clamped to {clamped}", self.key);
                }
                Ok(Some(ParamValue::Number(clamped)))
            }
            (ParamKind::Discrete { options }, ParamValue::Number(v)) => {
                if v.is_nan() {
                    log::warn!("{}: NaN rejected, keeping current value", self.key);
                    return Ok(None);
                }
                let Some(nearest) = nearest_option(options, *v) else {
                    return Ok(None);
                };
                if nearest != *v {
                    log::debug!("{}: {v} is not one of {options:?}, snapped to {nearest}", self.key);
                }
                Ok(Some(ParamValue::Number(nearest)))
            }
            (ParamKind::Choice { options }, ParamValue::Choice(label)) => {
                if options.iter().any(|o| o == label) {
                    Ok(Some(value.clone()))
                } else {
                    log::warn!("{}: '{label}' is not one of {options:?}, keeping current value", self.key);
                    Ok(None)
                }
            }
            (kind, _) => Err(ScenarioError::Validation {
                key:    self.key.clone(),
                reason: format!("expected a {} value, got {value}", kind.name()),
            }),
        }
    }

    /// Convert a widget-facing number to its stored form.
    pub fn from_display(&self, shown: f64) -> f64 {
        match self.kind {
            ParamKind::Percentage { .. } => shown / 100.0,
            _ => shown,
        }
    }

    /// The value as a widget shows it (percentages ×100). None for choices.
    pub fn display_value(&self, value: &ParamValue) -> Option<f64> {
        let v = value.as_f64()?;
        match self.kind {
            ParamKind::Percentage { .. } => Some(v * 100.0),
            ParamKind::Bounded { .. } | ParamKind::Discrete { .. } => Some(v),
            ParamKind::Choice { .. }     => None,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match &self.kind {
            ParamKind::Bounded { min, max, step } | ParamKind::Percentage { min, max, step } => {
                if !(min.is_finite() && max.is_finite()) || min > max {
                    return Err(format!("{}: bad range [{min}, {max}]", self.key));
                }
                if !(*step > 0.0) {
                    return Err(format!("{}: step must be > 0, got {step}", self.key));
                }
            }
            ParamKind::Choice { options } => {
                if options.is_empty() {
                    return Err(format!("{}: choice parameter has no options", self.key));
                }
            }
            ParamKind::Discrete { options } => {
                if options.is_empty() {
                    return Err(format!("{}: discrete parameter has no options", self.key));
                }
                if let Some(bad) = options.iter().find(|o| !o.is_finite()) {
                    return Err(format!("{}: option {bad} is not finite", self.key));
                }
            }
        }
        match self.admit(&self.default) {
            Ok(Some(admitted)) if admitted == self.default => Ok(()),
            _ => Err(format!("{}: default {} is outside its domain", self.key, self.default)),
        }
    }
}

/// Closest option to `v`; ties go to the smaller option.
fn nearest_option(options: &[f64], v: f64) -> Option<f64> {
    options.iter().copied().fold(None, |best, o| match best {
        None => Some(o),
        Some(b) => {
            let (db, d) = ((b - v).abs(), (o - v).abs());
            if d < db || (d == db && o < b) { Some(o) } else { Some(b) }
        }
    })
}

// ── Presets ────────────────────────────────────────────────────────

/// A named, partial override of the parameter set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    pub name:   String,
    pub values: BTreeMap<ParamKey, ParamValue>,
}

// ── Variant file ───────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct ScenarioVariantFile {
    id:         VariantId,
    label:      String,
    endpoint:   String,
    parameters: Vec<ParameterSpec>,
    #[serde(default)]
    presets:    Vec<Preset>,
}

/// A validated scenario variant: declaration-ordered parameters,
/// registered presets and the model endpoint they are posted to.
#[derive(Debug, Clone)]
pub struct ScenarioSchema {
    pub id:       VariantId,
    pub label:    String,
    pub endpoint: String,
    params:       Vec<ParameterSpec>,
    presets:      Vec<Preset>,
}

impl ScenarioSchema {
    /// Load `<data_dir>/scenarios/<id>.json`.
    pub fn load_variant(data_dir: &str, id: &str) -> ScenarioResult<Self> {
        Self::load(format!("{data_dir}/scenarios/{id}.json"))
    }

    pub fn load(path: impl AsRef<Path>) -> ScenarioResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ScenarioResult<Self> {
        let file: ScenarioVariantFile = serde_json::from_str(content)?;
        Self::build(file)
    }

    /// The SME "business impact" variant.
    pub fn business_impact() -> ScenarioResult<Self> {
        Self::from_json(BUSINESS_IMPACT_JSON)
    }

    /// The EN-ROADS style "global climate" variant.
    pub fn global_climate() -> ScenarioResult<Self> {
        Self::from_json(GLOBAL_CLIMATE_JSON)
    }

    /// Look up a built-in variant by id.
    pub fn builtin(id: &str) -> ScenarioResult<Self> {
        match id {
            "business_impact" => Self::business_impact(),
            "global_climate"  => Self::global_climate(),
            other => Err(ScenarioError::InvalidSchema {
                reason: format!("no built-in variant '{other}'"),
            }),
        }
    }

    fn build(file: ScenarioVariantFile) -> ScenarioResult<Self> {
        let invalid = |reason: String| ScenarioError::InvalidSchema { reason };

        let mut seen = std::collections::BTreeSet::new();
        for spec in &file.parameters {
            if !seen.insert(spec.key.as_str()) {
                return Err(invalid(format!("duplicate parameter '{}'", spec.key)));
            }
            spec.validate().map_err(invalid)?;
        }

        let schema = Self {
            id:       file.id,
            label:    file.label,
            endpoint: file.endpoint,
            params:   file.parameters,
            presets:  Vec::new(),
        };

        let mut presets: Vec<Preset> = Vec::with_capacity(file.presets.len());
        for preset in file.presets {
            if presets.iter().any(|p| p.name == preset.name) {
                return Err(invalid(format!("duplicate preset '{}'", preset.name)));
            }
            for (key, value) in &preset.values {
                let spec = schema.spec(key).ok_or_else(|| {
                    invalid(format!("preset '{}' sets unknown parameter '{key}'", preset.name))
                })?;
                match spec.admit(value) {
                    Ok(Some(_)) => {}
                    _ => {
                        return Err(invalid(format!(
                            "preset '{}' has invalid value {value} for '{key}'",
                            preset.name
                        )))
                    }
                }
            }
            presets.push(preset);
        }

        Ok(Self { presets, ..schema })
    }

    pub fn spec(&self, key: &str) -> Option<&ParameterSpec> {
        self.params.iter().find(|p| p.key == key)
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|p| p.name.as_str())
    }

    /// Every parameter at its declared default.
    pub fn defaults(&self) -> BTreeMap<ParamKey, ParamValue> {
        self.params
            .iter()
            .map(|p| (p.key.clone(), p.default.clone()))
            .collect()
    }
}

// ── Runtime settings ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub debounce:       Duration,
    /// Schedule a request as soon as the orchestrator starts (view mount).
    pub fetch_on_start: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            debounce:       DEFAULT_DEBOUNCE,
            fetch_on_start: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url:        String,
    /// None: wait as long as the transport does.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url:        DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Join `path` onto the base URL without doubling slashes.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn http_client(&self) -> ScenarioResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}
