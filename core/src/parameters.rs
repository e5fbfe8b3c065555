//! ParameterStore: the live scenario parameter set for one view.
//!
//! RULE: every stored value lies inside its declared domain.
//! Out-of-range numbers are clamped on the way in; unrecognised choice
//! labels leave the current value in place.
//!
//! Observers subscribe to a watch channel. Every accepted mutation
//! bumps the revision and publishes exactly one `StoreChange`.

use crate::{
    config::{ParameterSpec, ScenarioSchema},
    error::{ScenarioError, ScenarioResult},
    types::ParamKey,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, sync::Arc};
use tokio::sync::watch;

/// A single parameter value as it travels in the flat request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Choice(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Choice(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Choice(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    /// Parse a command-line style literal: numbers first, labels otherwise.
    pub fn parse_literal(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) => Self::Number(v),
            Err(_) => Self::Choice(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Choice(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self { Self::Number(v) }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self { Self::Number(v as f64) }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self { Self::Choice(s.to_string()) }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self { Self::Choice(s) }
}

/// An immutable view of the parameter mapping. Cheap to clone.
/// Serializes as the flat JSON object the model endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSnapshot(Arc<BTreeMap<ParamKey, ParamValue>>);

impl ParameterSnapshot {
    fn new(values: BTreeMap<ParamKey, ParamValue>) -> Self {
        Self(Arc::new(values))
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ParamValue::as_f64)
    }

    pub fn choice(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &ParamValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<ParamKey, ParamValue> {
        (*self.0).clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeCause {
    Initialized,
    Updated { key: ParamKey },
    PresetApplied { name: String },
}

/// What observers receive on every accepted mutation.
#[derive(Debug, Clone)]
pub struct StoreChange {
    pub revision: u64,
    pub snapshot: ParameterSnapshot,
    pub cause:    ChangeCause,
}

pub struct ParameterStore {
    schema:        Arc<ScenarioSchema>,
    snapshot:      ParameterSnapshot,
    revision:      u64,
    active_preset: Option<String>,
    notifier:      watch::Sender<StoreChange>,
}

impl ParameterStore {
    /// Establish the starting snapshot: schema defaults, overlaid with
    /// `defaults`. Overrides are admitted like any other write.
    pub fn initialize(
        schema: Arc<ScenarioSchema>,
        defaults: BTreeMap<ParamKey, ParamValue>,
    ) -> ScenarioResult<Self> {
        let mut values = schema.defaults();
        for (key, value) in defaults {
            let spec = Self::spec_in(&schema, &key)?;
            if let Some(admitted) = spec.admit(&value)? {
                values.insert(key, admitted);
            }
        }
        Ok(Self::with_values(schema, values))
    }

    /// A store at the schema's declared defaults.
    pub fn new(schema: Arc<ScenarioSchema>) -> Self {
        let values = schema.defaults();
        Self::with_values(schema, values)
    }

    fn with_values(schema: Arc<ScenarioSchema>, values: BTreeMap<ParamKey, ParamValue>) -> Self {
        let snapshot = ParameterSnapshot::new(values);
        let (notifier, _) = watch::channel(StoreChange {
            revision: 0,
            snapshot: snapshot.clone(),
            cause:    ChangeCause::Initialized,
        });
        Self {
            schema,
            snapshot,
            revision: 0,
            active_preset: None,
            notifier,
        }
    }

    /// Set one parameter. Returns the resulting snapshot.
    ///
    /// Writing the value already stored (after clamping) is not a change
    /// and publishes nothing.
    pub fn update(&mut self, key: &str, value: impl Into<ParamValue>) -> ScenarioResult<ParameterSnapshot> {
        let value = value.into();
        let spec = Self::spec_in(&self.schema, key)?;
        let Some(admitted) = spec.admit(&value)? else {
            return Ok(self.snapshot.clone());
        };
        if self.snapshot.get(key) == Some(&admitted) {
            return Ok(self.snapshot.clone());
        }

        let mut values = self.snapshot.to_map();
        values.insert(key.to_string(), admitted);
        self.active_preset = None;
        self.publish(values, ChangeCause::Updated { key: key.to_string() });
        Ok(self.snapshot.clone())
    }

    /// Like `update`, but `shown` is in widget units (percentages ×100).
    pub fn update_display(&mut self, key: &str, shown: f64) -> ScenarioResult<ParameterSnapshot> {
        let stored = Self::spec_in(&self.schema, key)?.from_display(shown);
        self.update(key, stored)
    }

    /// Merge a registered preset. Only the keys it lists are touched,
    /// and observers see a single change for the whole merge.
    pub fn apply_preset(&mut self, name: &str) -> ScenarioResult<ParameterSnapshot> {
        let preset = self
            .schema
            .preset(name)
            .ok_or_else(|| ScenarioError::UnknownPreset { name: name.to_string() })?;

        let mut values = self.snapshot.to_map();
        for (key, value) in &preset.values {
            let spec = Self::spec_in(&self.schema, key)?;
            if let Some(admitted) = spec.admit(value)? {
                values.insert(key.clone(), admitted);
            }
        }
        self.active_preset = Some(preset.name.clone());
        self.publish(values, ChangeCause::PresetApplied { name: name.to_string() });
        Ok(self.snapshot.clone())
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        self.snapshot.clone()
    }

    /// Number of changes published since initialization.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The preset last applied, cleared by any manual edit.
    pub fn active_preset(&self) -> Option<&str> {
        self.active_preset.as_deref()
    }

    pub fn schema(&self) -> &Arc<ScenarioSchema> {
        &self.schema
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreChange> {
        self.notifier.subscribe()
    }

    fn publish(&mut self, values: BTreeMap<ParamKey, ParamValue>, cause: ChangeCause) {
        self.revision += 1;
        self.snapshot = ParameterSnapshot::new(values);
        log::debug!("parameters r{}: {cause:?}", self.revision);
        self.notifier.send_replace(StoreChange {
            revision: self.revision,
            snapshot: self.snapshot.clone(),
            cause,
        });
    }

    fn spec_in<'a>(schema: &'a ScenarioSchema, key: &str) -> ScenarioResult<&'a ParameterSpec> {
        schema
            .spec(key)
            .ok_or_else(|| ScenarioError::UnknownParameter { key: key.to_string() })
    }
}
