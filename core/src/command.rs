use serde::{Deserialize, Serialize};
use crate::parameters::ParamValue;

/// Every edit a view can make to its scenario.
/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ScenarioCommand {
    /// Stored units (fractions for percentages).
    Set { key: String, value: ParamValue },

    /// Widget units (percentages ×100).
    SetDisplay { key: String, value: f64 },

    ApplyPreset { name: String },
}
