//! The external model's response, as it arrives on the wire.
//!
//! Decoding never fails. A field that is missing or has the wrong shape
//! is replaced by its zero/empty default and reported as a
//! `MalformedField`; list elements that cannot be read are skipped.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeatmapRow {
    Economic,
    Environmental,
    Strategic,
}

impl HeatmapRow {
    pub const ALL: [HeatmapRow; 3] = [Self::Economic, Self::Environmental, Self::Strategic];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Economic      => "Economic",
            Self::Environmental => "Environmental",
            Self::Strategic     => "Strategic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeatmapCol {
    Upside,
    Risk,
    Feasibility,
}

impl HeatmapCol {
    pub const ALL: [HeatmapCol; 3] = [Self::Upside, Self::Risk, Self::Feasibility];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Upside      => "Upside",
            Self::Risk        => "Risk",
            Self::Feasibility => "Feasibility",
        }
    }
}

/// Qualitative colour the model assigns to a heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellColor {
    Red,
    Yellow,
    Green,
    #[default]
    #[serde(other)]
    Neutral,
}

/// Where an alert sorts in the alert panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityRank {
    High,
    Medium,
    Low,
    Unrecognized,
}

impl SeverityRank {
    /// Display order: most severe first, unknown labels last.
    pub const DISPLAY_ORDER: [SeverityRank; 4] = [Self::High, Self::Medium, Self::Low, Self::Unrecognized];
}

/// Alert severity as sent. Labels outside high/medium/low are kept
/// verbatim so the panel can still show them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Severity {
    High,
    Medium,
    Low,
    Unrecognized(String),
}

impl Severity {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high"   => Self::High,
            "medium" => Self::Medium,
            "low"    => Self::Low,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }

    pub fn rank(&self) -> SeverityRank {
        match self {
            Self::High            => SeverityRank::High,
            Self::Medium          => SeverityRank::Medium,
            Self::Low             => SeverityRank::Low,
            Self::Unrecognized(_) => SeverityRank::Unrecognized,
        }
    }

    /// The label a widget prints before "Priority".
    pub fn label(&self) -> &str {
        match self {
            Self::High            => "high",
            Self::Medium          => "medium",
            Self::Low             => "low",
            Self::Unrecognized(s) => s,
        }
    }
}

/// A missing severity is an empty, unrecognized label.
impl Default for Severity {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|raw| Self::parse(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionRisk {
    #[default]
    Low,
    #[serde(alias = "Med")]
    Medium,
    High,
}

impl ExecutionRisk {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low    => "Low",
            Self::Medium => "Medium",
            Self::High   => "High",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub economic:      f64,
    pub environmental: f64,
    pub strategic:     f64,
    pub overall:       f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub row:   HeatmapRow,
    pub col:   HeatmapCol,
    pub value: f64,
    #[serde(default)]
    pub color: CellColor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub severity: Severity,
    pub message:  String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Details {
    pub financial_viability:   f64,
    pub roi_percent:           f64,
    pub payback_years:         f64,
    pub carbon_reduction_tons: f64,
    pub net_zero_progress:     f64,
    pub execution_risk_factor: ExecutionRisk,
    pub resilience_index:      f64,
}

/// One period of the two-track projection (A = baseline, B = strategy).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionPoint {
    pub year:      i32,
    pub revenue_a: f64,
    pub revenue_b: f64,
    pub profit_a:  f64,
    pub profit_b:  f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub scores:      Scores,
    pub heatmap:     Vec<HeatmapCell>,
    pub alerts:      Vec<Alert>,
    pub details:     Details,
    pub projections: Vec<ProjectionPoint>,
}

/// A part of the payload that could not be used as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalformedField {
    pub field:  String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct DecodedResult {
    pub result:    SimulationResult,
    pub malformed: Vec<MalformedField>,
}

impl SimulationResult {
    /// Decode a response body, defaulting whatever is unusable.
    pub fn decode(body: &Value) -> DecodedResult {
        let mut d = Decoder::default();
        let Some(obj) = body.as_object() else {
            d.note("$", format!("expected an object, got {}", kind_of(body)));
            return DecodedResult { result: Self::default(), malformed: d.malformed };
        };

        let scores = match d.object(obj, "scores") {
            Some(s) => Scores {
                economic:      d.field(s, "scores", "economic"),
                environmental: d.field(s, "scores", "environmental"),
                strategic:     d.field(s, "scores", "strategic"),
                overall:       d.field(s, "scores", "overall"),
            },
            None => Scores::default(),
        };

        let details = match d.object(obj, "details") {
            Some(s) => Details {
                financial_viability:   d.field(s, "details", "financial_viability"),
                roi_percent:           d.field(s, "details", "roi_percent"),
                payback_years:         d.field(s, "details", "payback_years"),
                carbon_reduction_tons: d.field(s, "details", "carbon_reduction_tons"),
                net_zero_progress:     d.field(s, "details", "net_zero_progress"),
                execution_risk_factor: d.field(s, "details", "execution_risk_factor"),
                resilience_index:      d.field(s, "details", "resilience_index"),
            },
            None => Details::default(),
        };

        let result = Self {
            scores,
            heatmap:     d.list(obj, "heatmap", true),
            alerts:      d.list(obj, "alerts", true),
            details,
            // The business-impact endpoint never sends projections.
            projections: d.list(obj, "projections", false),
        };

        for m in &d.malformed {
            log::warn!("malformed result field {}: {}", m.field, m.reason);
        }
        DecodedResult { result, malformed: d.malformed }
    }
}

#[derive(Default)]
struct Decoder {
    malformed: Vec<MalformedField>,
}

impl Decoder {
    fn note(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.malformed.push(MalformedField { field: field.into(), reason: reason.into() });
    }

    fn object<'a>(&mut self, obj: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
        match obj.get(key) {
            Some(Value::Object(inner)) => Some(inner),
            None | Some(Value::Null) => {
                self.note(key, "missing");
                None
            }
            Some(other) => {
                self.note(key, format!("expected an object, got {}", kind_of(other)));
                None
            }
        }
    }

    fn field<T: DeserializeOwned + Default>(&mut self, obj: &Map<String, Value>, parent: &str, key: &str) -> T {
        let path = format!("{parent}.{key}");
        match obj.get(key) {
            None | Some(Value::Null) => {
                self.note(path, "missing");
                T::default()
            }
            Some(v) => T::deserialize(v).unwrap_or_else(|e| {
                self.note(path, e.to_string());
                T::default()
            }),
        }
    }

    fn list<T: DeserializeOwned>(&mut self, obj: &Map<String, Value>, key: &str, required: bool) -> Vec<T> {
        let items = match obj.get(key) {
            Some(Value::Array(items)) => items,
            None | Some(Value::Null) => {
                if required {
                    self.note(key, "missing");
                }
                return Vec::new();
            }
            Some(other) => {
                self.note(key, format!("expected an array, got {}", kind_of(other)));
                return Vec::new();
            }
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| match T::deserialize(item) {
                Ok(v) => Some(v),
                Err(e) => {
                    self.note(format!("{key}[{i}]"), e.to_string());
                    None
                }
            })
            .collect()
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}
