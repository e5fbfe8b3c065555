//! Visualization adapters: ResultViewModel → per-widget display data.
//!
//! Pure functions. No I/O, no state, no failure paths: every input,
//! including the empty view-model, maps to something renderable.

use crate::{
    result::{Alert, CellColor, ExecutionRisk, HeatmapCol, HeatmapRow, SeverityRank},
    view_model::{HeatmapCellView, ResultViewModel},
};
use serde::{Deserialize, Serialize};

/// Shown in a heatmap slot the result has no cell for.
pub const PLACEHOLDER: &str = "-";

/// The alert panel's empty state.
pub const NOMINAL_MESSAGE: &str = "System nominal. No critical alerts.";

// ── Score cards ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Low,
    Mid,
    High,
}

/// `< 40` low, `40..60` mid, `>= 60` high.
pub fn score_tier(score: i64) -> Tier {
    match score {
        s if s < 40 => Tier::Low,
        s if s < 60 => Tier::Mid,
        _ => Tier::High,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Economic,
    Environmental,
    Strategic,
    Overall,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 4] = [Self::Economic, Self::Environmental, Self::Strategic, Self::Overall];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Economic      => "Economic",
            Self::Environmental => "Environmental",
            Self::Strategic     => "Strategic",
            Self::Overall       => "Overall Score",
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, Self::Overall)
    }
}

/// Card styling. The main card is always `Emphasis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardTier {
    Low,
    Mid,
    High,
    Emphasis,
}

impl From<Tier> for CardTier {
    fn from(t: Tier) -> Self {
        match t {
            Tier::Low  => Self::Low,
            Tier::Mid  => Self::Mid,
            Tier::High => Self::High,
        }
    }
}

pub fn card_tier(kind: ScoreKind, score: i64) -> CardTier {
    if kind.is_main() {
        CardTier::Emphasis
    } else {
        score_tier(score).into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreCardView {
    pub kind:      ScoreKind,
    pub title:     &'static str,
    pub score:     i64,
    /// Magnitude bucket, also computed for the main card.
    pub magnitude: Tier,
    pub tier:      CardTier,
}

pub fn score_cards(vm: &ResultViewModel) -> [ScoreCardView; 4] {
    ScoreKind::ALL.map(|kind| {
        let score = match kind {
            ScoreKind::Economic      => vm.scores.economic,
            ScoreKind::Environmental => vm.scores.environmental,
            ScoreKind::Strategic     => vm.scores.strategic,
            ScoreKind::Overall       => vm.scores.overall,
        };
        ScoreCardView {
            kind,
            title: kind.title(),
            score,
            magnitude: score_tier(score),
            tier: card_tier(kind, score),
        }
    })
}

// ── Heatmap ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellDisplay {
    Value { value: i64, color: CellColor },
    Placeholder,
}

impl CellDisplay {
    pub fn text(&self) -> String {
        match self {
            Self::Value { value, .. } => value.to_string(),
            Self::Placeholder => PLACEHOLDER.to_string(),
        }
    }
}

/// First cell matching both labels, or the placeholder.
pub fn heatmap_cell(cells: &[HeatmapCellView], row: HeatmapRow, col: HeatmapCol) -> CellDisplay {
    cells
        .iter()
        .find(|c| c.row == row && c.col == col)
        .map(|c| CellDisplay::Value { value: c.value, color: c.color })
        .unwrap_or(CellDisplay::Placeholder)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapGrid {
    pub rows:  [HeatmapRow; 3],
    pub cols:  [HeatmapCol; 3],
    /// `cells[r][c]` for `rows[r]` × `cols[c]`.
    pub cells: [[CellDisplay; 3]; 3],
}

pub fn heatmap_grid(vm: &ResultViewModel) -> HeatmapGrid {
    HeatmapGrid {
        rows:  HeatmapRow::ALL,
        cols:  HeatmapCol::ALL,
        cells: HeatmapRow::ALL.map(|row| HeatmapCol::ALL.map(|col| heatmap_cell(&vm.heatmap, row, col))),
    }
}

// ── Alerts ─────────────────────────────────────────────────────────

/// One alert as the panel prints it. `title` is "<label> Priority" with
/// the label exactly as sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRow {
    pub title:   String,
    pub message: String,
}

impl AlertRow {
    pub fn from_alert(alert: &Alert) -> Self {
        Self {
            title:   format!("{} Priority", alert.severity.label()),
            message: alert.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertGroup {
    pub severity: SeverityRank,
    pub alerts:   Vec<AlertRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AlertPanel {
    Nominal { message: String },
    Grouped { groups: Vec<AlertGroup> },
}

/// Groups in severity order (high, medium, low, unrecognized); empty
/// groups are left out, arrival order is kept inside a group.
pub fn alert_panel(vm: &ResultViewModel) -> AlertPanel {
    if vm.alerts.is_empty() {
        return AlertPanel::Nominal { message: NOMINAL_MESSAGE.to_string() };
    }
    let groups = SeverityRank::DISPLAY_ORDER
        .iter()
        .filter_map(|&rank| {
            let alerts: Vec<AlertRow> = vm
                .alerts
                .iter()
                .filter(|a| a.severity.rank() == rank)
                .map(AlertRow::from_alert)
                .collect();
            (!alerts.is_empty()).then(|| AlertGroup { severity: rank, alerts })
        })
        .collect();
    AlertPanel::Grouped { groups }
}

// ── Radar ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RadarAxis {
    pub subject:   &'static str,
    pub value:     i64,
    pub full_mark: i64,
}

/// Always three axes, in this order: economic, strategic, environmental.
pub fn radar_axes(vm: &ResultViewModel) -> [RadarAxis; 3] {
    let axis = |subject, value| RadarAxis { subject, value, full_mark: 100 };
    [
        axis("economic", vm.scores.economic),
        axis("strategic", vm.scores.strategic),
        axis("environmental", vm.scores.environmental),
    ]
}

// ── Deep metrics ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricTone {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricBox {
    pub label: &'static str,
    pub value: String,
    pub unit:  &'static str,
    pub tone:  MetricTone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeepMetricsPanel {
    pub financial:      Vec<MetricBox>,
    pub environmental:  Vec<MetricBox>,
    pub strategic:      Vec<MetricBox>,
    pub execution_risk: ExecutionRisk,
}

pub fn deep_metrics(vm: &ResultViewModel) -> DeepMetricsPanel {
    let d = &vm.details;
    let metric = |label, value: String, unit, tone| MetricBox { label, value, unit, tone };
    let roi_tone = if d.roi_percent > 0.0 { MetricTone::Positive } else { MetricTone::Negative };

    DeepMetricsPanel {
        financial: vec![
            metric("ROI", format!("{:.1}", d.roi_percent), "%", roi_tone),
            metric("Payback", format!("{:.1}", d.payback_years), "Yrs", MetricTone::Neutral),
            metric("Viability", d.financial_viability.to_string(), "/100", MetricTone::Neutral),
        ],
        environmental: vec![
            metric("Reduction", d.carbon_reduction_tons.to_string(), "tCO2e", MetricTone::Positive),
            metric("Net Zero", format!("{:.1}", d.net_zero_progress), "%", MetricTone::Neutral),
        ],
        strategic: vec![
            metric("Resilience", d.resilience_index.to_string(), "Idx", MetricTone::Neutral),
        ],
        execution_risk: d.execution_risk,
    }
}

// ── Projections ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMetric {
    Revenue,
    NetProfit,
}

impl ProjectionMetric {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Revenue   => "Revenue",
            Self::NetProfit => "Net Profit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year:     i32,
    pub baseline: i64,
    pub strategy: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionSeries {
    pub title:  &'static str,
    pub points: Vec<SeriesPoint>,
}

pub fn projection_series(vm: &ResultViewModel, metric: ProjectionMetric) -> ProjectionSeries {
    let points = vm
        .projections
        .iter()
        .map(|p| {
            let (baseline, strategy) = match metric {
                ProjectionMetric::Revenue   => (p.revenue_a, p.revenue_b),
                ProjectionMetric::NetProfit => (p.profit_a, p.profit_b),
            };
            SeriesPoint { year: p.year, baseline, strategy }
        })
        .collect();
    ProjectionSeries { title: metric.title(), points }
}

/// Everything the results panel renders, in one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardPanels {
    pub score_cards: [ScoreCardView; 4],
    pub heatmap:     HeatmapGrid,
    pub alerts:      AlertPanel,
    pub radar:       [RadarAxis; 3],
    pub metrics:     DeepMetricsPanel,
    pub revenue:     ProjectionSeries,
    pub net_profit:  ProjectionSeries,
}

pub fn dashboard_panels(vm: &ResultViewModel) -> DashboardPanels {
    DashboardPanels {
        score_cards: score_cards(vm),
        heatmap:     heatmap_grid(vm),
        alerts:      alert_panel(vm),
        radar:       radar_axes(vm),
        metrics:     deep_metrics(vm),
        revenue:     projection_series(vm, ProjectionMetric::Revenue),
        net_profit:  projection_series(vm, ProjectionMetric::NetProfit),
    }
}
