//! ResultViewModel: the display-safe projection of a result.
//!
//! Widgets never see an absent result: without one every score is 0,
//! every list is empty and every detail is zeroed.
//!
//! Presentation rounding is fixed per field family:
//!   - scores:                      nearest integer, within [0, 100]
//!   - ratios (ROI, payback, net-zero progress): one decimal place
//!   - amounts (currency, tonnes, indices, heatmap values): nearest integer

use crate::{
    orchestrator::ScenarioView,
    result::{Alert, CellColor, ExecutionRisk, HeatmapCol, HeatmapRow, SimulationResult},
};
use serde::{Deserialize, Serialize};

pub fn round_score(v: f64) -> i64 {
    if !v.is_finite() {
        return 0;
    }
    v.clamp(0.0, 100.0).round() as i64
}

pub fn round_ratio(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    (v * 10.0).round() / 10.0
}

pub fn round_amount(v: f64) -> i64 {
    if !v.is_finite() {
        return 0;
    }
    v.round() as i64
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreView {
    pub economic:      i64,
    pub environmental: i64,
    pub strategic:     i64,
    pub overall:       i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCellView {
    pub row:   HeatmapRow,
    pub col:   HeatmapCol,
    pub value: i64,
    pub color: CellColor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailsView {
    pub financial_viability:   i64,
    pub roi_percent:           f64,
    pub payback_years:         f64,
    pub carbon_reduction_tons: i64,
    pub net_zero_progress:     f64,
    pub execution_risk:        ExecutionRisk,
    pub resilience_index:      i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionView {
    pub year:      i32,
    pub revenue_a: i64,
    pub revenue_b: i64,
    pub profit_a:  i64,
    pub profit_b:  i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultViewModel {
    pub scores:      ScoreView,
    pub heatmap:     Vec<HeatmapCellView>,
    pub alerts:      Vec<Alert>,
    pub details:     DetailsView,
    pub projections: Vec<ProjectionView>,
    /// False until the first result is accepted.
    pub has_result:  bool,
    /// Shown result predates a failed round trip.
    pub stale:       bool,
    pub loading:     bool,
}

impl ResultViewModel {
    pub fn from_result(result: Option<&SimulationResult>) -> Self {
        let Some(r) = result else {
            return Self::default();
        };

        let d = &r.details;
        Self {
            scores: ScoreView {
                economic:      round_score(r.scores.economic),
                environmental: round_score(r.scores.environmental),
                strategic:     round_score(r.scores.strategic),
                overall:       round_score(r.scores.overall),
            },
            heatmap: r
                .heatmap
                .iter()
                .map(|c| HeatmapCellView {
                    row:   c.row,
                    col:   c.col,
                    value: round_amount(c.value),
                    color: c.color,
                })
                .collect(),
            alerts: r.alerts.clone(),
            details: DetailsView {
                financial_viability:   round_amount(d.financial_viability),
                roi_percent:           round_ratio(d.roi_percent),
                payback_years:         round_ratio(d.payback_years),
                carbon_reduction_tons: round_amount(d.carbon_reduction_tons),
                net_zero_progress:     round_ratio(d.net_zero_progress),
                execution_risk:        d.execution_risk_factor,
                resilience_index:      round_amount(d.resilience_index),
            },
            projections: r
                .projections
                .iter()
                .map(|p| ProjectionView {
                    year:      p.year,
                    revenue_a: round_amount(p.revenue_a),
                    revenue_b: round_amount(p.revenue_b),
                    profit_a:  round_amount(p.profit_a),
                    profit_b:  round_amount(p.profit_b),
                })
                .collect(),
            has_result: true,
            stale:      false,
            loading:    false,
        }
    }

    pub fn from_view(view: &ScenarioView) -> Self {
        Self {
            stale:   view.stale,
            loading: view.loading(),
            ..Self::from_result(view.result.as_deref())
        }
    }
}
