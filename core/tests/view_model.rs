//! Response decoding and the display-safe view-model.
//!
//! Widgets must be able to render whatever the model sends, including
//! nothing at all.

use scenario_core::{
    result::{CellColor, ExecutionRisk, HeatmapCol, HeatmapRow, Severity, SimulationResult},
    view_model::{round_amount, round_ratio, round_score, ResultViewModel},
};
use serde_json::json;

fn full_body() -> serde_json::Value {
    json!({
        "scores": { "economic": 62.4, "environmental": 57.5, "strategic": 49.6, "overall": 57.2 },
        "heatmap": [
            { "row": "Economic", "col": "Upside", "value": 71.6, "color": "green" },
            { "row": "Environmental", "col": "Risk", "value": 38.2, "color": "yellow" },
            { "row": "Strategic", "col": "Feasibility", "value": 22.0, "color": "red" }
        ],
        "alerts": [
            { "severity": "medium", "message": "Payback exceeds tolerance" },
            { "severity": "high", "message": "Supplier concentration critical" }
        ],
        "details": {
            "financial_viability": 61.7,
            "roi_percent": 14.06,
            "payback_years": 4.449,
            "carbon_reduction_tons": 1234.5,
            "net_zero_progress": 33.33,
            "execution_risk_factor": "Med",
            "resilience_index": 68.4
        },
        "projections": [
            { "year": 2025, "revenue_a": 1000.4, "revenue_b": 1100.6, "profit_a": 80, "profit_b": 95.5 },
            { "year": 2026, "revenue_a": 1030, "revenue_b": 1190, "profit_a": 82, "profit_b": 110 }
        ]
    })
}

#[test]
fn absent_result_maps_to_empty_defaults() {
    let vm = ResultViewModel::from_result(None);

    assert!(!vm.has_result);
    assert_eq!(vm.scores.economic, 0);
    assert_eq!(vm.scores.overall, 0);
    assert!(vm.heatmap.is_empty());
    assert!(vm.alerts.is_empty());
    assert!(vm.projections.is_empty());
    assert_eq!(vm.details.roi_percent, 0.0);
    assert_eq!(vm.details.execution_risk, ExecutionRisk::Low);
}

#[test]
fn well_formed_body_decodes_without_complaints() {
    let decoded = SimulationResult::decode(&full_body());
    assert!(decoded.malformed.is_empty(), "unexpected: {:?}", decoded.malformed);

    let r = decoded.result;
    assert_eq!(r.heatmap.len(), 3);
    assert_eq!(r.heatmap[0].row, HeatmapRow::Economic);
    assert_eq!(r.heatmap[2].color, CellColor::Red);
    assert_eq!(r.alerts[1].severity, Severity::High);
    assert_eq!(r.details.execution_risk_factor, ExecutionRisk::Medium, "'Med' is accepted");
    assert_eq!(r.projections.len(), 2);
}

#[test]
fn view_model_rounds_per_field_family() {
    let decoded = SimulationResult::decode(&full_body());
    let vm = ResultViewModel::from_result(Some(&decoded.result));

    assert!(vm.has_result);
    assert_eq!(vm.scores.economic, 62);
    assert_eq!(vm.scores.environmental, 58);
    assert_eq!(vm.scores.strategic, 50);
    assert_eq!(vm.scores.overall, 57);

    assert_eq!(vm.details.roi_percent, 14.1);
    assert_eq!(vm.details.payback_years, 4.4);
    assert_eq!(vm.details.net_zero_progress, 33.3);
    assert_eq!(vm.details.carbon_reduction_tons, 1235);
    assert_eq!(vm.details.financial_viability, 62);
    assert_eq!(vm.details.resilience_index, 68);

    assert_eq!(vm.heatmap[0].value, 72);
    assert_eq!(vm.heatmap[0].col, HeatmapCol::Upside);
    assert_eq!(vm.projections[0].revenue_b, 1101);
    assert_eq!(vm.projections[0].profit_b, 96);
}

#[test]
fn alerts_keep_arrival_order_in_the_view_model() {
    let decoded = SimulationResult::decode(&full_body());
    let vm = ResultViewModel::from_result(Some(&decoded.result));
    let messages: Vec<&str> = vm.alerts.iter().map(|a| a.message.as_str()).collect();
    assert_eq!(messages, ["Payback exceeds tolerance", "Supplier concentration critical"]);
}

#[test]
fn rounding_helpers_handle_edges() {
    assert_eq!(round_score(104.0), 100, "scores are clamped to 0..=100");
    assert_eq!(round_score(-3.0), 0);
    assert_eq!(round_score(f64::NAN), 0);
    assert_eq!(round_ratio(-2.26), -2.3);
    assert_eq!(round_ratio(f64::INFINITY), 0.0);
    assert_eq!(round_amount(-1500.5), -1501);
}

#[test]
fn missing_sections_default_and_are_reported() {
    let decoded = SimulationResult::decode(&json!({ "scores": { "economic": 40, "environmental": 41, "strategic": 42, "overall": 43 } }));
    let fields: Vec<&str> = decoded.malformed.iter().map(|m| m.field.as_str()).collect();

    assert!(fields.contains(&"heatmap"));
    assert!(fields.contains(&"alerts"));
    assert!(fields.contains(&"details"));
    assert!(!fields.contains(&"projections"), "projections are optional");

    assert_eq!(decoded.result.scores.overall, 43.0);
    assert!(decoded.result.heatmap.is_empty());
    assert_eq!(decoded.result.details.payback_years, 0.0);
}

#[test]
fn wrong_shapes_are_replaced_not_fatal() {
    let decoded = SimulationResult::decode(&json!({
        "scores": "excellent",
        "heatmap": { "row": "Economic" },
        "alerts": [
            { "severity": "high", "message": "kept" },
            { "severity": "high" },
            { "severity": "catastrophic", "message": "kept, unrecognized" }
        ],
        "details": { "roi_percent": "12%", "execution_risk_factor": "Extreme" }
    }));
    let fields: Vec<&str> = decoded.malformed.iter().map(|m| m.field.as_str()).collect();

    assert!(fields.contains(&"scores"));
    assert!(fields.contains(&"heatmap"));
    assert!(fields.contains(&"alerts[1]"), "alert without message is skipped");
    assert!(fields.contains(&"details.roi_percent"));
    assert!(fields.contains(&"details.execution_risk_factor"));

    let r = decoded.result;
    assert_eq!(r.scores.overall, 0.0);
    assert_eq!(r.alerts.len(), 2);
    assert_eq!(r.alerts[1].severity, Severity::Unrecognized("catastrophic".into()));
    assert_eq!(r.alerts[1].severity.label(), "catastrophic");
    assert_eq!(r.details.execution_risk_factor, ExecutionRisk::Low);
}

#[test]
fn non_object_body_yields_empty_result() {
    let decoded = SimulationResult::decode(&json!([1, 2, 3]));
    assert_eq!(decoded.malformed.len(), 1);
    assert_eq!(decoded.malformed[0].field, "$");

    let vm = ResultViewModel::from_result(Some(&decoded.result));
    assert!(vm.has_result);
    assert_eq!(vm.scores.overall, 0);
}

#[test]
fn unknown_heatmap_colour_falls_back_to_neutral() {
    let decoded = SimulationResult::decode(&json!({
        "heatmap": [{ "row": "Strategic", "col": "Risk", "value": 10, "color": "magenta" }]
    }));
    assert_eq!(decoded.result.heatmap[0].color, CellColor::Neutral);
}
