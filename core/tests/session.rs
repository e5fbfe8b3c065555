//! ScenarioSession wiring, commands and test doubles.

use scenario_core::{
    adapters::AlertPanel,
    command::ScenarioCommand,
    config::{OrchestratorConfig, ScenarioSchema},
    dashboard_client::category_filter,
    error::ScenarioError,
    mock::{LatencyRng, ScriptedModel},
    orchestrator::QueryStatus,
    parameters::ParamValue,
    session::ScenarioSession,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};

fn climate_body() -> serde_json::Value {
    json!({
        "scores": { "economic": 48, "environmental": 71, "strategic": 55, "overall": 58 },
        "heatmap": [{ "row": "Environmental", "col": "Upside", "value": 80, "color": "green" }],
        "alerts": [{ "severity": "low", "message": "Afforestation lag" }],
        "details": {
            "financial_viability": 50, "roi_percent": 3.14, "payback_years": 9.96,
            "carbon_reduction_tons": 12000, "net_zero_progress": 41.25,
            "execution_risk_factor": "High", "resilience_index": 60
        },
        "projections": [{ "year": 2030, "revenue_a": 100, "revenue_b": 120, "profit_a": 10, "profit_b": 15 }]
    })
}

fn climate_session(model: &Arc<ScriptedModel>) -> ScenarioSession {
    let schema = Arc::new(ScenarioSchema::global_climate().expect("built-in schema"));
    ScenarioSession::start(schema, model.clone(), OrchestratorConfig::default())
}

#[test]
fn commands_deserialize_from_ui_json() {
    let set: ScenarioCommand = serde_json::from_str(r#"{"cmd": "set", "key": "afforestation", "value": 40}"#).unwrap();
    assert!(matches!(set, ScenarioCommand::Set { ref key, value: ParamValue::Number(v) } if key == "afforestation" && v == 40.0));

    let choice: ScenarioCommand = serde_json::from_str(r#"{"cmd": "set", "key": "industry", "value": "Retail"}"#).unwrap();
    assert!(matches!(choice, ScenarioCommand::Set { value: ParamValue::Choice(ref s), .. } if s == "Retail"));

    let preset: ScenarioCommand = serde_json::from_str(r#"{"cmd": "apply_preset", "name": "Aggressive"}"#).unwrap();
    assert!(matches!(preset, ScenarioCommand::ApplyPreset { ref name } if name == "Aggressive"));
}

#[test]
fn literals_parse_numbers_before_labels() {
    assert_eq!(ParamValue::parse_literal(" 0.25 "), ParamValue::Number(0.25));
    assert_eq!(ParamValue::parse_literal("North America"), ParamValue::Choice("North America".into()));
}

#[tokio::test(start_paused = true)]
async fn session_runs_end_to_end() {
    let model = Arc::new(ScriptedModel::constant(climate_body()).with_latency(Duration::from_millis(80)));
    let mut session = climate_session(&model);

    session.apply(ScenarioCommand::ApplyPreset { name: "Conservative".into() }).unwrap();
    session.apply(ScenarioCommand::SetDisplay { key: "afforestation".into(), value: 35.0 }).unwrap();
    let view = session.settled().await;

    assert_eq!(view.status, QueryStatus::Resolved);
    assert_eq!(model.call_count(), 1, "mount fetch and edits coalesce inside the debounce window");
    assert_eq!(model.calls()[0].number("afforestation"), Some(35.0));
    assert_eq!(model.calls()[0].number("methane_reduction"), Some(25.0));
    assert!(session.store().active_preset().is_none(), "manual edit after the preset");

    let panels = session.panels();
    assert_eq!(panels.score_cards[1].score, 71);
    assert_eq!(panels.heatmap.cells[1][0].text(), "80");
    assert!(matches!(panels.alerts, AlertPanel::Grouped { ref groups } if groups.len() == 1));
    assert_eq!(panels.metrics.financial[1].value, "10.0");
    assert_eq!(panels.revenue.points.len(), 1);

    session.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn rejected_commands_do_not_schedule() {
    let model = Arc::new(ScriptedModel::constant(climate_body()));
    let mut session = climate_session(&model);
    session.settled().await;

    let err = session.apply(ScenarioCommand::ApplyPreset { name: "Moonshot".into() }).unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownPreset { .. }));
    let err = session.update("sea_level", 3.0).unwrap_err();
    assert!(matches!(err, ScenarioError::UnknownParameter { .. }));

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(model.call_count(), 1);
    assert_eq!(session.view().status, QueryStatus::Resolved);
}

#[test]
fn latency_rng_is_seeded_and_bounded() {
    let mut a = LatencyRng::new(42);
    let mut b = LatencyRng::new(42);
    let (min, max) = (Duration::from_millis(10), Duration::from_millis(900));

    for _ in 0..1_000 {
        let d = a.between(min, max);
        assert_eq!(d, b.between(min, max), "same seed, same sequence");
        assert!(d >= min && d < max, "{d:?} outside [{min:?}, {max:?})");
    }
    assert_ne!(LatencyRng::new(1).next_f64(), LatencyRng::new(2).next_f64());
}

#[tokio::test(start_paused = true)]
async fn scripted_latencies_repeat_the_last_entry() {
    use scenario_core::model::SimulationModel;

    let model = ScriptedModel::constant(climate_body())
        .with_latencies(vec![Duration::from_millis(100), Duration::from_millis(30)]);
    let schema = Arc::new(ScenarioSchema::global_climate().unwrap());
    let params = scenario_core::parameters::ParameterStore::new(schema).snapshot();

    let mut elapsed = Vec::new();
    for _ in 0..3 {
        let started = tokio::time::Instant::now();
        let decoded = model.simulate(&params).await.unwrap();
        assert!(decoded.malformed.is_empty());
        elapsed.push(started.elapsed().as_millis());
    }
    assert_eq!(elapsed, [100, 30, 30]);
}

#[test]
fn category_filter_treats_all_as_unfiltered() {
    assert_eq!(category_filter(None), None);
    assert_eq!(category_filter(Some("All")), None);
    assert_eq!(category_filter(Some("  ")), None);
    assert_eq!(category_filter(Some("Transport")), Some("transport".to_string()));
}
