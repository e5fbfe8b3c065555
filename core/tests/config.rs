//! Scenario variant loading and validation.

use scenario_core::{
    config::{ClientConfig, OrchestratorConfig, ParamKind, ScenarioSchema, DEFAULT_DEBOUNCE},
    error::ScenarioError,
};
use std::time::Duration;

fn variant_json(parameters: &str, presets: &str) -> String {
    format!(
        r#"{{
            "id": "test_variant",
            "label": "Test",
            "endpoint": "/test/run",
            "parameters": [{parameters}],
            "presets": [{presets}]
        }}"#
    )
}

const CAPEX: &str = r#"{"key": "capex", "label": "CAPEX", "kind": "bounded", "min": 0, "max": 100, "step": 1, "default": 30}"#;

fn invalid_reason(json: &str) -> String {
    match ScenarioSchema::from_json(json) {
        Err(ScenarioError::InvalidSchema { reason }) => reason,
        Err(other) => panic!("expected InvalidSchema, got {other}"),
        Ok(_) => panic!("schema should have been rejected"),
    }
}

#[test]
fn builtin_variants_load() {
    let business = ScenarioSchema::business_impact().expect("business_impact");
    assert_eq!(business.id, "business_impact");
    assert_eq!(business.endpoint, "/impact/calculate");
    assert!(business.params().len() > 20);

    let climate = ScenarioSchema::global_climate().expect("global_climate");
    assert_eq!(climate.endpoint, "/climate/simulate");
    assert_eq!(climate.params().len(), 7);

    for schema in [&business, &climate] {
        let names: Vec<&str> = schema.preset_names().collect();
        assert_eq!(names, ["Baseline", "Conservative", "Aggressive"], "{}", schema.id);
    }
}

#[test]
fn builtin_lookup_by_id() {
    assert!(ScenarioSchema::builtin("global_climate").is_ok());
    assert!(matches!(
        ScenarioSchema::builtin("ocean_acidity"),
        Err(ScenarioError::InvalidSchema { .. })
    ));
}

#[test]
fn load_variant_reads_from_data_dir() {
    let data_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");
    let schema = ScenarioSchema::load_variant(data_dir, "global_climate").expect("load from disk");
    assert_eq!(schema.id, "global_climate");
}

#[test]
fn missing_variant_file_is_an_error() {
    let err = ScenarioSchema::load_variant("/nonexistent", "global_climate").unwrap_err();
    assert!(err.to_string().contains("Cannot read"), "got: {err}");
}

#[test]
fn percentage_parameters_are_declared_as_fractions() {
    let schema = ScenarioSchema::business_impact().unwrap();
    for key in ["tax_rate", "discount_rate", "inflation_rate"] {
        let spec = schema.spec(key).unwrap();
        match spec.kind {
            ParamKind::Percentage { max, .. } => assert!(max <= 1.0, "{key} max {max}"),
            ref other => panic!("{key} should be a percentage, is {}", other.name()),
        }
    }
}

#[test]
fn duplicate_keys_are_rejected() {
    let json = variant_json(&format!("{CAPEX}, {CAPEX}"), "");
    assert!(invalid_reason(&json).contains("duplicate parameter"));
}

#[test]
fn default_outside_domain_is_rejected() {
    let param = r#"{"key": "capex", "label": "CAPEX", "kind": "bounded", "min": 0, "max": 100, "step": 1, "default": 130}"#;
    assert!(invalid_reason(&variant_json(param, "")).contains("outside its domain"));
}

#[test]
fn inverted_range_and_zero_step_are_rejected() {
    let inverted = r#"{"key": "x", "label": "X", "kind": "bounded", "min": 10, "max": 0, "step": 1, "default": 5}"#;
    assert!(invalid_reason(&variant_json(inverted, "")).contains("bad range"));

    let zero_step = r#"{"key": "x", "label": "X", "kind": "percentage", "min": 0, "max": 1, "step": 0, "default": 0.5}"#;
    assert!(invalid_reason(&variant_json(zero_step, "")).contains("step"));
}

#[test]
fn empty_choice_set_is_rejected() {
    let param = r#"{"key": "size", "label": "Size", "kind": "choice", "options": [], "default": "SME"}"#;
    assert!(invalid_reason(&variant_json(param, "")).contains("no options"));
}

#[test]
fn discrete_parameters_need_finite_options_and_an_admitted_default() {
    let empty = r#"{"key": "h", "label": "Horizon", "kind": "discrete", "options": [], "default": 7}"#;
    assert!(invalid_reason(&variant_json(empty, "")).contains("no options"));

    let off_grid = r#"{"key": "h", "label": "Horizon", "kind": "discrete", "options": [5, 7, 10], "default": 6}"#;
    assert!(invalid_reason(&variant_json(off_grid, "")).contains("outside its domain"));
}

#[test]
fn forecast_horizon_offers_only_five_seven_or_ten_years() {
    let schema = ScenarioSchema::business_impact().unwrap();
    let spec = schema.spec("forecast_horizon").unwrap();
    assert_eq!(spec.kind, ParamKind::Discrete { options: vec![5.0, 7.0, 10.0] });
    assert_eq!(spec.kind.name(), "discrete");
}

#[test]
fn presets_may_only_name_declared_parameters() {
    let preset = r#"{"name": "Bold", "values": {"capex": 50, "opex": 10}}"#;
    let reason = invalid_reason(&variant_json(CAPEX, preset));
    assert!(reason.contains("unknown parameter 'opex'"), "got: {reason}");
}

#[test]
fn presets_with_wrong_value_kind_are_rejected() {
    let preset = r#"{"name": "Bold", "values": {"capex": "lots"}}"#;
    assert!(invalid_reason(&variant_json(CAPEX, preset)).contains("invalid value"));
}

#[test]
fn runtime_defaults() {
    let orch = OrchestratorConfig::default();
    assert_eq!(orch.debounce, DEFAULT_DEBOUNCE);
    assert_eq!(orch.debounce, Duration::from_millis(200));
    assert!(orch.fetch_on_start);

    let client = ClientConfig::default();
    assert!(client.request_timeout.is_none(), "no timeout unless configured");
    assert_eq!(client.url("/impact/calculate"), "http://localhost:8000/api/impact/calculate");

    let custom = ClientConfig::with_base_url("http://model.local/");
    assert_eq!(custom.url("climate/simulate"), "http://model.local/climate/simulate");
}
