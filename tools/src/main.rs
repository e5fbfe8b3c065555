//! scenario-runner: headless driver for one scenario simulator view.
//!
//! Usage:
//!   scenario-runner --variant business_impact --preset Aggressive
//!   scenario-runner --variant global_climate --set afforestation=40 --set deforestation=60
//!   scenario-runner --variant business_impact --base-url http://localhost:8000/api --ipc-mode

use anyhow::{anyhow, Result};
use scenario_core::{
    adapters::{dashboard_panels, AlertPanel, DashboardPanels},
    config::{ClientConfig, OrchestratorConfig, ScenarioSchema, DEFAULT_BASE_URL},
    orchestrator::{QueryStatus, ScenarioView},
    parameters::{ParamValue, ParameterSnapshot},
    result::MalformedField,
    session::ScenarioSession,
    view_model::ResultViewModel,
};
use std::{env, sync::Arc, time::Duration};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    /// Stored units: fractions for percentages.
    Set {
        key:   String,
        value: ParamValue,
    },
    /// Widget units: percentages ×100.
    SetDisplay {
        key:   String,
        value: f64,
    },
    Preset {
        name: String,
    },
    GetState {
        /// Wait for the pending round trip before answering.
        #[serde(default)]
        wait: bool,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    variant:       String,
    revision:      u64,
    status:        QueryStatus,
    active_preset: Option<String>,
    parameters:    ParameterSnapshot,
    view_model:    ResultViewModel,
    panels:        DashboardPanels,
    malformed:     Vec<MalformedField>,
    last_error:    Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let variant = flag_value(&args, "--variant").unwrap_or("business_impact");
    let data_dir = flag_value(&args, "--data-dir");
    let base_url = flag_value(&args, "--base-url").unwrap_or(DEFAULT_BASE_URL);
    let preset = flag_value(&args, "--preset");
    let debounce_ms = parse_arg(&args, "--debounce-ms", 200u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let edits = set_args(&args)?;

    let schema = match data_dir {
        Some(dir) => ScenarioSchema::load_variant(dir, variant)?,
        None => ScenarioSchema::builtin(variant)?,
    };

    if !ipc_mode {
        println!("Scenario simulator: scenario-runner");
        println!("  variant:   {} ({})", schema.id, schema.label);
        println!("  endpoint:  {base_url}{}", schema.endpoint);
        println!("  debounce:  {debounce_ms} ms");
        println!("  presets:   {}", schema.preset_names().collect::<Vec<_>>().join(", "));
        println!();
    }

    let config = OrchestratorConfig {
        debounce: Duration::from_millis(debounce_ms),
        ..OrchestratorConfig::default()
    };
    let client = ClientConfig::with_base_url(base_url);
    let mut session = ScenarioSession::connect(Arc::new(schema), &client, config)?;

    if let Some(name) = preset {
        session.apply_preset(name)?;
    }
    for (key, value) in edits {
        session.update(&key, value)?;
    }

    if ipc_mode {
        run_ipc_loop(&mut session).await?;
    } else {
        let view = session.settled().await;
        print_summary(&session, &view);
    }

    session.teardown().await;
    Ok(())
}

async fn run_ipc_loop(session: &mut ScenarioSession) -> Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                write_json(&mut stdout, &serde_json::json!({ "error": e.to_string() })).await?;
                continue;
            }
        };

        let applied = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Set { key, value } => session.update(&key, value).map(|_| ()),
            IpcCommand::SetDisplay { key, value } => session.update_display(&key, value).map(|_| ()),
            IpcCommand::Preset { name } => session.apply_preset(&name).map(|_| ()),
            IpcCommand::GetState { wait } => {
                if wait {
                    session.settled().await;
                }
                Ok(())
            }
        };

        match applied {
            Ok(()) => {
                let state = build_ui_state(session);
                write_json(&mut stdout, &serde_json::to_value(&state)?).await?;
            }
            Err(e) => {
                log::warn!("command rejected: {e}");
                write_json(&mut stdout, &serde_json::json!({ "error": e.to_string() })).await?;
            }
        }
    }
    Ok(())
}

async fn write_json(stdout: &mut io::Stdout, value: &serde_json::Value) -> Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

fn build_ui_state(session: &ScenarioSession) -> UiState {
    let store = session.store();
    let view = session.view();
    let view_model = view.view_model();
    UiState {
        variant:       store.schema().id.clone(),
        revision:      store.revision(),
        status:        view.status,
        active_preset: store.active_preset().map(str::to_string),
        parameters:    store.snapshot(),
        panels:        dashboard_panels(&view_model),
        view_model,
        malformed:     view.malformed,
        last_error:    view.last_error,
    }
}

fn print_summary(session: &ScenarioSession, view: &ScenarioView) {
    let store = session.store();
    let vm = view.view_model();
    let panels = dashboard_panels(&vm);

    println!("=== PARAMETERS (r{}) ===", store.revision());
    if let Some(name) = store.active_preset() {
        println!("  preset:         {name}");
    }
    for (key, value) in store.snapshot().iter() {
        println!("  {key:<28}{value}");
    }

    println!();
    println!("=== RESULT ===");
    println!("  status:         {:?}", view.status);
    if let Some(error) = &view.last_error {
        println!("  last error:     {error}");
    }
    if !vm.has_result {
        println!("  (No result received)");
        return;
    }
    if vm.stale {
        println!("  (Showing a stale result)");
    }
    for card in &panels.score_cards {
        println!("  {:<16}{:>3}  [{:?}]", card.title, card.score, card.tier);
    }

    println!();
    println!("=== DETAILS ===");
    let d = &vm.details;
    println!("  ROI:            {:.1}%", d.roi_percent);
    println!("  payback:        {:.1} yrs", d.payback_years);
    println!("  reduction:      {} tCO2e", d.carbon_reduction_tons);
    println!("  net zero:       {:.1}%", d.net_zero_progress);
    println!("  execution risk: {}", d.execution_risk.label());

    println!();
    println!("=== ALERTS ===");
    match &panels.alerts {
        AlertPanel::Nominal { message } => println!("  {message}"),
        AlertPanel::Grouped { groups } => {
            for group in groups {
                for row in &group.alerts {
                    println!("  [{}] {}", row.title, row.message);
                }
            }
        }
    }
    if !view.malformed.is_empty() {
        println!();
        println!("=== MALFORMED FIELDS ===");
        for m in &view.malformed {
            println!("  {}: {}", m.field, m.reason);
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Every `--set key=value` pair, in command-line order.
fn set_args(args: &[String]) -> Result<Vec<(String, ParamValue)>> {
    args.windows(2)
        .filter(|w| w[0] == "--set")
        .map(|w| {
            let (key, raw) = w[1]
                .split_once('=')
                .ok_or_else(|| anyhow!("--set expects key=value, got '{}'", w[1]))?;
            Ok((key.trim().to_string(), ParamValue::parse_literal(raw)))
        })
        .collect()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
