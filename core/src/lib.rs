//! Scenario simulation orchestration for the sustainability dashboard.
//!
//! Parameter edits flow through `ParameterStore`, are debounced and sent
//! to the external model by `RequestOrchestrator`, and come back as a
//! `ResultViewModel` that the `adapters` turn into widget data.

pub mod adapters;
pub mod command;
pub mod config;
pub mod dashboard_client;
pub mod error;
pub mod event;
pub mod mock;
pub mod model;
pub mod orchestrator;
pub mod parameters;
pub mod result;
pub mod session;
pub mod types;
pub mod view_model;
