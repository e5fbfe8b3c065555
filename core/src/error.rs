use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Unknown parameter '{key}'")]
    UnknownParameter { key: String },

    #[error("Invalid value for '{key}': {reason}")]
    Validation { key: String, reason: String },

    #[error("Preset '{name}' is not registered")]
    UnknownPreset { name: String },

    #[error("Invalid scenario schema: {reason}")]
    InvalidSchema { reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Model returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
