use thiserror::Error;

use crate::models::solar::PanelTechnology;

/// Reasons a sizing request cannot produce a meaningful result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidInput { field: &'static str, value: f64 },
    #[error("required capacity is not computable with {sun_hours_per_day} peak sun hours per day")]
    NotComputable { sun_hours_per_day: f64 },
    #[error("{quantity} is out of range ({value}); check the input magnitudes and policy constants")]
    OutOfRange { quantity: &'static str, value: f64 },
    #[error("no panel specification configured for {0}")]
    UnknownPanelTechnology(PanelTechnology),
}

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("advisory generation is disabled")]
    Disabled,
    #[error("environment variable {0} holding the API key is not set")]
    MissingApiKey(String),
    #[error("request to text-generation service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("text-generation service returned status {0}")]
    Status(u16),
    #[error("response carried no generated text")]
    EmptyResponse,
    #[error("generated text does not match the advice schema: {0}")]
    Schema(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid sizing policy: {0}")]
    Policy(String),
}
