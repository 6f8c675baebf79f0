use thiserror::Error;

/// Failures while turning raw rows or JSON objects into transaction records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("csv decode failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("json decode failure: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },
    #[error("record {index} has invalid isFraud value `{value}` (expected 0 or 1)")]
    InvalidFraudFlag { index: usize, value: String },
}

/// Prediction input rejected before anything is sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Field `{field}` must be numeric, got `{value}`")]
    NotNumeric { field: &'static str, value: String },
    #[error("No file provided")]
    NoFile,
    #[error("File type not allowed: {0}")]
    UnsupportedFile(String),
}

/// Transport and remote failures talking to the prediction service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to read upload file: {0}")]
    File(#[from] std::io::Error),
    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error(transparent)]
    Record(#[from] RecordError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
