use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Workbook could not be read: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Unsupported input: {message}")]
    UnsupportedInput { message: String },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
