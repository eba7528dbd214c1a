use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Tournament selection requires a judge")]
    MissingJudge,

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Environment error: {0}")]
    EnvironmentError(String),

    #[error("Invalid board: {0}")]
    InvalidBoard(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ReplayError>;
