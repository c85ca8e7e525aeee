use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("invalid action status: {0}")]
    InvalidStatus(String),

    #[error("invalid unknown-action policy '{0}': expected 'drop' or 'append'")]
    InvalidPolicy(String),

    #[error("invalid tag '{0}': expected key=value")]
    InvalidTag(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
