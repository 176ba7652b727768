use granary_api::error::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("fallback file io: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation: {0}")]
    Validation(String),
}
