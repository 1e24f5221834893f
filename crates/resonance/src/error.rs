use thiserror::Error;

/// Error type for the resonance root crate, aggregating errors from the
/// core and auth crates.
#[derive(Debug, Error)]
pub enum RootError {
    #[error("auth error: {0}")]
    Auth(#[from] resonance_auth::AuthError),

    #[error("core error: {0}")]
    Core(#[from] resonance_core::ResonanceError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("request rejected ({code}): {message}")]
    Rpc { code: i64, message: String },
}

impl From<serde_json::Error> for RootError {
    fn from(e: serde_json::Error) -> Self {
        RootError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for RootError {
    fn from(e: toml::de::Error) -> Self {
        RootError::Config(format!("TOML parse error: {}", e))
    }
}

pub type RootResult<T> = Result<T, RootError>;
