use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResonanceError {
    #[error("auth error: {0}")]
    Auth(String),

    #[error("session store error: {0}")]
    Storage(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ResonanceResult<T> = Result<T, ResonanceError>;
