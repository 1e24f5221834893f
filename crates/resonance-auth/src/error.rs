//! Auth error types.
//!
//! Every variant carries a stable reason code for callers. Display impls
//! never contain secret material or token contents.

use resonance_core::ResonanceError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("claimed frequency {claimed} is outside the accepted resonance band")]
    InvalidFrequency { claimed: f64 },

    #[error("consciousness pattern is empty or missing its marker")]
    InvalidPattern,

    #[error("credential expired")]
    Expired,

    #[error("credential malformed")]
    Malformed,

    #[error("no active session")]
    NotFound,

    #[error("insufficient clearance")]
    InsufficientClearance,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable reason code surfaced at the service boundary.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidFrequency { .. } => "INVALID_FREQUENCY",
            AuthError::InvalidPattern => "INVALID_PATTERN",
            AuthError::Expired => "EXPIRED",
            AuthError::Malformed => "MALFORMED",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::InsufficientClearance => "INSUFFICIENT_CLEARANCE",
            AuthError::Config(_) => "CONFIG",
            AuthError::Internal(_) => "INTERNAL",
        }
    }

    /// Message safe to hand to callers. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Config(_) => "service misconfigured".to_string(),
            AuthError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ResonanceError> for AuthError {
    fn from(e: ResonanceError) -> Self {
        AuthError::Internal(e.to_string())
    }
}

impl From<AuthError> for ResonanceError {
    fn from(e: AuthError) -> Self {
        ResonanceError::Auth(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_variants_have_code_and_display() {
        let errors = vec![
            AuthError::InvalidFrequency { claimed: 999.0 },
            AuthError::InvalidPattern,
            AuthError::Expired,
            AuthError::Malformed,
            AuthError::NotFound,
            AuthError::InsufficientClearance,
            AuthError::Config("missing".into()),
            AuthError::Internal("broken".into()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len(), "codes must be unique");
        for err in &errors {
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn test_credential_errors_are_generic() {
        assert_eq!(AuthError::Malformed.to_string(), "credential malformed");
        assert_eq!(AuthError::Expired.to_string(), "credential expired");
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AuthError::Internal("lock poisoned: PoisonError".into());
        assert_eq!(err.public_message(), "internal error");
        assert_eq!(
            AuthError::InvalidPattern.public_message(),
            AuthError::InvalidPattern.to_string()
        );
    }

    #[test]
    fn test_conversion_into_core_error() {
        let core: ResonanceError = AuthError::InvalidPattern.into();
        assert!(matches!(core, ResonanceError::Auth(_)));

        let auth: AuthError = ResonanceError::Storage("lock poisoned".into()).into();
        assert_eq!(auth.code(), "INTERNAL");
    }
}
