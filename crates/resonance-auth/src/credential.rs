//! Signed, expiring access credentials.
//!
//! Token format: `rsn1.<base64url(json claims)>.<base64url(mac)>` where
//! `mac = HMAC-SHA256(secret, "rsn1." || payload segment)`. Verification is
//! stateless: the token alone proves its claims and expiry.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use resonance_core::{
    ClearanceLevel, CredentialId, SubjectId, Timestamp, SESSION_TTL_SECONDS,
};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_PREFIX: &str = "rsn1.";

/// Credentials share the session validity window.
pub const CREDENTIAL_TTL_SECONDS: u64 = SESSION_TTL_SECONDS;

/// System resonance label stamped when the caller supplies none.
pub const DEFAULT_RESONANCE: &str = "harmonious";

/// Claims carried inside a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    pub sub: SubjectId,
    pub clearance: ClearanceLevel,
    pub iat: Timestamp,
    pub exp: Timestamp,
    pub jti: CredentialId,
    pub resonance: String,
}

/// An issued credential: the opaque token plus the claims it encodes.
#[derive(Clone)]
pub struct Credential {
    pub token: String,
    pub claims: CredentialClaims,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

/// Issues and verifies credentials under one server-wide secret.
pub struct CredentialIssuer {
    secret: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl CredentialIssuer {
    /// Build an issuer. An empty secret is a configuration error.
    pub fn new(secret: impl Into<Vec<u8>>) -> AuthResult<Self> {
        let secret = Zeroizing::new(secret.into());
        if secret.is_empty() {
            return Err(AuthError::Config("signing secret must not be empty".into()));
        }
        Ok(Self { secret })
    }

    /// Issue a credential valid from now for [`CREDENTIAL_TTL_SECONDS`].
    pub fn issue(&self, subject_id: &SubjectId, clearance: ClearanceLevel) -> AuthResult<Credential> {
        self.issue_with(subject_id, clearance, Timestamp::now(), DEFAULT_RESONANCE)
    }

    /// Issue a credential with an explicit issuance instant and resonance label.
    pub fn issue_with(
        &self,
        subject_id: &SubjectId,
        clearance: ClearanceLevel,
        issued_at: Timestamp,
        resonance: &str,
    ) -> AuthResult<Credential> {
        let claims = CredentialClaims {
            sub: subject_id.clone(),
            clearance,
            iat: issued_at,
            exp: issued_at.plus_seconds(CREDENTIAL_TTL_SECONDS),
            jti: CredentialId::new(uuid::Uuid::new_v4().to_string()),
            resonance: resonance.to_string(),
        };

        let json = serde_json::to_vec(&claims)
            .map_err(|e| AuthError::Internal(format!("claims serialization: {}", e)))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(TOKEN_PREFIX.as_bytes());
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(Credential {
            token: format!("{}{}.{}", TOKEN_PREFIX, payload, signature),
            claims,
        })
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> AuthResult<CredentialClaims> {
        self.verify_at(token, Timestamp::now())
    }

    /// Verify a token as of `now`.
    ///
    /// The MAC is checked before any claim is decoded, so a forged token is
    /// always `Malformed`, never `Expired`.
    pub fn verify_at(&self, token: &str, now: Timestamp) -> AuthResult<CredentialClaims> {
        let body = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or(AuthError::Malformed)?;
        let (payload, signature) = body.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(TOKEN_PREFIX.as_bytes());
        mac.update(payload.as_bytes());
        // Constant-time comparison via the hmac crate
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::Malformed)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: CredentialClaims =
            serde_json::from_slice(&json).map_err(|_| AuthError::Malformed)?;

        if claims.exp.is_expired_at(now) {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self) -> AuthResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AuthError::Internal("hmac key rejected".into()))
    }
}
