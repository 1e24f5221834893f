//! Access gate: the single entry point collaborators call.
//!
//! An authentication attempt walks `Received -> FrequencyChecked -> Scored ->
//! Resolved -> CredentialIssued -> SessionStored`. Any step may fail; only the
//! final store write mutates state, so a failed attempt leaves nothing behind.
//! Nothing is retried here.

use resonance_core::{
    AccessDecision, ClearanceLevel, DenyReason, ResonanceAnalysis, Session, SessionStore,
    SubjectId, Timestamp,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::clearance;
use crate::credential::{CredentialClaims, CredentialIssuer, DEFAULT_RESONANCE};
use crate::error::{AuthError, AuthResult};
use crate::scorer::ResonanceScorer;

/// Raw input for one authentication attempt.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub subject_id: SubjectId,
    pub emotional_signature: Vec<u8>,
    pub consciousness_pattern: Vec<u8>,
    pub claimed_frequency: f64,
}

impl AuthRequest {
    pub fn new(
        subject_id: impl Into<SubjectId>,
        emotional_signature: impl Into<Vec<u8>>,
        consciousness_pattern: impl Into<Vec<u8>>,
        claimed_frequency: f64,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            emotional_signature: emotional_signature.into(),
            consciousness_pattern: consciousness_pattern.into(),
            claimed_frequency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStage {
    Received,
    FrequencyChecked,
    Scored,
    Resolved,
    CredentialIssued,
    SessionStored,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSuccess {
    pub subject_id: SubjectId,
    pub clearance_level: ClearanceLevel,
    pub credential: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub analysis: ResonanceAnalysis,
    /// True when this attempt replaced an existing session.
    pub superseded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthFailure {
    /// Last stage the attempt completed before failing.
    pub stage: AttemptStage,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Success(AuthSuccess),
    Failed(AuthFailure),
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success(_))
    }

    pub fn clearance(&self) -> Option<ClearanceLevel> {
        match self {
            AuthOutcome::Success(s) => Some(s.clearance_level),
            AuthOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CredentialVerification {
    Valid(CredentialClaims),
    Invalid { code: &'static str, message: String },
}

impl CredentialVerification {
    pub fn is_valid(&self) -> bool {
        matches!(self, CredentialVerification::Valid(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogoutOutcome {
    pub success: bool,
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChamberInfo {
    pub level: ClearanceLevel,
    pub frequency: f64,
}

/// Read-only diagnostic view of the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResonanceSnapshot {
    pub active_session_count: usize,
    pub base_frequency: f64,
    pub status: String,
    pub chambers: Vec<ChamberInfo>,
}

pub struct AccessGate {
    scorer: ResonanceScorer,
    issuer: CredentialIssuer,
    store: Arc<dyn SessionStore>,
    system_resonance: RwLock<String>,
}

impl AccessGate {
    pub fn new(
        scorer: ResonanceScorer,
        issuer: CredentialIssuer,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            scorer,
            issuer,
            store,
            system_resonance: RwLock::new(DEFAULT_RESONANCE.to_string()),
        }
    }

    /// Run one authentication attempt to completion or failure.
    pub fn authenticate(&self, request: &AuthRequest) -> AuthOutcome {
        let mut stage = AttemptStage::Received;
        debug!(subject_id = %request.subject_id, stage = ?stage, "authentication attempt");

        match self.run_attempt(request, &mut stage) {
            Ok(success) => {
                info!(
                    subject_id = %success.subject_id,
                    clearance = %success.clearance_level,
                    superseded = success.superseded,
                    "authentication succeeded"
                );
                AuthOutcome::Success(success)
            }
            Err(e) => {
                warn!(
                    subject_id = %request.subject_id,
                    stage = ?stage,
                    code = e.code(),
                    error = %e,
                    "authentication failed"
                );
                AuthOutcome::Failed(AuthFailure {
                    stage,
                    code: e.code(),
                    message: e.public_message(),
                })
            }
        }
    }

    fn run_attempt(
        &self,
        request: &AuthRequest,
        stage: &mut AttemptStage,
    ) -> AuthResult<AuthSuccess> {
        let subject_id = &request.subject_id;

        self.scorer.check_frequency(request.claimed_frequency)?;
        advance(stage, AttemptStage::FrequencyChecked, subject_id);

        self.scorer.check_pattern(&request.consciousness_pattern)?;
        let analysis = self
            .scorer
            .analyze(&request.emotional_signature, &request.consciousness_pattern);
        advance(stage, AttemptStage::Scored, subject_id);

        let clearance_level = clearance::resolve(&analysis.sub_scores);
        advance(stage, AttemptStage::Resolved, subject_id);

        let resonance = self.system_resonance()?;
        let credential =
            self.issuer
                .issue_with(subject_id, clearance_level, Timestamp::now(), &resonance)?;
        advance(stage, AttemptStage::CredentialIssued, subject_id);

        let session = Session::new(
            subject_id.clone(),
            clearance_level,
            credential.claims.iat,
            credential.token.clone(),
        )
        .with_analysis(analysis);
        let issued_at = session.issued_at();
        let expires_at = session.expires_at();
        let replaced = self.store.put(session)?;
        advance(stage, AttemptStage::SessionStored, subject_id);

        Ok(AuthSuccess {
            subject_id: subject_id.clone(),
            clearance_level,
            credential: credential.token,
            issued_at,
            expires_at,
            analysis,
            superseded: replaced.is_some(),
        })
    }

    /// Check a subject's live session against a required level.
    pub fn check_access(&self, subject_id: &SubjectId, required: ClearanceLevel) -> AccessDecision {
        match self.store.check_access(subject_id, required) {
            Ok(decision) => {
                debug!(subject_id = %subject_id, required = %required, granted = decision.is_granted(), "access check");
                decision
            }
            Err(e) => {
                warn!(subject_id = %subject_id, error = %e, "session store unavailable");
                AccessDecision::Denied {
                    reason: DenyReason::StoreUnavailable,
                }
            }
        }
    }

    /// Stateless credential check. Does not consult the session store.
    pub fn verify_credential(&self, token: &str) -> CredentialVerification {
        match self.issuer.verify(token) {
            Ok(claims) => CredentialVerification::Valid(claims),
            Err(e) => {
                debug!(code = e.code(), "credential rejected");
                CredentialVerification::Invalid {
                    code: e.code(),
                    message: e.public_message(),
                }
            }
        }
    }

    /// Terminate a subject's session. Never fails.
    pub fn logout(&self, subject_id: &SubjectId) -> LogoutOutcome {
        let removed = match self.store.remove(subject_id) {
            Ok(removed) => removed,
            Err(e) => {
                warn!(subject_id = %subject_id, error = %e, "logout could not reach session store");
                false
            }
        };
        info!(subject_id = %subject_id, removed, "session terminated");
        LogoutOutcome {
            success: true,
            removed,
        }
    }

    pub fn get_session(&self, subject_id: &SubjectId) -> Option<Arc<Session>> {
        self.store.get(subject_id).unwrap_or_else(|e| {
            warn!(subject_id = %subject_id, error = %e, "session lookup failed");
            None
        })
    }

    pub fn snapshot(&self) -> ResonanceSnapshot {
        let active_session_count = self.store.active_count().unwrap_or_else(|e| {
            warn!(error = %e, "could not count active sessions");
            0
        });
        let base_frequency = self.scorer.base_frequency();
        ResonanceSnapshot {
            active_session_count,
            base_frequency,
            status: self
                .system_resonance()
                .unwrap_or_else(|_| DEFAULT_RESONANCE.to_string()),
            chambers: ClearanceLevel::ALL
                .into_iter()
                .map(|level| ChamberInfo {
                    level,
                    frequency: level.chamber_frequency(base_frequency),
                })
                .collect(),
        }
    }

    pub fn system_resonance(&self) -> AuthResult<String> {
        self.system_resonance
            .read()
            .map(|s| s.clone())
            .map_err(|_| AuthError::Internal("resonance lock poisoned".into()))
    }

    /// Replace the resonance label stamped into new credentials.
    pub fn set_system_resonance(&self, status: &str) -> AuthResult<()> {
        let status = status.trim();
        if status.is_empty() {
            return Err(AuthError::Config(
                "system resonance label must not be empty".into(),
            ));
        }
        let mut current = self
            .system_resonance
            .write()
            .map_err(|_| AuthError::Internal("resonance lock poisoned".into()))?;
        info!(from = %current.as_str(), to = %status, "system resonance updated");
        *current = status.to_string();
        Ok(())
    }

    /// Run the explicit expiry sweep on the underlying store.
    pub fn evict_expired(&self) -> AuthResult<usize> {
        Ok(self.store.evict_expired()?)
    }
}

fn advance(stage: &mut AttemptStage, next: AttemptStage, subject_id: &SubjectId) {
    *stage = next;
    debug!(subject_id = %subject_id, stage = ?next, "attempt advanced");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;

    fn gate_with_store() -> (AccessGate, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let gate = AccessGate::new(
            ResonanceScorer::default(),
            CredentialIssuer::new("gate-test-secret").unwrap(),
            store.clone(),
        );
        (gate, store)
    }

    fn request(subject: &str, signature: &str, frequency: f64) -> AuthRequest {
        AuthRequest::new(subject, signature, "consciousness-pattern-x", frequency)
    }

    #[test]
    fn test_authenticate_success_stores_session() {
        let (gate, store) = gate_with_store();
        let outcome = gate.authenticate(&request("bob", "emotional-signature-a", 432.0));

        let AuthOutcome::Success(success) = outcome else {
            panic!("expected success");
        };
        assert_eq!(success.clearance_level, ClearanceLevel::Emotional);
        assert!(!success.superseded);
        assert_eq!(store.len(), 1);

        let session = gate.get_session(&SubjectId::new("bob")).unwrap();
        assert_eq!(session.credential(), success.credential);
        assert_eq!(session.analysis(), Some(&success.analysis));
    }

    #[test]
    fn test_invalid_frequency_fails_fast_without_state() {
        let (gate, store) = gate_with_store();
        let outcome = gate.authenticate(&request("bob", "emotional-signature-a", 432.0 * 1.11));

        let AuthOutcome::Failed(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.code, "INVALID_FREQUENCY");
        assert_eq!(failure.stage, AttemptStage::Received);
        assert!(store.is_empty());
    }

    #[test]
    fn test_invalid_pattern_fails_after_frequency_check() {
        let (gate, store) = gate_with_store();
        let outcome = gate.authenticate(&AuthRequest::new("bob", "sig", "pattern-x", 432.0));

        let AuthOutcome::Failed(failure) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.code, "INVALID_PATTERN");
        assert_eq!(failure.stage, AttemptStage::FrequencyChecked);
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_reauthentication_keeps_prior_session() {
        let (gate, _store) = gate_with_store();
        assert!(gate
            .authenticate(&request("bob", "signature-1", 432.0))
            .is_success());
        assert!(!gate
            .authenticate(&request("bob", "signature-11", 1_000.0))
            .is_success());

        assert_eq!(
            gate.check_access(&SubjectId::new("bob"), ClearanceLevel::Security),
            AccessDecision::Granted {
                clearance: ClearanceLevel::Security
            }
        );
    }

    #[test]
    fn test_reauthentication_supersedes() {
        let (gate, store) = gate_with_store();
        let first = gate.authenticate(&request("alice", "signature-0", 432.0));
        let second = gate.authenticate(&request("alice", "signature-11", 432.0));

        let AuthOutcome::Success(second) = second else {
            panic!("expected success");
        };
        assert!(second.superseded);
        assert_eq!(store.len(), 1);
        assert_eq!(first.clearance(), Some(ClearanceLevel::Emotional));
        assert!(gate
            .check_access(&SubjectId::new("alice"), ClearanceLevel::Maximum)
            .is_granted());
        assert_eq!(
            gate.get_session(&SubjectId::new("alice")).unwrap().credential(),
            second.credential
        );
    }

    #[test]
    fn test_verify_credential_outcomes() {
        let (gate, _store) = gate_with_store();
        let AuthOutcome::Success(success) = gate.authenticate(&request("bob", "signature-1", 432.0))
        else {
            panic!("expected success");
        };

        match gate.verify_credential(&success.credential) {
            CredentialVerification::Valid(claims) => {
                assert_eq!(claims.sub, SubjectId::new("bob"));
                assert_eq!(claims.clearance, ClearanceLevel::Security);
            }
            CredentialVerification::Invalid { .. } => panic!("expected valid"),
        }

        match gate.verify_credential("not-a-token") {
            CredentialVerification::Invalid { code, .. } => assert_eq!(code, "MALFORMED"),
            CredentialVerification::Valid(_) => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_logout_twice_never_errors() {
        let (gate, _store) = gate_with_store();
        gate.authenticate(&request("bob", "signature-1", 432.0));

        let first = gate.logout(&SubjectId::new("bob"));
        let second = gate.logout(&SubjectId::new("bob"));
        assert!(first.success && first.removed);
        assert!(second.success && !second.removed);
        assert_eq!(
            gate.check_access(&SubjectId::new("bob"), ClearanceLevel::Public),
            AccessDecision::Denied {
                reason: DenyReason::NoActiveSession
            }
        );
    }

    #[test]
    fn test_revoked_session_with_valid_token_is_denied() {
        let (gate, _store) = gate_with_store();
        let AuthOutcome::Success(success) = gate.authenticate(&request("bob", "signature-1", 432.0))
        else {
            panic!("expected success");
        };
        gate.logout(&SubjectId::new("bob"));

        assert!(gate.verify_credential(&success.credential).is_valid());
        assert!(!gate
            .check_access(&SubjectId::new("bob"), ClearanceLevel::Public)
            .is_granted());
    }

    #[test]
    fn test_snapshot() {
        let (gate, _store) = gate_with_store();
        gate.authenticate(&request("a", "signature-0", 432.0));
        gate.authenticate(&request("b", "signature-1", 432.0));

        let snapshot = gate.snapshot();
        assert_eq!(snapshot.active_session_count, 2);
        assert_eq!(snapshot.base_frequency, 432.0);
        assert_eq!(snapshot.status, DEFAULT_RESONANCE);
        assert_eq!(snapshot.chambers.len(), 4);
        assert_eq!(snapshot.chambers[2].level, ClearanceLevel::Security);
        assert_eq!(snapshot.chambers[2].frequency, 1296.0);
    }

    #[test]
    fn test_system_resonance_is_stamped_into_credentials() {
        let (gate, _store) = gate_with_store();
        gate.set_system_resonance("discordant").unwrap();
        assert!(gate.set_system_resonance("   ").is_err());

        let AuthOutcome::Success(success) = gate.authenticate(&request("bob", "signature-1", 432.0))
        else {
            panic!("expected success");
        };
        let CredentialVerification::Valid(claims) = gate.verify_credential(&success.credential)
        else {
            panic!("expected valid");
        };
        assert_eq!(claims.resonance, "discordant");
        assert_eq!(gate.snapshot().status, "discordant");
    }
}
