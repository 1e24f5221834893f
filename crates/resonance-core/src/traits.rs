use std::sync::Arc;

use crate::error::ResonanceResult;
use crate::types::{AccessDecision, ClearanceLevel, DenyReason, Session, SubjectId};

// ---------------------------------------------------------------------------
// SessionStore: one live session per subject
//
// Sessions are immutable values. Implementations replace the whole record on
// `put` and hand out `Arc<Session>` so readers never see a half-written entry.
// Expiry is enforced lazily on read; nothing runs in the background.
// ---------------------------------------------------------------------------

pub trait SessionStore: Send + Sync {
    /// Store `session`, replacing any prior session for the same subject.
    /// Returns the replaced session, if any.
    fn put(&self, session: Session) -> ResonanceResult<Option<Arc<Session>>>;

    /// Look up the live session for a subject. An expired session is evicted
    /// and reported as absent.
    fn get(&self, subject_id: &SubjectId) -> ResonanceResult<Option<Arc<Session>>>;

    /// Remove a subject's session. Returns whether one was present.
    fn remove(&self, subject_id: &SubjectId) -> ResonanceResult<bool>;

    /// Number of unexpired sessions.
    fn active_count(&self) -> ResonanceResult<usize>;

    /// Drop every expired session. Returns how many were removed.
    fn evict_expired(&self) -> ResonanceResult<usize>;

    /// Compare the subject's live clearance against `required`.
    fn check_access(
        &self,
        subject_id: &SubjectId,
        required: ClearanceLevel,
    ) -> ResonanceResult<AccessDecision> {
        let decision = match self.get(subject_id)? {
            None => AccessDecision::Denied {
                reason: DenyReason::NoActiveSession,
            },
            Some(session) if session.clearance_level().satisfies(required) => {
                AccessDecision::Granted {
                    clearance: session.clearance_level(),
                }
            }
            Some(session) => AccessDecision::Denied {
                reason: DenyReason::InsufficientClearance {
                    held: session.clearance_level(),
                    required,
                },
            },
        };
        Ok(decision)
    }
}
