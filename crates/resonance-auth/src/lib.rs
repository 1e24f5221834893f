//! Tiered-clearance authentication.
//!
//! Raw signature material is scored ([`scorer`]), the scores resolve to a
//! clearance level ([`clearance`]), a signed credential is issued
//! ([`credential`]) and the session is recorded ([`session`]). The
//! [`gate::AccessGate`] ties these together and is the only entry point
//! collaborators are expected to call.

pub mod clearance;
pub mod credential;
pub mod error;
pub mod gate;
pub mod scorer;
pub mod session;

pub use credential::{Credential, CredentialClaims, CredentialIssuer};
pub use error::*;
pub use gate::{
    AccessGate, AttemptStage, AuthFailure, AuthOutcome, AuthRequest, AuthSuccess,
    CredentialVerification, LogoutOutcome, ResonanceSnapshot,
};
pub use scorer::ResonanceScorer;
pub use session::InMemorySessionStore;
