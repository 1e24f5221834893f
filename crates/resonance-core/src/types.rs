use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ClearanceLevel: four ordered access tiers, compared by rank
// ---------------------------------------------------------------------------

/// Emotive clearance level. Declaration order is rank order, so the derived
/// `Ord` agrees with [`ClearanceLevel::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ClearanceLevel {
    /// Open areas. Granted to every authenticated subject.
    #[serde(rename = "ECL_PUBLIC")]
    Public = 1,
    /// Emotional-resonance areas.
    #[serde(rename = "ECL_EMOTIONAL")]
    Emotional = 2,
    /// Security-sensitive areas.
    #[serde(rename = "ECL_SECURITY")]
    Security = 3,
    /// Everything.
    #[serde(rename = "ECL_MAXIMUM")]
    Maximum = 4,
}

impl ClearanceLevel {
    /// All levels, ascending.
    pub const ALL: [ClearanceLevel; 4] = [
        ClearanceLevel::Public,
        ClearanceLevel::Emotional,
        ClearanceLevel::Security,
        ClearanceLevel::Maximum,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            1 => Some(ClearanceLevel::Public),
            2 => Some(ClearanceLevel::Emotional),
            3 => Some(ClearanceLevel::Security),
            4 => Some(ClearanceLevel::Maximum),
            _ => None,
        }
    }

    /// True if a holder of `self` may enter an area requiring `required`.
    pub fn satisfies(self, required: ClearanceLevel) -> bool {
        self.rank() >= required.rank()
    }

    /// Wire name, e.g. `ECL_SECURITY`.
    pub fn as_str(self) -> &'static str {
        match self {
            ClearanceLevel::Public => "ECL_PUBLIC",
            ClearanceLevel::Emotional => "ECL_EMOTIONAL",
            ClearanceLevel::Security => "ECL_SECURITY",
            ClearanceLevel::Maximum => "ECL_MAXIMUM",
        }
    }

    /// Frequency of the resonance chamber guarding this level.
    pub fn chamber_frequency(self, base_frequency: f64) -> f64 {
        base_frequency * f64::from(self.rank())
    }
}

impl fmt::Display for ClearanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a clearance level name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClearanceLevel(pub String);

impl fmt::Display for UnknownClearanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown clearance level: {}", self.0)
    }
}

impl std::error::Error for UnknownClearanceLevel {}

impl FromStr for ClearanceLevel {
    type Err = UnknownClearanceLevel;

    /// Accepts wire names (`ECL_SECURITY`) and bare names (`security`),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("ECL_").unwrap_or(&upper);
        match bare {
            "PUBLIC" => Ok(ClearanceLevel::Public),
            "EMOTIONAL" => Ok(ClearanceLevel::Emotional),
            "SECURITY" => Ok(ClearanceLevel::Security),
            "MAXIMUM" => Ok(ClearanceLevel::Maximum),
            _ => Err(UnknownClearanceLevel(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamp: canonical time representation (seconds + nanoseconds)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds_since_epoch: u64,
    pub nanoseconds: u32,
}

impl Timestamp {
    pub fn now() -> Self {
        chrono::Utc::now().into()
    }

    pub fn from_seconds(seconds: u64) -> Self {
        Self {
            seconds_since_epoch: seconds,
            nanoseconds: 0,
        }
    }

    /// This instant shifted forward by whole seconds. Nanoseconds are kept.
    pub fn plus_seconds(&self, seconds: u64) -> Self {
        Self {
            seconds_since_epoch: self.seconds_since_epoch.saturating_add(seconds),
            nanoseconds: self.nanoseconds,
        }
    }

    /// This instant shifted back by whole seconds, saturating at the epoch.
    pub fn minus_seconds(&self, seconds: u64) -> Self {
        Self {
            seconds_since_epoch: self.seconds_since_epoch.saturating_sub(seconds),
            nanoseconds: self.nanoseconds,
        }
    }

    pub fn to_rfc3339(&self) -> String {
        let dt =
            chrono::DateTime::from_timestamp(self.seconds_since_epoch as i64, self.nanoseconds);
        dt.map(|d| d.to_rfc3339())
            .unwrap_or_else(|| "invalid".to_string())
    }

    /// Strictly past `self` at `now`. An instant equal to `self` is not expired.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > *self
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Self::now())
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Timestamp {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            seconds_since_epoch: dt.timestamp().max(0) as u64,
            nanoseconds: dt.timestamp_subsec_nanos(),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed identifiers
// ---------------------------------------------------------------------------

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

define_id!(SubjectId, "Identifier of an authenticating subject.");
define_id!(CredentialId, "Unique identifier stamped into each issued credential.");

// ---------------------------------------------------------------------------
// SubScores / ResonanceAnalysis: derived scoring output
// ---------------------------------------------------------------------------

/// Four independently derived scores, each in `[0, 100)` and at or above its
/// floor when produced by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubScores {
    pub stability: u8,
    pub alignment: u8,
    pub complexity: u8,
    pub coherence: u8,
}

impl SubScores {
    pub fn emotional_score(&self) -> f64 {
        (f64::from(self.stability) + f64::from(self.alignment)) / 2.0
    }

    pub fn consciousness_score(&self) -> f64 {
        (f64::from(self.complexity) + f64::from(self.coherence)) / 2.0
    }

    pub fn overall(&self) -> f64 {
        (self.emotional_score() + self.consciousness_score()) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalState {
    Peaceful,
    Joyful,
    Contemplative,
    Energetic,
    Serene,
}

impl EmotionalState {
    pub const ALL: [EmotionalState; 5] = [
        EmotionalState::Peaceful,
        EmotionalState::Joyful,
        EmotionalState::Contemplative,
        EmotionalState::Energetic,
        EmotionalState::Serene,
    ];

    /// Select a state by reducing `value` modulo the number of states.
    pub fn from_window(value: u32) -> Self {
        Self::ALL[(value as usize) % Self::ALL.len()]
    }
}

impl fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EmotionalState::Peaceful => "peaceful",
            EmotionalState::Joyful => "joyful",
            EmotionalState::Contemplative => "contemplative",
            EmotionalState::Energetic => "energetic",
            EmotionalState::Serene => "serene",
        };
        f.write_str(name)
    }
}

/// Full output of one scoring pass. Only `sub_scores` feeds clearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResonanceAnalysis {
    pub sub_scores: SubScores,
    pub emotional_state: EmotionalState,
    pub intensity: u8,
    pub evolution: u8,
}

// ---------------------------------------------------------------------------
// Session: immutable record of a subject's current clearance
// ---------------------------------------------------------------------------

/// Fixed session and credential validity window: 24 hours.
pub const SESSION_TTL_SECONDS: u64 = 24 * 60 * 60;

/// A subject's active session.
///
/// Fields are private so `expires_at == issued_at + 24h` always holds.
/// Stores hand sessions out behind `Arc` and replace them whole.
#[derive(Clone, PartialEq, Serialize)]
pub struct Session {
    subject_id: SubjectId,
    clearance_level: ClearanceLevel,
    issued_at: Timestamp,
    expires_at: Timestamp,
    #[serde(skip_serializing)]
    credential: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<ResonanceAnalysis>,
}

impl Session {
    pub fn new(
        subject_id: SubjectId,
        clearance_level: ClearanceLevel,
        issued_at: Timestamp,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            subject_id,
            clearance_level,
            issued_at,
            expires_at: issued_at.plus_seconds(SESSION_TTL_SECONDS),
            credential: credential.into(),
            analysis: None,
        }
    }

    pub fn with_analysis(mut self, analysis: ResonanceAnalysis) -> Self {
        self.analysis = Some(analysis);
        self
    }

    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    pub fn clearance_level(&self) -> ClearanceLevel {
        self.clearance_level
    }

    pub fn issued_at(&self) -> Timestamp {
        self.issued_at
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn analysis(&self) -> Option<&ResonanceAnalysis> {
        self.analysis.as_ref()
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_expired_at(now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("subject_id", &self.subject_id)
            .field("clearance_level", &self.clearance_level)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("credential", &"<redacted>")
            .field("analysis", &self.analysis)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AccessDecision: outcome of a clearance check
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NoActiveSession,
    InsufficientClearance {
        held: ClearanceLevel,
        required: ClearanceLevel,
    },
    StoreUnavailable,
}

impl DenyReason {
    /// Stable reason code for callers.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::NoActiveSession => "NOT_FOUND",
            DenyReason::InsufficientClearance { .. } => "INSUFFICIENT_CLEARANCE",
            DenyReason::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NoActiveSession => write!(f, "no active session"),
            DenyReason::InsufficientClearance { .. } => write!(f, "insufficient clearance"),
            DenyReason::StoreUnavailable => write!(f, "session store unavailable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Granted { clearance: ClearanceLevel },
    Denied { reason: DenyReason },
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted { .. })
    }
}
