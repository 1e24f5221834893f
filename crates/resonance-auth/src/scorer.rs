//! Deterministic resonance scoring.
//!
//! Each score is one 4-byte window of a SHA-256 digest, read big-endian,
//! reduced modulo 100 and clamped up to a floor. Windows never overlap within
//! a digest. The derivation is reproducible, not a proof of identity.

use resonance_core::{
    digest_window, resonance_digest, EmotionalState, ResonanceAnalysis, SubScores,
};

use crate::error::{AuthError, AuthResult};

/// Default base resonance frequency.
pub const BASE_FREQUENCY: f64 = 432.0;

/// Accepted deviation from the base frequency, as a fraction.
pub const FREQUENCY_TOLERANCE: f64 = 0.1;

/// Literal every consciousness pattern must contain.
pub const PATTERN_MARKER: &[u8] = b"consciousness";

pub const STABILITY_FLOOR: u8 = 50;
pub const ALIGNMENT_FLOOR: u8 = 60;
pub const COMPLEXITY_FLOOR: u8 = 40;
pub const COHERENCE_FLOOR: u8 = 50;
pub const INTENSITY_FLOOR: u8 = 30;
pub const EVOLUTION_FLOOR: u8 = 20;

// Signature digest windows.
const STATE_WINDOW: usize = 0;
const STABILITY_WINDOW: usize = 1;
const ALIGNMENT_WINDOW: usize = 2;
const INTENSITY_WINDOW: usize = 3;

// Pattern digest windows.
const COMPLEXITY_WINDOW: usize = 0;
const COHERENCE_WINDOW: usize = 1;
const EVOLUTION_WINDOW: usize = 2;

fn window(digest: &[u8; 32], index: usize) -> u32 {
    // Window indices are compile-time constants below WINDOW_COUNT.
    digest_window(digest, index).unwrap_or_default()
}

fn floored_percent(digest: &[u8; 32], index: usize, floor: u8) -> u8 {
    let percent = (window(digest, index) % 100) as u8;
    percent.max(floor)
}

/// Scores signature/pattern pairs against a configured base frequency.
#[derive(Debug, Clone, Copy)]
pub struct ResonanceScorer {
    base_frequency: f64,
}

impl ResonanceScorer {
    pub fn new(base_frequency: f64) -> Self {
        Self { base_frequency }
    }

    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }

    /// Inclusive band of accepted frequencies.
    pub fn frequency_band(&self) -> (f64, f64) {
        (
            self.base_frequency * (1.0 - FREQUENCY_TOLERANCE),
            self.base_frequency * (1.0 + FREQUENCY_TOLERANCE),
        )
    }

    /// Fails with `InvalidFrequency` unless `claimed` lies inside the band.
    /// NaN and infinities never pass.
    pub fn check_frequency(&self, claimed: f64) -> AuthResult<()> {
        let (low, high) = self.frequency_band();
        if claimed.is_finite() && claimed >= low && claimed <= high {
            Ok(())
        } else {
            Err(AuthError::InvalidFrequency { claimed })
        }
    }

    /// Fails with `InvalidPattern` unless the pattern is non-empty and
    /// contains [`PATTERN_MARKER`].
    pub fn check_pattern(&self, pattern: &[u8]) -> AuthResult<()> {
        if pattern.is_empty() || !contains(pattern, PATTERN_MARKER) {
            return Err(AuthError::InvalidPattern);
        }
        Ok(())
    }

    /// Derive the four clearance sub-scores. Pure and infallible.
    pub fn derive(&self, signature: &[u8], pattern: &[u8]) -> SubScores {
        self.analyze(signature, pattern).sub_scores
    }

    /// Derive sub-scores plus the informational indicators.
    pub fn analyze(&self, signature: &[u8], pattern: &[u8]) -> ResonanceAnalysis {
        let sig = resonance_digest(signature);
        let pat = resonance_digest(pattern);

        ResonanceAnalysis {
            sub_scores: SubScores {
                stability: floored_percent(&sig, STABILITY_WINDOW, STABILITY_FLOOR),
                alignment: floored_percent(&sig, ALIGNMENT_WINDOW, ALIGNMENT_FLOOR),
                complexity: floored_percent(&pat, COMPLEXITY_WINDOW, COMPLEXITY_FLOOR),
                coherence: floored_percent(&pat, COHERENCE_WINDOW, COHERENCE_FLOOR),
            },
            emotional_state: EmotionalState::from_window(window(&sig, STATE_WINDOW)),
            intensity: floored_percent(&sig, INTENSITY_WINDOW, INTENSITY_FLOOR),
            evolution: floored_percent(&pat, EVOLUTION_WINDOW, EVOLUTION_FLOOR),
        }
    }
}

impl Default for ResonanceScorer {
    fn default() -> Self {
        Self::new(BASE_FREQUENCY)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
