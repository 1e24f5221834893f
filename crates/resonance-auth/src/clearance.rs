//! Maps combined resonance scores onto clearance levels.

use resonance_core::{ClearanceLevel, SubScores};

/// Inclusive lower bounds, highest first.
pub const THRESHOLDS: [(f64, ClearanceLevel); 3] = [
    (90.0, ClearanceLevel::Maximum),
    (75.0, ClearanceLevel::Security),
    (60.0, ClearanceLevel::Emotional),
];

/// Resolve the clearance earned by a set of sub-scores.
pub fn resolve(scores: &SubScores) -> ClearanceLevel {
    resolve_overall(scores.overall())
}

/// Map an overall score to the highest bracket whose bound it meets.
pub fn resolve_overall(overall: f64) -> ClearanceLevel {
    THRESHOLDS
        .iter()
        .find(|(bound, _)| overall >= *bound)
        .map(|(_, level)| *level)
        .unwrap_or(ClearanceLevel::Public)
}
