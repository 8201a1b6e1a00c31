//! Consensus detection — population variance over participant scores.
//!
//! A pure function of the current opinion set: given the same scores it
//! always returns the same answer, which keeps the orchestrator's
//! termination decision replayable.

use std::collections::BTreeMap;

use crate::opinion::{Opinion, ParticipantId};

/// Population variance of a score sample. Empty input yields 0.
pub fn population_variance(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64
}

/// Scores eligible for consensus arithmetic: every participant except the
/// challenger, in deterministic participant order.
pub fn scored(opinions: &BTreeMap<ParticipantId, Opinion>) -> Vec<f64> {
    opinions
        .iter()
        .filter(|(id, _)| !id.is_challenger())
        .map(|(_, op)| op.score())
        .collect()
}

/// Whether the committee has converged.
///
/// Trivially true with fewer than 2 scored participants; otherwise true
/// when the population variance of their scores is below `threshold`.
pub fn check_consensus(opinions: &BTreeMap<ParticipantId, Opinion>, threshold: f64) -> bool {
    let scores = scored(opinions);
    if scores.len() < 2 {
        return true;
    }
    population_variance(&scores) < threshold
}
