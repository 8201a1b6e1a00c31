//! Debate configuration and the named tunables the protocol depends on.

use serde::{Deserialize, Serialize};

/// Default number of debate rounds.
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

/// Default per-generation-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Population-variance threshold below which participant scores count as
/// consensus, on the [1, 10] score scale. Inherited from the committee
/// protocol; the round-level scenarios in the test suite depend on this
/// exact value.
pub const VARIANCE_CONSENSUS_THRESHOLD: f64 = 1.5;

/// Multiplier applied to a participant's confidence each time it concedes
/// an adjusted score. A policy choice, not a derived law: every successful
/// challenge erodes confidence by the same factor.
pub const CONFIDENCE_DECAY: f64 = 0.95;

/// Configuration for a debate session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    /// Maximum rounds before the debate exhausts.
    pub max_rounds: u32,
    /// Whether a challenger participates. Without one, every round is
    /// recorded empty and the debate runs straight to its termination
    /// checks.
    pub include_challenger: bool,
    /// Timeout for each external generation call, in seconds.
    pub timeout_secs: u64,
    /// Consensus threshold on score variance (see
    /// [`VARIANCE_CONSENSUS_THRESHOLD`]).
    pub variance_consensus_threshold: f64,
    /// Per-concession confidence decay (see [`CONFIDENCE_DECAY`]).
    pub confidence_decay: f64,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            include_challenger: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            variance_consensus_threshold: VARIANCE_CONSENSUS_THRESHOLD,
            confidence_decay: CONFIDENCE_DECAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DebateConfig::default();
        assert_eq!(config.max_rounds, 3);
        assert!(config.include_challenger);
        assert_eq!(config.timeout_secs, 300);
        assert!((config.variance_consensus_threshold - 1.5).abs() < f64::EPSILON);
        assert!((config.confidence_decay - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = DebateConfig {
            max_rounds: 5,
            include_challenger: false,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DebateConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_rounds, 5);
        assert!(!parsed.include_challenger);
    }
}
