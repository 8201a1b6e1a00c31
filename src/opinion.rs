//! Opinion value objects — participants, scores, and derived sentiment.
//!
//! An [`Opinion`] is immutable within a round: the orchestrator supersedes
//! it with [`Opinion::adjusted`] rather than mutating in place. Score and
//! confidence are clamped at construction so nothing downstream can store
//! an out-of-domain value, and sentiment is always derived from the score.

use serde::{Deserialize, Serialize};

/// Lower bound of the score domain.
pub const SCORE_MIN: f64 = 1.0;
/// Upper bound of the score domain.
pub const SCORE_MAX: f64 = 10.0;
/// Lower bound of the confidence domain (%).
pub const CONFIDENCE_MIN: f64 = 0.0;
/// Upper bound of the confidence domain (%).
pub const CONFIDENCE_MAX: f64 = 100.0;

/// Clamp a raw score into the [1, 10] domain.
pub fn clamp_score(raw: f64) -> f64 {
    raw.clamp(SCORE_MIN, SCORE_MAX)
}

/// Clamp a raw confidence into the [0, 100] domain.
pub fn clamp_confidence(raw: f64) -> f64 {
    raw.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX)
}

/// Fixed analytical role of a committee participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantId {
    Chairman,
    Macro,
    Quant,
    Qualitative,
    Industry,
    Valuation,
    Risk,
    DevilsAdvocate,
}

impl ParticipantId {
    /// Whether this participant is the contrarian challenger.
    ///
    /// The challenger issues challenges but is never challenged itself,
    /// and its score is excluded from consensus arithmetic.
    pub fn is_challenger(self) -> bool {
        matches!(self, Self::DevilsAdvocate)
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chairman => write!(f, "chairman"),
            Self::Macro => write!(f, "macro"),
            Self::Quant => write!(f, "quant"),
            Self::Qualitative => write!(f, "qualitative"),
            Self::Industry => write!(f, "industry"),
            Self::Valuation => write!(f, "valuation"),
            Self::Risk => write!(f, "risk"),
            Self::DevilsAdvocate => write!(f, "devils_advocate"),
        }
    }
}

/// Categorical sentiment, always a pure function of score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    VeryBullish,
    Bullish,
    Neutral,
    Bearish,
    VeryBearish,
}

impl Sentiment {
    /// Derive sentiment from a score on the [1, 10] scale.
    ///
    /// Band lower bounds are inclusive: 8.0 is very bullish, 6.5 bullish,
    /// 4.5 neutral, 3.0 bearish, anything below is very bearish.
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::VeryBullish
        } else if score >= 6.5 {
            Self::Bullish
        } else if score >= 4.5 {
            Self::Neutral
        } else if score >= 3.0 {
            Self::Bearish
        } else {
            Self::VeryBearish
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Self::Bullish | Self::VeryBullish)
    }

    pub fn is_negative(self) -> bool {
        matches!(self, Self::Bearish | Self::VeryBearish)
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VeryBullish => write!(f, "very_bullish"),
            Self::Bullish => write!(f, "bullish"),
            Self::Neutral => write!(f, "neutral"),
            Self::Bearish => write!(f, "bearish"),
            Self::VeryBearish => write!(f, "very_bearish"),
        }
    }
}

/// Severity of a challenge raised during debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// One participant's opinion on the subject at a point in the debate.
///
/// `score`, `confidence`, and `sentiment` are private: the only way to
/// produce an `Opinion` is through a clamping constructor, so the domain
/// invariants hold for every instance and sentiment can never drift from
/// the score that implies it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "OpinionWire")]
pub struct Opinion {
    participant: ParticipantId,
    score: f64,
    confidence: f64,
    sentiment: Sentiment,
    /// Short summary of the analysis behind the score.
    pub summary: String,
    /// Key supporting points, in the order the analysis produced them.
    pub key_points: Vec<String>,
    /// Risks and concerns the participant itself flagged.
    pub concerns: Vec<String>,
}

impl Opinion {
    /// Create an opinion, clamping score and confidence into their domains.
    pub fn new(participant: ParticipantId, score: f64, confidence: f64, summary: &str) -> Self {
        let score = clamp_score(score);
        Self {
            participant,
            score,
            confidence: clamp_confidence(confidence),
            sentiment: Sentiment::from_score(score),
            summary: summary.to_string(),
            key_points: Vec::new(),
            concerns: Vec::new(),
        }
    }

    /// Attach key points.
    pub fn with_key_points(mut self, key_points: Vec<String>) -> Self {
        self.key_points = key_points;
        self
    }

    /// Attach concerns.
    pub fn with_concerns(mut self, concerns: Vec<String>) -> Self {
        self.concerns = concerns;
        self
    }

    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    /// Produce the successor opinion after a conceded challenge.
    ///
    /// The new score replaces the old one (clamped), confidence erodes by
    /// `confidence_decay`, sentiment is recomputed, and the acknowledged
    /// risks extend (not replace) the key points and concerns.
    pub fn adjusted(
        &self,
        new_score: f64,
        confidence_decay: f64,
        acknowledged_risks: &[String],
    ) -> Self {
        let score = clamp_score(new_score);
        let mut key_points = self.key_points.clone();
        let mut concerns = self.concerns.clone();
        key_points.extend(acknowledged_risks.iter().cloned());
        concerns.extend(acknowledged_risks.iter().cloned());
        Self {
            participant: self.participant,
            score,
            confidence: clamp_confidence(self.confidence * confidence_decay),
            sentiment: Sentiment::from_score(score),
            summary: self.summary.clone(),
            key_points,
            concerns,
        }
    }
}

/// Deserialization surface for [`Opinion`].
///
/// Incoming data passes through the same clamping constructor as
/// programmatic construction; any `sentiment` present in the input is
/// ignored and re-derived from the score.
#[derive(Debug, Deserialize)]
struct OpinionWire {
    participant: ParticipantId,
    score: f64,
    confidence: f64,
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    concerns: Vec<String>,
}

impl From<OpinionWire> for Opinion {
    fn from(wire: OpinionWire) -> Self {
        Opinion::new(wire.participant, wire.score, wire.confidence, &wire.summary)
            .with_key_points(wire.key_points)
            .with_concerns(wire.concerns)
    }
}
