//! Post-debate summary — a pure projection of a finished transcript.

use serde::{Deserialize, Serialize};

use crate::agents::is_strong_defense;
use crate::debate::exchange::{DebateTranscript, Stance};
use crate::opinion::{ParticipantId, Sentiment, Severity};

/// Highlights kept per debate.
const MAX_HIGHLIGHTS: usize = 10;

/// Highlight text is cut to this many characters.
const HIGHLIGHT_LEN: usize = 200;

/// How one participant's position moved over the debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub participant: ParticipantId,
    pub initial_score: f64,
    pub final_score: f64,
    pub initial_sentiment: Sentiment,
    pub final_sentiment: Sentiment,
}

impl ScoreChange {
    /// Signed score movement; negative means the participant was talked down.
    pub fn delta(&self) -> f64 {
        self.final_score - self.initial_score
    }

    /// Whether the debate flipped the participant's sentiment band.
    pub fn sentiment_changed(&self) -> bool {
        self.initial_sentiment != self.final_sentiment
    }
}

/// What kind of exchange a highlight captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    /// A high- or critical-severity challenge.
    SignificantChallenge,
    /// A defense that held its ground against a challenge.
    StrongDefense,
}

/// One notable exchange from the debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub kind: HighlightKind,
    pub round: u32,
    pub participant: ParticipantId,
    pub text: String,
}

/// Condensed view of a finished debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateSummary {
    pub ticker: String,
    pub total_rounds: u32,
    pub consensus_reached: bool,
    /// Per-participant movement, in deterministic participant order.
    pub score_changes: Vec<ScoreChange>,
    pub highlights: Vec<Highlight>,
    /// Concerns still open at the end of the last round.
    pub unresolved_concerns: Vec<String>,
    pub key_disagreements: Vec<String>,
}

/// Build the summary from a finished transcript. Pure: no generation
/// calls, same transcript in, same summary out.
pub fn debate_summary(transcript: &DebateTranscript) -> DebateSummary {
    let score_changes = transcript
        .initial_opinions
        .iter()
        .filter_map(|(id, initial)| {
            let final_op = transcript.final_opinions.get(id)?;
            Some(ScoreChange {
                participant: *id,
                initial_score: initial.score(),
                final_score: final_op.score(),
                initial_sentiment: initial.sentiment(),
                final_sentiment: final_op.sentiment(),
            })
        })
        .collect();

    let mut highlights = Vec::new();
    for record in &transcript.rounds {
        for challenge in &record.challenges {
            if challenge.severity >= Severity::High {
                highlights.push(Highlight {
                    kind: HighlightKind::SignificantChallenge,
                    round: record.round,
                    participant: challenge.target,
                    text: truncate(&challenge.argument),
                });
            }
        }
        for defense in &record.defenses {
            if is_strong_defense(defense) && defense.stance == Stance::Maintain {
                highlights.push(Highlight {
                    kind: HighlightKind::StrongDefense,
                    round: record.round,
                    participant: defense.participant,
                    text: truncate(&defense.response),
                });
            }
        }
    }
    highlights.truncate(MAX_HIGHLIGHTS);

    let unresolved_concerns = transcript
        .rounds
        .last()
        .map(|record| record.remaining_concerns.clone())
        .unwrap_or_default();

    DebateSummary {
        ticker: transcript.ticker.clone(),
        total_rounds: transcript.total_rounds(),
        consensus_reached: transcript.consensus_reached,
        score_changes,
        highlights,
        unresolved_concerns,
        key_disagreements: transcript.key_disagreements.clone(),
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= HIGHLIGHT_LEN {
        text.to_string()
    } else {
        let head: String = text.chars().take(HIGHLIGHT_LEN).collect();
        format!("{}...", head)
    }
}
