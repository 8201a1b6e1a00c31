//! Debate exchange records — challenges, defenses, messages, rounds, and
//! the transcript that accumulates them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::opinion::{Opinion, ParticipantId, Severity};

/// A challenge issued against one participant's opinion.
///
/// Created fresh every round; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// The participant whose opinion is being challenged.
    pub target: ParticipantId,
    /// Copy of the summary being challenged.
    pub original_claim: String,
    /// The counter-argument itself.
    pub argument: String,
    /// Evidence supporting the counter-argument.
    pub evidence: Vec<String>,
    /// How serious the challenger considers the concern.
    pub severity: Severity,
}

/// A defending participant's final stance after a challenge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    #[default]
    Maintain,
    PartiallyConcede,
    FullyConcede,
}

impl std::fmt::Display for Stance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Maintain => write!(f, "maintain"),
            Self::PartiallyConcede => write!(f, "partially_concede"),
            Self::FullyConcede => write!(f, "fully_concede"),
        }
    }
}

/// A participant's response to the challenge it received in a round.
///
/// `participant` plus `round` identifies the challenge being answered —
/// no participant is challenged more than once per round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defense {
    /// The defending participant.
    pub participant: ParticipantId,
    /// Round in which the answered challenge was issued.
    pub round: u32,
    /// The rebuttal or concession text.
    pub response: String,
    /// Revised score if the challenge changed the assessment; `None` means
    /// "no change". Always within the opinion score domain.
    pub adjusted_score: Option<f64>,
    /// Risks the participant now acknowledges.
    pub acknowledged_risks: Vec<String>,
    /// Final stance toward the challenge.
    pub stance: Stance,
}

/// Kind of message in the transcript log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Challenge,
    Defense,
    Rebuttal,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Challenge => write!(f, "challenge"),
            Self::Defense => write!(f, "defense"),
            Self::Rebuttal => write!(f, "rebuttal"),
        }
    }
}

/// One message in the debate log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateMessage {
    pub speaker: ParticipantId,
    pub target: Option<ParticipantId>,
    pub kind: MessageKind,
    pub content: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Score revision attached to a defense, if any.
    pub score_adjustment: Option<f64>,
    pub round: u32,
}

/// Record of one complete challenge → defense → rebuttal cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number, 1-indexed.
    pub round: u32,
    /// Challenges issued this round, in participant order.
    pub challenges: Vec<Challenge>,
    /// Defenses issued this round, in challenge order.
    pub defenses: Vec<Defense>,
    /// Issues where the defender substantially held its ground.
    pub resolved_issues: Vec<String>,
    /// Acknowledged risks from defenses that conceded materially.
    pub remaining_concerns: Vec<String>,
}

impl RoundRecord {
    /// An empty record for a round that could not run (no challenger).
    pub fn empty(round: u32) -> Self {
        Self {
            round,
            challenges: Vec::new(),
            defenses: Vec::new(),
            resolved_issues: Vec::new(),
            remaining_concerns: Vec::new(),
        }
    }
}

/// Complete transcript of a debate session.
///
/// Owned and mutated exclusively by the orchestrator; round controllers
/// only ever see opinion snapshots and return records to append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateTranscript {
    /// Unique session identifier.
    pub id: String,
    /// Ticker of the subject debated.
    pub ticker: String,
    /// Opinion snapshot before round 1; never overwritten.
    pub initial_opinions: BTreeMap<ParticipantId, Opinion>,
    /// Opinions after the last applied round update.
    pub final_opinions: BTreeMap<ParticipantId, Opinion>,
    /// Round records, appended monotonically.
    pub rounds: Vec<RoundRecord>,
    /// Ordered message log across all rounds.
    pub messages: Vec<DebateMessage>,
    /// Whether the consensus predicate terminated the debate.
    pub consensus_reached: bool,
    /// Score gaps of at least 3 points remaining between participants.
    pub key_disagreements: Vec<String>,
    /// When the session was created.
    pub started_at: DateTime<Utc>,
}

impl DebateTranscript {
    /// Create a transcript seeded with the initial opinion snapshot.
    pub fn new(ticker: &str, initial_opinions: BTreeMap<ParticipantId, Opinion>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ticker: ticker.to_string(),
            final_opinions: initial_opinions.clone(),
            initial_opinions,
            rounds: Vec::new(),
            messages: Vec::new(),
            consensus_reached: false,
            key_disagreements: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Total rounds executed.
    pub fn total_rounds(&self) -> u32 {
        self.rounds.len() as u32
    }

    /// Compact status line for logs.
    pub fn status_line(&self) -> String {
        format!(
            "[{}] {} rounds | {} messages | consensus={}",
            self.ticker,
            self.rounds.len(),
            self.messages.len(),
            self.consensus_reached
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opinion::Opinion;

    fn opinions() -> BTreeMap<ParticipantId, Opinion> {
        let mut map = BTreeMap::new();
        map.insert(
            ParticipantId::Macro,
            Opinion::new(ParticipantId::Macro, 7.0, 80.0, "rates peaking"),
        );
        map.insert(
            ParticipantId::Quant,
            Opinion::new(ParticipantId::Quant, 6.0, 75.0, "momentum intact"),
        );
        map
    }

    #[test]
    fn test_new_transcript_seeds_final_from_initial() {
        let transcript = DebateTranscript::new("AAPL", opinions());
        assert_eq!(transcript.ticker, "AAPL");
        assert_eq!(transcript.initial_opinions.len(), 2);
        assert_eq!(transcript.final_opinions.len(), 2);
        assert!(!transcript.consensus_reached);
        assert!(transcript.rounds.is_empty());
        assert!(!transcript.id.is_empty());
    }

    #[test]
    fn test_empty_round_record() {
        let record = RoundRecord::empty(2);
        assert_eq!(record.round, 2);
        assert!(record.challenges.is_empty());
        assert!(record.defenses.is_empty());
        assert!(record.resolved_issues.is_empty());
        assert!(record.remaining_concerns.is_empty());
    }

    #[test]
    fn test_stance_default_and_display() {
        assert_eq!(Stance::default(), Stance::Maintain);
        assert_eq!(Stance::PartiallyConcede.to_string(), "partially_concede");
    }

    #[test]
    fn test_stance_serde() {
        let json = serde_json::to_string(&Stance::FullyConcede).unwrap();
        assert_eq!(json, "\"fully_concede\"");
        let parsed: Stance = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Stance::FullyConcede);
    }

    #[test]
    fn test_message_kind_display() {
        assert_eq!(MessageKind::Challenge.to_string(), "challenge");
        assert_eq!(MessageKind::Defense.to_string(), "defense");
        assert_eq!(MessageKind::Rebuttal.to_string(), "rebuttal");
    }

    #[test]
    fn test_status_line() {
        let transcript = DebateTranscript::new("TSLA", opinions());
        let line = transcript.status_line();
        assert!(line.contains("[TSLA]"));
        assert!(line.contains("0 rounds"));
        assert!(line.contains("consensus=false"));
    }

    #[test]
    fn test_transcript_serde_roundtrip() {
        let mut transcript = DebateTranscript::new("NVDA", opinions());
        transcript.rounds.push(RoundRecord::empty(1));
        transcript.messages.push(DebateMessage {
            speaker: ParticipantId::DevilsAdvocate,
            target: Some(ParticipantId::Macro),
            kind: MessageKind::Challenge,
            content: "priced for perfection".to_string(),
            evidence: vec!["forward P/E at decade high".to_string()],
            score_adjustment: None,
            round: 1,
        });

        let json = serde_json::to_string(&transcript).unwrap();
        let parsed: DebateTranscript = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.rounds.len(), 1);
        assert_eq!(parsed.messages.len(), 1);
        assert_eq!(parsed.messages[0].kind, MessageKind::Challenge);
        assert_eq!(parsed.initial_opinions.len(), 2);
    }
}
