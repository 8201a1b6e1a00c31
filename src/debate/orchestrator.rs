//! Debate orchestration — the session state machine.
//!
//! The orchestrator owns the transcript and is its only mutator. Each
//! round runs against an opinion snapshot; concessions are applied to the
//! working opinion set between rounds, consensus is checked, and the
//! debate ends converged or exhausted.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::agents::{Arbiter, Challenger, Defender};
use crate::config::DebateConfig;
use crate::context::SubjectContext;
use crate::debate::consensus::check_consensus;
use crate::debate::exchange::{DebateTranscript, RoundRecord};
use crate::debate::round::RoundController;
use crate::generate::{BoundedGenerator, TextGenerator};
use crate::opinion::{Opinion, ParticipantId};

/// Score gap between two participants that counts as a key disagreement.
const DISAGREEMENT_GAP: f64 = 3.0;

/// Where a debate session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebateState {
    NotStarted,
    RoundInProgress(u32),
    /// Terminated because the consensus predicate held.
    Converged,
    /// Terminated because the configured rounds ran out.
    Exhausted,
}

/// Errors that prevent a debate from starting.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("cannot debate an empty opinion set")]
    EmptyOpinions,
    #[error("invalid subject context: {0}")]
    InvalidContext(String),
}

/// Runs a complete debate over an initial opinion set.
pub struct DebateOrchestrator {
    generator: Arc<dyn TextGenerator>,
    config: DebateConfig,
    state: DebateState,
}

impl DebateOrchestrator {
    /// Create an orchestrator. The configured `timeout_secs` bounds every
    /// generation call made during the debate; an expired call surfaces as
    /// a [`crate::generate::GenerateError::Timeout`] and takes the owning
    /// agent's documented fallback.
    pub fn new(generator: Arc<dyn TextGenerator>, config: DebateConfig) -> Self {
        let generator: Arc<dyn TextGenerator> = Arc::new(BoundedGenerator::new(
            generator,
            Duration::from_secs(config.timeout_secs),
        ));
        Self {
            generator,
            config,
            state: DebateState::NotStarted,
        }
    }

    pub fn state(&self) -> DebateState {
        self.state
    }

    /// Run the debate to termination and return the finished transcript.
    ///
    /// Consensus is checked after each round before the exhaustion check,
    /// so a debate that converges in its final round still ends converged.
    pub async fn run_debate(
        &mut self,
        initial_opinions: BTreeMap<ParticipantId, Opinion>,
        context: &SubjectContext,
    ) -> Result<DebateTranscript, DebateError> {
        if initial_opinions.is_empty() {
            return Err(DebateError::EmptyOpinions);
        }
        if !context.is_valid() {
            return Err(DebateError::InvalidContext(format!(
                "blank ticker for {}",
                context.company_name
            )));
        }

        let mut transcript = DebateTranscript::new(&context.ticker, initial_opinions);
        let mut opinions = transcript.initial_opinions.clone();
        let controller = self.build_controller(&opinions);

        info!(
            ticker = %context.ticker,
            participants = opinions.len(),
            max_rounds = self.config.max_rounds,
            "debate session starting"
        );

        for round in 1..=self.config.max_rounds {
            self.state = DebateState::RoundInProgress(round);

            match &controller {
                Some(controller) => {
                    let outcome = controller.run_round(round, &opinions, context).await;
                    self.apply_concessions(&mut opinions, &outcome.record);
                    transcript.messages.extend(outcome.messages);
                    transcript.rounds.push(outcome.record);
                }
                None => {
                    // No challenger available: the round is recorded empty
                    // and the debate runs straight to its termination checks.
                    transcript.rounds.push(RoundRecord::empty(round));
                }
            }

            if check_consensus(&opinions, self.config.variance_consensus_threshold) {
                info!(round, "consensus reached, ending debate");
                transcript.consensus_reached = true;
                self.state = DebateState::Converged;
                break;
            }
        }

        if self.state != DebateState::Converged {
            info!(rounds = transcript.total_rounds(), "debate exhausted without consensus");
            self.state = DebateState::Exhausted;
        }

        transcript.final_opinions = opinions;
        transcript.key_disagreements = key_disagreements(&transcript.final_opinions);
        info!("{}", transcript.status_line());
        Ok(transcript)
    }

    /// One defender per non-challenger participant, or no controller at
    /// all when the debate runs without a challenger.
    fn build_controller(
        &self,
        opinions: &BTreeMap<ParticipantId, Opinion>,
    ) -> Option<RoundController> {
        let has_challenger = opinions.keys().any(|id| id.is_challenger());
        if !self.config.include_challenger || !has_challenger {
            if self.config.include_challenger {
                warn!("no challenger among the participants, rounds will be empty");
            }
            return None;
        }

        let defenders: BTreeMap<ParticipantId, Defender> = opinions
            .keys()
            .filter(|id| !id.is_challenger())
            .map(|id| (*id, Defender::new(*id, Arc::clone(&self.generator))))
            .collect();
        Some(RoundController::new(
            Challenger::new(Arc::clone(&self.generator)),
            defenders,
            Arbiter::new(Arc::clone(&self.generator)),
        ))
    }

    /// Apply every conceded score from the round to the working opinions.
    fn apply_concessions(
        &self,
        opinions: &mut BTreeMap<ParticipantId, Opinion>,
        record: &RoundRecord,
    ) {
        for defense in &record.defenses {
            let Some(new_score) = defense.adjusted_score else {
                continue;
            };
            let Some(current) = opinions.get(&defense.participant) else {
                continue;
            };
            let updated = current.adjusted(
                new_score,
                self.config.confidence_decay,
                &defense.acknowledged_risks,
            );
            info!(
                participant = %defense.participant,
                round = record.round,
                from = current.score(),
                to = updated.score(),
                "score concession applied"
            );
            opinions.insert(defense.participant, updated);
        }
    }
}

/// Participant pairs whose final scores differ by at least the
/// disagreement gap, in deterministic participant order. The challenger
/// is skipped; its contrarian score is a gap by construction.
fn key_disagreements(opinions: &BTreeMap<ParticipantId, Opinion>) -> Vec<String> {
    let entries: Vec<(&ParticipantId, &Opinion)> = opinions
        .iter()
        .filter(|(id, _)| !id.is_challenger())
        .collect();
    let mut out = Vec::new();
    for (i, (id_a, op_a)) in entries.iter().enumerate() {
        for (id_b, op_b) in &entries[i + 1..] {
            if (op_a.score() - op_b.score()).abs() >= DISAGREEMENT_GAP {
                out.push(format!(
                    "{} ({}/10) vs {} ({}/10)",
                    id_a,
                    op_a.score(),
                    id_b,
                    op_b.score()
                ));
            }
        }
    }
    out
}
