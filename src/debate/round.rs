//! Round execution — one challenge, defense, and arbitration cycle.
//!
//! The controller only ever sees an opinion snapshot. It returns the
//! round record and message log for the orchestrator to apply; it never
//! mutates opinions or the transcript itself.

use std::collections::BTreeMap;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::agents::{is_strong_defense, Arbiter, Challenger, Defender};
use crate::context::SubjectContext;
use crate::debate::exchange::{
    Challenge, DebateMessage, Defense, MessageKind, RoundRecord,
};
use crate::opinion::{Opinion, ParticipantId};

/// Adjusted scores at or above this still count the issue as resolved;
/// below it, the concession was material and its acknowledged risks carry
/// forward as remaining concerns.
pub const RESOLVED_HOLD_THRESHOLD: f64 = 5.0;

const CLAIM_SNIPPET_LEN: usize = 50;

/// What a completed round hands back to the orchestrator.
#[derive(Debug)]
pub struct RoundOutcome {
    pub record: RoundRecord,
    pub messages: Vec<DebateMessage>,
}

/// Drives the three phases of a round across the committee.
pub struct RoundController {
    challenger: Challenger,
    defenders: BTreeMap<ParticipantId, Defender>,
    arbiter: Arbiter,
}

impl RoundController {
    pub fn new(
        challenger: Challenger,
        defenders: BTreeMap<ParticipantId, Defender>,
        arbiter: Arbiter,
    ) -> Self {
        Self {
            challenger,
            defenders,
            arbiter,
        }
    }

    /// Run one full round against an opinion snapshot.
    ///
    /// Challenges fan out concurrently across all non-challenger
    /// participants, then defenses, then rebuttals against the weak
    /// defenses. Degraded challenges still appear in the record so the
    /// transcript shows what happened each round.
    pub async fn run_round(
        &self,
        round: u32,
        opinions: &BTreeMap<ParticipantId, Opinion>,
        context: &SubjectContext,
    ) -> RoundOutcome {
        info!(round, ticker = %context.ticker, "starting debate round");
        let mut messages = Vec::new();

        // Phase 1: challenge every non-challenger opinion.
        let targets: Vec<&Opinion> = opinions
            .iter()
            .filter(|(id, _)| !id.is_challenger())
            .map(|(_, op)| op)
            .collect();
        let challenged = join_all(
            targets
                .iter()
                .map(|op| self.challenger.challenge(op, round, context)),
        )
        .await;

        let challenges: Vec<Challenge> = challenged
            .into_iter()
            .map(|out| {
                if out.degraded {
                    debug!(round, target = %out.challenge.target, "placeholder challenge recorded");
                }
                out.challenge
            })
            .collect();

        for challenge in &challenges {
            messages.push(DebateMessage {
                speaker: ParticipantId::DevilsAdvocate,
                target: Some(challenge.target),
                kind: MessageKind::Challenge,
                content: challenge.argument.clone(),
                evidence: challenge.evidence.clone(),
                score_adjustment: None,
                round,
            });
        }

        // Phase 2: each challenged participant answers its challenge.
        let defense_calls = challenges.iter().filter_map(|challenge| {
            let defender = match self.defenders.get(&challenge.target) {
                Some(d) => d,
                None => {
                    warn!(round, target = %challenge.target, "no defender registered, challenge unanswered");
                    return None;
                }
            };
            let current = opinions.get(&challenge.target)?;
            Some(async move {
                let defense = defender.defend(challenge, current, round, context).await;
                (challenge, defense)
            })
        });
        let answered: Vec<(&Challenge, Defense)> = join_all(defense_calls).await;

        for (_, defense) in &answered {
            messages.push(DebateMessage {
                speaker: defense.participant,
                target: Some(ParticipantId::DevilsAdvocate),
                kind: MessageKind::Defense,
                content: defense.response.clone(),
                evidence: Vec::new(),
                score_adjustment: defense.adjusted_score,
                round,
            });
        }

        // Phase 3: rebut the weak defenses.
        let weak: Vec<&(&Challenge, Defense)> = answered
            .iter()
            .filter(|(_, defense)| !is_strong_defense(defense))
            .collect();
        let rebuttals = join_all(
            weak.iter()
                .map(|(challenge, defense)| self.arbiter.rebut(challenge, defense, context)),
        )
        .await;

        for ((_, defense), rebuttal) in weak.iter().zip(rebuttals) {
            if let Some(content) = rebuttal {
                messages.push(DebateMessage {
                    speaker: ParticipantId::DevilsAdvocate,
                    target: Some(defense.participant),
                    kind: MessageKind::Rebuttal,
                    content,
                    evidence: Vec::new(),
                    score_adjustment: None,
                    round,
                });
            }
        }

        let defenses: Vec<Defense> = answered.into_iter().map(|(_, d)| d).collect();
        let (resolved_issues, remaining_concerns) = partition_outcomes(&challenges, &defenses);

        info!(
            round,
            challenges = challenges.len(),
            defenses = defenses.len(),
            resolved = resolved_issues.len(),
            remaining = remaining_concerns.len(),
            "round complete"
        );

        RoundOutcome {
            record: RoundRecord {
                round,
                challenges,
                defenses,
                resolved_issues,
                remaining_concerns,
            },
            messages,
        }
    }
}

/// Split the round's defenses into resolved issues and remaining concerns.
///
/// A defense that kept its score, or conceded to at least
/// [`RESOLVED_HOLD_THRESHOLD`], resolves its challenge; a deeper concession
/// leaves its acknowledged risks on the table.
fn partition_outcomes(
    challenges: &[Challenge],
    defenses: &[Defense],
) -> (Vec<String>, Vec<String>) {
    let mut resolved = Vec::new();
    let mut remaining = Vec::new();
    for defense in defenses {
        let held = match defense.adjusted_score {
            None => true,
            Some(score) => score >= RESOLVED_HOLD_THRESHOLD,
        };
        if held {
            let claim = challenges
                .iter()
                .find(|c| c.target == defense.participant)
                .map(|c| c.original_claim.as_str())
                .unwrap_or("");
            resolved.push(format!("{}: {}", defense.participant, snippet(claim)));
        } else {
            remaining.extend(defense.acknowledged_risks.iter().cloned());
        }
    }
    (resolved, remaining)
}

fn snippet(text: &str) -> String {
    if text.chars().count() <= CLAIM_SNIPPET_LEN {
        text.to_string()
    } else {
        let head: String = text.chars().take(CLAIM_SNIPPET_LEN).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Arbiter, Challenger, Defender};
    use crate::generate::{GenerateError, TextGenerator};
    use crate::opinion::Severity;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Dispatches on the system prompt to play all three roles.
    struct CommitteeScript {
        /// Adjusted score the quant defender concedes to; macro always holds.
        quant_adjusted: f64,
    }

    #[async_trait]
    impl TextGenerator for CommitteeScript {
        async fn generate(&self, system: &str, user: &str) -> Result<String, GenerateError> {
            if system.contains("challenge the other analysts") {
                return Ok(r#"{
                    "counter_argument": "the thesis ignores margin compression",
                    "evidence": ["peer margins rolling over"],
                    "severity": "high"
                }"#
                .to_string());
            }
            if system.contains("defending your analysis") {
                if user.contains("rates peaking") {
                    // Macro holds firm.
                    return Ok(
                        r#"{"defense": "rate path already reflects this", "adjusted_score": null, "final_stance": "maintain"}"#
                            .to_string(),
                    );
                }
                // Quant concedes.
                return Ok(format!(
                    r#"{{"defense": "conceding partially", "adjusted_score": {}, "acknowledged_risks": ["crowding risk", "regime shift"], "final_stance": "partially_concede"}}"#,
                    self.quant_adjusted
                ));
            }
            // Arbiter.
            Ok(r#"{"rebuttal": "the concession does not go far enough"}"#.to_string())
        }
    }

    fn controller(quant_adjusted: f64) -> RoundController {
        let gen: Arc<dyn TextGenerator> = Arc::new(CommitteeScript { quant_adjusted });
        let mut defenders = BTreeMap::new();
        defenders.insert(
            ParticipantId::Macro,
            Defender::new(ParticipantId::Macro, Arc::clone(&gen)),
        );
        defenders.insert(
            ParticipantId::Quant,
            Defender::new(ParticipantId::Quant, Arc::clone(&gen)),
        );
        RoundController::new(
            Challenger::new(Arc::clone(&gen)),
            defenders,
            Arbiter::new(gen),
        )
    }

    fn snapshot() -> BTreeMap<ParticipantId, Opinion> {
        let mut map = BTreeMap::new();
        map.insert(
            ParticipantId::Macro,
            Opinion::new(ParticipantId::Macro, 7.0, 80.0, "rates peaking"),
        );
        map.insert(
            ParticipantId::Quant,
            Opinion::new(ParticipantId::Quant, 8.0, 75.0, "momentum intact"),
        );
        map.insert(
            ParticipantId::DevilsAdvocate,
            Opinion::new(ParticipantId::DevilsAdvocate, 3.0, 60.0, "contrarian"),
        );
        map
    }

    fn ctx() -> SubjectContext {
        SubjectContext::new("ACME", "Acme Corp")
    }

    #[tokio::test]
    async fn test_round_challenges_every_non_challenger() {
        let outcome = controller(6.0).run_round(1, &snapshot(), &ctx()).await;
        assert_eq!(outcome.record.round, 1);
        assert_eq!(outcome.record.challenges.len(), 2);
        assert_eq!(outcome.record.defenses.len(), 2);
        // The challenger itself was never a target.
        assert!(outcome
            .record
            .challenges
            .iter()
            .all(|c| c.target != ParticipantId::DevilsAdvocate));
        assert!(outcome
            .record
            .challenges
            .iter()
            .all(|c| c.severity == Severity::High));
    }

    #[tokio::test]
    async fn test_strong_defenses_produce_no_rebuttal() {
        // Quant concedes to 6.0 (above the weak floor), macro holds: both strong.
        let outcome = controller(6.0).run_round(1, &snapshot(), &ctx()).await;
        assert!(outcome
            .messages
            .iter()
            .all(|m| m.kind != MessageKind::Rebuttal));
        // 2 challenges + 2 defenses.
        assert_eq!(outcome.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_weak_defense_is_rebutted() {
        // Quant caves to 2.0: weak, rebutted.
        let outcome = controller(2.0).run_round(2, &snapshot(), &ctx()).await;
        let rebuttals: Vec<_> = outcome
            .messages
            .iter()
            .filter(|m| m.kind == MessageKind::Rebuttal)
            .collect();
        assert_eq!(rebuttals.len(), 1);
        assert_eq!(rebuttals[0].target, Some(ParticipantId::Quant));
        assert_eq!(rebuttals[0].speaker, ParticipantId::DevilsAdvocate);
        assert!(rebuttals[0].content.contains("does not go far enough"));
    }

    #[tokio::test]
    async fn test_partition_of_resolved_and_remaining() {
        let outcome = controller(2.0).run_round(1, &snapshot(), &ctx()).await;
        // Macro held (no adjustment) → resolved; quant conceded below the
        // hold threshold → its acknowledged risks remain on the table.
        assert_eq!(outcome.record.resolved_issues.len(), 1);
        assert!(outcome.record.resolved_issues[0].starts_with("macro:"));
        assert_eq!(
            outcome.record.remaining_concerns,
            vec!["crowding risk".to_string(), "regime shift".to_string()]
        );
    }

    #[tokio::test]
    async fn test_concession_at_hold_threshold_resolves() {
        let outcome = controller(5.0).run_round(1, &snapshot(), &ctx()).await;
        assert_eq!(outcome.record.resolved_issues.len(), 2);
        assert!(outcome.record.remaining_concerns.is_empty());
    }

    #[tokio::test]
    async fn test_messages_carry_round_and_adjustment() {
        let outcome = controller(6.0).run_round(3, &snapshot(), &ctx()).await;
        assert!(outcome.messages.iter().all(|m| m.round == 3));
        let quant_defense = outcome
            .messages
            .iter()
            .find(|m| m.kind == MessageKind::Defense && m.speaker == ParticipantId::Quant)
            .unwrap();
        assert_eq!(quant_defense.score_adjustment, Some(6.0));
    }

    #[test]
    fn test_snippet_truncation() {
        assert_eq!(snippet("short claim"), "short claim");
        let long = "x".repeat(80);
        let cut = snippet(&long);
        assert_eq!(cut.chars().count(), 53);
        assert!(cut.ends_with("..."));
    }
}
