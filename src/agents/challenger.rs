//! The Devil's Advocate — generates structured challenges against the
//! other participants' opinions, with round-scaled intensity.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::context::SubjectContext;
use crate::debate::exchange::Challenge;
use crate::generate::TextGenerator;
use crate::opinion::{Opinion, Severity};
use crate::parse::parse_structured;

/// How hard the challenger pushes in a given round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeIntensity {
    /// Round 1 — probe for weaknesses.
    Moderate,
    /// Round 2 — press unresolved issues.
    Aggressive,
    /// Round 3 and beyond — final verification of surviving claims.
    FinalVerification,
}

impl ChallengeIntensity {
    /// Intensity for a round number. Clamped: the orchestrator stops
    /// issuing rounds before anything past the configured maximum, so
    /// every later round maps to final verification.
    pub fn for_round(round: u32) -> Self {
        match round {
            0 | 1 => Self::Moderate,
            2 => Self::Aggressive,
            _ => Self::FinalVerification,
        }
    }
}

impl std::fmt::Display for ChallengeIntensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Moderate => write!(f, "moderate"),
            Self::Aggressive => write!(f, "aggressive"),
            Self::FinalVerification => write!(f, "final_verification"),
        }
    }
}

const CHALLENGER_SYSTEM_PROMPT: &str = "\
You are the Devil's Advocate on an investment committee. Your role is to \
challenge the other analysts' conclusions: find blind spots, separate what \
the market already knows from genuine edge, and surface pre-mortem failure \
scenarios. Be constructively critical and evidence-based, not reflexively \
negative.";

/// Shape of the structured challenge response.
#[derive(Debug, Deserialize)]
struct ChallengeReply {
    counter_argument: String,
    #[serde(default)]
    evidence: Vec<String>,
    severity: Option<Severity>,
}

/// A challenge plus whether it came from the documented fallback path.
#[derive(Debug, Clone)]
pub struct Challenged {
    pub challenge: Challenge,
    pub degraded: bool,
}

/// Generates challenges against target opinions.
pub struct Challenger {
    generator: Arc<dyn TextGenerator>,
}

impl Challenger {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Challenge one opinion.
    ///
    /// Never fails the round: generation or parse errors degrade to a
    /// low-severity placeholder challenge with `degraded` set.
    pub async fn challenge(
        &self,
        target: &Opinion,
        round: u32,
        context: &SubjectContext,
    ) -> Challenged {
        let intensity = ChallengeIntensity::for_round(round);
        let user_prompt = format!(
            "{}\n## Target analysis\n\
             - Analyst: {}\n- Score: {}/10\n- Sentiment: {}\n- Summary: {}\n\
             - Key points: {}\n\n\
             ## Debate round {} (intensity: {})\n\n\
             Challenge this analysis. Respond in JSON:\n\
             {{\n  \"counter_argument\": \"<core rebuttal, specific and data-driven>\",\n\
               \"evidence\": [\"<supporting evidence>\"],\n\
               \"severity\": \"<low|medium|high|critical>\"\n}}",
            context.prompt_block(),
            target.participant(),
            target.score(),
            target.sentiment(),
            target.summary,
            target.key_points.join("; "),
            round,
            intensity,
        );

        match self.generator.generate(CHALLENGER_SYSTEM_PROMPT, &user_prompt).await {
            Ok(raw) => match parse_structured::<ChallengeReply>(&raw) {
                Ok(reply) => Challenged {
                    challenge: Challenge {
                        target: target.participant(),
                        original_claim: target.summary.clone(),
                        argument: reply.counter_argument,
                        evidence: reply.evidence,
                        severity: reply.severity.unwrap_or(Severity::Medium),
                    },
                    degraded: false,
                },
                Err(e) => {
                    warn!(target = %target.participant(), round, error = %e, "challenge parse failed, using placeholder");
                    self.placeholder(target)
                }
            },
            Err(e) => {
                warn!(target = %target.participant(), round, error = %e, "challenge generation failed, using placeholder");
                self.placeholder(target)
            }
        }
    }

    fn placeholder(&self, target: &Opinion) -> Challenged {
        Challenged {
            challenge: Challenge {
                target: target.participant(),
                original_claim: target.summary.clone(),
                argument: "No counter-argument could be generated this round.".to_string(),
                evidence: Vec::new(),
                severity: Severity::Low,
            },
            degraded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GenerateError;
    use async_trait::async_trait;

    struct ScriptedGenerator(Result<String, ()>);

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, GenerateError> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(GenerateError::RequestFailed("down".to_string())),
            }
        }
    }

    fn target() -> Opinion {
        Opinion::new(
            crate::opinion::ParticipantId::Valuation,
            8.5,
            85.0,
            "undervalued on normalized FCF",
        )
    }

    #[test]
    fn test_intensity_ladder() {
        assert_eq!(ChallengeIntensity::for_round(1), ChallengeIntensity::Moderate);
        assert_eq!(ChallengeIntensity::for_round(2), ChallengeIntensity::Aggressive);
        assert_eq!(
            ChallengeIntensity::for_round(3),
            ChallengeIntensity::FinalVerification
        );
        // Clamped past the configured maximum.
        assert_eq!(
            ChallengeIntensity::for_round(17),
            ChallengeIntensity::FinalVerification
        );
    }

    #[test]
    fn test_intensity_display() {
        assert_eq!(ChallengeIntensity::Moderate.to_string(), "moderate");
        assert_eq!(ChallengeIntensity::Aggressive.to_string(), "aggressive");
        assert_eq!(
            ChallengeIntensity::FinalVerification.to_string(),
            "final_verification"
        );
    }

    #[tokio::test]
    async fn test_well_formed_challenge() {
        let generator = Arc::new(ScriptedGenerator(Ok(r#"{
            "counter_argument": "FCF normalization assumes peak margins persist",
            "evidence": ["gross margin 8pts above 10y mean", "competitor capacity coming online"],
            "severity": "high"
        }"#
        .to_string())));
        let challenger = Challenger::new(generator);

        let out = challenger
            .challenge(&target(), 1, &SubjectContext::new("ACME", "Acme Corp"))
            .await;
        assert!(!out.degraded);
        assert_eq!(out.challenge.severity, Severity::High);
        assert_eq!(out.challenge.evidence.len(), 2);
        assert_eq!(out.challenge.original_claim, "undervalued on normalized FCF");
    }

    #[tokio::test]
    async fn test_missing_severity_defaults_to_medium() {
        let generator = Arc::new(ScriptedGenerator(Ok(
            r#"{"counter_argument": "thin moat"}"#.to_string()
        )));
        let challenger = Challenger::new(generator);
        let out = challenger
            .challenge(&target(), 1, &SubjectContext::new("ACME", "Acme Corp"))
            .await;
        assert!(!out.degraded);
        assert_eq!(out.challenge.severity, Severity::Medium);
        assert!(out.challenge.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_degrades_to_placeholder() {
        let challenger = Challenger::new(Arc::new(ScriptedGenerator(Err(()))));
        let out = challenger
            .challenge(&target(), 2, &SubjectContext::new("ACME", "Acme Corp"))
            .await;
        assert!(out.degraded);
        assert_eq!(out.challenge.severity, Severity::Low);
        assert_eq!(out.challenge.target, crate::opinion::ParticipantId::Valuation);
    }

    #[tokio::test]
    async fn test_unparsable_response_degrades_to_placeholder() {
        let challenger = Challenger::new(Arc::new(ScriptedGenerator(Ok(
            "I refuse to answer in JSON".to_string(),
        ))));
        let out = challenger
            .challenge(&target(), 1, &SubjectContext::new("ACME", "Acme Corp"))
            .await;
        assert!(out.degraded);
        assert_eq!(out.challenge.severity, Severity::Low);
    }
}
