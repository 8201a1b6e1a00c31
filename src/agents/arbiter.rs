//! Defense-strength arbitration and rebuttal escalation.
//!
//! The strength rule is a pure policy, separate from the generation call
//! that produces the rebuttal text: only weak defenses are rebutted, and
//! a rebuttal never alters scores — it is informational pressure carried
//! into the next round's challenge.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::context::SubjectContext;
use crate::debate::exchange::{Challenge, Defense};
use crate::generate::TextGenerator;
use crate::parse::parse_structured;

/// A defense acknowledging more risks than this is weak.
pub const MAX_ACKNOWLEDGED_RISKS: usize = 3;

/// An adjusted score below this marks the defense as weak.
pub const WEAK_SCORE_FLOOR: f64 = 4.0;

/// Whether a defense is strong enough to escape rebuttal.
///
/// Weak iff it acknowledges more than [`MAX_ACKNOWLEDGED_RISKS`] risks, or
/// its adjusted score is present and below [`WEAK_SCORE_FLOOR`].
pub fn is_strong_defense(defense: &Defense) -> bool {
    if defense.acknowledged_risks.len() > MAX_ACKNOWLEDGED_RISKS {
        return false;
    }
    if let Some(score) = defense.adjusted_score {
        if score < WEAK_SCORE_FLOOR {
            return false;
        }
    }
    true
}

const ARBITER_SYSTEM_PROMPT: &str = "\
You are the Devil's Advocate evaluating an analyst's defense of their \
position. Judge whether the defense is logical and evidence-based, and \
press any core concern it left unresolved.";

#[derive(Debug, Deserialize)]
struct RebuttalReply {
    rebuttal: String,
}

/// Issues rebuttals against weak defenses.
pub struct Arbiter {
    generator: Arc<dyn TextGenerator>,
}

impl Arbiter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Generate a rebuttal for a weak defense.
    ///
    /// Returns `None` on generation or parse failure; the round proceeds
    /// without a rebuttal for that participant.
    pub async fn rebut(
        &self,
        challenge: &Challenge,
        defense: &Defense,
        context: &SubjectContext,
    ) -> Option<String> {
        let user_prompt = format!(
            "{}\n## Original challenge\n{}\n\n## The analyst's defense\n{}\n\n\
             Acknowledged risks: {}\n\n\
             Evaluate this defense and respond in JSON:\n\
             {{\n  \"rebuttal\": \"<your rebuttal, or acceptance if the defense holds>\"\n}}",
            context.prompt_block(),
            challenge.argument,
            defense.response,
            defense.acknowledged_risks.join("; "),
        );

        match self.generator.generate(ARBITER_SYSTEM_PROMPT, &user_prompt).await {
            Ok(raw) => match parse_structured::<RebuttalReply>(&raw) {
                Ok(reply) => Some(reply.rebuttal),
                Err(e) => {
                    warn!(participant = %defense.participant, error = %e, "rebuttal parse failed");
                    None
                }
            },
            Err(e) => {
                warn!(participant = %defense.participant, error = %e, "rebuttal generation failed");
                None
            }
        }
    }
}
