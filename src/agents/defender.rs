//! Defenders — one per challengeable participant, answering the
//! challenges raised against their opinions.
//!
//! `defend` never fails. A generation or parse failure yields the
//! documented fallback defense (no score change, no acknowledged risks,
//! stance maintained) so one participant's malfunction cannot stall the
//! round.

use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use crate::context::SubjectContext;
use crate::debate::exchange::{Challenge, Defense, Stance};
use crate::generate::TextGenerator;
use crate::opinion::{clamp_score, Opinion, ParticipantId};
use crate::parse::parse_structured;

/// Fallback response text when a defense cannot be generated.
pub const DEFENSE_FAILED_TEXT: &str = "Defense could not be generated; position maintained.";

const DEFENDER_SYSTEM_PROMPT: &str = "\
You are a senior analyst on an investment committee defending your \
analysis against the Devil's Advocate. Rebut the challenge with evidence \
where your position holds; concede honestly where it does not, and adjust \
your score if the challenge genuinely changes your assessment.";

/// Shape of the structured defense response.
#[derive(Debug, Deserialize)]
struct DefenseReply {
    defense: String,
    adjusted_score: Option<f64>,
    #[serde(default)]
    acknowledged_risks: Vec<String>,
    final_stance: Option<Stance>,
}

/// Defense generator for one participant.
pub struct Defender {
    participant: ParticipantId,
    generator: Arc<dyn TextGenerator>,
}

impl Defender {
    pub fn new(participant: ParticipantId, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            participant,
            generator,
        }
    }

    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    /// Answer a challenge against the participant's current opinion.
    ///
    /// An out-of-domain adjusted score from the generator is clamped to
    /// the nearest score boundary before being accepted.
    pub async fn defend(
        &self,
        challenge: &Challenge,
        current: &Opinion,
        round: u32,
        context: &SubjectContext,
    ) -> Defense {
        let user_prompt = format!(
            "{}\n## Your original analysis\n\
             - Score: {}/10\n- Summary: {}\n- Key points: {}\n\n\
             ## The challenge ({} severity)\n{}\n\nEvidence cited: {}\n\n\
             Respond in JSON:\n\
             {{\n  \"defense\": \"<your rebuttal or concession>\",\n\
               \"adjusted_score\": null or a number 1-10,\n\
               \"acknowledged_risks\": [\"<risks you now accept>\"],\n\
               \"final_stance\": \"<maintain|partially_concede|fully_concede>\"\n}}",
            context.prompt_block(),
            current.score(),
            current.summary,
            current.key_points.join("; "),
            challenge.severity,
            challenge.argument,
            challenge.evidence.join("; "),
        );

        match self.generator.generate(DEFENDER_SYSTEM_PROMPT, &user_prompt).await {
            Ok(raw) => match parse_structured::<DefenseReply>(&raw) {
                Ok(reply) => Defense {
                    participant: self.participant,
                    round,
                    response: reply.defense,
                    adjusted_score: reply.adjusted_score.map(clamp_score),
                    acknowledged_risks: reply.acknowledged_risks,
                    stance: reply.final_stance.unwrap_or_default(),
                },
                Err(e) => {
                    warn!(participant = %self.participant, round, error = %e, "defense parse failed, using fallback");
                    self.fallback(round)
                }
            },
            Err(e) => {
                warn!(participant = %self.participant, round, error = %e, "defense generation failed, using fallback");
                self.fallback(round)
            }
        }
    }

    fn fallback(&self, round: u32) -> Defense {
        Defense {
            participant: self.participant,
            round,
            response: DEFENSE_FAILED_TEXT.to_string(),
            adjusted_score: None,
            acknowledged_risks: Vec::new(),
            stance: Stance::Maintain,
        }
    }
}
