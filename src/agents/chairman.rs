//! The Chairman — synthesizes the final committee decision from the
//! post-debate opinion set.
//!
//! The numeric core (confidence-weighted score, variance-based consensus
//! level) is pure arithmetic and always produces a decision. The
//! qualitative fields come from one enrichment generation call whose
//! failure degrades to placeholder text without blocking the numbers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::SubjectContext;
use crate::debate::consensus::population_variance;
use crate::debate::exchange::DebateTranscript;
use crate::generate::TextGenerator;
use crate::opinion::{Opinion, ParticipantId, Sentiment};
use crate::parse::parse_structured;

/// Assumed maximum score variance on the [1, 10] scale, used to normalize
/// variance into a consensus percentage.
pub const MAX_SCORE_VARIANCE: f64 = 20.0;

/// Score used when there are no participants to aggregate.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Score gap between two participants that counts as a dissent worth
/// surfacing.
const DISSENT_GAP: f64 = 3.0;

/// One participant's vote in the final tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeVote {
    pub participant: ParticipantId,
    pub score: f64,
    pub confidence: f64,
    pub sentiment: Sentiment,
    pub rationale: String,
}

/// The Chairman's final decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeDecision {
    pub ticker: String,
    pub votes: Vec<CommitteeVote>,
    /// Confidence-weighted mean score, one decimal place.
    pub weighted_score: f64,
    /// Agreement percentage derived from score variance, one decimal place.
    pub consensus_level: f64,
    /// Sentiment implied by the weighted score.
    pub final_sentiment: Sentiment,
    pub recommendation: String,
    pub executive_summary: String,
    pub investment_thesis: String,
    pub target_price_low: Option<f64>,
    pub target_price_mid: Option<f64>,
    pub target_price_high: Option<f64>,
    /// Participant pairs still far apart at close of debate.
    pub dissenting_opinions: Vec<String>,
    /// Whether the qualitative fields came from the fallback path.
    pub enrichment_degraded: bool,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Confidence-weighted mean of vote scores.
///
/// Zero total confidence falls back to the unweighted mean; no votes at
/// all falls back to [`NEUTRAL_SCORE`]. Rounded to one decimal place.
pub fn weighted_score(votes: &[CommitteeVote]) -> f64 {
    if votes.is_empty() {
        return NEUTRAL_SCORE;
    }
    let total_confidence: f64 = votes.iter().map(|v| v.confidence).sum();
    if total_confidence == 0.0 {
        let mean = votes.iter().map(|v| v.score).sum::<f64>() / votes.len() as f64;
        return round1(mean);
    }
    let total: f64 = votes.iter().map(|v| v.score * v.confidence).sum();
    round1(total / total_confidence)
}

/// Consensus percentage from the variance of non-challenger vote scores.
///
/// `max(0, 100 − variance / MAX_SCORE_VARIANCE × 100)`, defined as 100
/// with fewer than 2 scored votes. Rounded to one decimal place.
pub fn consensus_level(votes: &[CommitteeVote]) -> f64 {
    let scores: Vec<f64> = votes
        .iter()
        .filter(|v| !v.participant.is_challenger())
        .map(|v| v.score)
        .collect();
    if scores.len() < 2 {
        return 100.0;
    }
    let variance = population_variance(&scores);
    round1((100.0 - variance / MAX_SCORE_VARIANCE * 100.0).max(0.0))
}

/// Recommendation label for a sentiment.
fn recommendation_for(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::VeryBullish => "Strong Buy",
        Sentiment::Bullish => "Buy",
        Sentiment::Neutral => "Hold",
        Sentiment::Bearish => "Sell",
        Sentiment::VeryBearish => "Strong Sell",
    }
}

const CHAIRMAN_SYSTEM_PROMPT: &str = "\
You are the Chairman of an investment committee. Synthesize the analysts' \
final opinions and the debate history into a balanced, well-reasoned \
recommendation. Be transparent about remaining disagreement.";

#[derive(Debug, Deserialize)]
struct EnrichmentReply {
    executive_summary: Option<String>,
    investment_thesis: Option<String>,
    recommendation: Option<String>,
    target_price_low: Option<f64>,
    target_price_mid: Option<f64>,
    target_price_high: Option<f64>,
}

/// Synthesizes the final decision.
pub struct Chairman {
    generator: Arc<dyn TextGenerator>,
}

impl Chairman {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Produce the committee decision from the final opinion set.
    pub async fn synthesize(
        &self,
        final_opinions: &BTreeMap<ParticipantId, Opinion>,
        transcript: &DebateTranscript,
        context: &SubjectContext,
    ) -> CommitteeDecision {
        let votes: Vec<CommitteeVote> = final_opinions
            .values()
            .map(|op| CommitteeVote {
                participant: op.participant(),
                score: op.score(),
                confidence: op.confidence(),
                sentiment: op.sentiment(),
                rationale: op.summary.clone(),
            })
            .collect();

        let weighted = weighted_score(&votes);
        let consensus = consensus_level(&votes);
        let final_sentiment = Sentiment::from_score(weighted);
        let dissenting = dissents(&votes);

        info!(
            ticker = %context.ticker,
            weighted,
            consensus,
            "synthesizing committee decision"
        );

        let (enrichment, degraded) = self.enrich(&votes, transcript, context).await;

        CommitteeDecision {
            ticker: context.ticker.clone(),
            votes,
            weighted_score: weighted,
            consensus_level: consensus,
            final_sentiment,
            recommendation: enrichment
                .recommendation
                .unwrap_or_else(|| recommendation_for(final_sentiment).to_string()),
            executive_summary: enrichment
                .executive_summary
                .unwrap_or_else(|| format!("Committee settled at {}/10 for {}.", weighted, context.ticker)),
            investment_thesis: enrichment
                .investment_thesis
                .unwrap_or_else(|| "No qualitative thesis available.".to_string()),
            target_price_low: enrichment.target_price_low,
            target_price_mid: enrichment.target_price_mid,
            target_price_high: enrichment.target_price_high,
            dissenting_opinions: dissenting,
            enrichment_degraded: degraded,
        }
    }

    /// The opaque enrichment call. Any failure degrades to an empty reply
    /// so the numeric decision is never blocked.
    async fn enrich(
        &self,
        votes: &[CommitteeVote],
        transcript: &DebateTranscript,
        context: &SubjectContext,
    ) -> (EnrichmentReply, bool) {
        let empty = EnrichmentReply {
            executive_summary: None,
            investment_thesis: None,
            recommendation: None,
            target_price_low: None,
            target_price_mid: None,
            target_price_high: None,
        };

        let votes_json = match serde_json::to_string_pretty(votes) {
            Ok(json) => json,
            Err(_) => return (empty, true),
        };

        let user_prompt = format!(
            "{}\n## Final committee votes\n{}\n\n\
             ## Debate\n{} rounds, consensus reached: {}\n\n\
             Provide the qualitative decision fields in JSON:\n\
             {{\n  \"executive_summary\": \"<2-3 sentences>\",\n\
               \"investment_thesis\": \"<brief thesis>\",\n\
               \"recommendation\": \"<Strong Buy|Buy|Hold|Sell|Strong Sell>\",\n\
               \"target_price_low\": <number>,\n\
               \"target_price_mid\": <number>,\n\
               \"target_price_high\": <number>\n}}",
            context.prompt_block(),
            votes_json,
            transcript.total_rounds(),
            transcript.consensus_reached,
        );

        match self.generator.generate(CHAIRMAN_SYSTEM_PROMPT, &user_prompt).await {
            Ok(raw) => match parse_structured::<EnrichmentReply>(&raw) {
                Ok(reply) => (reply, false),
                Err(e) => {
                    warn!(error = %e, "chairman enrichment parse failed, using placeholders");
                    (empty, true)
                }
            },
            Err(e) => {
                warn!(error = %e, "chairman enrichment generation failed, using placeholders");
                (empty, true)
            }
        }
    }
}

/// Participant pairs whose scores remain at least [`DISSENT_GAP`] apart.
fn dissents(votes: &[CommitteeVote]) -> Vec<String> {
    let mut out = Vec::new();
    for (i, a) in votes.iter().enumerate() {
        for b in &votes[i + 1..] {
            if (a.score - b.score).abs() >= DISSENT_GAP {
                out.push(format!(
                    "{} ({}/10) vs {} ({}/10)",
                    a.participant, a.score, b.participant, b.score
                ));
            }
        }
    }
    out
}
