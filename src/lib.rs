//! Investment Committee Debate Engine
//!
//! This library provides:
//! - Structured opinions with clamped scores and score-derived sentiment
//! - A challenge-defense-arbitration debate loop with a contrarian
//!   Devil's Advocate and per-participant defenders
//! - Variance-based consensus detection with bounded rounds
//! - Chairman synthesis into a confidence-weighted committee decision
//!
//! # Usage
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use committee::{
//!     AnthropicGenerator, Chairman, DebateConfig, DebateOrchestrator, Opinion, ParticipantId,
//!     SubjectContext,
//! };
//!
//! # async fn run() -> Result<(), committee::DebateError> {
//! let generator = Arc::new(AnthropicGenerator::new("api-key", "claude-sonnet-4-5"));
//! let context = SubjectContext::new("ACME", "Acme Corp").with_sector("Industrials");
//!
//! let mut opinions = BTreeMap::new();
//! opinions.insert(
//!     ParticipantId::Macro,
//!     Opinion::new(ParticipantId::Macro, 7.5, 80.0, "rate cuts support multiples"),
//! );
//! opinions.insert(
//!     ParticipantId::Valuation,
//!     Opinion::new(ParticipantId::Valuation, 4.0, 70.0, "rich versus peers"),
//! );
//! opinions.insert(
//!     ParticipantId::DevilsAdvocate,
//!     Opinion::new(ParticipantId::DevilsAdvocate, 3.0, 60.0, "consensus is crowded"),
//! );
//!
//! let mut orchestrator = DebateOrchestrator::new(generator.clone(), DebateConfig::default());
//! let transcript = orchestrator.run_debate(opinions, &context).await?;
//!
//! let chairman = Chairman::new(generator);
//! let decision = chairman
//!     .synthesize(&transcript.final_opinions, &transcript, &context)
//!     .await;
//! println!("{}: {}", decision.ticker, decision.recommendation);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod config;
pub mod context;
pub mod debate;
pub mod generate;
pub mod opinion;
pub mod parse;

// Re-export opinion model types
pub use opinion::{Opinion, ParticipantId, Sentiment, Severity};

// Re-export configuration types
pub use config::{DebateConfig, CONFIDENCE_DECAY, VARIANCE_CONSENSUS_THRESHOLD};

// Re-export subject context
pub use context::SubjectContext;

// Re-export generation types
pub use generate::{AnthropicGenerator, BoundedGenerator, GenerateError, TextGenerator};

// Re-export debate types
pub use debate::{
    debate_summary, DebateError, DebateOrchestrator, DebateState, DebateSummary, DebateTranscript,
    RoundRecord, Stance,
};

// Re-export agent types
pub use agents::{Arbiter, Chairman, Challenger, CommitteeDecision, CommitteeVote, Defender};
