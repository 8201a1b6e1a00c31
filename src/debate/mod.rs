//! Debate Orchestration — Challenge-Defense Consensus Loop
//!
//! State machine for structured debate between the Devil's Advocate and
//! the other committee participants, terminating on score consensus or
//! round exhaustion.
//!
//! # Debate Flow
//!
//! ```text
//! NotStarted → Round N: Challenge → Defense → Arbitration
//!                 │                               │
//!                 │        apply concessions ◄────┘
//!                 │                │
//!                 │                ▼
//!                 │         [consensus?]
//!                 │                ├─ Yes → Converged
//!                 │                ├─ No, rounds left → Round N+1
//!                 │                └─ No, max rounds → Exhausted
//! ```

pub mod consensus;
pub mod exchange;
pub mod orchestrator;
pub mod round;
pub mod summary;

pub use consensus::{check_consensus, population_variance};
pub use exchange::{
    Challenge, DebateMessage, DebateTranscript, Defense, MessageKind, RoundRecord, Stance,
};
pub use orchestrator::{DebateError, DebateOrchestrator, DebateState};
pub use round::{RoundController, RoundOutcome};
pub use summary::{debate_summary, DebateSummary, Highlight, HighlightKind, ScoreChange};
