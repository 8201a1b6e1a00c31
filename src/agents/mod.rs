//! Committee agents — the generation-backed roles in the debate.
//!
//! Each agent wraps a [`crate::generate::TextGenerator`], builds a prompt,
//! and converts the response into a typed value at the parse boundary.
//! Every agent has a documented degraded fallback so one malfunctioning
//! participant can never stall a round.

pub mod arbiter;
pub mod chairman;
pub mod challenger;
pub mod defender;

pub use arbiter::{is_strong_defense, Arbiter};
pub use chairman::{Chairman, CommitteeDecision, CommitteeVote};
pub use challenger::{ChallengeIntensity, Challenged, Challenger};
pub use defender::Defender;
