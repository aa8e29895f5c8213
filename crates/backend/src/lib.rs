//! Model backend implementations for GradePilot.
//!
//! Currently one backend: the Anthropic Messages API. It implements both
//! `ModelBackend` (the grading loop's peer) and `FeedbackDrafter` (the
//! secondary structured-feedback call).

pub mod anthropic;
pub mod drafter;

pub use anthropic::AnthropicBackend;
