//! The GradePilot grading loop.
//!
//! One invocation follows a fixed cycle:
//!
//! 1. **Build the briefing** (persona + task instructions + session snapshot), once
//! 2. **Call the model backend** with briefing + conversation + tool catalog
//! 3. **If tool calls**: dispatch them in response order, append results, loop
//! 4. **Terminate** on a text-only turn, the completion signal, the iteration
//!    bound, or a transport failure
//!
//! `GradingLoop::run` accumulates silently to a `LoopResult`;
//! `GradingLoop::run_stream` emits each transition as a `StreamEvent` with
//! identical dispatch semantics.

pub mod briefing;
pub mod loop_runner;
pub mod stream;

pub use briefing::build_briefing;
pub use loop_runner::GradingLoop;
pub use stream::{into_stream, StreamEvent};
