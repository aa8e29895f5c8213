//! # GradePilot Core
//!
//! Domain types, traits, and error definitions for the GradePilot grading agent.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (model backend, LMS, content extractor, history
//! store, feedback drafter) is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod backend;
pub mod error;
pub mod extract;
pub mod feedback;
pub mod history;
pub mod lms;
pub mod message;
pub mod task;

// Re-export key types at crate root for ergonomics
pub use backend::{BackendRequest, BackendResponse, ModelBackend, ToolDeclaration};
pub use error::{Error, Result};
pub use extract::{ContentExtractor, DocumentType};
pub use feedback::{FeedbackDraft, FeedbackDrafter};
pub use history::{CompetencyRecord, GradeEntry, HistoryStore, StudentHistory, Trend};
pub use lms::{Assignment, Course, LmsClient, Submission};
pub use message::{ContentBlock, Message, Role};
pub use task::{
    FeedbackExample, ImageAttachment, LoopRequest, LoopResult, SessionContext, TaskType,
};
