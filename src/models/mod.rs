//! Domain models for the development plan.
//!
//! # Core Concepts
//!
//! - [`Iteration`]: One versioned development cycle. At most one iteration is
//!   active at a time; completed iterations are archived in place.
//! - [`Requirement`]: A piece of a goal, decomposed within one iteration.
//! - [`Task`]: An executable unit of work under a requirement.
//! - [`IterationSummary`]: The derived counts kept in the iterations index.
//! - [`ProjectContext`]: Where the plan lives and what is currently active.

mod context;
mod iteration;
mod requirement;
mod task;

pub use context::*;
pub use iteration::*;
pub use requirement::*;
pub use task::*;

use thiserror::Error;

/// Returned when a status/priority/complexity/mode string is not recognised.
#[derive(Debug, Clone, Error)]
#[error("invalid {field} '{value}'. Must be: {expected}")]
pub struct InvalidValue {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static str,
}
