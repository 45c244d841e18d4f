//! The resumable-computation contract that jobs wrap.
//!
//! A task advances by exactly one logical step per [`Task::advance`] call and
//! eventually reports exhaustion with [`StepOutcome::Done`]. Exhaustion is a
//! normal terminal signal, not an error; a step that fails returns `Err` and
//! the dispatcher propagates it.

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of advancing a task by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// One step of work was done; the task has more to do. Carries the value
    /// the step produced, if any.
    Yielded(Option<String>),
    /// The task has nothing left to produce.
    Done,
}

/// A computation that can be advanced one step at a time.
///
/// `Send + Sync` because jobs cross into deferred-admission timer tasks and
/// sit behind the shared queue lock.
#[async_trait]
pub trait Task: Send + Sync {
    async fn advance(&mut self) -> Result<StepOutcome>;
}

/// The form in which a job owns its task.
pub type BoxedTask = Box<dyn Task>;
