use std::fmt;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, RondoError};
use crate::task::{BoxedTask, StepOutcome};

/// Fixed format for schedule strings: minute resolution, no timezone.
/// Strings are interpreted as UTC.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Where a job ended up, as tracked by the queue.
///
/// `Queued` covers the whole time a job occupies a queue slot, including the
/// instants it is popped and being stepped. The dispatcher records `Done` or
/// `Expired` when it drops the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Queued,
    Done,
    Expired,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Queued => write!(f, "queued"),
            JobState::Done => write!(f, "done"),
            JobState::Expired => write!(f, "expired"),
        }
    }
}

/// A schedulable unit: one resumable task plus timing and dependency
/// metadata.
pub struct Job {
    /// Unique, immutable, and the sole identity used for dependency checks.
    pub id: Uuid,
    /// The job must not be admitted before this instant.
    pub start_at: Option<DateTime<Utc>>,
    /// Elapsed-time budget.
    pub duration: Option<Duration>,
    /// Deadline, computed once at construction and never recomputed:
    /// `start_at + duration` if both were given, `now + duration` if only
    /// the duration was, absent otherwise.
    pub end_at: Option<DateTime<Utc>>,
    /// Retry budget. Carried on the job but not enforced yet.
    pub tries: u32,
    /// Jobs that must leave the queue before this one may run a step.
    /// Owned here until admission drains them into the queue.
    pub(crate) dependencies: Vec<Job>,
    depends_on: Vec<Uuid>,
    task: BoxedTask,
}

impl Job {
    pub fn builder() -> JobBuilder {
        JobBuilder::default()
    }

    /// Advance the task exactly one step.
    ///
    /// `StepOutcome::Done` signals exhaustion and is terminal, not an error
    /// to retry. A failing step returns `Err`.
    pub async fn run(&mut self) -> Result<StepOutcome> {
        self.task.advance().await
    }

    /// Ids of the declared dependencies, recorded at construction.
    pub fn depends_on(&self) -> &[Uuid] {
        &self.depends_on
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("start_at", &self.start_at)
            .field("end_at", &self.end_at)
            .field("tries", &self.tries)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Job`]. The task factory runs eagerly in [`build`], so a
/// construction failure surfaces to the caller right there.
///
/// [`build`]: JobBuilder::build
#[derive(Default)]
pub struct JobBuilder {
    start_at: Option<String>,
    start_at_time: Option<DateTime<Utc>>,
    duration: Option<StdDuration>,
    tries: u32,
    dependencies: Vec<Job>,
}

impl JobBuilder {
    /// Start window as a schedule string in [`TIME_FORMAT`].
    pub fn start_at(mut self, when: impl Into<String>) -> Self {
        self.start_at = Some(when.into());
        self
    }

    /// Typed start window. The string form has minute resolution; use this
    /// when the instant is already at hand. Takes precedence over
    /// [`start_at`](Self::start_at).
    pub fn start_at_time(mut self, when: DateTime<Utc>) -> Self {
        self.start_at_time = Some(when);
        self
    }

    pub fn duration(mut self, duration: StdDuration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    /// Declare a dependency: `dep` must leave the queue before the built job
    /// runs a step. The dependency is owned by the built job until admission.
    pub fn dependency(mut self, dep: Job) -> Self {
        self.dependencies.push(dep);
        self
    }

    pub fn build<F>(self, factory: F) -> Result<Job>
    where
        F: FnOnce() -> Result<BoxedTask>,
    {
        let start_at = match (self.start_at_time, self.start_at.as_deref()) {
            (Some(when), _) => Some(when),
            (None, Some(value)) => Some(parse_start_at(value)?),
            (None, None) => None,
        };
        let duration = self
            .duration
            .map(|d| Duration::from_std(d).map_err(|_| RondoError::InvalidDuration(d)))
            .transpose()?;
        let end_at = match (start_at, duration) {
            (Some(start), Some(budget)) => Some(start + budget),
            (None, Some(budget)) => Some(Utc::now() + budget),
            _ => None,
        };
        let depends_on = self.dependencies.iter().map(|dep| dep.id).collect();
        let task = factory()?;

        Ok(Job {
            id: Uuid::new_v4(),
            start_at,
            duration,
            end_at,
            tries: self.tries,
            dependencies: self.dependencies,
            depends_on,
            task,
        })
    }
}

/// Parse a schedule string against [`TIME_FORMAT`].
pub fn parse_start_at(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| RondoError::InvalidStartTime(value.to_string()))
}
