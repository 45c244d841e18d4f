use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use crate::scheduler::job::{Job, JobState};

const DEFAULT_POOL_SIZE: usize = 10;

/// Bounded FIFO admission queue plus per-job state bookkeeping.
///
/// Queue order is dispatch order. The state map is what dependency gating
/// consults: a job counts as [`JobState::Queued`] from admission until the
/// dispatcher drops it, so a popped job mid-step still blocks its
/// dependents.
#[derive(Debug)]
pub struct JobQueue {
    jobs: VecDeque<Job>,
    states: HashMap<Uuid, JobState>,
    pool_size: usize,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_SIZE)
    }

    pub fn with_capacity(pool_size: usize) -> Self {
        Self {
            jobs: VecDeque::new(),
            states: HashMap::new(),
            pool_size,
        }
    }

    /// Append a job to the tail and mark it queued.
    ///
    /// Unconditional: admission gates on [`is_full`](Self::is_full) before
    /// calling this, and deferred jobs land here without re-checking, so the
    /// queue can grow past `pool_size`.
    pub fn push(&mut self, job: Job) {
        self.states.insert(job.id, JobState::Queued);
        self.jobs.push_back(job);
    }

    /// Put a popped job back at the tail. Its state entry is untouched; a
    /// cycling job stays queued.
    pub fn requeue(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    /// Pop the queue head, if any.
    pub fn pop_front(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    pub fn mark_done(&mut self, id: Uuid) {
        self.states.insert(id, JobState::Done);
    }

    pub fn mark_expired(&mut self, id: Uuid) {
        self.states.insert(id, JobState::Expired);
    }

    /// Last recorded state of a job, or `None` if it was never admitted.
    pub fn state(&self, id: Uuid) -> Option<JobState> {
        self.states.get(&id).copied()
    }

    /// True while the job occupies a queue slot (admitted, not yet dropped).
    pub fn is_queued(&self, id: Uuid) -> bool {
        matches!(self.state(id), Some(JobState::Queued))
    }

    /// Job ids in dispatch order.
    pub fn ids(&self) -> Vec<Uuid> {
        self.jobs.iter().map(|job| job.id).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// True when the queue is at or beyond capacity.
    pub fn is_full(&self) -> bool {
        self.jobs.len() >= self.pool_size
    }
}
