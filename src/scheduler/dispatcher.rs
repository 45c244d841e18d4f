use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::scheduler::job::Job;
use crate::scheduler::queue::JobQueue;
use crate::task::StepOutcome;

/// The dispatcher: admission control, deferred-admission timers, dependency
/// gating, and the cooperative round-robin dispatch loop.
///
/// Cloning is cheap; clones share the same queue.
#[derive(Clone)]
pub struct Scheduler {
    queue: Arc<RwLock<JobQueue>>,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            queue: Arc::new(RwLock::new(JobQueue::with_capacity(config.pool_size))),
            poll_interval: config.poll_interval,
        }
    }

    /// Shared handle to the queue, for observers.
    pub fn queue(&self) -> Arc<RwLock<JobQueue>> {
        Arc::clone(&self.queue)
    }

    /// Admit a job into the queue.
    ///
    /// Returns `true` only when the job entered the queue now. A deferred
    /// job (future `start_at`) returns `false` and is appended by a one-shot
    /// timer once its window opens; a rejected job (queue full, or
    /// `start_at` already past) returns `false` and is dropped. Declared
    /// dependencies are admitted first, each subject to its own checks, so
    /// they sit ahead of the dependent in the queue.
    pub async fn schedule(&self, job: Job) -> bool {
        let mut queue = self.queue.write().await;
        self.admit(&mut queue, job)
    }

    fn admit(&self, queue: &mut JobQueue, mut job: Job) -> bool {
        if queue.is_full() {
            tracing::error!(job_id = %job.id, "Queue is full, rejecting job");
            return false;
        }

        if let Some(start_at) = job.start_at {
            let now = Utc::now();
            if start_at < now {
                tracing::info!(job_id = %job.id, %start_at, "Start time already passed, rejecting job");
                return false;
            }
            if start_at > now {
                tracing::info!(job_id = %job.id, %start_at, "Deferring job until its start time");
                let delay = (start_at - now).to_std().unwrap_or(Duration::ZERO);
                let queue_handle = Arc::clone(&self.queue);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    tracing::info!(job_id = %job.id, "Deferred job entering queue");
                    // Admission checks ran when the job was scheduled; the
                    // deferred landing appends unconditionally, so the queue
                    // can exceed pool_size here.
                    queue_handle.write().await.push(job);
                });
                return false;
            }
        }

        for dependency in std::mem::take(&mut job.dependencies) {
            self.admit(queue, dependency);
        }

        tracing::info!(job_id = %job.id, "Job admitted");
        queue.push(job);
        true
    }

    /// Pop the next job to dispatch, if any. Non-blocking.
    pub async fn get_task(&self) -> Option<Job> {
        self.queue.write().await.pop_front()
    }

    /// Dispatch a single job: expiry check, dependency gate, one step.
    ///
    /// Returns the value the step produced, if any. Exhaustion drops the
    /// job; a step failure propagates to the caller.
    pub async fn run_task(&self, job: Option<Job>) -> Result<Option<String>> {
        let Some(mut job) = job else {
            return Ok(None);
        };

        if let Some(end_at) = job.end_at {
            if end_at < Utc::now() {
                tracing::info!(job_id = %job.id, %end_at, "Job deadline passed, dropping");
                self.queue.write().await.mark_expired(job.id);
                return Ok(None);
            }
        }

        if !job.depends_on().is_empty() {
            let mut queue = self.queue.write().await;
            let pending = job.depends_on().iter().copied().find(|id| queue.is_queued(*id));
            if let Some(dependency) = pending {
                tracing::info!(job_id = %job.id, %dependency, "Waiting for dependency, requeueing");
                queue.requeue(job);
                return Ok(None);
            }
        }

        tracing::info!(job_id = %job.id, "Running job step");
        match job.run().await? {
            StepOutcome::Done => {
                tracing::info!(job_id = %job.id, "Job finished");
                self.queue.write().await.mark_done(job.id);
                Ok(None)
            }
            StepOutcome::Yielded(value) => {
                if let Some(ref value) = value {
                    tracing::debug!(job_id = %job.id, %value, "Job step yielded");
                }
                self.queue.write().await.requeue(job);
                Ok(value)
            }
        }
    }

    /// Drive the dispatch loop until the token is cancelled.
    ///
    /// Each cycle pops the queue head, dispatches it for one step, and
    /// sleeps the poll interval. A step failure terminates the loop with
    /// that error; jobs are not isolated from one another's failures.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        tracing::info!("Starting dispatcher");
        loop {
            let job = self.get_task().await;
            self.run_task(job).await?;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, dispatcher stopping");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}
