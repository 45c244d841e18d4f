//! Dispatch-path tests: FIFO fairness, cooperative cycling, run-time expiry,
//! dependency gating, and dispatch-loop termination.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rondo::config::SchedulerConfig;
use rondo::scheduler::{Job, JobState, Scheduler};
use rondo::task::{BoxedTask, StepOutcome, Task};
use rondo::{Result, RondoError};
use tokio_util::sync::CancellationToken;

/// Shared record of which task advanced, in order.
#[derive(Clone, Default)]
struct StepLog(Arc<Mutex<Vec<&'static str>>>);

impl StepLog {
    fn push(&self, name: &'static str) {
        self.0.lock().unwrap().push(name);
    }

    fn entries(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, name: &'static str) -> usize {
        self.entries().iter().filter(|&&n| n == name).count()
    }
}

/// Yields `remaining` times, recording every advance call (including the one
/// that discovers exhaustion, matching generator semantics).
struct Recorder {
    name: &'static str,
    remaining: usize,
    log: StepLog,
}

#[async_trait]
impl Task for Recorder {
    async fn advance(&mut self) -> Result<StepOutcome> {
        self.log.push(self.name);
        if self.remaining == 0 {
            return Ok(StepOutcome::Done);
        }
        self.remaining -= 1;
        Ok(StepOutcome::Yielded(None))
    }
}

struct Failing;

#[async_trait]
impl Task for Failing {
    async fn advance(&mut self) -> Result<StepOutcome> {
        Err(RondoError::Task("boom".into()))
    }
}

fn recording_job(name: &'static str, yields: usize, log: &StepLog) -> Job {
    let log = log.clone();
    Job::builder()
        .build(move || {
            Ok(Box::new(Recorder {
                name,
                remaining: yields,
                log,
            }) as BoxedTask)
        })
        .unwrap()
}

async fn dispatch_once(scheduler: &Scheduler) -> Result<Option<String>> {
    let job = scheduler.get_task().await;
    scheduler.run_task(job).await
}

#[tokio::test]
async fn fifo_fairness_between_unconditioned_jobs() {
    let log = StepLog::default();
    let scheduler = Scheduler::new(SchedulerConfig::default());

    scheduler.schedule(recording_job("a", 3, &log)).await;
    scheduler.schedule(recording_job("b", 3, &log)).await;

    dispatch_once(&scheduler).await.unwrap();
    dispatch_once(&scheduler).await.unwrap();

    assert_eq!(log.entries(), vec!["a", "b"]);
}

#[tokio::test]
async fn job_with_n_yields_is_dropped_on_the_n_plus_first_dispatch() {
    let log = StepLog::default();
    let scheduler = Scheduler::new(SchedulerConfig::default());

    let job = recording_job("only", 3, &log);
    let id = job.id;
    scheduler.schedule(job).await;

    for _ in 0..3 {
        dispatch_once(&scheduler).await.unwrap();
    }
    assert_eq!(scheduler.queue().read().await.state(id), Some(JobState::Queued));

    dispatch_once(&scheduler).await.unwrap();
    assert_eq!(scheduler.queue().read().await.state(id), Some(JobState::Done));
    assert!(scheduler.queue().read().await.is_empty());
    assert_eq!(log.count("only"), 4);
}

#[tokio::test]
async fn expired_job_is_dropped_without_further_steps() {
    let log = StepLog::default();
    let scheduler = Scheduler::new(SchedulerConfig::default());

    let job = Job::builder()
        .duration(Duration::from_millis(150))
        .build({
            let log = log.clone();
            move || {
                Ok(Box::new(Recorder {
                    name: "doomed",
                    remaining: 100,
                    log,
                }) as BoxedTask)
            }
        })
        .unwrap();
    let id = job.id;
    scheduler.schedule(job).await;

    dispatch_once(&scheduler).await.unwrap();
    assert_eq!(log.count("doomed"), 1);

    tokio::time::sleep(Duration::from_millis(250)).await;

    dispatch_once(&scheduler).await.unwrap();
    assert_eq!(log.count("doomed"), 1, "no step after the deadline passed");
    assert_eq!(
        scheduler.queue().read().await.state(id),
        Some(JobState::Expired)
    );
    assert!(scheduler.queue().read().await.is_empty());
}

#[tokio::test]
async fn dependent_job_cycles_until_its_dependency_leaves_the_queue() {
    let log = StepLog::default();
    let scheduler = Scheduler::new(SchedulerConfig::default());

    let dep = recording_job("dep", 1, &log);
    let dep_id = dep.id;
    let job = Job::builder()
        .dependency(dep)
        .build({
            let log = log.clone();
            move || {
                Ok(Box::new(Recorder {
                    name: "waiter",
                    remaining: 1,
                    log,
                }) as BoxedTask)
            }
        })
        .unwrap();
    scheduler.schedule(job).await;

    // round 1: dep steps once and requeues
    dispatch_once(&scheduler).await.unwrap();
    assert_eq!(log.count("dep"), 1);

    // round 2: waiter is head but dep is still queued, so it cycles unstepped
    dispatch_once(&scheduler).await.unwrap();
    assert_eq!(log.count("waiter"), 0);

    // round 3: dep exhausts and is dropped
    dispatch_once(&scheduler).await.unwrap();
    assert_eq!(
        scheduler.queue().read().await.state(dep_id),
        Some(JobState::Done)
    );

    // round 4: waiter is eligible now
    dispatch_once(&scheduler).await.unwrap();
    assert_eq!(log.count("waiter"), 1);
}

#[tokio::test]
async fn run_loop_interleaves_jobs_round_robin() {
    let log = StepLog::default();
    let scheduler = Scheduler::new(
        SchedulerConfig::default().with_poll_interval(Duration::from_millis(10)),
    );

    let a = recording_job("a", 2, &log);
    let b = recording_job("b", 1, &log);
    let (a_id, b_id) = (a.id, b.id);
    scheduler.schedule(a).await;
    scheduler.schedule(b).await;

    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let scheduler = scheduler.clone();
        let token = token.clone();
        async move { scheduler.run(token).await }
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    token.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(log.entries(), vec!["a", "b", "a", "b", "a"]);
    let queue = scheduler.queue();
    assert_eq!(queue.read().await.state(a_id), Some(JobState::Done));
    assert_eq!(queue.read().await.state(b_id), Some(JobState::Done));
    assert!(queue.read().await.is_empty());
}

#[tokio::test]
async fn step_failure_terminates_the_dispatch_loop() {
    let scheduler = Scheduler::new(SchedulerConfig::default());
    let job = Job::builder()
        .build(|| Ok(Box::new(Failing) as BoxedTask))
        .unwrap();
    scheduler.schedule(job).await;

    let result = scheduler.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(RondoError::Task(_))));
}

#[tokio::test]
async fn cancellation_stops_an_idle_dispatcher() {
    let scheduler = Scheduler::new(
        SchedulerConfig::default().with_poll_interval(Duration::from_millis(10)),
    );
    let token = CancellationToken::new();
    let handle = tokio::spawn({
        let scheduler = scheduler.clone();
        let token = token.clone();
        async move { scheduler.run(token).await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    token.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn dispatching_nothing_is_a_noop() {
    let scheduler = Scheduler::new(SchedulerConfig::default());
    assert_eq!(scheduler.run_task(None).await.unwrap(), None);
}

#[tokio::test]
async fn yielded_value_is_returned_by_dispatch() {
    struct YieldOnce {
        value: Option<String>,
    }

    #[async_trait]
    impl Task for YieldOnce {
        async fn advance(&mut self) -> Result<StepOutcome> {
            match self.value.take() {
                Some(value) => Ok(StepOutcome::Yielded(Some(value))),
                None => Ok(StepOutcome::Done),
            }
        }
    }

    let scheduler = Scheduler::new(SchedulerConfig::default());
    let job = Job::builder()
        .build(|| {
            Ok(Box::new(YieldOnce {
                value: Some("payload".to_string()),
            }) as BoxedTask)
        })
        .unwrap();
    scheduler.schedule(job).await;

    let value = dispatch_once(&scheduler).await.unwrap();
    assert_eq!(value.as_deref(), Some("payload"));
}
