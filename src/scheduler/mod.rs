pub mod dispatcher;
pub mod job;
pub mod queue;

pub use dispatcher::Scheduler;
pub use job::{Job, JobBuilder, JobState};
pub use queue::JobQueue;
