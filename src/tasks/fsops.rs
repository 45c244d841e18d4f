use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// Creates and immediately removes `dir_<n>` under the root, one directory
/// per step.
pub struct DirChurn {
    root: PathBuf,
    rounds: usize,
    completed: usize,
}

impl DirChurn {
    pub fn new(root: impl Into<PathBuf>, rounds: usize) -> Self {
        Self {
            root: root.into(),
            rounds,
            completed: 0,
        }
    }
}

#[async_trait]
impl Task for DirChurn {
    async fn advance(&mut self) -> Result<StepOutcome> {
        if self.completed >= self.rounds {
            tracing::info!("Directory churn finished");
            return Ok(StepOutcome::Done);
        }

        let dir = self.root.join(format!("dir_{}", self.completed));
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::remove_dir_all(&dir).await?;
        tracing::debug!(dir = %dir.display(), "Churned directory");
        self.completed += 1;
        Ok(StepOutcome::Yielded(None))
    }
}
