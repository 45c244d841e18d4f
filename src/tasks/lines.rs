use std::collections::VecDeque;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// Writes `count` numbered lines to a file in its first step, then reports
/// exhaustion on the next.
pub struct WriteLines {
    path: PathBuf,
    count: usize,
    written: bool,
}

impl WriteLines {
    pub fn new(path: impl Into<PathBuf>, count: usize) -> Self {
        Self {
            path: path.into(),
            count,
            written: false,
        }
    }
}

#[async_trait]
impl Task for WriteLines {
    async fn advance(&mut self) -> Result<StepOutcome> {
        if self.written {
            tracing::info!(path = %self.path.display(), "Write finished");
            return Ok(StepOutcome::Done);
        }

        let body: String = (0..self.count).map(|n| format!("{n}\n")).collect();
        tokio::fs::write(&self.path, body).await?;
        self.written = true;
        tracing::info!(path = %self.path.display(), count = self.count, "Wrote lines");
        Ok(StepOutcome::Yielded(None))
    }
}

/// Reads a file on its first step, then yields one line per step.
pub struct ReadLines {
    path: PathBuf,
    pending: Option<VecDeque<String>>,
}

impl ReadLines {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: None,
        }
    }
}

#[async_trait]
impl Task for ReadLines {
    async fn advance(&mut self) -> Result<StepOutcome> {
        if self.pending.is_none() {
            let text = tokio::fs::read_to_string(&self.path).await?;
            self.pending = Some(text.lines().map(String::from).collect());
        }

        match self.pending.as_mut().and_then(VecDeque::pop_front) {
            Some(line) => {
                tracing::debug!(%line, "Read line");
                Ok(StepOutcome::Yielded(Some(line)))
            }
            None => {
                tracing::info!(path = %self.path.display(), "Read finished");
                Ok(StepOutcome::Done)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.txt");

        let mut writer = WriteLines::new(&path, 3);
        assert_eq!(writer.advance().await.unwrap(), StepOutcome::Yielded(None));
        assert_eq!(writer.advance().await.unwrap(), StepOutcome::Done);

        let mut reader = ReadLines::new(&path);
        for expected in ["0", "1", "2"] {
            let outcome = reader.advance().await.unwrap();
            assert_eq!(outcome, StepOutcome::Yielded(Some(expected.to_string())));
        }
        assert_eq!(reader.advance().await.unwrap(), StepOutcome::Done);
    }

    #[tokio::test]
    async fn read_missing_file_is_a_step_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = ReadLines::new(dir.path().join("absent.txt"));
        assert!(reader.advance().await.is_err());
    }
}
