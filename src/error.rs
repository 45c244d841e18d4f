use thiserror::Error;

#[derive(Error, Debug)]
pub enum RondoError {
    #[error("invalid start time {0:?}, expected format YYYY-MM-DD HH:MM")]
    InvalidStartTime(String),

    #[error("duration {0:?} is out of range")]
    InvalidDuration(std::time::Duration),

    #[error("task failed: {0}")]
    Task(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, RondoError>;
