//! Demo task bodies for the dispatcher.
//!
//! These are ordinary [`Task`](crate::task::Task) implementations; the
//! scheduler knows nothing about them beyond the step contract. Each holds
//! its own explicit cursor and reports `Done` once exhausted.

pub mod forecast;
pub mod fsops;
pub mod lines;

pub use forecast::{ForecastTask, WeatherClient};
pub use fsops::DirChurn;
pub use lines::{ReadLines, WriteLines};
