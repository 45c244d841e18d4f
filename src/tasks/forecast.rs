use std::collections::VecDeque;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::task::{StepOutcome, Task};

/// One city's forecast, as served by the weather endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastReport {
    pub city: String,
    pub temp_c: f64,
    pub condition: String,
}

/// Thin client for the weather service.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    base_url: String,
    http: reqwest::Client,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn forecast(&self, city: &str) -> Result<ForecastReport> {
        let url = format!("{}/forecast/{}", self.base_url, city);
        let report = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(report)
    }
}

/// Polls the weather service, one city per step, yielding a summary line.
pub struct ForecastTask {
    client: WeatherClient,
    cities: VecDeque<String>,
}

impl ForecastTask {
    pub fn new(client: WeatherClient, cities: impl IntoIterator<Item = String>) -> Self {
        Self {
            client,
            cities: cities.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Task for ForecastTask {
    async fn advance(&mut self) -> Result<StepOutcome> {
        let Some(city) = self.cities.pop_front() else {
            tracing::info!("Forecast polling finished");
            return Ok(StepOutcome::Done);
        };

        let report = self.client.forecast(&city).await?;
        let summary = format!("{}: {:.1}C, {}", report.city, report.temp_c, report.condition);
        tracing::info!(%city, %summary, "Fetched forecast");
        Ok(StepOutcome::Yielded(Some(summary)))
    }
}
