//! Weather context for the planned moment.
//!
//! Lookups never fail: every problem is turned into a readable sentence that is
//! passed to the model in place of the forecast.

use crate::config::WeatherConfig;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

pub const TOO_FAR_MESSAGE: &str = "날짜가 너무 멀어 날씨 정보를 가져올 수 없습니다.";
pub const UNAVAILABLE_MESSAGE: &str = "날씨 정보를 가져올 수 없습니다.";

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no forecast available")]
    NoForecast,
    #[error("invalid local time: {0}")]
    InvalidTime(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
}

#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn lookup(&self, date: NaiveDate, time: NaiveTime) -> String;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<Forecast>,
}

#[derive(Debug, Clone, Deserialize)]
struct Forecast {
    /// Unix timestamp of the 3-hour slot
    dt: i64,
    main: Readings,
    weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
struct Readings {
    temp: f64,
    feels_like: f64,
    humidity: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct Condition {
    description: String,
}

/// OpenWeather 5 day / 3 hour forecast client
pub struct OpenWeather {
    client: Client,
    api_key: String,
    config: WeatherConfig,
}

impl OpenWeather {
    pub fn new(api_key: impl Into<String>, config: WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Forecast for the slot closest to `target`
    pub async fn forecast(&self, target: DateTime<Local>) -> Result<String, WeatherError> {
        let url = format!(
            "{}?lat={}&lon={}&appid={}&units=metric&lang={}",
            FORECAST_URL, self.config.lat, self.config.lon, self.api_key, self.config.lang
        );
        let response: ForecastResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(slots = response.list.len(), target = %target, "Fetched forecast");
        closest_slot(&response.list, target.timestamp())
            .map(describe)
            .ok_or(WeatherError::NoForecast)
    }
}

#[async_trait]
impl WeatherLookup for OpenWeather {
    async fn lookup(&self, date: NaiveDate, time: NaiveTime) -> String {
        let target = match Local.from_local_datetime(&date.and_time(time)).earliest() {
            Some(target) => target,
            None => return error_message(&WeatherError::InvalidTime(format!("{date} {time}"))),
        };
        if too_far(target, Local::now(), self.config.horizon_days) {
            return TOO_FAR_MESSAGE.to_string();
        }

        let result = match tokio::time::timeout(self.config.timeout(), self.forecast(target)).await
        {
            Ok(result) => result,
            Err(_) => Err(WeatherError::Timeout(self.config.timeout_secs)),
        };
        result.unwrap_or_else(|e| {
            warn!(error = %e, "Weather lookup failed");
            error_message(&e)
        })
    }
}

fn too_far(target: DateTime<Local>, now: DateTime<Local>, horizon_days: i64) -> bool {
    (target - now).num_days() > horizon_days
}

fn error_message(error: &WeatherError) -> String {
    match error {
        WeatherError::NoForecast => UNAVAILABLE_MESSAGE.to_string(),
        other => format!("날씨 정보를 가져오는 중 오류가 발생했습니다: {}", other),
    }
}

fn closest_slot(list: &[Forecast], target: i64) -> Option<&Forecast> {
    list.iter().min_by_key(|slot| (slot.dt - target).abs())
}

fn describe(slot: &Forecast) -> String {
    let description = slot
        .weather
        .first()
        .map(|c| c.description.as_str())
        .unwrap_or("정보 없음");
    format!(
        "날씨: {}\n기온: {:.1}°C\n체감온도: {:.1}°C\n습도: {}%",
        description, slot.main.temp, slot.main.feels_like, slot.main.humidity
    )
}
