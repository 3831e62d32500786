//! Weather gateway and the poll-side classification state.
//!
//! The gateway is the only external dependency of the engine. Fetch
//! failures never surface to risk evaluation; the monitor keeps the last
//! good report and the weather rules simply do not fire until one exists.

use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use fleet_core::models::{EventLevel, EventSource, WeatherReport, WeatherRisk};
use fleet_core::weather::{classify_conditions, describe_weather_code};
use serde::Deserialize;
use thiserror::Error;

use crate::events::EventBus;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("weather gateway unavailable: {0}")]
    Unavailable(String),
}

/// Source of current flight conditions.
#[async_trait]
pub trait WeatherGateway: Send + Sync {
    async fn classify(&self) -> Result<WeatherReport, WeatherError>;
}

/// Live conditions from the Open-Meteo forecast API (no API key needed).
pub struct OpenMeteoGateway {
    client: reqwest::Client,
    lat: f64,
    lon: f64,
}

impl OpenMeteoGateway {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            client: reqwest::Client::new(),
            lat,
            lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    wind_speed_10m: f64,
    #[serde(default)]
    wind_gusts_10m: Option<f64>,
    /// Meters
    #[serde(default)]
    visibility: Option<f64>,
    /// Millimeters
    #[serde(default)]
    precipitation: Option<f64>,
    #[serde(default)]
    weather_code: Option<u16>,
}

#[async_trait]
impl WeatherGateway for OpenMeteoGateway {
    async fn classify(&self) -> Result<WeatherReport, WeatherError> {
        let current = self
            .client
            .get(OPEN_METEO_URL)
            .query(&[
                ("latitude", self.lat.to_string()),
                ("longitude", self.lon.to_string()),
                (
                    "current",
                    "temperature_2m,wind_speed_10m,wind_gusts_10m,visibility,precipitation,weather_code"
                        .to_string(),
                ),
                ("wind_speed_unit", "ms".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<ForecastResponse>()
            .await?
            .current;

        let visibility_km = current.visibility.map(|m| (m / 100.0).round() / 10.0);
        let precipitation_mm = current.precipitation.map(|mm| (mm * 10.0).round() / 10.0);
        let risk_level = classify_conditions(
            current.wind_speed_10m,
            current.wind_gusts_10m,
            visibility_km,
            precipitation_mm,
        );

        Ok(WeatherReport {
            temp_c: current.temperature_2m,
            wind_speed_ms: current.wind_speed_10m,
            wind_gust_ms: current.wind_gusts_10m,
            visibility_km,
            description: describe_weather_code(current.weather_code).to_string(),
            risk_level,
            updated_at: Utc::now(),
        })
    }
}

/// Holds the latest classification, the forced-override mode, and the
/// change tracking behind the weather audit events.
pub struct WeatherMonitor {
    gateway: Arc<dyn WeatherGateway>,
    events: Arc<EventBus>,
    latest: RwLock<Option<WeatherReport>>,
    forced: Mutex<Option<WeatherRisk>>,
    last_level: Mutex<Option<WeatherRisk>>,
}

impl WeatherMonitor {
    pub fn new(gateway: Arc<dyn WeatherGateway>, events: Arc<EventBus>) -> Self {
        Self {
            gateway,
            events,
            latest: RwLock::new(None),
            forced: Mutex::new(None),
            last_level: Mutex::new(None),
        }
    }

    /// Latest report with any forced override applied. `None` until the
    /// first successful fetch.
    pub fn latest(&self) -> Option<WeatherReport> {
        let report = match self.latest.read() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        }?;
        match self.override_mode() {
            Some(level) => Some(WeatherReport {
                risk_level: level,
                ..report
            }),
            None => Some(report),
        }
    }

    pub fn override_mode(&self) -> Option<WeatherRisk> {
        self.forced.lock().ok().and_then(|forced| *forced)
    }

    /// Pin the classification to a fixed level, or clear the pin. Each
    /// change is audited with the acting role.
    pub fn set_override(&self, mode: Option<WeatherRisk>) {
        if let Ok(mut forced) = self.forced.lock() {
            *forced = mode;
        }
        match mode {
            Some(WeatherRisk::NoFly) => {
                self.events.publish(
                    "Administrator enabled no-fly weather simulation",
                    EventLevel::Warning,
                    EventSource::Admin,
                );
            }
            Some(level) => {
                self.events.publish(
                    format!("Administrator set simulated weather risk level: {level}"),
                    EventLevel::Info,
                    EventSource::Admin,
                );
            }
            None => {
                self.events.publish(
                    "Administrator disabled weather simulation, using live data",
                    EventLevel::Info,
                    EventSource::Admin,
                );
            }
        }
    }

    /// Poll the gateway once. Failures are logged and absorbed.
    pub async fn refresh(&self) {
        match self.gateway.classify().await {
            Ok(mut report) => {
                if let Some(level) = self.override_mode() {
                    report.risk_level = level;
                }
                self.track_transition(report.risk_level, &report.description);
                if let Ok(mut latest) = self.latest.write() {
                    *latest = Some(report);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "weather fetch failed; keeping last classification");
            }
        }
    }

    /// Audit changes of the effective classification level.
    fn track_transition(&self, new_level: WeatherRisk, description: &str) {
        let Ok(mut last) = self.last_level.lock() else {
            return;
        };
        if *last == Some(new_level) {
            return;
        }

        match new_level {
            WeatherRisk::Warning => {
                self.events.publish(
                    format!("Weather conditions degraded: {description}"),
                    EventLevel::Warning,
                    EventSource::System,
                );
            }
            WeatherRisk::NoFly => {
                self.events.publish(
                    format!("No-fly weather in the station cluster area: {description}"),
                    EventLevel::Warning,
                    EventSource::System,
                );
            }
            WeatherRisk::Ok => {
                if matches!(*last, Some(WeatherRisk::Warning) | Some(WeatherRisk::NoFly)) {
                    self.events.publish(
                        "Weather conditions normalized, flights permitted",
                        EventLevel::Info,
                        EventSource::System,
                    );
                }
            }
        }
        *last = Some(new_level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedGateway {
        levels: Mutex<Vec<Result<WeatherRisk, ()>>>,
    }

    impl ScriptedGateway {
        fn new(levels: Vec<Result<WeatherRisk, ()>>) -> Self {
            Self {
                levels: Mutex::new(levels),
            }
        }
    }

    #[async_trait]
    impl WeatherGateway for ScriptedGateway {
        async fn classify(&self) -> Result<WeatherReport, WeatherError> {
            let next = self.levels.lock().unwrap().remove(0);
            match next {
                Ok(risk_level) => Ok(WeatherReport {
                    temp_c: -3.0,
                    wind_speed_ms: 12.0,
                    wind_gust_ms: Some(14.0),
                    visibility_km: Some(4.0),
                    description: "Snow".to_string(),
                    risk_level,
                    updated_at: Utc::now(),
                }),
                Err(()) => Err(WeatherError::Unavailable("scripted outage".to_string())),
            }
        }
    }

    fn monitor(levels: Vec<Result<WeatherRisk, ()>>) -> (Arc<EventBus>, WeatherMonitor) {
        let events = Arc::new(EventBus::new(50));
        let monitor = WeatherMonitor::new(Arc::new(ScriptedGateway::new(levels)), events.clone());
        (events, monitor)
    }

    #[tokio::test]
    async fn fetch_failure_keeps_the_last_good_report() {
        let (_events, monitor) = monitor(vec![Ok(WeatherRisk::Warning), Err(())]);

        monitor.refresh().await;
        assert_eq!(monitor.latest().unwrap().risk_level, WeatherRisk::Warning);

        monitor.refresh().await;
        assert_eq!(monitor.latest().unwrap().risk_level, WeatherRisk::Warning);
    }

    #[tokio::test]
    async fn before_any_fetch_there_is_no_report() {
        let (_events, monitor) = monitor(vec![]);
        assert!(monitor.latest().is_none());
    }

    #[tokio::test]
    async fn level_transitions_are_audited_once() {
        let (events, monitor) = monitor(vec![
            Ok(WeatherRisk::Ok),
            Ok(WeatherRisk::Warning),
            Ok(WeatherRisk::Warning),
            Ok(WeatherRisk::Ok),
        ]);

        for _ in 0..4 {
            monitor.refresh().await;
        }

        let titles: Vec<String> = events.recent(10).into_iter().map(|e| e.title).collect();
        // One degradation, one normalization; the repeat stays silent and
        // the initial ok has nothing to normalize from.
        assert_eq!(titles.len(), 2);
        assert!(titles[1].starts_with("Weather conditions degraded"));
        assert!(titles[0].starts_with("Weather conditions normalized"));
    }

    #[tokio::test]
    async fn override_pins_the_effective_level() {
        let (events, monitor) = monitor(vec![Ok(WeatherRisk::Ok)]);

        monitor.refresh().await;
        monitor.set_override(Some(WeatherRisk::NoFly));
        assert_eq!(monitor.latest().unwrap().risk_level, WeatherRisk::NoFly);

        let newest = &events.recent(1)[0];
        assert_eq!(newest.level, EventLevel::Warning);
        assert_eq!(newest.source, EventSource::Admin);

        monitor.set_override(None);
        assert_eq!(monitor.latest().unwrap().risk_level, WeatherRisk::Ok);
    }
}
