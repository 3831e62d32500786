//! Scripted demo flow exercising commands, stations, and events.
//!
//! Plays a fixed sequence against the seeded fleet: bring the stations
//! up, send two drones out, recall them, then fault and recover the
//! southern station. Meant for demos and smoke runs, not for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fleet_core::models::{EventLevel, EventSource, StationStatus};
use tokio::time::sleep;

use crate::engine::FleetEngine;

pub struct DemoScenario {
    engine: Arc<FleetEngine>,
    running: Arc<AtomicBool>,
}

impl DemoScenario {
    pub fn new(engine: Arc<FleetEngine>) -> Self {
        Self {
            engine,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Play the sequence in a background task. A second start while one is
    /// already running only logs and returns `false`.
    pub fn start(&self, actor: &str) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            self.engine.event_bus().publish(
                "Demo scenario is already running",
                EventLevel::Info,
                EventSource::System,
            );
            return false;
        }

        let engine = self.engine.clone();
        let running = self.running.clone();
        let actor = actor.to_string();
        tokio::spawn(async move {
            engine.event_bus().publish(
                format!("Operator {actor} started the station demo scenario"),
                EventLevel::Info,
                EventSource::Operator,
            );

            sleep(Duration::from_millis(500)).await;
            engine.set_station_status("st-1", StationStatus::Online);
            engine.set_station_status("st-2", StationStatus::Online);

            sleep(Duration::from_millis(1500)).await;
            engine.dispatch("dr-101", &actor).await;

            sleep(Duration::from_millis(2500)).await;
            engine.dispatch("dr-102", &actor).await;

            sleep(Duration::from_millis(3000)).await;
            engine.recall("dr-101", &actor).await;

            sleep(Duration::from_millis(3000)).await;
            engine.recall("dr-102", &actor).await;

            sleep(Duration::from_millis(3000)).await;
            engine.set_station_status("st-3", StationStatus::Error);

            sleep(Duration::from_millis(3000)).await;
            engine.set_station_status("st-3", StationStatus::Online);
            engine.event_bus().publish(
                "Demo scenario finished. System back to normal operation",
                EventLevel::Info,
                EventSource::System,
            );

            running.store(false, Ordering::SeqCst);
        });
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::weather::{WeatherError, WeatherGateway};
    use async_trait::async_trait;
    use fleet_core::models::WeatherReport;

    struct NoWeather;

    #[async_trait]
    impl WeatherGateway for NoWeather {
        async fn classify(&self) -> Result<WeatherReport, WeatherError> {
            Err(WeatherError::Unavailable("offline".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_runs_once_and_rejects_overlap() {
        let config = EngineConfig {
            command_latency: Duration::from_millis(10),
            ..EngineConfig::default()
        };
        let engine = Arc::new(FleetEngine::with_gateway(config, Arc::new(NoWeather)));
        let scenario = DemoScenario::new(engine.clone());

        assert!(scenario.start("demo"));
        // Give the task a moment to pass the opening step.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(scenario.is_running());
        assert!(!scenario.start("demo"));

        // Let the whole script play out under paused time.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!scenario.is_running());

        let titles: Vec<String> = engine
            .recent_events(50)
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert!(titles.iter().any(|t| t.contains("started the station demo scenario")));
        assert!(titles.iter().any(|t| t.contains("already running")));
        assert!(titles.iter().any(|t| t.contains("Demo scenario finished")));
    }
}
