//! Engine configuration from environment.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Period of the simulation tick
    pub tick_interval: Duration,
    /// Period of the weather poll
    pub weather_poll_interval: Duration,
    /// Artificial latency applied to command submissions
    pub command_latency: Duration,
    /// Flight ledger ring size
    pub ledger_capacity: usize,
    /// Audit event log ring size
    pub event_capacity: usize,
    /// Station-cluster point the weather classification is fetched for
    pub cluster_lat: f64,
    pub cluster_lon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(3),
            weather_poll_interval: Duration::from_secs(120),
            command_latency: Duration::from_millis(500),
            ledger_capacity: 200,
            event_capacity: 300,
            cluster_lat: 55.03,
            cluster_lon: 82.92,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_interval: env_millis("FLEET_TICK_MS").unwrap_or(defaults.tick_interval),
            weather_poll_interval: env_secs("FLEET_WEATHER_POLL_SECS")
                .unwrap_or(defaults.weather_poll_interval),
            command_latency: env_millis("FLEET_COMMAND_LATENCY_MS")
                .unwrap_or(defaults.command_latency),
            ledger_capacity: env_parse("FLEET_LEDGER_CAPACITY").unwrap_or(defaults.ledger_capacity),
            event_capacity: env_parse("FLEET_EVENT_CAPACITY").unwrap_or(defaults.event_capacity),
            cluster_lat: env_parse("FLEET_CLUSTER_LAT").unwrap_or(defaults.cluster_lat),
            cluster_lon: env_parse("FLEET_CLUSTER_LON").unwrap_or(defaults.cluster_lon),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_millis(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_millis)
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_secs)
}
