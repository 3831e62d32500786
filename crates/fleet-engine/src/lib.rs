//! In-memory drone fleet simulation and flight-risk engine.
//!
//! One process owns a fixed fleet: commands mutate drone status through
//! the registry, a periodic tick advances every drone's telemetry and
//! detects arrivals, and risk is recomputed on demand from the current
//! record, telemetry, and weather classification. Everything a
//! presentation layer needs goes through [`FleetEngine`].

pub mod config;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod loops;
pub mod registry;
pub mod risk_monitor;
pub mod scenario;
pub mod seed;
pub mod simulator;
pub mod weather;

pub use config::EngineConfig;
pub use engine::FleetEngine;
pub use scenario::DemoScenario;
pub use weather::{OpenMeteoGateway, WeatherError, WeatherGateway, WeatherMonitor};
