//! Operator console: boots the engine and streams what it does.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use fleet_core::models::WeatherRisk;
use fleet_engine::{DemoScenario, EngineConfig, FleetEngine};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fleet-console", about = "Run the drone fleet simulation")]
struct Args {
    /// Play the scripted demo scenario after boot
    #[arg(long)]
    demo: bool,
    /// Seconds between printed per-drone risk digests
    #[arg(long, default_value_t = 15)]
    risk_interval_secs: u64,
    /// Pin the weather classification (ok, warning, no_fly)
    #[arg(long)]
    weather: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let engine = Arc::new(FleetEngine::new(EngineConfig::from_env()));
    engine.start();

    if let Some(mode) = args.weather.as_deref() {
        let level = match mode {
            "ok" => WeatherRisk::Ok,
            "warning" => WeatherRisk::Warning,
            "no_fly" => WeatherRisk::NoFly,
            other => bail!("unknown weather mode '{other}' (ok, warning, no_fly)"),
        };
        engine.set_weather_override(Some(level));
    }

    // Mirror the audit stream onto the console.
    let mut events = engine.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::info!(source = ?event.source, level = ?event.level, "{}", event.title)
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    if args.demo {
        DemoScenario::new(engine.clone()).start("console");
    }

    // Periodic per-drone risk digest.
    let digest_engine = engine.clone();
    let digest_interval = Duration::from_secs(args.risk_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(digest_interval);
        loop {
            ticker.tick().await;
            for drone in digest_engine.vehicles() {
                if let Some(summary) = digest_engine.risk_for(&drone.id) {
                    tracing::info!(
                        drone = %drone.code,
                        status = ?drone.status,
                        level = %summary.level,
                        score = summary.score,
                        "risk digest"
                    );
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    engine.shutdown();
    Ok(())
}
