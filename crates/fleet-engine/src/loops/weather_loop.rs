//! Periodic weather poll, independent of the simulation tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::weather::WeatherMonitor;

pub async fn run_weather_loop(
    weather: Arc<WeatherMonitor>,
    poll_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(poll_interval);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Weather loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                weather.refresh().await;
            }
        }
    }
}
