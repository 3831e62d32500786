//! Fixed-period simulation tick.
//!
//! The single driver of the fleet: one task, one tick at a time, stopped
//! by an explicit shutdown signal rather than by counting subscribers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::simulator::TelemetrySimulator;

pub async fn run_sim_loop(
    simulator: Arc<TelemetrySimulator>,
    tick_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    // The first tick fires immediately so subscribers see data right away.
    let mut ticker = interval(tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Simulation loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                simulator.tick();
            }
        }
    }
}
