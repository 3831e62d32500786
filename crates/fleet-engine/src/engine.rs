//! Engine facade wiring the registry, ledger, simulator, and monitors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fleet_core::models::{
    CommandOutcome, Drone, DroneTelemetry, Flight, Station, StationStatus, SystemEvent,
    WeatherReport, WeatherRisk,
};
use fleet_core::risk::{evaluate, RiskSummary};
use tokio::sync::broadcast;

use crate::config::EngineConfig;
use crate::events::EventBus;
use crate::ledger::FlightLedger;
use crate::loops;
use crate::registry::FleetRegistry;
use crate::risk_monitor::RiskMonitor;
use crate::seed;
use crate::simulator::TelemetrySimulator;
use crate::weather::{OpenMeteoGateway, WeatherGateway, WeatherMonitor};

/// The in-process surface of the fleet simulation.
///
/// All reads return owned snapshots; all commands are async with the
/// configured artificial latency. One engine owns its background loops:
/// [`FleetEngine::start`] spawns them, [`FleetEngine::shutdown`] stops
/// them explicitly.
pub struct FleetEngine {
    config: EngineConfig,
    registry: Arc<FleetRegistry>,
    ledger: Arc<FlightLedger>,
    events: Arc<EventBus>,
    simulator: Arc<TelemetrySimulator>,
    risk_monitor: RiskMonitor,
    weather: Arc<WeatherMonitor>,
    shutdown_tx: broadcast::Sender<()>,
    started: AtomicBool,
}

impl FleetEngine {
    /// Engine with the live Open-Meteo weather gateway.
    pub fn new(config: EngineConfig) -> Self {
        let gateway = Arc::new(OpenMeteoGateway::new(config.cluster_lat, config.cluster_lon));
        Self::with_gateway(config, gateway)
    }

    /// Engine with a custom weather gateway (offline use, tests).
    pub fn with_gateway(config: EngineConfig, gateway: Arc<dyn WeatherGateway>) -> Self {
        let events = Arc::new(EventBus::new(config.event_capacity));
        let ledger = Arc::new(FlightLedger::new(config.ledger_capacity));
        ledger.seed(seed::demo_flights());

        let registry = Arc::new(FleetRegistry::new(
            seed::demo_fleet(),
            seed::demo_stations(),
            ledger.clone(),
            events.clone(),
            config.command_latency,
        ));
        let simulator = Arc::new(TelemetrySimulator::new(
            registry.clone(),
            ledger.clone(),
            events.clone(),
        ));
        let weather = Arc::new(WeatherMonitor::new(gateway, events.clone()));
        let risk_monitor = RiskMonitor::new(events.clone());
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            registry,
            ledger,
            events,
            simulator,
            risk_monitor,
            weather,
            shutdown_tx,
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the simulation tick and the weather poll. Idempotent.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        tokio::spawn(loops::run_sim_loop(
            self.simulator.clone(),
            self.config.tick_interval,
            self.shutdown_tx.subscribe(),
        ));
        tokio::spawn(loops::run_weather_loop(
            self.weather.clone(),
            self.config.weather_poll_interval,
            self.shutdown_tx.subscribe(),
        ));
        tracing::info!("Fleet engine started");
    }

    /// Stop both background loops.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        self.started.store(false, Ordering::SeqCst);
    }

    /// Advance the simulation by one step without the timer. The periodic
    /// loop is the normal driver; this exists for embedders that drive
    /// time themselves.
    pub fn tick(&self) {
        self.simulator.tick();
    }

    // ========== COMMANDS ==========

    pub async fn dispatch(&self, drone_id: &str, actor: &str) -> CommandOutcome {
        self.registry.dispatch(drone_id, actor).await
    }

    pub async fn recall(&self, drone_id: &str, actor: &str) -> CommandOutcome {
        self.registry.recall(drone_id, actor).await
    }

    pub async fn emergency_land(&self, drone_id: &str, actor: &str) -> CommandOutcome {
        self.registry.emergency_land(drone_id, actor).await
    }

    pub fn set_station_status(&self, station_id: &str, status: StationStatus) -> CommandOutcome {
        self.registry.set_station_status(station_id, status)
    }

    // ========== READS ==========

    pub fn vehicles(&self) -> Vec<Drone> {
        self.registry.vehicles()
    }

    pub fn vehicle(&self, drone_id: &str) -> Option<Drone> {
        self.registry.vehicle(drone_id)
    }

    pub fn vehicles_by_station(&self, station_id: &str) -> Vec<Drone> {
        self.registry.vehicles_by_station(station_id)
    }

    pub fn stations(&self) -> Vec<Station> {
        self.registry.stations()
    }

    pub fn station(&self, station_id: &str) -> Option<Station> {
        self.registry.station(station_id)
    }

    pub fn telemetry_snapshot(&self) -> Vec<DroneTelemetry> {
        self.simulator.snapshot()
    }

    pub fn telemetry_for(&self, drone_id: &str) -> Option<DroneTelemetry> {
        self.simulator.for_drone(drone_id)
    }

    pub fn flights(&self) -> Vec<Flight> {
        self.ledger.all()
    }

    pub fn flight(&self, flight_id: &str) -> Option<Flight> {
        self.ledger.get(flight_id)
    }

    pub fn flights_by_vehicle(&self, drone_id: &str) -> Vec<Flight> {
        self.ledger.by_drone(drone_id)
    }

    pub fn active_flights(&self) -> Vec<Flight> {
        self.ledger.active()
    }

    pub fn recent_events(&self, limit: usize) -> Vec<SystemEvent> {
        self.events.recent(limit)
    }

    pub fn latest_weather(&self) -> Option<WeatherReport> {
        self.weather.latest()
    }

    // ========== RISK ==========

    /// Evaluate the drone's risk right now. Never cached; every call runs
    /// the rules against the current record, telemetry, and weather, and
    /// feeds the result through the escalation monitor.
    pub fn risk_for(&self, drone_id: &str) -> Option<RiskSummary> {
        let drone = self.registry.vehicle(drone_id)?;
        let telemetry = self.simulator.for_drone(drone_id);
        let weather = self.weather.latest();
        let summary = evaluate(&drone, telemetry.as_ref(), weather.as_ref());
        self.risk_monitor.observe(&summary);
        Some(summary)
    }

    // ========== WEATHER ==========

    /// Pin or clear the simulated weather classification.
    pub fn set_weather_override(&self, mode: Option<WeatherRisk>) {
        self.weather.set_override(mode);
    }

    /// Force one weather poll outside the periodic loop.
    pub async fn refresh_weather(&self) {
        self.weather.refresh().await;
    }

    // ========== SUBSCRIPTIONS ==========

    /// Live stream of audit events. Dropping the receiver unsubscribes.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.events.subscribe()
    }

    /// Live stream of whole-fleet telemetry snapshots, one per tick.
    pub fn subscribe_telemetry(&self) -> broadcast::Receiver<Vec<DroneTelemetry>> {
        self.simulator.subscribe()
    }

    pub(crate) fn event_bus(&self) -> &Arc<EventBus> {
        &self.events
    }
}
