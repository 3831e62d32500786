//! Per-drone kinematic simulation, advanced on a fixed tick.
//!
//! The simulator owns the telemetry table but no drone records: status
//! and attractor points are read from the registry and the ledger, and
//! any transition it triggers (arrival, critical battery) goes back
//! through the registry. One tick processes the whole fleet before a
//! snapshot is published, so subscribers never see a half-advanced fleet.

use std::ops::Range;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use fleet_core::geo::{planar_distance, random_point_near};
use fleet_core::models::{Drone, DroneStatus, DroneTelemetry, EventLevel, EventSource, GeoPoint};
use rand::Rng;
use tokio::sync::broadcast;

use crate::events::EventBus;
use crate::ledger::{FlightLedger, FlightOutcome};
use crate::registry::FleetRegistry;

/// Fraction of the remaining distance covered toward the mission target
/// per tick.
const MISSION_PULL: f64 = 0.02;
/// Fraction of the remaining distance covered toward home per tick.
const RETURN_PULL: f64 = 0.03;
/// Positional noise per axis per tick, in degrees.
const JITTER_DEG: f64 = 0.001;
/// Planar arrival threshold in degrees, roughly 150-200 m at the
/// simulated latitude.
const ARRIVAL_THRESHOLD_DEG: f64 = 0.002;
/// Battery level at or below which an active drone is forced into error.
const CRITICAL_BATTERY: f64 = 10.0;
/// Spread of the initial position around the attractor, per axis.
const SPAWN_SPREAD_DEG: f64 = 0.005;

const BATTERY_DRAIN_MISSION: Range<f64> = 1.0..2.0;
const BATTERY_DRAIN_RETURN: Range<f64> = 0.5..1.0;
const SPEED_BAND_MISSION: Range<f64> = 40.0..50.0;
const SPEED_BAND_RETURN: Range<f64> = 30.0..40.0;

/// Buffer of the snapshot fan-out channel.
const SNAPSHOT_BUFFER: usize = 16;

pub struct TelemetrySimulator {
    registry: Arc<FleetRegistry>,
    ledger: Arc<FlightLedger>,
    events: Arc<EventBus>,
    telemetry: DashMap<String, DroneTelemetry>,
    /// Drones that already produced a critical-battery event. Kept for the
    /// process lifetime so the alarm fires once per drone.
    battery_notified: DashMap<String, ()>,
    snapshot_tx: broadcast::Sender<Vec<DroneTelemetry>>,
}

impl TelemetrySimulator {
    pub fn new(
        registry: Arc<FleetRegistry>,
        ledger: Arc<FlightLedger>,
        events: Arc<EventBus>,
    ) -> Self {
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_BUFFER);
        Self {
            registry,
            ledger,
            events,
            telemetry: DashMap::new(),
            battery_notified: DashMap::new(),
            snapshot_tx,
        }
    }

    /// Advance every drone by one step, then publish one whole-fleet
    /// snapshot.
    pub fn tick(&self) {
        for drone_id in self.registry.drone_ids() {
            let Some(drone) = self.registry.vehicle(&drone_id) else {
                // One bad record must not take the rest of the fleet down.
                tracing::warn!(drone = %drone_id, "skipping tick for missing drone record");
                continue;
            };
            self.advance_drone(&drone);
        }
        let _ = self.snapshot_tx.send(self.snapshot());
    }

    /// Current telemetry for the whole fleet, ordered by drone id.
    pub fn snapshot(&self) -> Vec<DroneTelemetry> {
        let mut all: Vec<DroneTelemetry> =
            self.telemetry.iter().map(|t| t.value().clone()).collect();
        all.sort_by(|a, b| a.drone_id.cmp(&b.drone_id));
        all
    }

    pub fn for_drone(&self, drone_id: &str) -> Option<DroneTelemetry> {
        self.telemetry.get(drone_id).map(|t| t.value().clone())
    }

    /// Live stream of post-tick fleet snapshots. Dropping the receiver is
    /// the unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<DroneTelemetry>> {
        self.snapshot_tx.subscribe()
    }

    fn advance_drone(&self, drone: &Drone) {
        let station = self.registry.station_for(drone);
        let home = GeoPoint::new(station.lat, station.lon);
        let mut entry = self
            .telemetry
            .entry(drone.id.clone())
            .or_insert_with(|| self.spawn_telemetry(drone, home));

        match drone.status {
            DroneStatus::Idle | DroneStatus::Offline | DroneStatus::Error => {
                // Frozen: position and battery stay bit-for-bit; only the
                // freshness label goes stale.
                drop(entry);
                self.registry.touch_stale(&drone.id);
            }
            DroneStatus::OnMission => {
                let target = self.ledger.active_target(&drone.id).unwrap_or(home);
                self.advance_active(
                    entry.value_mut(),
                    drone,
                    target,
                    MISSION_PULL,
                    BATTERY_DRAIN_MISSION,
                    SPEED_BAND_MISSION,
                );
                drop(entry);
                // A mission drone circles its target until recalled; only
                // the return leg has arrival detection.
                self.check_critical_battery(drone);
            }
            DroneStatus::Returning => {
                let t = entry.value_mut();
                self.advance_active(
                    t,
                    drone,
                    home,
                    RETURN_PULL,
                    BATTERY_DRAIN_RETURN,
                    SPEED_BAND_RETURN,
                );

                if planar_distance(t.lat, t.lon, home.lat, home.lon) < ARRIVAL_THRESHOLD_DEG {
                    // Landed: pin the drone to the pad and settle it.
                    t.lat = home.lat;
                    t.lon = home.lon;
                    t.altitude_m = 0.0;
                    t.speed_kmh = 0.0;
                    drop(entry);

                    self.registry.complete_return(&drone.id);
                    self.ledger.close(&drone.id, FlightOutcome::Completed);
                    self.events.publish(
                        format!(
                            "Drone {} completed its flight and returned to station {}",
                            drone.code, drone.station_id
                        ),
                        EventLevel::Info,
                        EventSource::Monitoring,
                    );
                    tracing::info!(drone = %drone.id, "returned to station");
                } else {
                    drop(entry);
                    self.check_critical_battery(drone);
                }
            }
        }
    }

    /// Shared movement step for the two active states.
    fn advance_active(
        &self,
        t: &mut DroneTelemetry,
        drone: &Drone,
        target: GeoPoint,
        pull: f64,
        drain: Range<f64>,
        speed_band: Range<f64>,
    ) {
        let mut rng = rand::rng();

        // Visual noise first, then the pull toward the attractor.
        t.lat += rng.random_range(-JITTER_DEG..=JITTER_DEG);
        t.lon += rng.random_range(-JITTER_DEG..=JITTER_DEG);
        t.lat += (target.lat - t.lat) * pull;
        t.lon += (target.lon - t.lon) * pull;

        // Speed is a status band, not a derivative of displacement.
        t.speed_kmh = rng.random_range(speed_band);

        t.altitude_m = (t.altitude_m + rng.random_range(-1.0..=1.0)).clamp(0.0, 120.0);
        t.signal = (t.signal + rng.random_range(-2.5..=2.5)).clamp(0.0, 100.0);

        if let Some(battery) = self
            .registry
            .drain_battery(&drone.id, rng.random_range(drain))
        {
            t.battery = battery;
        }
        t.last_update = Utc::now();
    }

    /// Fault an active drone whose charge ran out. The audit event fires
    /// once per drone; the status is forced either way, and no tick path
    /// brings the drone back, only an operator command does.
    fn check_critical_battery(&self, drone: &Drone) {
        let Some(current) = self.registry.vehicle(&drone.id) else {
            return;
        };
        if current.battery > CRITICAL_BATTERY {
            return;
        }

        self.registry.force_error(&drone.id, "Critical battery level");
        if self
            .battery_notified
            .insert(drone.id.clone(), ())
            .is_none()
        {
            self.events.publish(
                format!(
                    "Drone {} battery critically low ({:.0}%)",
                    drone.code, current.battery
                ),
                EventLevel::Error,
                EventSource::Monitoring,
            );
            tracing::error!(drone = %drone.id, battery = current.battery, "critical battery, drone faulted");
        }
    }

    /// First telemetry for a drone: near its current attractor, with a
    /// small offset so markers never stack exactly.
    fn spawn_telemetry(&self, drone: &Drone, home: GeoPoint) -> DroneTelemetry {
        let base = match drone.status {
            DroneStatus::OnMission => self.ledger.active_target(&drone.id).unwrap_or(home),
            _ => home,
        };
        let position = random_point_near(base, SPAWN_SPREAD_DEG);
        let mut rng = rand::rng();

        DroneTelemetry {
            drone_id: drone.id.clone(),
            lat: position.lat,
            lon: position.lon,
            altitude_m: rng.random_range(80.0..100.0),
            speed_kmh: rng.random_range(30.0..50.0),
            battery: drone.battery,
            signal: rng.random_range(70.0..100.0),
            last_update: Utc::now(),
        }
    }
}
