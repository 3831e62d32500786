//! Authoritative drone and station store, and the command layer that
//! mutates it.
//!
//! Every status transition goes through this registry, whether it comes
//! from an operator command or from the simulator. Per-drone entry locks
//! serialize concurrent commands against the same drone.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use fleet_core::models::{
    CommandOutcome, Drone, DroneStatus, EventLevel, EventSource, Station, StationStatus,
};
use tokio::time::sleep;

use crate::events::EventBus;
use crate::ledger::{FlightLedger, FlightOutcome};

/// Battery points removed by a forced landing.
const EMERGENCY_BATTERY_PENALTY: f64 = 5.0;
/// Freshness label applied when a command touches a drone.
const CONTACT_JUST_NOW: &str = "a few seconds ago";
/// Coarser label for drones that are not reporting.
const CONTACT_STALE: &str = "over a minute ago";

pub struct FleetRegistry {
    drones: DashMap<String, Drone>,
    stations: DashMap<String, Station>,
    ledger: Arc<FlightLedger>,
    events: Arc<EventBus>,
    command_latency: Duration,
}

impl FleetRegistry {
    pub fn new(
        fleet: Vec<Drone>,
        stations: Vec<Station>,
        ledger: Arc<FlightLedger>,
        events: Arc<EventBus>,
        command_latency: Duration,
    ) -> Self {
        let drones = DashMap::new();
        for drone in fleet {
            drones.insert(drone.id.clone(), drone);
        }
        let station_map = DashMap::new();
        for station in stations {
            station_map.insert(station.id.clone(), station);
        }
        Self {
            drones,
            stations: station_map,
            ledger,
            events,
            command_latency,
        }
    }

    // ========== READS ==========

    pub fn vehicle(&self, drone_id: &str) -> Option<Drone> {
        self.drones.get(drone_id).map(|d| d.value().clone())
    }

    /// All drones, ordered by id for stable snapshots.
    pub fn vehicles(&self) -> Vec<Drone> {
        let mut all: Vec<Drone> = self.drones.iter().map(|d| d.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn vehicles_by_station(&self, station_id: &str) -> Vec<Drone> {
        self.vehicles()
            .into_iter()
            .filter(|d| d.station_id == station_id)
            .collect()
    }

    pub fn drone_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.drones.iter().map(|d| d.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn station(&self, station_id: &str) -> Option<Station> {
        self.stations.get(station_id).map(|s| s.value().clone())
    }

    pub fn stations(&self) -> Vec<Station> {
        let mut all: Vec<Station> = self.stations.iter().map(|s| s.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Home station for a drone. Falls back to a detached placeholder when
    /// the drone references a station that was never registered.
    pub fn station_for(&self, drone: &Drone) -> Station {
        self.station(&drone.station_id).unwrap_or_else(|| Station {
            id: drone.station_id.clone(),
            name: "Unassigned station".to_string(),
            location: String::new(),
            status: StationStatus::Offline,
            drones_total: 0,
            drones_active: 0,
            battery_level: 0.0,
            lat: 55.0,
            lon: 83.0,
        })
    }

    // ========== COMMANDS ==========
    //
    // The mutation happens up front; the latency only delays the reply to
    // the caller. Ordering between commands is decided by the entry lock,
    // not by the artificial delay.

    /// Send a drone out on a mission and open a flight for it.
    pub async fn dispatch(&self, drone_id: &str, actor: &str) -> CommandOutcome {
        let outcome = self.apply_dispatch(drone_id, actor);
        sleep(self.command_latency).await;
        outcome
    }

    /// Order a drone back to its home station. The open flight stays open
    /// until the drone actually arrives.
    pub async fn recall(&self, drone_id: &str, actor: &str) -> CommandOutcome {
        let outcome = self.apply_recall(drone_id, actor);
        sleep(self.command_latency).await;
        outcome
    }

    /// Force a landing no matter what the drone is doing. Aborts the open
    /// flight and costs a fixed battery penalty.
    pub async fn emergency_land(&self, drone_id: &str, actor: &str) -> CommandOutcome {
        let outcome = self.apply_emergency_land(drone_id, actor);
        sleep(self.command_latency).await;
        outcome
    }

    fn apply_dispatch(&self, drone_id: &str, actor: &str) -> CommandOutcome {
        let Some(mut drone) = self.drones.get_mut(drone_id) else {
            return self.unknown_vehicle("dispatch", drone_id);
        };
        drone.status = DroneStatus::OnMission;
        drone.mission = "Mission underway".to_string();
        drone.last_contact = CONTACT_JUST_NOW.to_string();
        let snapshot = drone.clone();
        drop(drone);

        let station = self.station_for(&snapshot);
        let flight = self.ledger.open(&snapshot, &station, None);
        self.events.publish(
            format!(
                "Operator {actor} dispatched drone {} on a mission",
                snapshot.code
            ),
            EventLevel::Info,
            EventSource::Operator,
        );
        tracing::info!(drone = %snapshot.id, flight = %flight.id, "drone dispatched");

        CommandOutcome {
            success: true,
            message: format!("Drone {} dispatched on a mission.", snapshot.code),
        }
    }

    fn apply_recall(&self, drone_id: &str, actor: &str) -> CommandOutcome {
        let Some(mut drone) = self.drones.get_mut(drone_id) else {
            return self.unknown_vehicle("recall", drone_id);
        };
        drone.status = DroneStatus::Returning;
        drone.mission = "Returning to station".to_string();
        drone.last_contact = CONTACT_JUST_NOW.to_string();
        let snapshot = drone.clone();
        drop(drone);

        self.events.publish(
            format!(
                "Operator {actor} recalled drone {} to its station",
                snapshot.code
            ),
            EventLevel::Info,
            EventSource::Operator,
        );
        tracing::info!(drone = %snapshot.id, "drone recalled");

        CommandOutcome {
            success: true,
            message: format!("Drone {} is returning to its station.", snapshot.code),
        }
    }

    fn apply_emergency_land(&self, drone_id: &str, actor: &str) -> CommandOutcome {
        let Some(mut drone) = self.drones.get_mut(drone_id) else {
            return self.unknown_vehicle("emergency_land", drone_id);
        };
        drone.status = DroneStatus::Idle;
        drone.mission = "Emergency landing completed".to_string();
        drone.last_contact = CONTACT_JUST_NOW.to_string();
        drone.battery = (drone.battery - EMERGENCY_BATTERY_PENALTY).max(0.0);
        let snapshot = drone.clone();
        drop(drone);

        self.ledger.close(&snapshot.id, FlightOutcome::Aborted);
        self.events.publish(
            format!(
                "Operator {actor} executed an emergency landing for drone {}",
                snapshot.code
            ),
            EventLevel::Warning,
            EventSource::Operator,
        );
        tracing::warn!(drone = %snapshot.id, "emergency landing executed");

        CommandOutcome {
            success: true,
            message: format!("Emergency landing executed for drone {}.", snapshot.code),
        }
    }

    fn unknown_vehicle(&self, command: &str, drone_id: &str) -> CommandOutcome {
        self.events.publish(
            format!("Command {command} rejected: unknown vehicle {drone_id}"),
            EventLevel::Error,
            EventSource::System,
        );
        tracing::warn!(drone = %drone_id, command, "command for unknown vehicle");

        CommandOutcome {
            success: false,
            message: format!("Unknown vehicle {drone_id}."),
        }
    }

    /// Change a station's operational status. Emits an event only on an
    /// actual change.
    pub fn set_station_status(&self, station_id: &str, status: StationStatus) -> CommandOutcome {
        let Some(mut station) = self.stations.get_mut(station_id) else {
            self.events.publish(
                format!("Station command rejected: unknown station {station_id}"),
                EventLevel::Error,
                EventSource::System,
            );
            return CommandOutcome {
                success: false,
                message: format!("Unknown station {station_id}."),
            };
        };
        if station.status == status {
            return CommandOutcome {
                success: true,
                message: format!("Station {} already {status}.", station.name),
            };
        }
        station.status = status;
        let name = station.name.clone();
        drop(station);

        let level = match status {
            StationStatus::Error => EventLevel::Warning,
            _ => EventLevel::Info,
        };
        self.events.publish(
            format!("Station {name} status changed to {status}"),
            level,
            EventSource::Service,
        );

        CommandOutcome {
            success: true,
            message: format!("Station {name} is now {status}."),
        }
    }

    // ========== SIMULATOR-SIDE MUTATION ==========
    //
    // The simulator never touches drone records directly; it asks the
    // registry so transitions stay in one place.

    pub(crate) fn touch_stale(&self, drone_id: &str) {
        if let Some(mut drone) = self.drones.get_mut(drone_id) {
            drone.last_contact = CONTACT_STALE.to_string();
        }
    }

    /// Lower a drone's battery by `delta`, floored at zero and rounded to
    /// a whole percent. Returns the new level.
    pub(crate) fn drain_battery(&self, drone_id: &str, delta: f64) -> Option<f64> {
        let mut drone = self.drones.get_mut(drone_id)?;
        drone.battery = (drone.battery - delta).max(0.0).round();
        Some(drone.battery)
    }

    pub(crate) fn force_error(&self, drone_id: &str, mission: &str) {
        if let Some(mut drone) = self.drones.get_mut(drone_id) {
            drone.status = DroneStatus::Error;
            drone.mission = mission.to_string();
        }
    }

    /// Arrival bookkeeping for a returning drone: docked and idle again.
    pub(crate) fn complete_return(&self, drone_id: &str) {
        if let Some(mut drone) = self.drones.get_mut(drone_id) {
            drone.status = DroneStatus::Idle;
            drone.mission = "Awaiting assignment".to_string();
            drone.last_contact = CONTACT_JUST_NOW.to_string();
        }
    }
}
