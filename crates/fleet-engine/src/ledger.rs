//! Append-only record of flight attempts.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::Utc;
use fleet_core::geo::random_point_near;
use fleet_core::models::{Drone, Flight, FlightStatus, GeoPoint, Station};
use rand::Rng;
use uuid::Uuid;

/// Largest random offset of a generated mission target from its station,
/// in degrees per axis.
const TARGET_SPREAD_DEG: f64 = 0.025;

/// How a finished flight attempt is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightOutcome {
    Completed,
    Aborted,
}

/// Capacity-bounded flight history, newest entries first.
///
/// Eviction at capacity does not look at status: a still-open flight at
/// the back of the ring is dropped like any other entry.
pub struct FlightLedger {
    flights: Mutex<VecDeque<Flight>>,
    capacity: usize,
}

impl FlightLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            flights: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Open a new in-progress flight for `drone` out of `station`.
    ///
    /// The planned distance is sampled from 4-7 km unless given, and the
    /// mission target is a random point near the station.
    pub fn open(&self, drone: &Drone, station: &Station, planned_distance_km: Option<f64>) -> Flight {
        let distance_km =
            planned_distance_km.unwrap_or_else(|| rand::rng().random_range(4.0..7.0));
        let from = GeoPoint::new(station.lat, station.lon);

        let flight = Flight {
            id: next_flight_id(),
            drone_id: drone.id.clone(),
            drone_name: drone.name.clone(),
            station_id: station.id.clone(),
            station_name: station.name.clone(),
            start_time: Utc::now(),
            end_time: None,
            status: FlightStatus::InProgress,
            distance_km,
            from,
            to: random_point_near(from, TARGET_SPREAD_DEG),
        };
        self.insert(flight.clone());
        flight
    }

    /// Close the drone's most recent open flight. Idempotent: returns
    /// `None` without touching anything when no flight is open.
    pub fn close(&self, drone_id: &str, outcome: FlightOutcome) -> Option<Flight> {
        let mut flights = self.flights.lock().ok()?;
        let flight = flights
            .iter_mut()
            .find(|f| f.drone_id == drone_id && f.status == FlightStatus::InProgress)?;

        flight.status = match outcome {
            FlightOutcome::Completed => FlightStatus::Completed,
            FlightOutcome::Aborted => FlightStatus::Aborted,
        };
        flight.end_time = Some(Utc::now());
        Some(flight.clone())
    }

    /// Mission target of the drone's most recent open flight, if any.
    pub fn active_target(&self, drone_id: &str) -> Option<GeoPoint> {
        let flights = self.flights.lock().ok()?;
        flights
            .iter()
            .find(|f| f.drone_id == drone_id && f.status == FlightStatus::InProgress)
            .map(|f| f.to)
    }

    /// All retained flights, newest first.
    pub fn all(&self) -> Vec<Flight> {
        let mut flights: Vec<Flight> = match self.flights.lock() {
            Ok(flights) => flights.iter().cloned().collect(),
            Err(_) => Vec::new(),
        };
        flights.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        flights
    }

    /// One drone's flights, newest first.
    pub fn by_drone(&self, drone_id: &str) -> Vec<Flight> {
        self.all()
            .into_iter()
            .filter(|f| f.drone_id == drone_id)
            .collect()
    }

    /// Flights still in progress.
    pub fn active(&self) -> Vec<Flight> {
        self.all()
            .into_iter()
            .filter(|f| f.status == FlightStatus::InProgress)
            .collect()
    }

    pub fn get(&self, flight_id: &str) -> Option<Flight> {
        let flights = self.flights.lock().ok()?;
        flights.iter().find(|f| f.id == flight_id).cloned()
    }

    /// Load historical flights at boot. Entries are inserted as-is and
    /// count against capacity.
    pub fn seed(&self, seed_flights: Vec<Flight>) {
        for flight in seed_flights {
            self.insert(flight);
        }
    }

    fn insert(&self, flight: Flight) {
        if let Ok(mut flights) = self.flights.lock() {
            flights.push_front(flight);
            while flights.len() > self.capacity {
                flights.pop_back();
            }
        }
    }
}

fn next_flight_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("fl-{}", &raw[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::models::{DroneStatus, StationStatus};

    fn test_drone() -> Drone {
        Drone {
            id: "dr-700".to_string(),
            code: "DR-700".to_string(),
            name: "Drone DR-700".to_string(),
            station_id: "st-1".to_string(),
            status: DroneStatus::Idle,
            battery: 90.0,
            last_contact: "a few seconds ago".to_string(),
            mission: "Awaiting assignment".to_string(),
        }
    }

    fn test_station() -> Station {
        Station {
            id: "st-1".to_string(),
            name: "Station 1 (North)".to_string(),
            location: "55.030, 82.920".to_string(),
            status: StationStatus::Online,
            drones_total: 1,
            drones_active: 0,
            battery_level: 90.0,
            lat: 55.03,
            lon: 82.92,
        }
    }

    #[test]
    fn open_creates_an_in_progress_flight_near_the_station() {
        let ledger = FlightLedger::new(10);
        let flight = ledger.open(&test_drone(), &test_station(), None);

        assert_eq!(flight.status, FlightStatus::InProgress);
        assert!(flight.end_time.is_none());
        assert!((4.0..7.0).contains(&flight.distance_km));
        assert!((flight.to.lat - 55.03).abs() <= 0.025);
        assert!((flight.to.lon - 82.92).abs() <= 0.025);
        assert_eq!(ledger.active().len(), 1);
    }

    #[test]
    fn close_is_idempotent() {
        let ledger = FlightLedger::new(10);
        let opened = ledger.open(&test_drone(), &test_station(), Some(5.0));

        let closed = ledger.close("dr-700", FlightOutcome::Completed).unwrap();
        assert_eq!(closed.id, opened.id);
        assert_eq!(closed.status, FlightStatus::Completed);
        assert!(closed.end_time.is_some());

        // Nothing left to close.
        assert!(ledger.close("dr-700", FlightOutcome::Completed).is_none());
        assert_eq!(ledger.by_drone("dr-700").len(), 1);
    }

    #[test]
    fn close_targets_the_most_recent_open_flight() {
        let ledger = FlightLedger::new(10);
        let first = ledger.open(&test_drone(), &test_station(), Some(4.0));
        let second = ledger.open(&test_drone(), &test_station(), Some(6.0));

        let closed = ledger.close("dr-700", FlightOutcome::Aborted).unwrap();
        assert_eq!(closed.id, second.id);
        assert_eq!(ledger.get(&first.id).unwrap().status, FlightStatus::InProgress);
    }

    #[test]
    fn eviction_ignores_status_and_can_drop_an_open_flight() {
        // Documents the ring behavior: the oldest entry goes regardless of
        // whether it is still open.
        let ledger = FlightLedger::new(2);
        let oldest = ledger.open(&test_drone(), &test_station(), Some(4.0));
        ledger.open(&test_drone(), &test_station(), Some(5.0));
        ledger.open(&test_drone(), &test_station(), Some(6.0));

        assert_eq!(ledger.all().len(), 2);
        assert!(ledger.get(&oldest.id).is_none());
    }
}
