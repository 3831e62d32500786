//! Fixed demo fleet loaded into the registry at boot.

use chrono::{Duration, Utc};
use fleet_core::models::{
    Drone, DroneStatus, Flight, FlightStatus, GeoPoint, Station, StationStatus,
};

pub fn demo_stations() -> Vec<Station> {
    vec![
        Station {
            id: "st-1".to_string(),
            name: "Station 1 (North)".to_string(),
            location: "55.030, 82.920".to_string(),
            status: StationStatus::Online,
            drones_total: 3,
            drones_active: 1,
            battery_level: 82.0,
            lat: 55.03,
            lon: 82.92,
        },
        Station {
            id: "st-2".to_string(),
            name: "Station 2 (East)".to_string(),
            location: "54.980, 83.050".to_string(),
            status: StationStatus::Offline,
            drones_total: 2,
            drones_active: 0,
            battery_level: 56.0,
            lat: 54.98,
            lon: 83.05,
        },
        Station {
            id: "st-3".to_string(),
            name: "Station 3 (South)".to_string(),
            location: "54.900, 82.950".to_string(),
            status: StationStatus::Error,
            drones_total: 4,
            drones_active: 2,
            battery_level: 34.0,
            lat: 54.9,
            lon: 82.95,
        },
    ]
}

pub fn demo_fleet() -> Vec<Drone> {
    vec![
        Drone {
            id: "dr-101".to_string(),
            code: "DR-101".to_string(),
            name: "Drone DR-101".to_string(),
            station_id: "st-1".to_string(),
            status: DroneStatus::Idle,
            battery: 86.0,
            last_contact: "a minute ago".to_string(),
            mission: "Awaiting assignment".to_string(),
        },
        Drone {
            id: "dr-102".to_string(),
            code: "DR-102".to_string(),
            name: "Drone DR-102".to_string(),
            station_id: "st-1".to_string(),
            status: DroneStatus::OnMission,
            battery: 63.0,
            last_contact: "30 seconds ago".to_string(),
            mission: "Surveying field 12".to_string(),
        },
        Drone {
            id: "dr-103".to_string(),
            code: "DR-103".to_string(),
            name: "Drone DR-103".to_string(),
            station_id: "st-1".to_string(),
            status: DroneStatus::Returning,
            battery: 47.0,
            last_contact: "2 minutes ago".to_string(),
            mission: "Returning to station".to_string(),
        },
        Drone {
            id: "dr-201".to_string(),
            code: "DR-201".to_string(),
            name: "Drone DR-201".to_string(),
            station_id: "st-2".to_string(),
            status: DroneStatus::Offline,
            battery: 30.0,
            last_contact: "15 minutes ago".to_string(),
            mission: "Awaiting connection".to_string(),
        },
        Drone {
            id: "dr-301".to_string(),
            code: "DR-301".to_string(),
            name: "Drone DR-301".to_string(),
            station_id: "st-3".to_string(),
            status: DroneStatus::Error,
            battery: 12.0,
            last_contact: "5 minutes ago".to_string(),
            mission: "Telemetry failure".to_string(),
        },
    ]
}

/// Historical flights, oldest first so the newest ends up at the front of
/// the ledger ring. The two in-progress entries give the on-mission and
/// faulted drones their mission targets at boot.
pub fn demo_flights() -> Vec<Flight> {
    let now = Utc::now();
    let flight = |id: &str,
                  drone: (&str, &str),
                  station: (&str, &str),
                  started_mins_ago: i64,
                  ended_mins_ago: Option<i64>,
                  status: FlightStatus,
                  distance_km: f64,
                  from: GeoPoint,
                  to: GeoPoint| Flight {
        id: id.to_string(),
        drone_id: drone.0.to_string(),
        drone_name: drone.1.to_string(),
        station_id: station.0.to_string(),
        station_name: station.1.to_string(),
        start_time: now - Duration::minutes(started_mins_ago),
        end_time: ended_mins_ago.map(|m| now - Duration::minutes(m)),
        status,
        distance_km,
        from,
        to,
    };

    vec![
        flight(
            "fl-3002",
            ("dr-301", "Drone DR-301"),
            ("st-3", "Station 3 (South)"),
            330,
            Some(305),
            FlightStatus::Completed,
            3.8,
            GeoPoint::new(54.9, 82.95),
            GeoPoint::new(54.92, 82.92),
        ),
        flight(
            "fl-2002",
            ("dr-201", "Drone DR-201"),
            ("st-2", "Station 2 (East)"),
            280,
            Some(255),
            FlightStatus::Completed,
            6.0,
            GeoPoint::new(54.98, 83.05),
            GeoPoint::new(54.96, 83.02),
        ),
        flight(
            "fl-2001",
            ("dr-201", "Drone DR-201"),
            ("st-2", "Station 2 (East)"),
            230,
            Some(208),
            FlightStatus::Aborted,
            4.4,
            GeoPoint::new(54.98, 83.05),
            GeoPoint::new(54.99, 83.09),
        ),
        flight(
            "fl-3001",
            ("dr-301", "Drone DR-301"),
            ("st-3", "Station 3 (South)"),
            180,
            None,
            FlightStatus::InProgress,
            2.7,
            GeoPoint::new(54.9, 82.95),
            GeoPoint::new(54.91, 82.99),
        ),
        flight(
            "fl-1003",
            ("dr-102", "Drone DR-102"),
            ("st-1", "Station 1 (North)"),
            85,
            None,
            FlightStatus::InProgress,
            5.1,
            GeoPoint::new(55.03, 82.92),
            GeoPoint::new(54.98, 82.93),
        ),
        flight(
            "fl-1002",
            ("dr-101", "Drone DR-101"),
            ("st-1", "Station 1 (North)"),
            75,
            Some(65),
            FlightStatus::Completed,
            3.2,
            GeoPoint::new(55.03, 82.92),
            GeoPoint::new(55.035, 82.95),
        ),
        flight(
            "fl-1001",
            ("dr-103", "Drone DR-103"),
            ("st-1", "Station 1 (North)"),
            70,
            Some(60),
            FlightStatus::Completed,
            3.2,
            GeoPoint::new(55.03, 82.92),
            GeoPoint::new(55.035, 82.95),
        ),
    ]
}
