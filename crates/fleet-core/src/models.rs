//! Core data models for the fleet engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

// ========== FLEET ==========

/// Lifecycle state of a drone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneStatus {
    /// Docked at its station, ready for dispatch
    #[default]
    Idle,
    /// Flying toward a mission target
    OnMission,
    /// Flying back to its home station
    Returning,
    /// Faulted (critical battery, telemetry failure)
    Error,
    /// Not connected
    Offline,
}

/// A registered drone. The fleet is created once at boot; records are
/// mutated by commands and the simulator but never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    pub id: String,
    pub code: String,
    pub name: String,
    pub station_id: String,
    pub status: DroneStatus,
    /// Charge percentage in [0, 100]
    pub battery: f64,
    /// Free-text freshness label, e.g. "a few seconds ago"
    pub last_contact: String,
    /// Free-text mission label
    pub mission: String,
}

/// Operational state of a dispatch station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Online,
    Offline,
    Error,
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationStatus::Online => write!(f, "online"),
            StationStatus::Offline => write!(f, "offline"),
            StationStatus::Error => write!(f, "error"),
        }
    }
}

/// A fixed dispatch station and home point for returning drones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    /// Human-readable location label
    pub location: String,
    pub status: StationStatus,
    pub drones_total: u32,
    pub drones_active: u32,
    /// Average charge across docked drones, percent
    pub battery_level: f64,
    pub lat: f64,
    pub lon: f64,
}

// ========== TELEMETRY ==========

/// Latest simulated telemetry for one drone. One record per drone,
/// overwritten in place on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneTelemetry {
    pub drone_id: String,
    pub lat: f64,
    pub lon: f64,
    /// Meters above ground, held within [0, 120]
    pub altitude_m: f64,
    /// km/h; a status band rather than a derivative of displacement
    pub speed_kmh: f64,
    /// Mirrors the drone record's battery
    pub battery: f64,
    /// Link quality in [0, 100]
    pub signal: f64,
    pub last_update: DateTime<Utc>,
}

// ========== FLIGHTS ==========

/// State of one dispatch-to-resolution flight attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    /// Scheduled but not yet started
    Planned,
    /// Currently flying
    InProgress,
    /// Finished by arriving back at the station
    Completed,
    /// Cut short by an operator or a fault
    Aborted,
}

/// One flight attempt. Opened on dispatch, closed on arrival or abort,
/// immutable once closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub id: String,
    pub drone_id: String,
    pub drone_name: String,
    pub station_id: String,
    pub station_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: FlightStatus,
    /// Planned distance in kilometers
    pub distance_km: f64,
    pub from: GeoPoint,
    pub to: GeoPoint,
}

// ========== AUDIT EVENTS ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

/// Which part of the system produced an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Operator,
    Admin,
    System,
    Monitoring,
    Security,
    Service,
}

/// An audit log entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEvent {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    /// Display string, `YYYY-MM-DD HH:MM`
    pub time: String,
    pub title: String,
    pub level: EventLevel,
    pub source: EventSource,
}

/// Result of submitting a fleet command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    pub message: String,
}

// ========== WEATHER ==========

/// Flight-condition classification for the station cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherRisk {
    Ok,
    Warning,
    NoFly,
}

impl fmt::Display for WeatherRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherRisk::Ok => write!(f, "ok"),
            WeatherRisk::Warning => write!(f, "warning"),
            WeatherRisk::NoFly => write!(f, "no_fly"),
        }
    }
}

/// Current conditions as reported by the weather gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub temp_c: f64,
    pub wind_speed_ms: f64,
    pub wind_gust_ms: Option<f64>,
    pub visibility_km: Option<f64>,
    pub description: String,
    pub risk_level: WeatherRisk,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_enums_keep_their_wire_casing() {
        assert_eq!(
            serde_json::to_string(&DroneStatus::OnMission).unwrap(),
            "\"on_mission\""
        );
        assert_eq!(
            serde_json::to_string(&FlightStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&WeatherRisk::NoFly).unwrap(),
            "\"no_fly\""
        );
        assert_eq!(
            serde_json::to_string(&EventSource::Monitoring).unwrap(),
            "\"monitoring\""
        );
        assert_eq!(
            serde_json::to_string(&StationStatus::Online).unwrap(),
            "\"online\""
        );
    }

    #[test]
    fn telemetry_round_trips_through_json() {
        let telemetry = DroneTelemetry {
            drone_id: "dr-101".to_string(),
            lat: 55.03,
            lon: 82.92,
            altitude_m: 92.0,
            speed_kmh: 44.0,
            battery: 63.0,
            signal: 88.0,
            last_update: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
        };

        let json = serde_json::to_string(&telemetry).unwrap();
        let back: DroneTelemetry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, telemetry);
    }
}
