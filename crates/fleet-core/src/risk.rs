//! Rule-based flight-risk scoring.
//!
//! [`evaluate`] combines a drone record, its latest telemetry, and the
//! weather classification into a weighted score plus the list of factors
//! that produced it, so a consumer can always explain the number.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Drone, DroneStatus, DroneTelemetry, WeatherReport, WeatherRisk};

/// Score threshold above which the aggregate level is at least medium.
const SCORE_MEDIUM: u32 = 30;
/// Score threshold above which the aggregate level is high.
const SCORE_HIGH: u32 = 70;

/// Aggregate risk level for a drone. Ordering follows severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// Individual conditions the rules can flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorId {
    BatteryLow,
    BatteryCritical,
    SignalUnstable,
    SignalCritical,
    WeatherWarning,
    WeatherNoFly,
    StatusError,
    StatusReturningLowBattery,
    HighAltitude,
}

/// One weighted contributor to a risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub id: RiskFactorId,
    /// Short factor name
    pub label: String,
    /// Local severity of this factor alone
    pub level: RiskLevel,
    /// Contribution to the aggregate score
    pub weight: u32,
    /// What exactly went wrong
    pub description: String,
}

/// Aggregate risk for one drone. Computed on demand, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub drone_id: String,
    pub drone_code: String,
    pub station_id: String,
    pub level: RiskLevel,
    /// 0-100, higher is worse
    pub score: u32,
    /// Weather classification the evaluation used, if any was available
    pub weather_risk: Option<WeatherRisk>,
    /// Fired factors in evaluation order
    pub factors: Vec<RiskFactor>,
}

/// Evaluate the risk rules for one drone.
///
/// Pure: identical inputs always produce an identical summary. A missing
/// telemetry record falls back to the drone's own battery and neutral
/// signal/altitude; missing weather simply leaves the weather rules out.
pub fn evaluate(
    drone: &Drone,
    telemetry: Option<&DroneTelemetry>,
    weather: Option<&WeatherReport>,
) -> RiskSummary {
    let battery = telemetry.map_or(drone.battery, |t| t.battery);
    let signal = telemetry.map_or(100.0, |t| t.signal);
    let altitude = telemetry.map_or(0.0, |t| t.altitude_m);
    let weather_risk = weather.map(|w| w.risk_level);

    let mut factors: Vec<RiskFactor> = Vec::new();

    // Battery: only the more severe of the pair fires.
    if battery <= 15.0 {
        factors.push(RiskFactor {
            id: RiskFactorId::BatteryCritical,
            label: "Critically low charge".to_string(),
            level: RiskLevel::High,
            weight: 40,
            description: format!(
                "Drone {} battery has dropped to {:.0}%.",
                drone.code, battery
            ),
        });
    } else if battery <= 30.0 {
        factors.push(RiskFactor {
            id: RiskFactorId::BatteryLow,
            label: "Low charge".to_string(),
            level: RiskLevel::Medium,
            weight: 25,
            description: format!(
                "Drone {} battery is below the safety margin ({:.0}%).",
                drone.code, battery
            ),
        });
    }

    // Link quality, same exclusive pairing.
    if signal <= 30.0 {
        factors.push(RiskFactor {
            id: RiskFactorId::SignalCritical,
            label: "Critical signal".to_string(),
            level: RiskLevel::High,
            weight: 35,
            description: format!(
                "Link quality with drone {} is critically low ({:.0}%).",
                drone.code, signal
            ),
        });
    } else if signal <= 60.0 {
        factors.push(RiskFactor {
            id: RiskFactorId::SignalUnstable,
            label: "Unstable link".to_string(),
            level: RiskLevel::Medium,
            weight: 20,
            description: format!(
                "Link quality with drone {} is unstable ({:.0}%).",
                drone.code, signal
            ),
        });
    }

    match weather_risk {
        Some(WeatherRisk::NoFly) => factors.push(RiskFactor {
            id: RiskFactorId::WeatherNoFly,
            label: "No-fly weather".to_string(),
            level: RiskLevel::High,
            weight: 45,
            description: "Conditions around the station cluster are classified as no-fly."
                .to_string(),
        }),
        Some(WeatherRisk::Warning) => factors.push(RiskFactor {
            id: RiskFactorId::WeatherWarning,
            label: "Degraded conditions".to_string(),
            level: RiskLevel::Medium,
            weight: 25,
            description:
                "The weather gateway reports degraded conditions (wind, precipitation, or low visibility)."
                    .to_string(),
        }),
        _ => {}
    }

    if drone.status == DroneStatus::Error {
        factors.push(RiskFactor {
            id: RiskFactorId::StatusError,
            label: "Status: error".to_string(),
            level: RiskLevel::High,
            weight: 50,
            description: format!("Drone {} is in the error state.", drone.code),
        });
    }

    // Can co-occur with the battery pair above.
    if drone.status == DroneStatus::Returning && battery <= 25.0 {
        factors.push(RiskFactor {
            id: RiskFactorId::StatusReturningLowBattery,
            label: "Returning on low charge".to_string(),
            level: RiskLevel::Medium,
            weight: 20,
            description: format!(
                "Drone {} is returning to its station with a low charge ({:.0}%).",
                drone.code, battery
            ),
        });
    }

    if altitude > 120.0 {
        factors.push(RiskFactor {
            id: RiskFactorId::HighAltitude,
            label: "High altitude".to_string(),
            level: RiskLevel::Medium,
            weight: 10,
            description: format!(
                "Drone {} is above the usual corridor ({:.0} m).",
                drone.code, altitude
            ),
        });
    }

    let score = factors.iter().map(|f| f.weight).sum::<u32>().min(100);

    let mut level = if score >= SCORE_HIGH {
        RiskLevel::High
    } else if score >= SCORE_MEDIUM {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    // Weather can only push the level up, never down.
    match weather_risk {
        Some(WeatherRisk::NoFly) => level = RiskLevel::High,
        Some(WeatherRisk::Warning) if level == RiskLevel::Low => level = RiskLevel::Medium,
        _ => {}
    }

    RiskSummary {
        drone_id: drone.id.clone(),
        drone_code: drone.code.clone(),
        station_id: drone.station_id.clone(),
        level,
        score,
        weather_risk,
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn drone(status: DroneStatus, battery: f64) -> Drone {
        Drone {
            id: "dr-900".to_string(),
            code: "DR-900".to_string(),
            name: "Drone DR-900".to_string(),
            station_id: "st-1".to_string(),
            status,
            battery,
            last_contact: "a few seconds ago".to_string(),
            mission: "Mission underway".to_string(),
        }
    }

    fn telemetry(battery: f64, signal: f64, altitude_m: f64) -> DroneTelemetry {
        DroneTelemetry {
            drone_id: "dr-900".to_string(),
            lat: 55.03,
            lon: 82.92,
            altitude_m,
            speed_kmh: 45.0,
            battery,
            signal,
            last_update: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
        }
    }

    fn weather(risk_level: WeatherRisk) -> WeatherReport {
        WeatherReport {
            temp_c: -4.0,
            wind_speed_ms: 6.0,
            wind_gust_ms: Some(9.0),
            visibility_km: Some(10.0),
            description: "Cloudy".to_string(),
            risk_level,
            updated_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn identical_inputs_produce_identical_summaries() {
        let d = drone(DroneStatus::Returning, 22.0);
        let t = telemetry(22.0, 55.0, 90.0);
        let w = weather(WeatherRisk::Warning);

        let first = evaluate(&d, Some(&t), Some(&w));
        let second = evaluate(&d, Some(&t), Some(&w));
        assert_eq!(first, second);
        assert!(first.score <= 100);
    }

    #[test]
    fn battery_rules_are_mutually_exclusive() {
        let d = drone(DroneStatus::OnMission, 100.0);

        let critical = evaluate(&d, Some(&telemetry(12.0, 100.0, 50.0)), None);
        assert!(critical.factors.iter().any(|f| f.id == RiskFactorId::BatteryCritical));
        assert!(!critical.factors.iter().any(|f| f.id == RiskFactorId::BatteryLow));

        let low = evaluate(&d, Some(&telemetry(25.0, 100.0, 50.0)), None);
        assert!(low.factors.iter().any(|f| f.id == RiskFactorId::BatteryLow));
        assert!(!low.factors.iter().any(|f| f.id == RiskFactorId::BatteryCritical));
    }

    #[test]
    fn signal_rules_are_mutually_exclusive() {
        let d = drone(DroneStatus::OnMission, 100.0);

        let critical = evaluate(&d, Some(&telemetry(100.0, 28.0, 50.0)), None);
        assert!(critical.factors.iter().any(|f| f.id == RiskFactorId::SignalCritical));
        assert!(!critical.factors.iter().any(|f| f.id == RiskFactorId::SignalUnstable));

        let unstable = evaluate(&d, Some(&telemetry(100.0, 55.0, 50.0)), None);
        assert!(unstable.factors.iter().any(|f| f.id == RiskFactorId::SignalUnstable));
        assert_eq!(unstable.score, 20);
        assert_eq!(unstable.level, RiskLevel::Low);
    }

    #[test]
    fn no_fly_weather_forces_high_regardless_of_everything_else() {
        let d = drone(DroneStatus::Idle, 100.0);
        let summary = evaluate(&d, Some(&telemetry(100.0, 100.0, 50.0)), Some(&weather(WeatherRisk::NoFly)));
        assert_eq!(summary.score, 45);
        assert_eq!(summary.level, RiskLevel::High);
    }

    #[test]
    fn weather_warning_raises_low_but_never_lowers_high() {
        let healthy = drone(DroneStatus::Idle, 100.0);
        let raised = evaluate(&healthy, Some(&telemetry(100.0, 100.0, 50.0)), Some(&weather(WeatherRisk::Warning)));
        assert_eq!(raised.level, RiskLevel::Medium);

        let faulted = drone(DroneStatus::Error, 10.0);
        let high = evaluate(&faulted, Some(&telemetry(10.0, 20.0, 50.0)), Some(&weather(WeatherRisk::Warning)));
        assert_eq!(high.level, RiskLevel::High);
    }

    #[test]
    fn score_is_clamped_at_100() {
        let d = drone(DroneStatus::Error, 10.0);
        let summary = evaluate(&d, Some(&telemetry(10.0, 20.0, 50.0)), Some(&weather(WeatherRisk::NoFly)));
        // 40 + 35 + 45 + 50 raw
        assert_eq!(summary.score, 100);
        assert_eq!(summary.level, RiskLevel::High);
        assert_eq!(summary.factors.len(), 4);
    }

    #[test]
    fn returning_on_low_charge_stacks_with_the_battery_rule() {
        let d = drone(DroneStatus::Returning, 20.0);
        let summary = evaluate(&d, Some(&telemetry(20.0, 100.0, 50.0)), None);
        assert!(summary.factors.iter().any(|f| f.id == RiskFactorId::BatteryLow));
        assert!(summary
            .factors
            .iter()
            .any(|f| f.id == RiskFactorId::StatusReturningLowBattery));
        assert_eq!(summary.score, 45);
        assert_eq!(summary.level, RiskLevel::Medium);
    }

    #[test]
    fn altitude_above_corridor_is_flagged() {
        let d = drone(DroneStatus::OnMission, 100.0);
        let summary = evaluate(&d, Some(&telemetry(100.0, 100.0, 125.0)), None);
        assert!(summary.factors.iter().any(|f| f.id == RiskFactorId::HighAltitude));
        assert_eq!(summary.score, 10);
    }

    #[test]
    fn missing_telemetry_falls_back_to_the_drone_record() {
        let d = drone(DroneStatus::Error, 12.0);
        let summary = evaluate(&d, None, None);
        assert!(summary.factors.iter().any(|f| f.id == RiskFactorId::BatteryCritical));
        assert!(summary.factors.iter().any(|f| f.id == RiskFactorId::StatusError));
        // Neutral signal/altitude defaults fire no rules of their own.
        assert!(!summary.factors.iter().any(|f| f.id == RiskFactorId::SignalCritical));
        assert!(!summary.factors.iter().any(|f| f.id == RiskFactorId::HighAltitude));
        assert_eq!(summary.weather_risk, None);
    }
}
