pub mod geo;
pub mod models;
pub mod risk;
pub mod weather;

pub use geo::{planar_distance, random_point_near};
pub use models::{
    CommandOutcome, Drone, DroneStatus, DroneTelemetry, EventLevel, EventSource, Flight,
    FlightStatus, GeoPoint, Station, StationStatus, SystemEvent, WeatherReport, WeatherRisk,
};
pub use risk::{evaluate, RiskFactor, RiskFactorId, RiskLevel, RiskSummary};
pub use weather::{classify_conditions, describe_weather_code};
