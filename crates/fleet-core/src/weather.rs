//! Flight-condition classification thresholds.

use crate::models::WeatherRisk;

/// Classify current conditions into a flight-risk level.
///
/// Hard limits ground the fleet outright; softer ones only flag the
/// conditions as degraded. Missing measurements never raise the level.
pub fn classify_conditions(
    wind_ms: f64,
    gust_ms: Option<f64>,
    visibility_km: Option<f64>,
    precipitation_mm: Option<f64>,
) -> WeatherRisk {
    let no_fly = wind_ms > 15.0
        || gust_ms.unwrap_or(0.0) > 20.0
        || visibility_km.is_some_and(|v| v < 1.0)
        || precipitation_mm.is_some_and(|p| p > 1.0);
    if no_fly {
        return WeatherRisk::NoFly;
    }

    let warning = wind_ms > 10.0
        || gust_ms.unwrap_or(0.0) > 15.0
        || visibility_km.is_some_and(|v| v < 2.0)
        || precipitation_mm.is_some_and(|p| p > 0.2);
    if warning {
        return WeatherRisk::Warning;
    }

    WeatherRisk::Ok
}

/// Short human description for a WMO weather code.
pub fn describe_weather_code(code: Option<u16>) -> &'static str {
    let Some(code) = code else {
        return "No data";
    };

    match code {
        0 => "Clear",
        1..=3 => "Cloudy",
        45 | 48 => "Fog or haze",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 | 77 => "Snow",
        80..=82 => "Showers",
        85 | 86 => "Snowfall",
        95 | 96 | 99 => "Thunderstorm",
        _ => "Adverse conditions",
    }
}
