use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::{config::TelemetryConfig, telemetry::Location};

pub const GEOLOCATION_DISABLED_WARNING: &str = "Geolocation is disabled. Using default location.";
pub const UNKNOWN_PLACE: &str = "Unknown Area";
pub const UNKNOWN_WEATHER: &str = "Unknown";

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeolocationError {
    #[error("geolocation permission denied")]
    PermissionDenied,
    #[error("geolocation unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationFix {
    pub location: Location,
    pub warning: Option<&'static str>,
}

/// A failed lookup of any kind pins the fallback coordinate and raises the banner.
pub fn resolve_location(
    result: Result<Location, GeolocationError>,
    telemetry: &TelemetryConfig,
) -> LocationFix {
    match result {
        Ok(location) => LocationFix {
            location,
            warning: None,
        },
        Err(err) => {
            log::warn!("geolocation failed: {err}");
            LocationFix {
                location: Location::new(telemetry.fallback_latitude, telemetry.fallback_longitude),
                warning: Some(GEOLOCATION_DISABLED_WARNING),
            }
        }
    }
}

/// WMO weather interpretation code.
pub fn weather_label(code: u16) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing Rime Fog",
        51 => "Light Drizzle",
        53 => "Moderate Drizzle",
        55 => "Dense Drizzle",
        56 => "Light Freezing Drizzle",
        57 => "Dense Freezing Drizzle",
        61 => "Slight Rain",
        63 => "Moderate Rain",
        65 => "Heavy Rain",
        66 => "Light Freezing Rain",
        67 => "Heavy Freezing Rain",
        71 => "Slight Snow",
        73 => "Moderate Snow",
        75 => "Heavy Snow",
        77 => "Snow Grains",
        80 => "Slight Rain Showers",
        81 => "Moderate Rain Showers",
        82 => "Violent Rain Showers",
        85 => "Slight Snow Showers",
        86 => "Heavy Snow Showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm & Hail",
        99 => "Thunderstorm & Heavy Hail",
        _ => UNKNOWN_WEATHER,
    }
}

pub fn describe_weather(code: u16, temperature_c: f64) -> String {
    format!("{}, {temperature_c}°C", weather_label(code))
}

pub fn describe_place(city: Option<&str>, country: Option<&str>) -> String {
    let city = city.filter(|c| !c.is_empty()).unwrap_or(UNKNOWN_PLACE);
    match country.filter(|c| !c.is_empty()) {
        Some(country) => format!("{city}, {country}"),
        None => city.to_string(),
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum TrafficCondition {
    Flowing,
    Slow,
    Congested,
}

impl TrafficCondition {
    pub const ALL: [Self; 3] = [Self::Flowing, Self::Slow, Self::Congested];

    /// Inclusive average-speed band in km/h.
    pub const fn speed_band(self) -> (u32, u32) {
        match self {
            Self::Flowing => (60, 100),
            Self::Slow => (20, 59),
            Self::Congested => (5, 19),
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Flowing => "Traffic is moving smoothly.",
            Self::Slow => "Minor slowdowns reported in the area.",
            Self::Congested => "Heavy congestion, expect delays.",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficReport {
    pub condition: TrafficCondition,
    pub average_speed_kmh: u32,
    pub description: &'static str,
}

pub fn simulate_traffic<R: Rng + ?Sized>(rng: &mut R) -> TrafficReport {
    let condition = TrafficCondition::ALL[rng.gen_range(0..TrafficCondition::ALL.len())];
    let (min, max) = condition.speed_band();
    TrafficReport {
        condition,
        average_speed_kmh: rng.gen_range(min..=max),
        description: condition.description(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    pub place: String,
    pub weather: String,
    pub altitude_m: f64,
    pub traffic: Option<TrafficReport>,
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self {
            place: UNKNOWN_PLACE.into(),
            weather: UNKNOWN_WEATHER.into(),
            altitude_m: 0.0,
            traffic: None,
        }
    }
}

/// Offline stand-in for the weather, place and traffic services.
pub struct SimulatedEnvironment<R> {
    rng: R,
}

impl<R: Rng> SimulatedEnvironment<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn snapshot(&mut self, at: Location) -> EnvironmentSnapshot {
        let code = [0u16, 1, 2, 3, 45, 61, 80, 95][self.rng.gen_range(0..8)];
        let temperature = f64::from(self.rng.gen_range(12i8..=38));
        let place = format!("{:.3}, {:.3}", at.latitude, at.longitude);
        EnvironmentSnapshot {
            place: describe_place(Some(&place), None),
            weather: describe_weather(code, temperature),
            altitude_m: self.rng.gen_range(0.0..1_200.0),
            traffic: Some(simulate_traffic(&mut self.rng)),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::config::active_config;

    #[test]
    fn denied_permission_pins_fallback_and_warns() {
        let fix = resolve_location(
            Err(GeolocationError::PermissionDenied),
            &active_config().telemetry,
        );
        assert_eq!(fix.location, Location::new(28.6139, 77.2090));
        assert_eq!(fix.warning, Some(GEOLOCATION_DISABLED_WARNING));

        let fix = resolve_location(Ok(Location::new(1.0, 2.0)), &active_config().telemetry);
        assert_eq!(fix.location, Location::new(1.0, 2.0));
        assert_eq!(fix.warning, None);
    }

    #[test]
    fn weather_codes_map_to_labels() {
        assert_eq!(weather_label(0), "Clear");
        assert_eq!(weather_label(96), "Thunderstorm & Hail");
        assert_eq!(weather_label(4), "Unknown");
        assert_eq!(describe_weather(63, 21.5), "Moderate Rain, 21.5°C");
    }

    #[test]
    fn place_falls_back_to_unknown_area() {
        assert_eq!(describe_place(Some("Pune"), Some("India")), "Pune, India");
        assert_eq!(describe_place(None, Some("India")), "Unknown Area, India");
        assert_eq!(describe_place(Some(""), None), "Unknown Area");
    }

    #[test]
    fn simulated_traffic_stays_within_condition_band() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let report = simulate_traffic(&mut rng);
            let (min, max) = report.condition.speed_band();
            assert!((min..=max).contains(&report.average_speed_kmh));
            assert_eq!(report.description, report.condition.description());
        }
    }

    #[test]
    fn default_snapshot_uses_unknowns() {
        let snapshot = EnvironmentSnapshot::default();
        assert_eq!(snapshot.place, "Unknown Area");
        assert_eq!(snapshot.weather, "Unknown");
        assert_eq!(snapshot.altitude_m, 0.0);
        assert!(snapshot.traffic.is_none());
    }
}
