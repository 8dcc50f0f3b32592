use rand::{seq::SliceRandom, Rng};

use super::types::{
    Location, Reading, ReadingSource, RegionType, RoadClass, Traffic, TripContext, Vec3, Weather,
};
use crate::config::TelemetryConfig;

/// Uniform draw in `[-half_width, half_width)`.
pub(crate) fn centered<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    (rng.gen::<f64>() - 0.5) * 2.0 * half_width
}

/// Uniform draw in `[min, min + span)`.
pub(crate) fn spanned<R: Rng + ?Sized>(rng: &mut R, min: f64, span: f64) -> f64 {
    min + rng.gen::<f64>() * span
}

pub(crate) fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.gen_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}

pub fn fallback_location(config: &TelemetryConfig) -> Location {
    Location::new(config.fallback_latitude, config.fallback_longitude)
}

pub fn random_context<R: Rng + ?Sized>(rng: &mut R) -> TripContext {
    TripContext {
        weather: *Weather::ALL.choose(rng).unwrap_or(&Weather::Clear),
        traffic: *Traffic::ALL.choose(rng).unwrap_or(&Traffic::Light),
        road_class: *RoadClass::ALL.choose(rng).unwrap_or(&RoadClass::Highway),
        region_type: *RegionType::ALL.choose(rng).unwrap_or(&RegionType::Urban),
    }
}

/// Produces one resting-vehicle sample from the previous one.
pub struct ReadingGenerator {
    config: &'static TelemetryConfig,
}

impl ReadingGenerator {
    pub const fn new(config: &'static TelemetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'static TelemetryConfig {
        self.config
    }

    pub fn next<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        previous: Option<&Reading>,
        now_ms: u64,
    ) -> Reading {
        let cfg = self.config;

        let (speed_kmh, location, context) = match previous {
            Some(last) => {
                let speed = (last.speed_kmh + centered(rng, cfg.speed_jitter_kmh)).max(0.0);
                let drift = cfg.location_drift_deg * (speed / cfg.location_drift_reference_kmh);
                let location = Location::new(
                    last.location.latitude + (rng.gen::<f64>() - 0.5) * drift,
                    last.location.longitude + (rng.gen::<f64>() - 0.5) * drift,
                );
                (speed, location, last.context)
            }
            None => (
                rng.gen::<f64>() * cfg.initial_speed_max_kmh,
                fallback_location(cfg),
                random_context(rng),
            ),
        };

        let accel = Vec3::new(
            centered(rng, cfg.accel_noise_ms2),
            centered(rng, cfg.accel_noise_ms2),
            cfg.gravity_ms2 + centered(rng, cfg.gravity_noise_ms2),
        );
        let gyro = Vec3::new(
            centered(rng, cfg.gyro_noise_rads),
            centered(rng, cfg.gyro_noise_rads),
            centered(rng, cfg.gyro_noise_rads),
        );

        Reading {
            timestamp_ms: now_ms,
            accel,
            gyro,
            speed_kmh,
            location,
            context,
            source: ReadingSource::Normal,
        }
    }
}
