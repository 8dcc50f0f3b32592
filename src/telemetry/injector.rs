use rand::Rng;

use super::{
    generator::{centered, random_sign, spanned},
    types::{BurstKind, Reading, ReadingSource, Vec3},
};
use crate::config::{InjectionConfig, InjectionMode, TelemetryConfig};

/// What the injector wants for the current tick.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Injection {
    Normal,
    Burst(BurstKind),
}

/// Burst state: at most `max_burst_ticks` overridden readings, ended by a counter.
#[derive(Debug)]
pub struct EventInjector {
    config: &'static InjectionConfig,
    active: Option<BurstKind>,
    counter: u8,
}

impl EventInjector {
    pub const fn new(config: &'static InjectionConfig) -> Self {
        Self {
            config,
            active: None,
            counter: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }

    pub fn reset(&mut self) {
        self.active = None;
        self.counter = 0;
    }

    fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<BurstKind> {
        let cfg = self.config;
        match cfg.mode {
            InjectionMode::Crash => rng
                .gen_bool(cfg.crash_probability)
                .then_some(BurstKind::Crash),
            InjectionMode::Split => {
                let draw = rng.gen::<f64>();
                if draw < cfg.brake_probability {
                    Some(BurstKind::HardBrake)
                } else if draw < cfg.brake_probability + cfg.acceleration_probability {
                    Some(BurstKind::HardAcceleration)
                } else {
                    None
                }
            }
        }
    }

    /// Advances one tick. A burst can only override a reading once a previous
    /// reading exists; the tick after the cap produces a normal reading.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, has_previous: bool) -> Injection {
        if self.active.is_none() {
            if let Some(kind) = self.roll(rng) {
                self.active = Some(kind);
                self.counter = 0;
            }
        }

        let Some(kind) = self.active else {
            return Injection::Normal;
        };
        if !has_previous {
            return Injection::Normal;
        }

        self.counter = self.counter.saturating_add(1);
        if self.counter > self.config.max_burst_ticks {
            self.reset();
            return Injection::Normal;
        }
        Injection::Burst(kind)
    }
}

fn signed_span<R: Rng + ?Sized>(rng: &mut R, min: f64, span: f64) -> f64 {
    random_sign(rng) * spanned(rng, min, span)
}

/// Builds the high-magnitude reading that replaces a normal one during a burst.
pub fn burst_reading<R: Rng + ?Sized>(
    rng: &mut R,
    previous: &Reading,
    kind: BurstKind,
    now_ms: u64,
    injection: &InjectionConfig,
    telemetry: &TelemetryConfig,
) -> Reading {
    let (accel_min, accel_span) = (injection.accel_min_ms2, injection.accel_span_ms2);
    let (gyro_min, gyro_span) = (injection.gyro_min_rads, injection.gyro_span_rads);

    let mut accel = Vec3::new(
        signed_span(rng, accel_min, accel_span),
        signed_span(rng, accel_min, accel_span),
        telemetry.gravity_ms2 + centered(rng, injection.vertical_jolt_ms2),
    );
    match kind {
        BurstKind::Crash => {}
        BurstKind::HardBrake => accel.x = -accel.x.abs(),
        BurstKind::HardAcceleration => accel.x = accel.x.abs(),
    }
    let gyro = Vec3::new(
        signed_span(rng, gyro_min, gyro_span),
        signed_span(rng, gyro_min, gyro_span),
        signed_span(rng, gyro_min, gyro_span),
    );

    let speed_kmh = match kind {
        BurstKind::HardAcceleration => previous.speed_kmh,
        BurstKind::Crash | BurstKind::HardBrake => previous.speed_kmh * injection.speed_factor,
    };

    Reading {
        timestamp_ms: now_ms,
        accel,
        gyro,
        speed_kmh,
        location: previous.location,
        context: previous.context,
        source: ReadingSource::Burst(kind),
    }
}
