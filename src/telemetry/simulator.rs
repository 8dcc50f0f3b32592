use rand::{rngs::StdRng, RngCore, SeedableRng};

use super::{
    generator::ReadingGenerator,
    injector::{burst_reading, EventInjector, Injection},
    types::{Location, Reading},
};
use crate::config::ReflexConfig;

/// One simulated trip: RNG, generator, injector and the last emitted reading.
pub struct TripSimulator<R = StdRng> {
    config: &'static ReflexConfig,
    rng: R,
    generator: ReadingGenerator,
    injector: EventInjector,
    last: Option<Reading>,
}

impl TripSimulator<StdRng> {
    pub fn seeded(config: &'static ReflexConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> TripSimulator<R> {
    pub fn new(config: &'static ReflexConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            generator: ReadingGenerator::new(&config.telemetry),
            injector: EventInjector::new(&config.injection),
            last: None,
        }
    }

    pub fn last(&self) -> Option<&Reading> {
        self.last.as_ref()
    }

    pub fn injector(&self) -> &EventInjector {
        &self.injector
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Emits the next reading. A known position overrides the simulated drift.
    pub fn next(&mut self, now_ms: u64, position: Option<Location>) -> Reading {
        let injection = self.injector.advance(&mut self.rng, self.last.is_some());

        let mut reading = match (injection, self.last.as_ref()) {
            (Injection::Burst(kind), Some(previous)) => burst_reading(
                &mut self.rng,
                previous,
                kind,
                now_ms,
                &self.config.injection,
                &self.config.telemetry,
            ),
            _ => self
                .generator
                .next(&mut self.rng, self.last.as_ref(), now_ms),
        };

        if let Some(position) = position {
            reading.location = position;
        }

        self.last = Some(reading);
        reading
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.injector.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::active_config;

    #[test]
    fn first_reading_after_reset_starts_fresh() {
        let mut sim = TripSimulator::seeded(active_config(), 17);
        for tick in 0..10 {
            let _ = sim.next(tick * 2_000, None);
        }
        assert!(sim.last().is_some());

        sim.reset();
        assert!(sim.last().is_none());
        assert!(!sim.injector().is_active());

        let first = sim.next(50_000, None);
        assert!(!first.is_burst());
        assert!((0.0..60.0).contains(&first.speed_kmh));
        assert_eq!(first.location, Location::new(28.6139, 77.2090));
    }

    #[test]
    fn known_position_pins_every_reading() {
        let fix = Location::new(51.5, -0.12);
        let mut sim = TripSimulator::seeded(active_config(), 4);
        for tick in 0..200 {
            let reading = sim.next(tick, Some(fix));
            assert_eq!(reading.location, fix);
        }
    }

    #[test]
    fn long_trip_never_has_more_than_two_burst_readings_in_a_row() {
        for seed in 0..50 {
            let mut sim = TripSimulator::seeded(active_config(), seed);
            let mut run = 0;
            for tick in 0..400 {
                if sim.next(tick * 2_000, None).is_burst() {
                    run += 1;
                    assert!(run <= 2, "seed {seed}");
                } else {
                    run = 0;
                }
            }
        }
    }

    #[test]
    fn bursts_appear_over_a_long_trip() {
        let mut sim = TripSimulator::seeded(active_config(), 1234);
        let bursts = (0..1_000)
            .filter(|tick| sim.next(*tick * 2_000, None).is_burst())
            .count();
        assert!(bursts > 0);
    }
}
