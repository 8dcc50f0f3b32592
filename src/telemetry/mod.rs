pub mod generator;
pub mod injector;
pub mod simulator;
pub mod types;

pub use generator::{fallback_location, ReadingGenerator};
pub use injector::{burst_reading, EventInjector, Injection};
pub use simulator::TripSimulator;
pub use types::{
    BurstKind, Location, Reading, ReadingSource, RegionType, RoadClass, Traffic, TripContext, Vec3,
    Weather,
};
