#[derive(Clone, Copy, Debug)]
pub struct TelemetryConfig {
    pub initial_speed_max_kmh: f64,
    pub speed_jitter_kmh: f64,
    pub location_drift_deg: f64,
    pub location_drift_reference_kmh: f64,
    pub accel_noise_ms2: f64,
    pub gravity_ms2: f64,
    pub gravity_noise_ms2: f64,
    pub gyro_noise_rads: f64,
    pub fallback_latitude: f64,
    pub fallback_longitude: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InjectionMode {
    /// One undirected crash-like burst type.
    Crash,
    /// Separate hard-brake and hard-acceleration bursts.
    Split,
}

#[derive(Clone, Copy, Debug)]
pub struct InjectionConfig {
    pub mode: InjectionMode,
    pub crash_probability: f64,
    pub brake_probability: f64,
    pub acceleration_probability: f64,
    pub max_burst_ticks: u8,
    pub accel_min_ms2: f64,
    pub accel_span_ms2: f64,
    pub vertical_jolt_ms2: f64,
    pub gyro_min_rads: f64,
    pub gyro_span_rads: f64,
    pub speed_factor: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct RiskConfig {
    pub floor: f32,
    pub decay_step: f32,
    pub hard_brake_delta: f32,
    pub sudden_acceleration_delta: f32,
    pub sharp_turn_delta: f32,
    pub severe_turn_delta: f32,
    pub heavy_traffic_delta: f32,
    pub hard_brake_threshold_ms2: f64,
    pub sudden_acceleration_threshold_ms2: f64,
    pub sharp_turn_threshold_rads: f64,
    pub severe_turn_threshold_rads: f64,
    pub warning_above: f32,
    pub alert_above: f32,
    pub alert_countdown_ms: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct AnalysisConfig {
    pub hard_brake_threshold_ms2: f64,
    pub sudden_acceleration_threshold_ms2: f64,
    pub sharp_turn_threshold_rads: f64,
    pub min_history: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub tick_period_ms: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct ReflexConfig {
    pub telemetry: TelemetryConfig,
    pub injection: InjectionConfig,
    pub risk: RiskConfig,
    pub analysis: AnalysisConfig,
    pub scheduler: SchedulerConfig,
}

include!(concat!(env!("OUT_DIR"), "/reflex_config.rs"));

pub fn active_config() -> &'static ReflexConfig {
    &REFLEX_CONFIG
}
