use std::{fmt, fmt::Write as _, fs, path::Path};

use serde::Deserialize;

#[derive(Debug)]
pub enum ConfigCompilerError {
    Io(String),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigCompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "io error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigCompilerError {}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReflexFile {
    pub telemetry: TelemetrySection,
    pub injection: InjectionSection,
    pub risk: RiskSection,
    pub analysis: AnalysisSection,
    pub scheduler: SchedulerSection,
    pub history: HistorySection,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetrySection {
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

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum InjectionModeSetting {
    Crash,
    Split,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InjectionSection {
    pub mode: InjectionModeSetting,
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

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskSection {
    pub floor: f64,
    pub decay_step: f64,
    pub hard_brake_delta: f64,
    pub sudden_acceleration_delta: f64,
    pub sharp_turn_delta: f64,
    pub severe_turn_delta: f64,
    pub heavy_traffic_delta: f64,
    pub hard_brake_threshold_ms2: f64,
    pub sudden_acceleration_threshold_ms2: f64,
    pub sharp_turn_threshold_rads: f64,
    pub severe_turn_threshold_rads: f64,
    pub warning_above: f64,
    pub alert_above: f64,
    pub alert_countdown_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisSection {
    pub hard_brake_threshold_ms2: f64,
    pub sudden_acceleration_threshold_ms2: f64,
    pub sharp_turn_threshold_rads: f64,
    pub min_history: usize,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSection {
    pub tick_period_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistorySection {
    pub trip_len: usize,
    pub live_len: usize,
    pub status_log_len: usize,
}

const MAX_HISTORY_LEN: usize = 1024;
const MAX_BURST_TICKS: u8 = 10;

pub fn parse_config_str(source: &str) -> Result<ReflexFile, ConfigCompilerError> {
    toml::from_str(source).map_err(|e| ConfigCompilerError::Parse(e.to_string()))
}

pub fn parse_config_file(path: &Path) -> Result<ReflexFile, ConfigCompilerError> {
    let source = fs::read_to_string(path)
        .map_err(|e| ConfigCompilerError::Io(format!("{}: {e}", path.display())))?;
    parse_config_str(&source)
}

fn invalid(msg: impl Into<String>) -> ConfigCompilerError {
    ConfigCompilerError::Validation(msg.into())
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn is_probability(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

pub fn validate_config(config: &ReflexFile) -> Result<(), ConfigCompilerError> {
    validate_telemetry(&config.telemetry)?;
    validate_injection(&config.injection)?;
    validate_risk(&config.risk)?;
    validate_analysis(&config.analysis, &config.history)?;

    let period = config.scheduler.tick_period_ms;
    if !(100..=60_000).contains(&period) {
        return Err(invalid("scheduler.tick_period_ms must be within 100..=60000"));
    }

    let history = &config.history;
    for (name, len) in [
        ("history.trip_len", history.trip_len),
        ("history.live_len", history.live_len),
        ("history.status_log_len", history.status_log_len),
    ] {
        if len == 0 || len > MAX_HISTORY_LEN {
            return Err(invalid(format!(
                "{name} must be within 1..={MAX_HISTORY_LEN}"
            )));
        }
    }
    if history.live_len > history.trip_len {
        return Err(invalid("history.live_len must be <= history.trip_len"));
    }

    Ok(())
}

fn validate_telemetry(t: &TelemetrySection) -> Result<(), ConfigCompilerError> {
    if !all_finite(&[
        t.initial_speed_max_kmh,
        t.speed_jitter_kmh,
        t.location_drift_deg,
        t.location_drift_reference_kmh,
        t.accel_noise_ms2,
        t.gravity_ms2,
        t.gravity_noise_ms2,
        t.gyro_noise_rads,
        t.fallback_latitude,
        t.fallback_longitude,
    ]) {
        return Err(invalid("all telemetry fields must be finite numbers"));
    }
    if t.initial_speed_max_kmh <= 0.0 {
        return Err(invalid("telemetry.initial_speed_max_kmh must be > 0"));
    }
    if t.location_drift_reference_kmh <= 0.0 {
        return Err(invalid("telemetry.location_drift_reference_kmh must be > 0"));
    }
    if [
        t.speed_jitter_kmh,
        t.location_drift_deg,
        t.accel_noise_ms2,
        t.gravity_noise_ms2,
        t.gyro_noise_rads,
    ]
    .iter()
    .any(|v| *v < 0.0)
    {
        return Err(invalid("telemetry noise amplitudes must be >= 0"));
    }
    if !(-90.0..=90.0).contains(&t.fallback_latitude) {
        return Err(invalid("telemetry.fallback_latitude must be within -90..=90"));
    }
    if !(-180.0..=180.0).contains(&t.fallback_longitude) {
        return Err(invalid("telemetry.fallback_longitude must be within -180..=180"));
    }
    Ok(())
}

fn validate_injection(i: &InjectionSection) -> Result<(), ConfigCompilerError> {
    if !all_finite(&[
        i.crash_probability,
        i.brake_probability,
        i.acceleration_probability,
        i.accel_min_ms2,
        i.accel_span_ms2,
        i.vertical_jolt_ms2,
        i.gyro_min_rads,
        i.gyro_span_rads,
        i.speed_factor,
    ]) {
        return Err(invalid("all injection fields must be finite numbers"));
    }
    if !is_probability(i.crash_probability)
        || !is_probability(i.brake_probability)
        || !is_probability(i.acceleration_probability)
    {
        return Err(invalid("injection probabilities must be within 0..=1"));
    }
    if i.brake_probability + i.acceleration_probability > 1.0 {
        return Err(invalid(
            "injection.brake_probability + injection.acceleration_probability must be <= 1",
        ));
    }
    if i.max_burst_ticks == 0 || i.max_burst_ticks > MAX_BURST_TICKS {
        return Err(invalid(format!(
            "injection.max_burst_ticks must be within 1..={MAX_BURST_TICKS}"
        )));
    }
    if i.accel_min_ms2 <= 0.0 || i.gyro_min_rads <= 0.0 {
        return Err(invalid("injection burst minimums must be > 0"));
    }
    if i.accel_span_ms2 < 0.0 || i.gyro_span_rads < 0.0 || i.vertical_jolt_ms2 < 0.0 {
        return Err(invalid("injection burst spans must be >= 0"));
    }
    if !(0.0..=1.0).contains(&i.speed_factor) {
        return Err(invalid("injection.speed_factor must be within 0..=1"));
    }
    Ok(())
}

fn validate_risk(r: &RiskSection) -> Result<(), ConfigCompilerError> {
    if !all_finite(&[
        r.floor,
        r.decay_step,
        r.hard_brake_delta,
        r.sudden_acceleration_delta,
        r.sharp_turn_delta,
        r.severe_turn_delta,
        r.heavy_traffic_delta,
        r.hard_brake_threshold_ms2,
        r.sudden_acceleration_threshold_ms2,
        r.sharp_turn_threshold_rads,
        r.severe_turn_threshold_rads,
        r.warning_above,
        r.alert_above,
    ]) {
        return Err(invalid("all risk fields must be finite numbers"));
    }
    if !(r.floor >= 0.0 && r.floor < r.warning_above && r.warning_above < r.alert_above)
        || r.alert_above > 100.0
    {
        return Err(invalid(
            "risk levels must satisfy 0 <= floor < warning_above < alert_above <= 100",
        ));
    }
    if r.decay_step <= 0.0 {
        return Err(invalid("risk.decay_step must be > 0"));
    }
    if [
        r.hard_brake_delta,
        r.sudden_acceleration_delta,
        r.sharp_turn_delta,
        r.severe_turn_delta,
        r.heavy_traffic_delta,
    ]
    .iter()
    .any(|v| *v < 0.0)
    {
        return Err(invalid("risk deltas must be >= 0"));
    }
    if r.hard_brake_threshold_ms2 >= 0.0 || r.sudden_acceleration_threshold_ms2 <= 0.0 {
        return Err(invalid(
            "risk.hard_brake_threshold_ms2 must be < 0 and risk.sudden_acceleration_threshold_ms2 > 0",
        ));
    }
    if r.sharp_turn_threshold_rads <= 0.0
        || r.severe_turn_threshold_rads <= r.sharp_turn_threshold_rads
    {
        return Err(invalid(
            "risk turn thresholds must satisfy 0 < sharp_turn_threshold_rads < severe_turn_threshold_rads",
        ));
    }
    if r.alert_countdown_ms == 0 {
        return Err(invalid("risk.alert_countdown_ms must be > 0"));
    }
    Ok(())
}

fn validate_analysis(a: &AnalysisSection, h: &HistorySection) -> Result<(), ConfigCompilerError> {
    if !all_finite(&[
        a.hard_brake_threshold_ms2,
        a.sudden_acceleration_threshold_ms2,
        a.sharp_turn_threshold_rads,
    ]) {
        return Err(invalid("all analysis thresholds must be finite numbers"));
    }
    if a.hard_brake_threshold_ms2 >= 0.0
        || a.sudden_acceleration_threshold_ms2 <= 0.0
        || a.sharp_turn_threshold_rads <= 0.0
    {
        return Err(invalid(
            "analysis thresholds must be signed as brake < 0, acceleration > 0, turn > 0",
        ));
    }
    if a.min_history == 0 || a.min_history > h.trip_len {
        return Err(invalid(
            "analysis.min_history must be within 1..=history.trip_len",
        ));
    }
    Ok(())
}

fn float(value: f64) -> String {
    format!("{value:?}")
}

pub fn render_generated_config(config: &ReflexFile) -> String {
    let t = &config.telemetry;
    let i = &config.injection;
    let r = &config.risk;
    let a = &config.analysis;
    let mode = match i.mode {
        InjectionModeSetting::Crash => "InjectionMode::Crash",
        InjectionModeSetting::Split => "InjectionMode::Split",
    };

    let mut out = String::new();
    let _ = writeln!(out, "// @generated by reflex_config_compiler. Do not edit.");
    let _ = writeln!(
        out,
        "pub const TRIP_HISTORY_LEN: usize = {};",
        config.history.trip_len
    );
    let _ = writeln!(
        out,
        "pub const LIVE_HISTORY_LEN: usize = {};",
        config.history.live_len
    );
    let _ = writeln!(
        out,
        "pub const STATUS_LOG_LEN: usize = {};",
        config.history.status_log_len
    );
    out.push('\n');
    out.push_str("pub static REFLEX_CONFIG: ReflexConfig = ReflexConfig {\n");

    out.push_str("    telemetry: TelemetryConfig {\n");
    for (name, value) in [
        ("initial_speed_max_kmh", t.initial_speed_max_kmh),
        ("speed_jitter_kmh", t.speed_jitter_kmh),
        ("location_drift_deg", t.location_drift_deg),
        ("location_drift_reference_kmh", t.location_drift_reference_kmh),
        ("accel_noise_ms2", t.accel_noise_ms2),
        ("gravity_ms2", t.gravity_ms2),
        ("gravity_noise_ms2", t.gravity_noise_ms2),
        ("gyro_noise_rads", t.gyro_noise_rads),
        ("fallback_latitude", t.fallback_latitude),
        ("fallback_longitude", t.fallback_longitude),
    ] {
        let _ = writeln!(out, "        {name}: {},", float(value));
    }
    out.push_str("    },\n");

    out.push_str("    injection: InjectionConfig {\n");
    let _ = writeln!(out, "        mode: {mode},");
    for (name, value) in [
        ("crash_probability", i.crash_probability),
        ("brake_probability", i.brake_probability),
        ("acceleration_probability", i.acceleration_probability),
    ] {
        let _ = writeln!(out, "        {name}: {},", float(value));
    }
    let _ = writeln!(out, "        max_burst_ticks: {},", i.max_burst_ticks);
    for (name, value) in [
        ("accel_min_ms2", i.accel_min_ms2),
        ("accel_span_ms2", i.accel_span_ms2),
        ("vertical_jolt_ms2", i.vertical_jolt_ms2),
        ("gyro_min_rads", i.gyro_min_rads),
        ("gyro_span_rads", i.gyro_span_rads),
        ("speed_factor", i.speed_factor),
    ] {
        let _ = writeln!(out, "        {name}: {},", float(value));
    }
    out.push_str("    },\n");

    out.push_str("    risk: RiskConfig {\n");
    for (name, value) in [
        ("floor", r.floor),
        ("decay_step", r.decay_step),
        ("hard_brake_delta", r.hard_brake_delta),
        ("sudden_acceleration_delta", r.sudden_acceleration_delta),
        ("sharp_turn_delta", r.sharp_turn_delta),
        ("severe_turn_delta", r.severe_turn_delta),
        ("heavy_traffic_delta", r.heavy_traffic_delta),
        ("hard_brake_threshold_ms2", r.hard_brake_threshold_ms2),
        (
            "sudden_acceleration_threshold_ms2",
            r.sudden_acceleration_threshold_ms2,
        ),
        ("sharp_turn_threshold_rads", r.sharp_turn_threshold_rads),
        ("severe_turn_threshold_rads", r.severe_turn_threshold_rads),
        ("warning_above", r.warning_above),
        ("alert_above", r.alert_above),
    ] {
        let _ = writeln!(out, "        {name}: {},", float(value));
    }
    let _ = writeln!(out, "        alert_countdown_ms: {},", r.alert_countdown_ms);
    out.push_str("    },\n");

    out.push_str("    analysis: AnalysisConfig {\n");
    for (name, value) in [
        ("hard_brake_threshold_ms2", a.hard_brake_threshold_ms2),
        (
            "sudden_acceleration_threshold_ms2",
            a.sudden_acceleration_threshold_ms2,
        ),
        ("sharp_turn_threshold_rads", a.sharp_turn_threshold_rads),
    ] {
        let _ = writeln!(out, "        {name}: {},", float(value));
    }
    let _ = writeln!(out, "        min_history: {},", a.min_history);
    out.push_str("    },\n");

    out.push_str("    scheduler: SchedulerConfig {\n");
    let _ = writeln!(
        out,
        "        tick_period_ms: {},",
        config.scheduler.tick_period_ms
    );
    out.push_str("    },\n");
    out.push_str("};\n");
    out
}

pub fn generate_from_path(path: &Path) -> Result<String, ConfigCompilerError> {
    let config = parse_config_file(path)?;
    validate_config(&config)?;
    Ok(render_generated_config(&config))
}
