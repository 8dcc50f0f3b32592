use super::types::RiskScore;
use crate::{config::RiskConfig, telemetry::Reading};

pub const DET_HARD_BRAKE: u8 = 0x01;
pub const DET_SUDDEN_ACCEL: u8 = 0x02;
pub const DET_SHARP_TURN: u8 = 0x04;
pub const DET_SEVERE_TURN: u8 = 0x08;
pub const DET_HEAVY_TRAFFIC: u8 = 0x10;

const DET_MOTION_EVENTS: u8 = DET_HARD_BRAKE | DET_SUDDEN_ACCEL | DET_SHARP_TURN | DET_SEVERE_TURN;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Detections {
    pub mask: u8,
}

impl Detections {
    pub const fn has(self, bit: u8) -> bool {
        self.mask & bit != 0
    }

    /// True when a brake, acceleration or turn event was seen.
    pub const fn has_motion_event(self) -> bool {
        self.mask & DET_MOTION_EVENTS != 0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeuristicOutcome {
    pub score: RiskScore,
    pub detections: Detections,
    pub explanation: String,
}

/// Longitudinal axis is `x`; turns are judged on yaw rate `|gyro.z|`.
pub fn detect(reading: &Reading, cfg: &RiskConfig) -> Detections {
    let mut mask = 0u8;
    if reading.accel.x <= cfg.hard_brake_threshold_ms2 {
        mask |= DET_HARD_BRAKE;
    }
    if reading.accel.x >= cfg.sudden_acceleration_threshold_ms2 {
        mask |= DET_SUDDEN_ACCEL;
    }

    let yaw_rate = reading.gyro.z.abs();
    if yaw_rate > cfg.severe_turn_threshold_rads {
        mask |= DET_SEVERE_TURN;
    } else if yaw_rate > cfg.sharp_turn_threshold_rads {
        mask |= DET_SHARP_TURN;
    }

    if reading.context.traffic.is_heavy() {
        mask |= DET_HEAVY_TRAFFIC;
    }
    Detections { mask }
}

fn explain(detections: Detections) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if detections.has(DET_HARD_BRAKE) {
        parts.push("Hard braking detected.");
    }
    if detections.has(DET_SUDDEN_ACCEL) {
        parts.push("Sudden acceleration detected.");
    }
    if detections.has(DET_SEVERE_TURN) {
        parts.push("Severe swerve detected.");
    } else if detections.has(DET_SHARP_TURN) {
        parts.push("Sharp turn detected.");
    }
    if !detections.has_motion_event() {
        parts.push("Driving is steady.");
    }
    if detections.has(DET_HEAVY_TRAFFIC) {
        parts.push("Heavy traffic raises baseline risk.");
    }
    parts.join(" ")
}

/// Rule-based score update for one reading.
pub fn score_reading(reading: &Reading, previous: RiskScore, cfg: &RiskConfig) -> HeuristicOutcome {
    let detections = detect(reading, cfg);
    let prev = previous.value();

    let mut next = if detections.has_motion_event() {
        let mut delta = 0.0f32;
        if detections.has(DET_HARD_BRAKE) {
            delta += cfg.hard_brake_delta;
        }
        if detections.has(DET_SUDDEN_ACCEL) {
            delta += cfg.sudden_acceleration_delta;
        }
        if detections.has(DET_SEVERE_TURN) {
            delta += cfg.severe_turn_delta;
        } else if detections.has(DET_SHARP_TURN) {
            delta += cfg.sharp_turn_delta;
        }
        prev + delta
    } else if prev > cfg.floor {
        (prev - cfg.decay_step).max(cfg.floor)
    } else {
        prev
    };

    if detections.has(DET_HEAVY_TRAFFIC) {
        next += cfg.heavy_traffic_delta;
    }

    HeuristicOutcome {
        score: RiskScore::new(next),
        detections,
        explanation: explain(detections),
    }
}
