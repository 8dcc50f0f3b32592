use serde::{Deserialize, Serialize};

use super::AssessmentError;
use crate::{config::AnalysisConfig, telemetry::Reading};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivingAnalysis {
    pub hard_braking_events: u32,
    pub sudden_acceleration_events: u32,
    pub sharp_turn_events: u32,
    pub summary: String,
    pub recommendations: Vec<String>,
}

impl DrivingAnalysis {
    pub fn total_events(&self) -> u32 {
        self.hard_braking_events + self.sudden_acceleration_events + self.sharp_turn_events
    }
}

/// Whole-trip review. Implementations must count with the thresholds they are given.
#[allow(async_fn_in_trait)]
pub trait PatternAnalyzer {
    async fn analyze(
        &self,
        history: &[Reading],
        config: &AnalysisConfig,
    ) -> Result<DrivingAnalysis, AssessmentError>;
}

pub fn parse_driving_analysis(body: &str) -> Result<DrivingAnalysis, AssessmentError> {
    serde_json::from_str(body).map_err(|err| AssessmentError::Malformed(err.to_string()))
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LocalPatternAnalyzer;

impl LocalPatternAnalyzer {
    pub fn count(history: &[Reading], config: &AnalysisConfig) -> (u32, u32, u32) {
        history.iter().fold((0, 0, 0), |(brakes, surges, turns), reading| {
            (
                brakes + u32::from(reading.accel.x <= config.hard_brake_threshold_ms2),
                surges + u32::from(reading.accel.x >= config.sudden_acceleration_threshold_ms2),
                turns + u32::from(reading.gyro.z.abs() > config.sharp_turn_threshold_rads),
            )
        })
    }

    fn summarize(readings: usize, brakes: u32, surges: u32, turns: u32) -> String {
        let total = brakes + surges + turns;
        if total == 0 {
            return format!("Smooth trip: no aggressive events across {readings} readings.");
        }
        format!(
            "{total} aggressive events across {readings} readings: {brakes} hard braking, \
             {surges} sudden acceleration, {turns} sharp turns."
        )
    }

    fn recommend(brakes: u32, surges: u32, turns: u32) -> Vec<String> {
        let mut tips = Vec::new();
        if brakes > 0 {
            tips.push("Keep a longer following distance to avoid hard braking.".to_string());
        }
        if surges > 0 {
            tips.push("Accelerate gradually when pulling away.".to_string());
        }
        if turns > 0 {
            tips.push("Slow down before entering turns.".to_string());
        }
        if tips.is_empty() {
            tips.push("Keep up the steady driving.".to_string());
        }
        tips
    }
}

impl PatternAnalyzer for LocalPatternAnalyzer {
    async fn analyze(
        &self,
        history: &[Reading],
        config: &AnalysisConfig,
    ) -> Result<DrivingAnalysis, AssessmentError> {
        let (brakes, surges, turns) = Self::count(history, config);
        Ok(DrivingAnalysis {
            hard_braking_events: brakes,
            sudden_acceleration_events: surges,
            sharp_turn_events: turns,
            summary: Self::summarize(history.len(), brakes, surges, turns),
            recommendations: Self::recommend(brakes, surges, turns),
        })
    }
}
