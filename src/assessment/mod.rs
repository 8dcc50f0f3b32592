pub mod pattern;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::{
    config::RiskConfig,
    environment::EnvironmentSnapshot,
    risk::{score_reading, RiskScore, ASSESSMENT_UNAVAILABLE},
    telemetry::{Location, Reading, TripContext, Vec3},
};

pub use pattern::{parse_driving_analysis, DrivingAnalysis, LocalPatternAnalyzer, PatternAnalyzer};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum AssessmentError {
    #[error("assessment service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed assessment payload: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    #[serde(serialize_with = "observed_only")]
    pub reading: Reading,
    pub previous_score: RiskScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentSnapshot>,
}

/// What a vehicle would actually report; burst provenance stays local.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ObservedReading<'a> {
    timestamp_ms: u64,
    accel: &'a Vec3,
    gyro: &'a Vec3,
    speed_kmh: f64,
    location: &'a Location,
    context: &'a TripContext,
}

fn observed_only<S: Serializer>(reading: &Reading, serializer: S) -> Result<S::Ok, S::Error> {
    ObservedReading {
        timestamp_ms: reading.timestamp_ms,
        accel: &reading.accel,
        gyro: &reading.gyro,
        speed_kmh: reading.speed_kmh,
        location: &reading.location,
        context: &reading.context,
    }
    .serialize(serializer)
}

impl AssessmentRequest {
    pub fn to_json(&self) -> Result<String, AssessmentError> {
        serde_json::to_string(self).map_err(|err| AssessmentError::Malformed(err.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Assessment {
    pub score: RiskScore,
    pub explanation: String,
}

impl Assessment {
    pub fn unavailable() -> Self {
        Self {
            score: RiskScore::ZERO,
            explanation: ASSESSMENT_UNAVAILABLE.into(),
        }
    }

    pub fn or_unavailable(result: Result<Self, AssessmentError>) -> Self {
        result.unwrap_or_else(|err| {
            log::warn!("{err}");
            Self::unavailable()
        })
    }
}

#[allow(async_fn_in_trait)]
pub trait Assessor {
    async fn assess(&self, request: &AssessmentRequest) -> Result<Assessment, AssessmentError>;
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentWire {
    risk_score: Option<f64>,
    analysis: Option<String>,
}

/// Parses `{"riskScore": number, "analysis": string}`. Out-of-range finite
/// scores are clamped; anything else missing or non-finite is malformed.
pub fn parse_assessment(body: &str) -> Result<Assessment, AssessmentError> {
    let wire: AssessmentWire =
        serde_json::from_str(body).map_err(|err| AssessmentError::Malformed(err.to_string()))?;
    let score = wire
        .risk_score
        .ok_or_else(|| AssessmentError::Malformed("missing riskScore".into()))?;
    if !score.is_finite() {
        return Err(AssessmentError::Malformed("riskScore is not finite".into()));
    }
    let explanation = wire
        .analysis
        .ok_or_else(|| AssessmentError::Malformed("missing analysis".into()))?;
    Ok(Assessment {
        score: RiskScore::new(score as f32),
        explanation,
    })
}

/// Local heuristics behind the collaborator interface.
pub struct RuleAssessor {
    config: &'static RiskConfig,
}

impl RuleAssessor {
    pub const fn new(config: &'static RiskConfig) -> Self {
        Self { config }
    }
}

impl Assessor for RuleAssessor {
    async fn assess(&self, request: &AssessmentRequest) -> Result<Assessment, AssessmentError> {
        let outcome = score_reading(&request.reading, request.previous_score, self.config);
        Ok(Assessment {
            score: outcome.score,
            explanation: outcome.explanation,
        })
    }
}
