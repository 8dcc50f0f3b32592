pub mod heuristics;
pub mod hsm;
pub mod types;

pub use heuristics::{detect, score_reading, Detections, HeuristicOutcome};
pub use hsm::{RiskEngine, RiskOutput};
pub use types::{
    ActionBuffer, RiskAction, RiskScore, RiskState, RiskStatus, ASSESSMENT_UNAVAILABLE,
    IDLE_EXPLANATION, STOPPED_EXPLANATION,
};
