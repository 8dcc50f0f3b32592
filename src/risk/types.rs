use heapless::Vec;
use serde::Serialize;

pub const IDLE_EXPLANATION: &str = "System Idle";
pub const STOPPED_EXPLANATION: &str = "Monitoring stopped. You can now analyze the trip.";
pub const ASSESSMENT_UNAVAILABLE: &str = "AI service unavailable.";

/// Accident likelihood, always within `[0, 100]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize)]
pub struct RiskScore(f32);

impl RiskScore {
    pub const ZERO: Self = Self(0.0);
    pub const MAX: f32 = 100.0;

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, Self::MAX))
    }

    pub const fn value(self) -> f32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RiskStatus {
    #[default]
    Idle = 0,
    Monitoring = 1,
    Warning = 2,
    Alert = 3,
}

impl RiskStatus {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Monitoring => "monitoring",
            Self::Warning => "warning",
            Self::Alert => "alert",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RiskAction {
    StatusChanged { from: RiskStatus, to: RiskStatus },
    AlertRaised { score: RiskScore },
    AlertCleared,
    EmergencyDispatch { score: RiskScore },
}

const ACTION_CAPACITY: usize = 4;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionBuffer {
    actions: Vec<RiskAction, ACTION_CAPACITY>,
}

impl ActionBuffer {
    pub const MAX: usize = ACTION_CAPACITY;

    pub const fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn push(&mut self, action: RiskAction) {
        let _ = self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RiskAction> {
        self.actions.iter()
    }

    pub fn contains_alert(&self) -> bool {
        self.iter()
            .any(|action| matches!(action, RiskAction::AlertRaised { .. }))
    }

    pub fn dispatch_score(&self) -> Option<RiskScore> {
        self.iter().find_map(|action| match action {
            RiskAction::EmergencyDispatch { score } => Some(*score),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskState {
    pub score: RiskScore,
    pub status: RiskStatus,
    pub explanation: String,
}

impl RiskState {
    pub fn idle() -> Self {
        Self {
            score: RiskScore::ZERO,
            status: RiskStatus::Idle,
            explanation: IDLE_EXPLANATION.into(),
        }
    }
}

impl Default for RiskState {
    fn default() -> Self {
        Self::idle()
    }
}
