pub mod contacts;
pub mod runtime;
pub mod scheduler;
pub mod status_log;

use rand::{rngs::StdRng, RngCore};
use serde::Serialize;
use thiserror::Error;

use crate::{
    assessment::{
        Assessment, AssessmentError, AssessmentRequest, DrivingAnalysis, PatternAnalyzer,
    },
    config::{ReflexConfig, LIVE_HISTORY_LEN, TRIP_HISTORY_LEN},
    environment::{resolve_location, EnvironmentSnapshot, GeolocationError},
    history::ReadingHistory,
    risk::{
        score_reading, ActionBuffer, RiskAction, RiskEngine, RiskScore, RiskState, RiskStatus,
        ASSESSMENT_UNAVAILABLE, IDLE_EXPLANATION, STOPPED_EXPLANATION,
    },
    telemetry::{Location, Reading, TripSimulator},
};

pub use contacts::{default_contacts, EmergencyContact};
pub use runtime::{drive, CommandChannel, MonitorCommand};
pub use scheduler::TickScheduler;
pub use status_log::{StatusEntry, StatusLevel, StatusLog};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum MonitorError {
    #[error("no trip is being monitored")]
    NotMonitoring,
    #[error("stop the trip before analyzing it")]
    TripActive,
    #[error("trip analysis needs at least {need} readings, have {have}")]
    InsufficientHistory { have: usize, need: usize },
    #[error(transparent)]
    Analysis(#[from] AssessmentError),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ScoringMode {
    #[default]
    Local,
    External,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TicketId {
    pub epoch: u32,
    pub seq: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssessmentTicket {
    pub id: TicketId,
    pub request: AssessmentRequest,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyDispatch {
    pub at_ms: u64,
    pub score: RiskScore,
    pub location: Option<Location>,
    pub contacts: Vec<EmergencyContact>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub at_ms: u64,
    pub reading: Option<Reading>,
    pub state: RiskState,
    pub alert_raised: bool,
    pub dispatch: Option<EmergencyDispatch>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    Scored(TickReport),
    Pending(AssessmentTicket),
    Coalesced,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorCounters {
    pub ticks: u32,
    pub coalesced: u32,
    pub stale_results: u32,
    pub assessment_failures: u32,
    pub dispatches: u32,
}

pub trait MonitorListener {
    fn on_tick(&mut self, report: &TickReport);

    fn on_dispatch(&mut self, dispatch: &EmergencyDispatch) {
        let _ = dispatch;
    }

    fn on_stopped(&mut self, state: &RiskState) {
        let _ = state;
    }
}

/// Trip session. At most one assessment ticket is in flight; ticks arriving
/// meanwhile are coalesced, and results for a superseded ticket or an earlier
/// session are dropped.
pub struct Monitor<R = StdRng> {
    config: &'static ReflexConfig,
    mode: ScoringMode,
    simulator: TripSimulator<R>,
    risk: RiskEngine,
    state: RiskState,
    current: Option<Reading>,
    trip: ReadingHistory<TRIP_HISTORY_LEN>,
    live: ReadingHistory<LIVE_HISTORY_LEN>,
    log: StatusLog,
    contacts: Vec<EmergencyContact>,
    position: Option<Location>,
    location_warning: Option<&'static str>,
    environment: EnvironmentSnapshot,
    sharing_location: bool,
    monitoring: bool,
    epoch: u32,
    next_seq: u32,
    in_flight: Option<TicketId>,
    counters: MonitorCounters,
    listeners: Vec<Box<dyn MonitorListener>>,
}

impl Monitor<StdRng> {
    pub fn seeded(config: &'static ReflexConfig, mode: ScoringMode, seed: u64) -> Self {
        Self::new(config, mode, TripSimulator::seeded(config, seed))
    }
}

impl<R: RngCore> Monitor<R> {
    pub fn new(config: &'static ReflexConfig, mode: ScoringMode, simulator: TripSimulator<R>) -> Self {
        Self {
            config,
            mode,
            simulator,
            risk: RiskEngine::new(&config.risk),
            state: RiskState::idle(),
            current: None,
            trip: ReadingHistory::new(),
            live: ReadingHistory::new(),
            log: StatusLog::new(),
            contacts: default_contacts(),
            position: None,
            location_warning: None,
            environment: EnvironmentSnapshot::default(),
            sharing_location: false,
            monitoring: false,
            epoch: 0,
            next_seq: 0,
            in_flight: None,
            counters: MonitorCounters::default(),
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &'static ReflexConfig {
        self.config
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn state(&self) -> &RiskState {
        &self.state
    }

    pub fn current(&self) -> Option<&Reading> {
        self.current.as_ref()
    }

    pub fn trip_history(&self) -> &ReadingHistory<TRIP_HISTORY_LEN> {
        &self.trip
    }

    pub fn live_window(&self) -> &ReadingHistory<LIVE_HISTORY_LEN> {
        &self.live
    }

    pub fn status_log(&self) -> &StatusLog {
        &self.log
    }

    pub fn contacts(&self) -> &[EmergencyContact] {
        &self.contacts
    }

    pub fn set_contacts(&mut self, contacts: Vec<EmergencyContact>) {
        self.contacts = contacts;
    }

    pub fn environment(&self) -> &EnvironmentSnapshot {
        &self.environment
    }

    pub fn location_warning(&self) -> Option<&'static str> {
        self.location_warning
    }

    pub fn is_sharing_location(&self) -> bool {
        self.sharing_location
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn in_flight(&self) -> Option<TicketId> {
        self.in_flight
    }

    pub fn counters(&self) -> MonitorCounters {
        self.counters
    }

    pub fn alert_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.risk.alert_remaining_ms(now_ms)
    }

    pub fn subscribe(&mut self, listener: Box<dyn MonitorListener>) {
        self.listeners.push(listener);
    }

    /// Begins a fresh trip, ending any running one first.
    pub fn start(&mut self, now_ms: u64) {
        if self.monitoring {
            self.halt(now_ms);
        }
        self.trip.clear();
        self.live.clear();
        self.simulator.reset();
        self.current = None;
        self.sharing_location = false;
        self.in_flight = None;
        self.epoch = self.epoch.wrapping_add(1);

        let output = self.risk.start();
        self.state = RiskState {
            score: RiskScore::ZERO,
            status: output.status,
            explanation: IDLE_EXPLANATION.into(),
        };
        self.monitoring = true;
        self.log.push(now_ms, StatusLevel::Info, "Monitoring started.");
        log::debug!("trip epoch {} started", self.epoch);
    }

    pub fn stop(&mut self, now_ms: u64) -> Result<(), MonitorError> {
        if !self.monitoring {
            return Err(MonitorError::NotMonitoring);
        }
        self.halt(now_ms);
        Ok(())
    }

    fn halt(&mut self, now_ms: u64) {
        self.monitoring = false;
        self.simulator.reset();
        let _ = self.risk.stop();
        if self.in_flight.take().is_some() {
            log::debug!("dropping in-flight assessment for epoch {}", self.epoch);
        }
        self.current = None;
        self.sharing_location = false;
        self.state = RiskState {
            score: RiskScore::ZERO,
            status: RiskStatus::Idle,
            explanation: STOPPED_EXPLANATION.into(),
        };
        self.log.push(now_ms, StatusLevel::Info, "Monitoring stopped.");
        for listener in &mut self.listeners {
            listener.on_stopped(&self.state);
        }
    }

    pub fn tick(&mut self, now_ms: u64) -> Result<TickOutcome, MonitorError> {
        if !self.monitoring {
            return Err(MonitorError::NotMonitoring);
        }
        if self.in_flight.is_some() {
            self.counters.coalesced += 1;
            log::debug!("tick at {now_ms} ms coalesced behind in-flight assessment");
            return Ok(TickOutcome::Coalesced);
        }

        self.counters.ticks += 1;
        let reading = self.simulator.next(now_ms, self.position);
        self.trip.push(reading);
        self.live.push(reading);
        self.current = Some(reading);

        match self.mode {
            ScoringMode::Local => {
                let outcome = score_reading(&reading, self.state.score, &self.config.risk);
                Ok(TickOutcome::Scored(self.apply(
                    now_ms,
                    outcome.score,
                    outcome.explanation,
                )))
            }
            ScoringMode::External => {
                let id = TicketId {
                    epoch: self.epoch,
                    seq: self.next_seq,
                };
                self.next_seq = self.next_seq.wrapping_add(1);
                self.in_flight = Some(id);
                Ok(TickOutcome::Pending(AssessmentTicket {
                    id,
                    request: AssessmentRequest {
                        reading,
                        previous_score: self.state.score,
                        environment: Some(self.environment.clone()),
                    },
                }))
            }
        }
    }

    /// Applies an assessment result. Returns `None` when the ticket is stale.
    pub fn complete_assessment(
        &mut self,
        id: TicketId,
        result: Result<Assessment, AssessmentError>,
        now_ms: u64,
    ) -> Option<TickReport> {
        if !self.monitoring || self.in_flight != Some(id) {
            self.counters.stale_results += 1;
            log::debug!("discarding stale assessment {id:?}");
            return None;
        }
        self.in_flight = None;

        let assessment = match result {
            Ok(assessment) => assessment,
            Err(err) => {
                self.counters.assessment_failures += 1;
                log::warn!("{err}");
                self.log
                    .push(now_ms, StatusLevel::Warning, ASSESSMENT_UNAVAILABLE);
                Assessment::unavailable()
            }
        };
        Some(self.apply(now_ms, assessment.score, assessment.explanation))
    }

    fn apply(&mut self, now_ms: u64, score: RiskScore, explanation: String) -> TickReport {
        let output = self.risk.score(score, now_ms);
        self.state = RiskState {
            score,
            status: output.status,
            explanation,
        };

        let dispatch = self.handle_actions(now_ms, &output.actions);
        let report = TickReport {
            at_ms: now_ms,
            reading: self.current,
            state: self.state.clone(),
            alert_raised: output.actions.contains_alert(),
            dispatch: dispatch.clone(),
        };
        for listener in &mut self.listeners {
            listener.on_tick(&report);
        }
        if dispatch.is_some() {
            self.halt(now_ms);
        }
        report
    }

    fn handle_actions(&mut self, now_ms: u64, actions: &ActionBuffer) -> Option<EmergencyDispatch> {
        let mut dispatch = None;
        for action in actions.iter() {
            match *action {
                RiskAction::StatusChanged { from, to } => {
                    log::debug!("status {} -> {}", from.label(), to.label());
                    if to == RiskStatus::Warning {
                        self.log.push(now_ms, StatusLevel::Warning, "Risk elevated.");
                    }
                }
                RiskAction::AlertRaised { score } => {
                    self.log.push(
                        now_ms,
                        StatusLevel::Alert,
                        format!(
                            "High risk detected ({:.0}). Contacts will be notified in {} s.",
                            score.value(),
                            self.config.risk.alert_countdown_ms / 1_000
                        ),
                    );
                }
                RiskAction::AlertCleared => {
                    self.log.push(now_ms, StatusLevel::Info, "Alert acknowledged.");
                }
                RiskAction::EmergencyDispatch { score } => {
                    let event = EmergencyDispatch {
                        at_ms: now_ms,
                        score,
                        location: self.current.map(|r| r.location).or(self.position),
                        contacts: self.contacts.clone(),
                    };
                    self.counters.dispatches += 1;
                    self.log.push(
                        now_ms,
                        StatusLevel::Alert,
                        "Emergency contacts have been notified!",
                    );
                    for listener in &mut self.listeners {
                        listener.on_dispatch(&event);
                    }
                    dispatch = Some(event);
                }
            }
        }
        dispatch
    }

    pub fn acknowledge_alert(&mut self, now_ms: u64) -> Result<RiskStatus, MonitorError> {
        if !self.monitoring {
            return Err(MonitorError::NotMonitoring);
        }
        let output = self.risk.acknowledge();
        self.state.status = output.status;
        let _ = self.handle_actions(now_ms, &output.actions);
        Ok(output.status)
    }

    /// Dispatches right away when an alert is pending; the trip then stops.
    pub fn confirm_alert(&mut self, now_ms: u64) -> Result<Option<EmergencyDispatch>, MonitorError> {
        if !self.monitoring {
            return Err(MonitorError::NotMonitoring);
        }
        let output = self.risk.confirm();
        let dispatch = self.handle_actions(now_ms, &output.actions);
        if dispatch.is_some() {
            self.halt(now_ms);
        }
        Ok(dispatch)
    }

    pub fn set_geolocation(&mut self, result: Result<Location, GeolocationError>, now_ms: u64) {
        let fix = resolve_location(result, &self.config.telemetry);
        // A failed lookup keeps the last good fix.
        if fix.warning.is_none() || self.position.is_none() {
            self.position = Some(fix.location);
        }
        self.location_warning = fix.warning;
        if let Some(warning) = fix.warning {
            self.log.push(now_ms, StatusLevel::Warning, warning);
        }
    }

    pub fn update_environment(&mut self, snapshot: Option<EnvironmentSnapshot>) {
        self.environment = snapshot.unwrap_or_default();
    }

    pub fn toggle_location_sharing(&mut self, now_ms: u64) -> Result<bool, MonitorError> {
        if !self.monitoring {
            return Err(MonitorError::NotMonitoring);
        }
        self.sharing_location = !self.sharing_location;
        let message = if self.sharing_location {
            "Real-time location sharing enabled."
        } else {
            "Real-time location sharing disabled."
        };
        self.log.push(now_ms, StatusLevel::Info, message);
        Ok(self.sharing_location)
    }

    pub fn trip_for_analysis(&self) -> Result<Vec<Reading>, MonitorError> {
        if self.monitoring {
            return Err(MonitorError::TripActive);
        }
        let need = self.config.analysis.min_history;
        let have = self.trip.len();
        if have < need {
            return Err(MonitorError::InsufficientHistory { have, need });
        }
        Ok(self.trip.to_vec())
    }

    pub async fn analyze_trip<A: PatternAnalyzer>(
        &self,
        analyzer: &A,
    ) -> Result<DrivingAnalysis, MonitorError> {
        let history = self.trip_for_analysis()?;
        Ok(analyzer.analyze(&history, &self.config.analysis).await?)
    }
}
