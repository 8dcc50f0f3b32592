use statig::{blocking::IntoStateMachineExt as _, prelude::*};

use super::types::{ActionBuffer, RiskAction, RiskScore, RiskStatus};
use crate::config::{active_config, RiskConfig};

#[derive(Clone, Copy, Debug)]
enum RiskHsmEvent {
    Start,
    Score { score: RiskScore, now_ms: u64 },
    Acknowledge,
    Confirm,
    Stop,
}

#[derive(Default)]
struct DispatchContext {
    actions: ActionBuffer,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RiskOutput {
    pub status: RiskStatus,
    pub actions: ActionBuffer,
}

/// Status machine with a sticky alert episode and a dispatch countdown.
pub struct RiskEngine {
    machine: statig::blocking::StateMachine<RiskHsm>,
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(&active_config().risk)
    }
}

impl RiskEngine {
    pub fn new(config: &'static RiskConfig) -> Self {
        Self {
            machine: RiskHsm::new(config).state_machine(),
        }
    }

    pub fn start(&mut self) -> RiskOutput {
        self.dispatch(RiskHsmEvent::Start)
    }

    pub fn score(&mut self, score: RiskScore, now_ms: u64) -> RiskOutput {
        self.dispatch(RiskHsmEvent::Score { score, now_ms })
    }

    pub fn acknowledge(&mut self) -> RiskOutput {
        self.dispatch(RiskHsmEvent::Acknowledge)
    }

    /// Skips the rest of the countdown.
    pub fn confirm(&mut self) -> RiskOutput {
        self.dispatch(RiskHsmEvent::Confirm)
    }

    pub fn stop(&mut self) -> RiskOutput {
        self.dispatch(RiskHsmEvent::Stop)
    }

    pub fn status(&self) -> RiskStatus {
        self.machine.inner().status
    }

    pub fn last_score(&self) -> RiskScore {
        self.machine.inner().last_score
    }

    pub fn alert_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        let hsm = self.machine.inner();
        if hsm.dispatched {
            return None;
        }
        let since = hsm.alert_since_ms?;
        Some(
            hsm.config
                .alert_countdown_ms
                .saturating_sub(now_ms.saturating_sub(since)),
        )
    }

    fn dispatch(&mut self, event: RiskHsmEvent) -> RiskOutput {
        let mut context = DispatchContext::default();
        self.machine.handle_with_context(&event, &mut context);
        RiskOutput {
            status: self.status(),
            actions: context.actions,
        }
    }
}

struct RiskHsm {
    config: &'static RiskConfig,
    status: RiskStatus,
    last_score: RiskScore,
    alert_since_ms: Option<u64>,
    dispatched: bool,
}

impl RiskHsm {
    fn new(config: &'static RiskConfig) -> Self {
        Self {
            config,
            status: RiskStatus::Idle,
            last_score: RiskScore::ZERO,
            alert_since_ms: None,
            dispatched: false,
        }
    }

    fn classify(&self, score: RiskScore) -> RiskStatus {
        let value = score.value();
        if value > self.config.alert_above {
            RiskStatus::Alert
        } else if value > self.config.warning_above {
            RiskStatus::Warning
        } else {
            RiskStatus::Monitoring
        }
    }

    fn state_for(status: RiskStatus) -> State {
        match status {
            RiskStatus::Idle => State::idle(),
            RiskStatus::Monitoring => State::monitoring(),
            RiskStatus::Warning => State::warning(),
            RiskStatus::Alert => State::alert(),
        }
    }

    fn set_status(&mut self, context: &mut DispatchContext, to: RiskStatus) {
        if self.status != to {
            context.actions.push(RiskAction::StatusChanged {
                from: self.status,
                to,
            });
            self.status = to;
        }
    }

    fn clear_episode(&mut self) {
        self.alert_since_ms = None;
        self.dispatched = false;
    }

    fn push_dispatch(&mut self, context: &mut DispatchContext) {
        if !self.dispatched {
            self.dispatched = true;
            context.actions.push(RiskAction::EmergencyDispatch {
                score: self.last_score,
            });
        }
    }

    fn follow_score(
        &mut self,
        context: &mut DispatchContext,
        score: RiskScore,
        now_ms: u64,
    ) -> Outcome<State> {
        self.last_score = score;
        let next = self.classify(score);
        if next == self.status {
            return Handled;
        }
        if next == RiskStatus::Alert {
            self.alert_since_ms = Some(now_ms);
            self.dispatched = false;
            context.actions.push(RiskAction::AlertRaised { score });
        }
        self.set_status(context, next);
        Transition(Self::state_for(next))
    }
}

#[state_machine(initial = "State::idle()")]
impl RiskHsm {
    #[state]
    fn idle(&mut self, context: &mut DispatchContext, event: &RiskHsmEvent) -> Outcome<State> {
        match event {
            RiskHsmEvent::Start => {
                self.last_score = RiskScore::ZERO;
                self.clear_episode();
                self.set_status(context, RiskStatus::Monitoring);
                Transition(State::monitoring())
            }
            _ => Handled,
        }
    }

    #[state(superstate = "engaged")]
    fn monitoring(&mut self, context: &mut DispatchContext, event: &RiskHsmEvent) -> Outcome<State> {
        let _ = context;
        let _ = event;
        Super
    }

    #[state(superstate = "engaged")]
    fn warning(&mut self, context: &mut DispatchContext, event: &RiskHsmEvent) -> Outcome<State> {
        let _ = context;
        let _ = event;
        Super
    }

    #[state(superstate = "engaged")]
    fn alert(&mut self, context: &mut DispatchContext, event: &RiskHsmEvent) -> Outcome<State> {
        match event {
            RiskHsmEvent::Score { score, now_ms } => {
                self.last_score = *score;
                let overdue = self.alert_since_ms.is_some_and(|since| {
                    now_ms.saturating_sub(since) >= self.config.alert_countdown_ms
                });
                if overdue {
                    self.push_dispatch(context);
                }
                Handled
            }
            RiskHsmEvent::Acknowledge => {
                self.clear_episode();
                context.actions.push(RiskAction::AlertCleared);
                let settled = match self.classify(self.last_score) {
                    RiskStatus::Alert => RiskStatus::Warning,
                    other => other,
                };
                self.set_status(context, settled);
                Transition(Self::state_for(settled))
            }
            RiskHsmEvent::Confirm => {
                self.push_dispatch(context);
                Handled
            }
            _ => Super,
        }
    }

    #[superstate]
    fn engaged(&mut self, context: &mut DispatchContext, event: &RiskHsmEvent) -> Outcome<State> {
        match event {
            RiskHsmEvent::Score { score, now_ms } => self.follow_score(context, *score, *now_ms),
            RiskHsmEvent::Start => {
                self.last_score = RiskScore::ZERO;
                self.clear_episode();
                self.set_status(context, RiskStatus::Monitoring);
                Transition(State::monitoring())
            }
            RiskHsmEvent::Stop => {
                self.last_score = RiskScore::ZERO;
                self.clear_episode();
                self.set_status(context, RiskStatus::Idle);
                Transition(State::idle())
            }
            RiskHsmEvent::Acknowledge | RiskHsmEvent::Confirm => Handled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(value: f32) -> RiskScore {
        RiskScore::new(value)
    }

    #[test]
    fn alert_is_sticky_until_acknowledged() {
        let mut engine = RiskEngine::default();
        assert_eq!(engine.status(), RiskStatus::Idle);
        assert_eq!(engine.start().status, RiskStatus::Monitoring);

        let statuses: Vec<RiskStatus> = [10.0, 50.0, 80.0, 60.0]
            .into_iter()
            .enumerate()
            .map(|(i, value)| engine.score(score(value), i as u64 * 2_000).status)
            .collect();
        assert_eq!(
            statuses,
            [
                RiskStatus::Monitoring,
                RiskStatus::Warning,
                RiskStatus::Alert,
                RiskStatus::Alert
            ]
        );

        let ack = engine.acknowledge();
        assert_eq!(ack.status, RiskStatus::Warning);
        assert!(ack.actions.iter().any(|a| *a == RiskAction::AlertCleared));

        assert_eq!(engine.score(score(20.0), 8_000).status, RiskStatus::Monitoring);
    }

    #[test]
    fn entering_alert_raises_once_per_episode() {
        let mut engine = RiskEngine::default();
        let _ = engine.start();

        let raised = engine.score(score(90.0), 0);
        assert!(raised.actions.contains_alert());
        assert!(raised.actions.iter().any(|a| *a
            == RiskAction::StatusChanged {
                from: RiskStatus::Monitoring,
                to: RiskStatus::Alert
            }));

        let repeat = engine.score(score(95.0), 2_000);
        assert!(repeat.actions.is_empty());

        let _ = engine.acknowledge();
        let again = engine.score(score(85.0), 4_000);
        assert!(again.actions.contains_alert());
    }

    #[test]
    fn acknowledging_a_high_score_settles_to_warning() {
        let mut engine = RiskEngine::default();
        let _ = engine.start();
        let _ = engine.score(score(99.0), 0);
        assert_eq!(engine.acknowledge().status, RiskStatus::Warning);
        assert_eq!(engine.score(score(99.0), 2_000).status, RiskStatus::Alert);
    }

    #[test]
    fn countdown_dispatches_exactly_once() {
        let mut engine = RiskEngine::default();
        let _ = engine.start();
        let _ = engine.score(score(80.0), 1_000);
        assert_eq!(engine.alert_remaining_ms(5_000), Some(6_000));

        let early = engine.score(score(80.0), 9_000);
        assert_eq!(early.actions.dispatch_score(), None);

        let due = engine.score(score(82.0), 11_000);
        assert_eq!(due.actions.dispatch_score(), Some(score(82.0)));
        assert_eq!(engine.alert_remaining_ms(11_000), None);

        let later = engine.score(score(82.0), 13_000);
        assert_eq!(later.actions.dispatch_score(), None);
        assert_eq!(engine.confirm().actions.dispatch_score(), None);
    }

    #[test]
    fn confirm_dispatches_immediately_only_in_alert() {
        let mut engine = RiskEngine::default();
        let _ = engine.start();
        let _ = engine.score(score(30.0), 0);
        assert!(engine.confirm().actions.is_empty());

        let _ = engine.score(score(77.0), 2_000);
        let confirmed = engine.confirm();
        assert_eq!(confirmed.actions.dispatch_score(), Some(score(77.0)));
    }

    #[test]
    fn stop_returns_to_idle_and_ignores_scores() {
        let mut engine = RiskEngine::default();
        let _ = engine.start();
        let _ = engine.score(score(90.0), 0);

        let stopped = engine.stop();
        assert_eq!(stopped.status, RiskStatus::Idle);
        assert_eq!(engine.last_score(), RiskScore::ZERO);
        assert_eq!(engine.alert_remaining_ms(1_000), None);

        let ignored = engine.score(score(90.0), 2_000);
        assert_eq!(ignored.status, RiskStatus::Idle);
        assert!(ignored.actions.is_empty());
    }

    #[test]
    fn restart_while_engaged_resets_episode() {
        let mut engine = RiskEngine::default();
        let _ = engine.start();
        let _ = engine.score(score(90.0), 0);

        let restarted = engine.start();
        assert_eq!(restarted.status, RiskStatus::Monitoring);
        assert_eq!(engine.alert_remaining_ms(0), None);
    }
}
