use embassy_futures::block_on;
use reflex::{
    assessment::{Assessment, AssessmentError, Assessor, RuleAssessor},
    config::{active_config, LIVE_HISTORY_LEN, TRIP_HISTORY_LEN},
    monitor::{Monitor, MonitorError, ScoringMode, TickOutcome},
    risk::{detect, score_reading, RiskScore, RiskStatus, ASSESSMENT_UNAVAILABLE},
    telemetry::{Location, ReadingGenerator, Traffic, TripSimulator},
};
use rand::{rngs::StdRng, SeedableRng};

fn scripted(monitor: &mut Monitor, now_ms: u64, score: f32) -> RiskStatus {
    let ticket = match monitor.tick(now_ms) {
        Ok(TickOutcome::Pending(ticket)) => ticket,
        other => panic!("expected assessment ticket, got {other:?}"),
    };
    let result = Ok(Assessment {
        score: RiskScore::new(score),
        explanation: format!("scripted {score}"),
    });
    monitor
        .complete_assessment(ticket.id, result, now_ms)
        .map(|report| report.state.status)
        .unwrap_or_else(|| panic!("ticket {:?} was stale", ticket.id))
}

#[test]
fn score_stays_bounded_over_long_local_trips() {
    for seed in 0..10 {
        let mut monitor = Monitor::seeded(active_config(), ScoringMode::Local, seed);
        monitor.start(0);
        for tick in 1..=500u64 {
            let now = tick * 2_000;
            if !monitor.is_monitoring() {
                monitor.start(now);
                continue;
            }
            let _ = monitor.tick(now);
            let score = monitor.state().score.value();
            assert!((0.0..=100.0).contains(&score), "seed {seed} tick {tick}: {score}");
            assert!(monitor.trip_history().len() <= TRIP_HISTORY_LEN);
            assert!(monitor.live_window().len() <= LIVE_HISTORY_LEN);
        }
    }
}

#[test]
fn bursts_never_run_longer_than_two_ticks() {
    for seed in 0..100 {
        let mut sim = TripSimulator::seeded(active_config(), seed);
        let mut run = 0;
        for tick in 0..300u64 {
            if sim.next(tick * 2_000, None).is_burst() {
                run += 1;
                assert!(run <= 2, "seed {seed}");
            } else {
                run = 0;
            }
        }
    }
}

#[test]
fn first_reading_uses_fallback_location() {
    let generator = ReadingGenerator::new(&active_config().telemetry);
    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let first = generator.next(&mut rng, None, 0);
        assert!((0.0..60.0).contains(&first.speed_kmh));
        assert_eq!(first.location, Location::new(28.6139, 77.2090));
    }
}

#[test]
fn quiet_ticks_decay_by_fixed_step_above_floor() {
    let cfg = &active_config().risk;
    let mut sim = TripSimulator::seeded(active_config(), 77);
    let mut checked = 0;
    for tick in 0..400u64 {
        let mut reading = sim.next(tick * 2_000, None);
        reading.context.traffic = Traffic::Light;
        if detect(&reading, cfg).mask != 0 {
            continue;
        }
        let previous = RiskScore::new(60.0);
        let next = score_reading(&reading, previous, cfg).score;
        assert_eq!(next.value(), previous.value() - cfg.decay_step);
        checked += 1;
    }
    assert!(checked > 0);
}

#[test]
fn failed_assessment_reports_sentinel() {
    struct Down;

    impl Assessor for Down {
        async fn assess(
            &self,
            _request: &reflex::assessment::AssessmentRequest,
        ) -> Result<Assessment, AssessmentError> {
            Err(AssessmentError::Malformed("missing riskScore".into()))
        }
    }

    let mut monitor = Monitor::seeded(active_config(), ScoringMode::External, 21);
    monitor.start(0);
    let Ok(TickOutcome::Pending(ticket)) = monitor.tick(2_000) else {
        panic!("external tick must hand out a ticket");
    };
    let result = block_on(Down.assess(&ticket.request));
    let report = monitor.complete_assessment(ticket.id, result, 2_050);

    let Some(report) = report else {
        panic!("fresh ticket must apply");
    };
    assert_eq!(report.state.score, RiskScore::ZERO);
    assert_eq!(report.state.explanation, ASSESSMENT_UNAVAILABLE);
    assert!(monitor.is_monitoring());
}

#[test]
fn alert_is_sticky_until_acknowledged() {
    let mut monitor = Monitor::seeded(active_config(), ScoringMode::External, 31);
    monitor.start(0);

    let statuses: Vec<RiskStatus> = [10.0, 50.0, 80.0, 60.0]
        .into_iter()
        .zip(1u64..)
        .map(|(score, tick)| scripted(&mut monitor, tick * 2_000, score))
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

    assert_eq!(monitor.acknowledge_alert(8_500), Ok(RiskStatus::Warning));
    assert_eq!(scripted(&mut monitor, 10_000, 60.0), RiskStatus::Warning);
    assert_eq!(scripted(&mut monitor, 12_000, 30.0), RiskStatus::Monitoring);
}

#[test]
fn rule_assessor_drives_external_mode_like_local_rules() {
    let config = active_config();
    let assessor = RuleAssessor::new(&config.risk);
    let mut external = Monitor::seeded(config, ScoringMode::External, 41);
    let mut local = Monitor::seeded(config, ScoringMode::Local, 41);
    external.start(0);
    local.start(0);

    for tick in 1..=30u64 {
        let now = tick * 2_000;
        if !local.is_monitoring() {
            break;
        }
        let _ = local.tick(now);
        if let Ok(TickOutcome::Pending(ticket)) = external.tick(now) {
            let result = block_on(assessor.assess(&ticket.request));
            let _ = external.complete_assessment(ticket.id, result, now);
        }
        assert_eq!(external.state(), local.state(), "tick {tick}");
    }
}

#[test]
fn restart_clears_history_and_analysis_waits_for_stop() {
    let mut monitor = Monitor::seeded(active_config(), ScoringMode::Local, 51);
    monitor.start(0);
    for tick in 1..=15u64 {
        let _ = monitor.tick(tick * 2_000);
    }
    if monitor.is_monitoring() {
        assert_eq!(monitor.trip_for_analysis(), Err(MonitorError::TripActive));
    }

    monitor.start(40_000);
    assert!(monitor.trip_history().is_empty());
    assert!(monitor.live_window().is_empty());
    assert_eq!(monitor.state().score, RiskScore::ZERO);
}
