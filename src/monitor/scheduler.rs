use embassy_time::{Duration, Instant};

/// Periodic deadline tracker. It never sleeps; callers poll it with whatever
/// clock they run on, so a virtual clock works the same as wall time.
#[derive(Clone, Copy, Debug)]
pub struct TickScheduler {
    period: Duration,
    next_due: Option<Instant>,
}

impl TickScheduler {
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub const fn period(&self) -> Duration {
        self.period
    }

    pub const fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub const fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// First tick fires one period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn reset(&mut self, now: Instant) {
        self.start(now);
    }

    /// Returns true when a tick is due. Polling a full period late or more
    /// yields a single tick and re-phases on `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }
        self.next_due = Some(if now - due >= self.period {
            now + self.period
        } else {
            due + self.period
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn fires_once_per_period() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(2_000));
        assert!(!scheduler.poll(at(0)));

        scheduler.start(at(0));
        assert!(!scheduler.poll(at(1_999)));
        assert!(scheduler.poll(at(2_000)));
        assert!(!scheduler.poll(at(2_001)));
        assert!(scheduler.poll(at(4_100)));
        assert_eq!(scheduler.next_due(), Some(at(6_000)));
    }

    #[test]
    fn late_poll_coalesces_missed_ticks() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(2_000));
        scheduler.start(at(0));

        assert!(scheduler.poll(at(9_000)));
        assert!(!scheduler.poll(at(9_500)));
        assert_eq!(scheduler.next_due(), Some(at(11_000)));
    }

    #[test]
    fn stop_cancels_and_reset_rephases() {
        let mut scheduler = TickScheduler::new(Duration::from_millis(1_500));
        scheduler.start(at(0));
        scheduler.stop();
        assert!(!scheduler.is_running());
        assert!(!scheduler.poll(at(10_000)));

        scheduler.reset(at(10_000));
        assert!(!scheduler.poll(at(11_000)));
        assert!(scheduler.poll(at(11_500)));
    }
}
