use core::{future::pending, pin::pin};

use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::{Duration, Instant, Timer};
use rand::RngCore;

use super::{Monitor, TickOutcome, TickScheduler};
use crate::assessment::Assessor;

pub const COMMAND_QUEUE_LEN: usize = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MonitorCommand {
    Start,
    Stop,
    Acknowledge,
    Confirm,
    ToggleLocationSharing,
    Shutdown,
}

pub type CommandChannel = Channel<CriticalSectionRawMutex, MonitorCommand, COMMAND_QUEUE_LEN>;

enum Flow {
    Continue,
    Exit,
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

fn apply_command<R: RngCore>(
    monitor: &mut Monitor<R>,
    scheduler: &mut TickScheduler,
    command: MonitorCommand,
) -> Flow {
    let now = Instant::now();
    let at_ms = now.as_millis();
    log::debug!("command {command:?}");
    let result = match command {
        MonitorCommand::Start => {
            monitor.start(at_ms);
            scheduler.start(now);
            Ok(())
        }
        MonitorCommand::Stop => monitor.stop(at_ms),
        MonitorCommand::Acknowledge => monitor.acknowledge_alert(at_ms).map(|_| ()),
        MonitorCommand::Confirm => monitor.confirm_alert(at_ms).map(|_| ()),
        MonitorCommand::ToggleLocationSharing => monitor.toggle_location_sharing(at_ms).map(|_| ()),
        MonitorCommand::Shutdown => {
            if monitor.is_monitoring() {
                let _ = monitor.stop(at_ms);
            }
            return Flow::Exit;
        }
    };
    if let Err(err) = result {
        log::warn!("{command:?} ignored: {err}");
    }
    if !monitor.is_monitoring() {
        scheduler.stop();
    }
    Flow::Continue
}

/// Runs one tick. An external assessment is awaited inline while commands
/// keep flowing; a restart or shutdown drops the pending future.
async fn run_tick<R: RngCore, A: Assessor>(
    monitor: &mut Monitor<R>,
    scheduler: &mut TickScheduler,
    assessor: &A,
    commands: &CommandChannel,
) -> Flow {
    let ticket = match monitor.tick(now_ms()) {
        Ok(TickOutcome::Pending(ticket)) => ticket,
        Ok(_) => return Flow::Continue,
        Err(err) => {
            log::warn!("tick skipped: {err}");
            return Flow::Continue;
        }
    };

    let mut assessment = pin!(assessor.assess(&ticket.request));
    loop {
        match select(assessment.as_mut(), commands.receive()).await {
            Either::First(result) => {
                let _ = monitor.complete_assessment(ticket.id, result, now_ms());
                return Flow::Continue;
            }
            Either::Second(command) => match apply_command(monitor, scheduler, command) {
                Flow::Continue if monitor.in_flight() == Some(ticket.id) => {}
                flow => return flow,
            },
        }
    }
}

/// Drives a monitor until `Shutdown`. Ticks are serialized: the timer is not
/// polled again until the previous tick, including its assessment, finished.
pub async fn drive<R: RngCore, A: Assessor>(
    monitor: &mut Monitor<R>,
    assessor: &A,
    commands: &CommandChannel,
) {
    let period = Duration::from_millis(monitor.config().scheduler.tick_period_ms);
    let mut scheduler = TickScheduler::new(period);
    log::info!("monitor runtime up, tick period {} ms", period.as_millis());

    loop {
        let due = scheduler.next_due();
        let wait = async move {
            match due {
                Some(at) => Timer::at(at).await,
                None => pending::<()>().await,
            }
        };

        let flow = match select(wait, commands.receive()).await {
            Either::First(()) => {
                if scheduler.poll(Instant::now()) {
                    run_tick(monitor, &mut scheduler, assessor, commands).await
                } else {
                    Flow::Continue
                }
            }
            Either::Second(command) => apply_command(monitor, &mut scheduler, command),
        };

        if let Flow::Exit = flow {
            break;
        }
        if !monitor.is_monitoring() {
            scheduler.stop();
        }
    }
    log::info!("monitor runtime down");
}
