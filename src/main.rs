use std::{
    io::{self, BufRead, Write},
    thread,
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use embassy_executor::Executor;
use embassy_futures::block_on;
use embassy_time::{Duration, Instant};
use log::LevelFilter;
use rand::{rngs::StdRng, SeedableRng};
use static_cell::StaticCell;

use reflex::{
    assessment::{Assessor, LocalPatternAnalyzer, RuleAssessor},
    config::active_config,
    environment::{GeolocationError, SimulatedEnvironment},
    logging::HostLogger,
    monitor::{
        drive, CommandChannel, EmergencyDispatch, Monitor, MonitorCommand, MonitorListener,
        ScoringMode, TickOutcome, TickReport, TickScheduler,
    },
    telemetry::Location,
};

static COMMANDS: CommandChannel = CommandChannel::new();
static EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[derive(Debug, Parser)]
#[command(name = "reflex")]
#[command(about = "Simulated vehicle telemetry and accident-risk monitor")]
struct Cli {
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Real-time loop; reads start/stop/ack/confirm/share/quit from stdin.
    Run(TripArgs),
    /// Virtual-clock trip printing one JSON line per tick.
    Simulate(SimulateArgs),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum ModeArg {
    Local,
    External,
}

impl From<ModeArg> for ScoringMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Local => ScoringMode::Local,
            ModeArg::External => ScoringMode::External,
        }
    }
}

#[derive(Clone, Debug, Args)]
struct TripArgs {
    #[arg(long, default_value_t = 1)]
    seed: u64,
    #[arg(long, value_enum, default_value_t = ModeArg::Local)]
    mode: ModeArg,
    #[arg(long)]
    latitude: Option<f64>,
    #[arg(long)]
    longitude: Option<f64>,
    #[arg(long)]
    deny_geolocation: bool,
}

#[derive(Clone, Debug, Args)]
struct SimulateArgs {
    #[command(flatten)]
    trip: TripArgs,
    #[arg(long, default_value_t = 60)]
    ticks: u32,
    #[arg(long)]
    acknowledge_alerts: bool,
}

struct JsonLines;

impl MonitorListener for JsonLines {
    fn on_tick(&mut self, report: &TickReport) {
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(err) => log::warn!("tick report not serializable: {err}"),
        }
    }

    fn on_dispatch(&mut self, dispatch: &EmergencyDispatch) {
        let names: Vec<&str> = dispatch.contacts.iter().map(|c| c.name.as_str()).collect();
        log::error!(
            "emergency dispatch at {} ms (score {:.0}) to {}",
            dispatch.at_ms,
            dispatch.score.value(),
            names.join(", ")
        );
    }
}

fn geolocation(args: &TripArgs) -> Result<Option<Result<Location, GeolocationError>>> {
    if args.deny_geolocation {
        return Ok(Some(Err(GeolocationError::PermissionDenied)));
    }
    match (args.latitude, args.longitude) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                bail!("coordinates out of range: {lat}, {lon}");
            }
            Ok(Some(Ok(Location::new(lat, lon))))
        }
        (None, None) => Ok(None),
        _ => bail!("--latitude and --longitude must be given together"),
    }
}

fn build_monitor(args: &TripArgs, now_ms: u64) -> Result<Monitor> {
    let config = active_config();
    let mut monitor = Monitor::seeded(config, args.mode.into(), args.seed);
    if let Some(fix) = geolocation(args)? {
        monitor.set_geolocation(fix, now_ms);
    }

    let anchor = Location::new(
        config.telemetry.fallback_latitude,
        config.telemetry.fallback_longitude,
    );
    let mut environment = SimulatedEnvironment::new(StdRng::seed_from_u64(args.seed ^ 0x5eed));
    monitor.update_environment(Some(environment.snapshot(anchor)));
    monitor.subscribe(Box::new(JsonLines));
    Ok(monitor)
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let config = active_config();
    let mut monitor = build_monitor(&args.trip, 0)?;
    let assessor = RuleAssessor::new(&config.risk);
    let mut scheduler = TickScheduler::new(Duration::from_millis(config.scheduler.tick_period_ms));

    let mut now = Instant::from_millis(0);
    monitor.start(0);
    scheduler.start(now);

    let mut ticks = 0;
    while ticks < args.ticks && monitor.is_monitoring() {
        now += scheduler.period();
        if !scheduler.poll(now) {
            continue;
        }
        ticks += 1;
        let at_ms = now.as_millis();

        if let TickOutcome::Pending(ticket) = monitor.tick(at_ms)? {
            let result = block_on(assessor.assess(&ticket.request));
            let _ = monitor.complete_assessment(ticket.id, result, at_ms);
        }
        if args.acknowledge_alerts && monitor.alert_remaining_ms(at_ms).is_some() {
            monitor.acknowledge_alert(at_ms)?;
        }
    }
    if monitor.is_monitoring() {
        monitor.stop(now.as_millis())?;
    }

    let counters = monitor.counters();
    log::info!(
        "trip finished: {} ticks, {} dispatches, {} readings kept",
        counters.ticks,
        counters.dispatches,
        monitor.trip_history().len()
    );

    match block_on(monitor.analyze_trip(&LocalPatternAnalyzer)) {
        Ok(analysis) => {
            let line = serde_json::to_string(&serde_json::json!({ "analysis": analysis }))
                .context("serializing driving analysis")?;
            println!("{line}");
        }
        Err(err) => log::warn!("driving analysis skipped: {err}"),
    }
    io::stdout().flush().context("flushing stdout")?;
    Ok(())
}

fn parse_command(line: &str) -> Option<MonitorCommand> {
    match line.trim() {
        "start" => Some(MonitorCommand::Start),
        "stop" => Some(MonitorCommand::Stop),
        "ack" => Some(MonitorCommand::Acknowledge),
        "confirm" => Some(MonitorCommand::Confirm),
        "share" => Some(MonitorCommand::ToggleLocationSharing),
        "quit" | "exit" => Some(MonitorCommand::Shutdown),
        _ => None,
    }
}

fn spawn_stdin_reader() {
    thread::spawn(|| {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_command(&line) {
                Some(command) => {
                    if COMMANDS.try_send(command).is_err() {
                        log::warn!("command queue full, dropped {command:?}");
                    }
                }
                None if line.trim().is_empty() => {}
                None => log::warn!("unknown command: {}", line.trim()),
            }
        }
        let _ = COMMANDS.try_send(MonitorCommand::Shutdown);
    });
}

#[embassy_executor::task]
async fn monitor_task(args: TripArgs) {
    let config = active_config();
    let mut monitor = match build_monitor(&args, Instant::now().as_millis()) {
        Ok(monitor) => monitor,
        Err(err) => {
            log::error!("{err:#}");
            std::process::exit(2);
        }
    };
    let assessor = RuleAssessor::new(&config.risk);
    drive(&mut monitor, &assessor, &COMMANDS).await;
    std::process::exit(0);
}

fn run(args: TripArgs) -> Result<()> {
    geolocation(&args)?;
    spawn_stdin_reader();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(move |spawner| {
        spawner.must_spawn(monitor_task(args));
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    HostLogger::from_env(cli.log_level)?.install()?;

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Simulate(args) => simulate(args),
    }
}
