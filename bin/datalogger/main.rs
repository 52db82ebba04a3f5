use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use scope_logger::{
    AwgChannel, ConnectionConfig, InstrumentSession, LoggerError, OUTPUT_FILE, RunConfig,
    RunOutcome, SampleLog, ScopeChannel, SiglentSession, load_config_or_default, plot_time_series,
    run_sampling, write_csv,
};
use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

/// Oscilloscope Data Logger
#[derive(Parser, Debug)]
#[command(name = "datalogger")]
#[command(
    about = "Log triggered voltage of active scope channels at a fixed interval, \
             optionally ramping the AWG DC offset between samples",
    long_about = None
)]
struct Args {
    /// Sample interval in seconds
    #[arg(short = 'i', long = "interval", value_name = "SECONDS", default_value_t = 1.0)]
    interval: f64,

    /// Maximum number of samples (0 = unlimited)
    #[arg(short = 'n', long = "limit", value_name = "COUNT", default_value_t = 0)]
    limit: usize,

    /// Plot samples after the run
    #[arg(short = 'p', long = "plot")]
    plot: bool,

    /// AWG output channel for the DC ramp (1 or 2, 0 = off)
    #[arg(
        long = "awg",
        value_name = "CHANNEL",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=2)
    )]
    awg: u8,

    /// AWG minimum DC voltage
    #[arg(long = "vmin", value_name = "VOLTS", default_value_t = 0, allow_hyphen_values = true)]
    vmin: i32,

    /// AWG maximum DC voltage
    #[arg(long = "vmax", value_name = "VOLTS", default_value_t = 1, allow_hyphen_values = true)]
    vmax: i32,

    /// Scope channels to log (e.g. CH1 CH2); defaults to the active channels
    #[arg(long = "ch", value_name = "CHANNEL", num_args = 1..)]
    channels: Option<Vec<String>>,

    /// Path to configuration file
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config_or_default(args.config.as_deref());

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.log_level.clone());
    env_logger::Builder::from_env(Env::default().default_filter_or(&log_level)).init();

    // Configuration errors surface before any instrument is touched.
    if args.interval <= 0.0 {
        return Err(
            LoggerError::Config(format!("Sample interval must be > 0, got {}", args.interval))
                .into(),
        );
    }
    let explicit_channels = parse_channels(&args)?;

    info!(
        "DSO at {}:{}, AWG at {}:{}",
        config.dso.host, config.dso.port, config.awg.host, config.awg.port
    );

    let shutdown = setup_shutdown_handler()?;
    let mut session = SiglentSession::connect(&config.dso, &config.awg, ConnectionConfig::default())?;

    let result = execute(&mut session, &args, explicit_channels, &shutdown);

    // The session is released on every exit path; a close failure must not
    // mask a run failure.
    if let Err(e) = session.close() {
        warn!("Failed to close instrument session: {e}");
    }

    let log = result?;
    report_outcome(&log);

    write_csv(Path::new(OUTPUT_FILE), &log)?;

    if args.plot {
        plot_time_series(&log, None, None)?;
    }

    Ok(())
}

/// Resolve the channel set and drive the sampling loop.
fn execute<S: InstrumentSession>(
    session: &mut S,
    args: &Args,
    explicit_channels: Option<Vec<ScopeChannel>>,
    shutdown: &AtomicBool,
) -> Result<SampleLog, LoggerError> {
    let channels = match explicit_channels {
        Some(channels) => channels,
        None => session.list_active_channels()?,
    };
    if channels.is_empty() {
        return Err(LoggerError::Config(
            "No scope channels active and none specified with --ch".to_string(),
        ));
    }

    let run_config = RunConfig {
        interval: Duration::from_secs_f64(args.interval),
        limit: args.limit,
        ramp_channel: AwgChannel::from_selector(args.awg)?,
        vmin: args.vmin as f64,
        vmax: args.vmax as f64,
        channels,
    };

    run_sampling(session, &run_config, shutdown)
}

/// Validate the `--ch` list up front, before connecting.
fn parse_channels(args: &Args) -> Result<Option<Vec<ScopeChannel>>, LoggerError> {
    args.channels
        .as_ref()
        .map(|names| names.iter().map(|name| name.parse()).collect())
        .transpose()
}

fn report_outcome(log: &SampleLog) {
    match log.outcome {
        RunOutcome::Completed => info!("Run complete: {} samples", log.len()),
        RunOutcome::Interrupted => info!("Run interrupted after {} samples", log.len()),
    }
}

/// Raise the shutdown flag on Ctrl-C; the loop stops at the next iteration
/// boundary, never mid-measurement.
fn setup_shutdown_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received, stopping after the current sample");
        handler_flag.store(true, Ordering::Relaxed);
    })?;
    Ok(flag)
}
