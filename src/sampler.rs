use crate::error::LoggerError;
use crate::ramp::RampController;
use crate::session::InstrumentSession;
use crate::types::{AwgChannel, RunOutcome, ScopeChannel};
use chrono::{DateTime, Local};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Parameters of one sampling run, fixed at startup.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Pause between samples. Not drift-compensated: time spent measuring
    /// and settling accumulates on top of it.
    pub interval: Duration,
    /// Number of samples to take, 0 for unlimited.
    pub limit: usize,
    /// AWG output to ramp, `None` for no ramp.
    pub ramp_channel: Option<AwgChannel>,
    /// Ramp minimum DC voltage.
    pub vmin: f64,
    /// Ramp maximum DC voltage.
    pub vmax: f64,
    /// Scope channels to log, in column order.
    pub channels: Vec<ScopeChannel>,
}

impl RunConfig {
    fn validate(&self) -> Result<(), LoggerError> {
        if self.channels.is_empty() {
            return Err(LoggerError::Config(
                "At least one scope channel must be selected".to_string(),
            ));
        }
        Ok(())
    }
}

/// The accumulated samples of one run.
///
/// `readings` holds one vector per configured channel; index `i` of every
/// inner vector belongs to the same sample as `timestamps[i]` and
/// `elapsed[i]`.
#[derive(Debug, Clone)]
pub struct SampleLog {
    pub channels: Vec<ScopeChannel>,
    pub timestamps: Vec<DateTime<Local>>,
    pub elapsed: Vec<f64>,
    pub readings: Vec<Vec<f64>>,
    pub outcome: RunOutcome,
}

impl SampleLog {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Run the sampling loop until the sample limit is reached or the shutdown
/// flag is raised.
///
/// Each iteration applies the next ramp offset (when ramping is active),
/// timestamps the sample, reads every configured channel at the trigger
/// point and prints one progress line. Any instrument-communication failure
/// aborts the run immediately; nothing is persisted here, the caller feeds
/// the returned log to the CSV/plot sinks afterwards.
///
/// The shutdown flag is honored only at the top of an iteration, never
/// mid-measurement.
pub fn run_sampling<S: InstrumentSession + ?Sized>(
    session: &mut S,
    config: &RunConfig,
    shutdown: &AtomicBool,
) -> Result<SampleLog, LoggerError> {
    config.validate()?;

    // Informational roll-mode expectation check, mismatch never aborts.
    if config.ramp_channel.is_none() {
        if !session.is_roll_mode_active()? {
            warn!("Scope roll mode not enabled");
        }
    } else if config.limit != 0 && session.is_roll_mode_active()? {
        warn!("Scope roll mode enabled");
    }

    let mut ramp = config
        .ramp_channel
        .and_then(|ch| RampController::new(ch, config.vmin, config.vmax, config.limit));

    if let Some(ramp) = &ramp {
        ramp.arm(session)?;
    }

    print!("                 Timestamp,      [s]");
    for channel in &config.channels {
        print!(",{:>9}", channel.label());
    }
    println!();

    let mut timestamps: Vec<DateTime<Local>> = Vec::new();
    let mut elapsed: Vec<f64> = Vec::new();
    let mut readings: Vec<Vec<f64>> = vec![Vec::new(); config.channels.len()];
    let mut start: Option<DateTime<Local>> = None;
    let mut taken = 0usize;

    let outcome = loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Shutdown requested, stopping after {taken} samples");
            break RunOutcome::Interrupted;
        }

        if let Some(ramp) = ramp.as_mut() {
            ramp.apply_next(session)?;
        }

        let now = Local::now();
        let start = *start.get_or_insert(now);
        let delta = now - start;
        let seconds = delta
            .num_microseconds()
            .map(|us| us as f64 / 1e6)
            .unwrap_or_else(|| delta.num_milliseconds() as f64 / 1e3);
        timestamps.push(now);
        elapsed.push(seconds);
        print!("{},{:9.3}", now.format("%Y-%m-%d %H:%M:%S%.6f"), seconds);

        for (idx, channel) in config.channels.iter().enumerate() {
            let volts = session.measure_triggered_voltage(*channel)?;
            readings[idx].push(volts);
            print!(",{volts:9.5}");
        }
        println!();

        taken += 1;
        if config.limit > 0 && taken >= config.limit {
            break RunOutcome::Completed;
        }

        std::thread::sleep(config.interval);
    };

    Ok(SampleLog {
        channels: config.channels.clone(),
        timestamps,
        elapsed,
        readings,
        outcome,
    })
}
