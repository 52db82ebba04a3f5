use crate::error::LoggerError;
use crate::session::InstrumentSession;
use crate::types::{Instrument, ScopeChannel};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Scripted instrument session recording all traffic, for driving the
/// sampling loop without hardware.
pub struct MockSession {
    responses: HashMap<String, String>,
    pub writes: Vec<(Instrument, String)>,
    pub queries: Vec<(Instrument, String)>,
    pub settles: usize,
    pub closed: bool,
    measurements: usize,
    fail_measurement_at: Option<usize>,
    raise_shutdown_after: Option<(usize, Arc<AtomicBool>)>,
}

impl MockSession {
    pub fn new() -> Self {
        let mut responses = HashMap::new();
        responses.insert("SAST?".to_string(), "SAST Roll".to_string());
        responses.insert("*OPC?".to_string(), "1".to_string());

        Self {
            responses,
            writes: Vec::new(),
            queries: Vec::new(),
            settles: 0,
            closed: false,
            measurements: 0,
            fail_measurement_at: None,
            raise_shutdown_after: None,
        }
    }

    pub fn set_response(&mut self, command: &str, response: &str) {
        self.responses
            .insert(command.to_string(), response.to_string());
    }

    /// Make every level measurement of `channel` return `volts`.
    pub fn set_voltage(&mut self, channel: ScopeChannel, volts: f64) {
        let name = channel.scpi_name();
        self.responses.insert(
            format!("{name}:PAVA? LEVL"),
            format!("{name}:PAVA LEVL,{volts:.5E}V"),
        );
    }

    /// Fail the measurement with the given zero-based ordinal.
    pub fn fail_measurement_at(&mut self, index: usize) {
        self.fail_measurement_at = Some(index);
    }

    /// Raise `flag` once the given number of measurements has completed.
    pub fn raise_shutdown_after(&mut self, measurements: usize, flag: Arc<AtomicBool>) {
        self.raise_shutdown_after = Some((measurements, flag));
    }

    /// The offsets of all `BSWV OFST` writes sent to the AWG, in order.
    pub fn awg_offset_writes(&self) -> Vec<f64> {
        self.writes
            .iter()
            .filter(|(instrument, command)| {
                *instrument == Instrument::Awg && command.contains("BSWV OFST,")
            })
            .filter_map(|(_, command)| command.rsplit(',').next()?.parse().ok())
            .collect()
    }
}

impl InstrumentSession for MockSession {
    fn query(&mut self, instrument: Instrument, command: &str) -> Result<String, LoggerError> {
        self.queries.push((instrument, command.to_string()));

        if command.contains("PAVA") {
            let index = self.measurements;
            self.measurements += 1;

            if self.fail_measurement_at == Some(index) {
                return Err(LoggerError::Timeout);
            }

            if let Some((after, flag)) = &self.raise_shutdown_after {
                if self.measurements >= *after {
                    flag.store(true, Ordering::Relaxed);
                }
            }
        }

        self.responses.get(command).cloned().ok_or_else(|| {
            LoggerError::Protocol(format!("no scripted response for '{command}'"))
        })
    }

    fn write(&mut self, instrument: Instrument, command: &str) -> Result<(), LoggerError> {
        self.writes.push((instrument, command.to_string()));
        Ok(())
    }

    // No hardware to wait for, just record the call.
    fn settle(&mut self) -> Result<(), LoggerError> {
        self.settles += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), LoggerError> {
        self.closed = true;
        Ok(())
    }
}
