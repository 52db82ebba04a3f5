use crate::config::EndpointConfig;
use crate::error::LoggerError;
use crate::scpi::{ConnectionConfig, ScpiTransport};
use crate::types::{Instrument, ScopeChannel};
use log::{debug, info};
use std::time::Duration;

/// Minimum hardware settling delay between an AWG offset change and the
/// next measurement, on top of the `*OPC?` completion polls.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Synchronous command/response access to the two instruments of a run.
///
/// The sampling loop is generic over this trait so it can be driven against
/// recorded mocks in tests. All operations block until the instrument
/// responds and raise on any communication failure.
pub trait InstrumentSession {
    /// Send a command and read its response line.
    fn query(&mut self, instrument: Instrument, command: &str) -> Result<String, LoggerError>;

    /// Send a command without reading a response.
    fn write(&mut self, instrument: Instrument, command: &str) -> Result<(), LoggerError>;

    /// Whether the scope is currently in roll (continuous) acquisition mode.
    fn is_roll_mode_active(&mut self) -> Result<bool, LoggerError> {
        let status = self.query(Instrument::Dso, "SAST?")?;
        Ok(status.trim() == "SAST Roll")
    }

    /// The scope channels whose trace is currently enabled, in C1..C4 order.
    fn list_active_channels(&mut self) -> Result<Vec<ScopeChannel>, LoggerError> {
        let mut active = Vec::new();
        for channel in ScopeChannel::ALL {
            let response = self.query(Instrument::Dso, &format!("{}:TRA?", channel.scpi_name()))?;
            if response.split_whitespace().last() == Some("ON") {
                active.push(channel);
            }
        }
        Ok(active)
    }

    /// Voltage level of the given channel at the trigger point, in volts.
    fn measure_triggered_voltage(&mut self, channel: ScopeChannel) -> Result<f64, LoggerError> {
        let response = self.query(
            Instrument::Dso,
            &format!("{}:PAVA? LEVL", channel.scpi_name()),
        )?;
        parse_level(&response)
    }

    /// Block until both instruments report operation-complete, with a fixed
    /// minimum delay for hardware settling.
    fn settle(&mut self) -> Result<(), LoggerError> {
        std::thread::sleep(SETTLE_DELAY);
        self.query(Instrument::Awg, "*OPC?")?;
        self.query(Instrument::Dso, "*OPC?")?;
        Ok(())
    }

    /// Release the instrument link. Must be called on every exit path.
    fn close(&mut self) -> Result<(), LoggerError>;
}

/// Parse the value out of a `PAVA` response like `C1:PAVA LEVL,3.25E-01V`.
///
/// The scope reports `****` when the parameter cannot be measured; that is a
/// protocol error here, never a NaN reading.
fn parse_level(response: &str) -> Result<f64, LoggerError> {
    let payload = response
        .rsplit(',')
        .next()
        .ok_or_else(|| LoggerError::Protocol(format!("Malformed PAVA response: '{response}'")))?;

    payload
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .parse::<f64>()
        .map_err(|_| LoggerError::Protocol(format!("Unreadable voltage in '{response}'")))
}

/// Instrument session for a Siglent SDS1104X-U scope and SDG1032X generator,
/// each reached over its own raw SCPI socket.
pub struct SiglentSession {
    dso: ScpiTransport,
    awg: ScpiTransport,
}

impl SiglentSession {
    /// Connect to both instruments and log their identification strings.
    pub fn connect(
        dso: &EndpointConfig,
        awg: &EndpointConfig,
        config: ConnectionConfig,
    ) -> Result<Self, LoggerError> {
        let mut dso = ScpiTransport::builder()
            .address(&dso.host)
            .port(dso.port)
            .config(config.clone())
            .build()?;
        let mut awg = ScpiTransport::builder()
            .address(&awg.host)
            .port(awg.port)
            .config(config)
            .build()?;

        info!("DSO: {}", dso.query("*IDN?")?);
        info!("AWG: {}", awg.query("*IDN?")?);

        Ok(Self { dso, awg })
    }

    fn transport(&mut self, instrument: Instrument) -> &mut ScpiTransport {
        match instrument {
            Instrument::Dso => &mut self.dso,
            Instrument::Awg => &mut self.awg,
        }
    }
}

impl InstrumentSession for SiglentSession {
    fn query(&mut self, instrument: Instrument, command: &str) -> Result<String, LoggerError> {
        self.transport(instrument).query(command)
    }

    fn write(&mut self, instrument: Instrument, command: &str) -> Result<(), LoggerError> {
        self.transport(instrument).write(command)
    }

    fn close(&mut self) -> Result<(), LoggerError> {
        debug!("Closing instrument session");
        let dso_result = self.dso.close();
        let awg_result = self.awg.close();
        dso_result?;
        awg_result
    }
}
