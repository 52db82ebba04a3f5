use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LoggerError;

/// One oscilloscope input channel.
///
/// Displayed as `CH1`..`CH4` (the labels users pass on the command line and
/// the column names in the CSV output), addressed on the wire as `C1`..`C4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeChannel {
    Ch1,
    Ch2,
    Ch3,
    Ch4,
}

impl ScopeChannel {
    pub const ALL: [ScopeChannel; 4] = [
        ScopeChannel::Ch1,
        ScopeChannel::Ch2,
        ScopeChannel::Ch3,
        ScopeChannel::Ch4,
    ];

    /// The SCPI name of this channel, e.g. `C1`.
    pub fn scpi_name(&self) -> &'static str {
        match self {
            ScopeChannel::Ch1 => "C1",
            ScopeChannel::Ch2 => "C2",
            ScopeChannel::Ch3 => "C3",
            ScopeChannel::Ch4 => "C4",
        }
    }

    /// The user-facing label of this channel, e.g. `CH1`.
    pub fn label(&self) -> &'static str {
        match self {
            ScopeChannel::Ch1 => "CH1",
            ScopeChannel::Ch2 => "CH2",
            ScopeChannel::Ch3 => "CH3",
            ScopeChannel::Ch4 => "CH4",
        }
    }
}

impl fmt::Display for ScopeChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ScopeChannel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CH1" | "C1" => Ok(ScopeChannel::Ch1),
            "CH2" | "C2" => Ok(ScopeChannel::Ch2),
            "CH3" | "C3" => Ok(ScopeChannel::Ch3),
            "CH4" | "C4" => Ok(ScopeChannel::Ch4),
            _ => Err(LoggerError::InvalidChannel(s.to_string())),
        }
    }
}

/// One of the two AWG output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AwgChannel {
    C1,
    C2,
}

impl AwgChannel {
    /// The SCPI prefix of this output, e.g. `C1`.
    pub fn scpi_name(&self) -> &'static str {
        match self {
            AwgChannel::C1 => "C1",
            AwgChannel::C2 => "C2",
        }
    }

    /// Map the CLI selector to an output channel. 0 means "ramp off".
    pub fn from_selector(selector: u8) -> Result<Option<Self>, LoggerError> {
        match selector {
            0 => Ok(None),
            1 => Ok(Some(AwgChannel::C1)),
            2 => Ok(Some(AwgChannel::C2)),
            n => Err(LoggerError::Config(format!(
                "AWG channel selector must be 0, 1 or 2, got {n}"
            ))),
        }
    }
}

impl fmt::Display for AwgChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scpi_name())
    }
}

/// Which instrument a raw SCPI command is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instrument {
    Dso,
    Awg,
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Dso => f.write_str("DSO"),
            Instrument::Awg => f.write_str("AWG"),
        }
    }
}

/// How a sampling run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The configured sample limit was reached.
    Completed,
    /// The shutdown flag was raised between iterations.
    Interrupted,
}
