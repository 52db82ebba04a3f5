use crate::error::LoggerError;
use crate::session::InstrumentSession;
use crate::types::{AwgChannel, Instrument};
use log::{debug, info};

/// Linear DC-offset sweep programmed onto the AWG across a run.
///
/// Enabled only when an output channel is selected and the run has a known
/// sample count: an unlimited run silently disables the ramp, since the step
/// size requires the count. For a single-sample run no step is defined and
/// only the initial `vmin` programming applies.
#[derive(Debug)]
pub struct RampController {
    channel: AwgChannel,
    vmin: f64,
    step: Option<f64>,
    offset: f64,
}

impl RampController {
    pub fn new(channel: AwgChannel, vmin: f64, vmax: f64, sample_limit: usize) -> Option<Self> {
        if sample_limit == 0 {
            debug!("Unlimited run requested, disabling AWG ramp");
            return None;
        }

        let step = if sample_limit >= 2 {
            Some((vmax - vmin) / (sample_limit - 1) as f64)
        } else {
            None
        };

        Some(Self {
            channel,
            vmin,
            step,
            offset: vmin,
        })
    }

    /// The per-sample offset increment, when one is defined.
    pub fn step(&self) -> Option<f64> {
        self.step
    }

    /// Program the AWG into fixed DC, high-impedance output mode with the
    /// starting offset and enable the output.
    ///
    /// The output stays enabled for the whole run; the generator's prior
    /// state is not restored on exit (documented limitation).
    pub fn arm<S: InstrumentSession + ?Sized>(&self, session: &mut S) -> Result<(), LoggerError> {
        let ch = self.channel.scpi_name();
        info!("Arming AWG {ch}: DC output, HiZ, starting at {} V", self.vmin);
        session.write(Instrument::Awg, &format!("{ch}:OUTP LOAD,HZ,PLRT,NOR"))?;
        session.write(Instrument::Awg, &format!("{ch}:BSWV WVTP,DC"))?;
        session.write(Instrument::Awg, &format!("{ch}:BSWV OFST,{}", self.vmin))?;
        session.write(Instrument::Awg, &format!("{ch}:OUTP ON"))?;
        Ok(())
    }

    /// Write the offset for the upcoming sample, advance by one step and
    /// wait for both instruments to settle.
    ///
    /// Returns whether an offset write happened; inert when no nonzero step
    /// is defined.
    pub fn apply_next<S: InstrumentSession + ?Sized>(
        &mut self,
        session: &mut S,
    ) -> Result<bool, LoggerError> {
        let step = match self.step {
            Some(step) if step != 0.0 => step,
            _ => return Ok(false),
        };

        session.write(
            Instrument::Awg,
            &format!("{}:BSWV OFST,{}", self.channel.scpi_name(), self.offset),
        )?;
        self.offset += step;
        session.settle()?;
        Ok(true)
    }
}
