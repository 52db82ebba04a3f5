pub mod config;
pub mod error;
pub mod output;
pub mod plotting;
pub mod ramp;
pub mod sampler;
pub mod scpi;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use self::config::{AppConfig, EndpointConfig, load_config, load_config_or_default};
pub use error::LoggerError;
pub use output::{OUTPUT_FILE, write_csv};
pub use plotting::plot_time_series;
pub use ramp::RampController;
pub use sampler::{RunConfig, SampleLog, run_sampling};
pub use scpi::{ConnectionConfig, ScpiTransport, ScpiTransportBuilder};
pub use session::{InstrumentSession, SETTLE_DELAY, SiglentSession};
pub use types::{AwgChannel, Instrument, RunOutcome, ScopeChannel};
