use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("IO error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("Instrument timeout")]
    Timeout,
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
