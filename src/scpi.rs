use crate::error::LoggerError;
use log::{debug, trace};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

/// Connection configuration for a raw SCPI socket.
///
/// All timeouts have sensible defaults but can be customized for slow
/// networks or slow-responding instruments.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Timeout for establishing the initial TCP connection
    pub connect_timeout: Duration,
    /// Timeout for reading a response line from the instrument
    pub read_timeout: Duration,
    /// Timeout for writing a command to the instrument
    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(5),
        }
    }
}

/// Builder for [`ScpiTransport`] instances.
///
/// # Examples
///
/// ```no_run
/// use scope_logger::ScpiTransport;
///
/// let dso = ScpiTransport::builder()
///     .address("192.168.0.10")
///     .port(5025)
///     .build()?;
/// # Ok::<(), scope_logger::LoggerError>(())
/// ```
#[derive(Default)]
pub struct ScpiTransportBuilder {
    address: Option<String>,
    port: Option<u16>,
    config: ConnectionConfig,
}

impl ScpiTransportBuilder {
    pub fn address(mut self, addr: &str) -> Self {
        self.address = Some(addr.to_string());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the full connection configuration
    pub fn config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Build the transport and connect
    pub fn build(self) -> Result<ScpiTransport, LoggerError> {
        let address = self
            .address
            .ok_or_else(|| LoggerError::Config("Address must be specified".to_string()))?;

        let port = self
            .port
            .ok_or_else(|| LoggerError::Config("Port must be specified".to_string()))?;

        let socket_addr: SocketAddr = format!("{address}:{port}")
            .parse()
            .map_err(|_| LoggerError::InvalidAddress(address.clone()))?;

        debug!("Connecting to SCPI socket at {socket_addr}");

        let stream = TcpStream::connect_timeout(&socket_addr, self.config.connect_timeout)
            .map_err(|e| map_io(e, format!("Failed to connect to {socket_addr}")))?;

        stream
            .set_read_timeout(Some(self.config.read_timeout))
            .map_err(|e| map_io(e, "Failed to set read timeout".to_string()))?;
        stream
            .set_write_timeout(Some(self.config.write_timeout))
            .map_err(|e| map_io(e, "Failed to set write timeout".to_string()))?;
        stream
            .set_nodelay(true)
            .map_err(|e| map_io(e, "Failed to set TCP_NODELAY".to_string()))?;

        let reader = stream
            .try_clone()
            .map_err(|e| map_io(e, "Failed to clone SCPI stream".to_string()))?;

        Ok(ScpiTransport {
            stream,
            reader: BufReader::new(reader),
            peer: socket_addr,
        })
    }
}

/// Blocking line-oriented SCPI link over a raw TCP socket.
///
/// Commands are sent newline-terminated; responses are read as a single
/// newline-terminated line. Any communication fault surfaces as an error,
/// there is no retry layer.
#[derive(Debug)]
pub struct ScpiTransport {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
    peer: SocketAddr,
}

impl ScpiTransport {
    pub fn builder() -> ScpiTransportBuilder {
        ScpiTransportBuilder::default()
    }

    /// Send a command without waiting for a response.
    pub fn write(&mut self, command: &str) -> Result<(), LoggerError> {
        trace!("-> {}: {command}", self.peer);
        self.stream
            .write_all(command.as_bytes())
            .and_then(|_| self.stream.write_all(b"\n"))
            .map_err(|e| map_io(e, format!("Failed to send '{command}' to {}", self.peer)))
    }

    /// Send a command and read one response line, with the trailing
    /// newline trimmed.
    pub fn query(&mut self, command: &str) -> Result<String, LoggerError> {
        self.write(command)?;

        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .map_err(|e| map_io(e, format!("No response to '{command}' from {}", self.peer)))?;

        if n == 0 {
            return Err(LoggerError::Protocol(format!(
                "Connection to {} closed while waiting for response to '{command}'",
                self.peer
            )));
        }

        let response = line.trim_end_matches(['\r', '\n']).to_string();
        trace!("<- {}: {response}", self.peer);
        Ok(response)
    }

    /// Shut the socket down. Safe to call on every exit path.
    pub fn close(&mut self) -> Result<(), LoggerError> {
        debug!("Closing SCPI socket to {}", self.peer);
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Already gone, nothing left to release
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(map_io(e, format!("Failed to close socket to {}", self.peer))),
        }
    }
}

fn map_io(e: std::io::Error, context: String) -> LoggerError {
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => LoggerError::Timeout,
        _ => LoggerError::Io { source: e, context },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_address_and_port() {
        assert!(matches!(
            ScpiTransport::builder().port(5025).build(),
            Err(LoggerError::Config(_))
        ));
        assert!(matches!(
            ScpiTransport::builder().address("127.0.0.1").build(),
            Err(LoggerError::Config(_))
        ));
    }

    #[test]
    fn builder_rejects_malformed_address() {
        let result = ScpiTransport::builder()
            .address("not an ip")
            .port(5025)
            .build();
        assert!(matches!(result, Err(LoggerError::InvalidAddress(_))));
    }

    #[test]
    fn timeouts_map_to_timeout_error() {
        let e = std::io::Error::new(ErrorKind::TimedOut, "timed out");
        assert!(matches!(map_io(e, String::new()), LoggerError::Timeout));
        let e = std::io::Error::new(ErrorKind::WouldBlock, "would block");
        assert!(matches!(map_io(e, String::new()), LoggerError::Timeout));
        let e = std::io::Error::new(ErrorKind::BrokenPipe, "broken");
        assert!(matches!(map_io(e, String::new()), LoggerError::Io { .. }));
    }

    #[test]
    fn query_round_trip_over_loopback() {
        use std::io::{BufRead, BufReader, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            assert_eq!(line, "*IDN?\n");
            let mut stream = stream;
            stream.write_all(b"Siglent,SDS1104X-U,123,1.0\n").unwrap();
        });

        let mut transport = ScpiTransport::builder()
            .address(&addr.ip().to_string())
            .port(addr.port())
            .build()
            .unwrap();

        let idn = transport.query("*IDN?").unwrap();
        assert_eq!(idn, "Siglent,SDS1104X-U,123,1.0");

        transport.close().unwrap();
        server.join().unwrap();
    }
}
