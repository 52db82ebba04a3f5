use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Static application configuration: where the instruments live and how
/// chatty the log is. Run parameters come from the command line instead.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub dso: EndpointConfig,
    pub awg: EndpointConfig,
    pub logging: LoggingConfig,
}

/// One instrument's SCPI socket endpoint.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dso: EndpointConfig {
                host: "127.0.0.1".to_string(),
                port: 5025,
            },
            awg: EndpointConfig {
                host: "127.0.0.1".to_string(),
                port: 5026,
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Load configuration from file with layered fallbacks
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(File::from(path));
        } else {
            return Err(ConfigError::Message(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    } else {
        // Try common config file locations
        let possible_paths = ["datalogger.toml", "config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
                break;
            }
        }
    }

    // Add environment variable overrides with prefix "DATALOGGER_"
    builder = builder.add_source(
        Environment::with_prefix("DATALOGGER")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize::<AppConfig>()
}

/// Load configuration with better error handling and defaults
pub fn load_config_or_default(config_path: Option<&Path>) -> AppConfig {
    match load_config(config_path) {
        Ok(config) => {
            log::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            log::warn!("Failed to load config ({}), using defaults", e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/datalogger.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn defaults_point_at_local_scpi_sockets() {
        let config = AppConfig::default();
        assert_eq!(config.dso.port, 5025);
        assert_eq!(config.awg.port, 5026);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datalogger.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[dso]\nhost = \"192.168.0.10\"\nport = 5025\n\n[logging]\nlog_level = \"debug\""
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.dso.host, "192.168.0.10");
        assert_eq!(config.logging.log_level, "debug");
        // untouched section keeps its default
        assert_eq!(config.awg.port, 5026);
    }

    #[test]
    fn load_or_default_falls_back_on_bad_path() {
        let config = load_config_or_default(Some(Path::new("/nonexistent/file.toml")));
        assert_eq!(config.dso.port, 5025);
    }
}
