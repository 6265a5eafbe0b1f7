// ABOUTME: Server configuration from environment variables
// ABOUTME: Port, database path and CORS origin with sensible defaults

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_path: Option<PathBuf>,
    pub cors_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_str = env::var("CADENCE_PORT").unwrap_or_else(|_| "4310".to_string());
        let port = port_str.parse::<u16>()?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let database_path = env::var("CADENCE_DB").ok().map(PathBuf::from);

        let cors_origin = env::var("CADENCE_CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        Ok(Config {
            port,
            database_path,
            cors_origin,
        })
    }
}
