//! Command-line interface parsing for the Pokedex REPL
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a validated `Config` for building the API client and logging.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::api::DEFAULT_BASE_URL;

/// Default lifetime of a cached API response in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default log filter when `RUST_LOG` is not set
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The cache TTL must be positive
    #[error("Invalid cache TTL: '{0}'. Must be at least 1 second")]
    InvalidCacheTtl(u64),

    /// The request timeout must be positive
    #[error("Invalid timeout: '{0}'. Must be at least 1 second")]
    InvalidTimeout(u64),
}

/// Pokedex - explore PokeAPI location areas and catch pokemon
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Explore PokeAPI location areas and catch pokemon from an interactive prompt")]
#[command(version)]
pub struct Cli {
    /// Seconds a cached API response stays valid
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl: u64,

    /// Root URL of the PokeAPI instance to query
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Abort HTTP requests that take longer than this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Log filter used when RUST_LOG is unset (e.g. warn, debug, pokedex=trace)
    #[arg(long, value_name = "LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

/// Validated runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub cache_ttl: Duration,
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Creates a Config from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Config)` with durations converted from seconds
    /// * `Err(CliError)` if the TTL or timeout is zero
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.cache_ttl == 0 {
            return Err(CliError::InvalidCacheTtl(cli.cache_ttl));
        }

        let timeout = match cli.timeout {
            None => None,
            Some(0) => return Err(CliError::InvalidTimeout(0)),
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        Ok(Config {
            cache_ttl: Duration::from_secs(cli.cache_ttl),
            base_url: cli.base_url.clone(),
            timeout,
            log_level: cli.log_level.clone(),
        })
    }
}
