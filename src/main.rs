//! Pokedex CLI - explore PokeAPI from an interactive prompt
//!
//! Browses location areas, lists the pokemon found in them, and lets you catch
//! and inspect pokemon. Every API response is cached in memory for a configurable TTL.

use std::io;

use clap::Parser;
use reqwest::Client;
use tokio::io::BufReader;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use pokedex::api::PokeClient;
use pokedex::cli::{Cli, Config};
use pokedex::commands::Session;
use pokedex::repl;

/// Sets up stderr logging, preferring RUST_LOG over the configured level
fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    init_logging(&config.log_level);
    debug!(?config, "starting pokedex");

    let mut http = Client::builder();
    if let Some(timeout) = config.timeout {
        http = http.timeout(timeout);
    }

    let client = PokeClient::new(config.cache_ttl)?
        .with_base_url(&config.base_url)
        .with_http_client(http.build()?);
    let mut session = Session::new(client);

    let result = repl::run(&mut session, BufReader::new(tokio::io::stdin()), io::stdout()).await;

    // Stop the cache sweep before the runtime goes away
    session.client().shutdown();

    if let Err(e) = result {
        error!(error = %e, "terminal I/O failed");
        return Err(e.into());
    }
    Ok(())
}
