//! skynow - current weather conditions at your location
//!
//! Acquires one position fix, fetches the current conditions from the
//! weather provider, and resolves the matching condition icon. Results are
//! printed by a terminal presentation sink; logs go to stderr.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use skynow::app::{App, Phase};
use skynow::cli::{Cli, StartupConfig};
use skynow::config::Config;
use skynow::position::{Disabled, FixedSource, IpLookupSource, PositionSource};
use skynow::sink::TerminalSink;

/// Selects the position source: explicit override first, then the
/// configured geolocation endpoint, otherwise positioning is disabled
fn select_source(
    startup: &StartupConfig,
    config: &Config,
) -> Result<Box<dyn PositionSource>, Box<dyn std::error::Error>> {
    if let Some(position) = startup.position_override {
        return Ok(Box::new(FixedSource::new(position)));
    }

    match config.geolocate_url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => Ok(Box::new(IpLookupSource::new(
            url.to_string(),
            config.request_timeout(),
        )?)),
        None => Ok(Box::new(Disabled)),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(err) => {
            eprintln!("{err}");
            return Ok(ExitCode::from(2));
        }
    };

    let config = match &startup.config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let source = select_source(&startup, &config)?;
    let sink = Box::new(TerminalSink::new(startup.json_output));

    let (mut app, mut events) = App::new(&config, source, sink)?;
    let phase = app.run(&mut events).await;

    Ok(match phase {
        Phase::Done => ExitCode::SUCCESS,
        _ => ExitCode::from(1),
    })
}
