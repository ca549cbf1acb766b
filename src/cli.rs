//! Command-line interface parsing for skynow
//!
//! This module handles parsing of CLI arguments using clap, including the
//! `--lat`/`--lon` override that skips positioning entirely.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::data::Position;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// Latitude outside the valid range
    #[error("Invalid latitude {0}: must be between -90 and 90")]
    InvalidLatitude(f64),

    /// Longitude outside the valid range
    #[error("Invalid longitude {0}: must be between -180 and 180")]
    InvalidLongitude(f64),
}

/// skynow - current weather conditions at your location
#[derive(Parser, Debug)]
#[command(name = "skynow")]
#[command(about = "Locate yourself and show the current weather conditions")]
#[command(version)]
pub struct Cli {
    /// Latitude override in decimal degrees (skips positioning; requires --lon)
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude override in decimal degrees (requires --lat)
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Print the observation as a JSON document instead of text
    #[arg(long)]
    pub json: bool,

    /// Path to an alternate config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    /// Position to use instead of acquiring a fix
    pub position_override: Option<Position>,
    /// Whether to emit JSON output
    pub json_output: bool,
    /// Alternate config file path
    pub config_path: Option<PathBuf>,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments, validating
    /// coordinate ranges
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let position_override = match (cli.lat, cli.lon) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(CliError::InvalidLatitude(lat));
                }
                if !(-180.0..=180.0).contains(&lon) {
                    return Err(CliError::InvalidLongitude(lon));
                }
                Some(Position::new(lat, lon))
            }
            // clap's `requires` rules make a lone --lat/--lon unreachable.
            _ => None,
        };

        Ok(StartupConfig {
            position_override,
            json_output: cli.json,
            config_path: cli.config.clone(),
        })
    }
}
