//! Presentation sink interface and the terminal implementation
//!
//! The core never renders anything itself; it notifies a sink of pipeline
//! progress and hands over ownership of presentation data. The terminal
//! sink here is the CLI front door; GUIs or tests supply their own.

use chrono::Local;

use crate::data::{IconAsset, WeatherObservation};
use crate::error::{ErrorKind, FetchError};

/// Consumer of orchestrator events
///
/// Implemented externally to the core. Methods are invoked from the single
/// control task, in pipeline order: `on_loading_started`, then either
/// `on_error`, or `on_observation_ready` followed by exactly one of
/// `on_icon_ready` / `on_icon_failed`.
pub trait PresentationSink {
    /// A new fetch session has started
    fn on_loading_started(&mut self);

    /// A complete observation was parsed successfully
    fn on_observation_ready(&mut self, observation: &WeatherObservation);

    /// The condition icon was fetched and decoded; ownership transfers
    fn on_icon_ready(&mut self, icon: IconAsset);

    /// The icon could not be fetched or decoded; the observation already
    /// delivered remains valid
    fn on_icon_failed(&mut self);

    /// The session failed; `error` carries the kind and a printable detail
    fn on_error(&mut self, error: &FetchError);
}

/// Plain line-oriented sink writing to stdout
#[derive(Debug, Default)]
pub struct TerminalSink {
    /// Emit the observation as a JSON document instead of text lines
    json: bool,
}

impl TerminalSink {
    /// Creates a terminal sink; `json` switches the observation output to a
    /// single JSON document
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl PresentationSink for TerminalSink {
    fn on_loading_started(&mut self) {
        eprintln!("Getting location...");
    }

    fn on_observation_ready(&mut self, observation: &WeatherObservation) {
        if self.json {
            match serde_json::to_string_pretty(observation) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("Could not serialize observation: {err}"),
            }
            return;
        }

        println!("{}", observation.location_full_name);
        println!(
            "{}, {}°C",
            observation.condition_text, observation.temperature_celsius
        );
        println!("As of {}", Local::now().format("%H:%M"));
    }

    fn on_icon_ready(&mut self, icon: IconAsset) {
        if !self.json {
            println!("Icon: {}x{} px", icon.width(), icon.height());
        }
    }

    fn on_icon_failed(&mut self) {
        if !self.json {
            println!("Icon: unavailable");
        }
    }

    fn on_error(&mut self, error: &FetchError) {
        match error.kind() {
            ErrorKind::PositioningUnavailable => {
                eprintln!("Positioning needs to be enabled: {error}");
            }
            _ => eprintln!("Weather fetch failed: {error}"),
        }
    }
}
