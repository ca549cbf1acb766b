//! Position acquisition
//!
//! Sources wrap a platform's "subscribe for location updates" mechanism and
//! expose single-shot semantics: each activation delivers at most one fix,
//! then the source stops listening on its own. Without that guarantee every
//! subsequent raw location tick would re-trigger a full network fetch.
//!
//! Each background acquisition is a spawned task producing exactly one
//! `Result`, delivered through a oneshot channel to the orchestrator's
//! control task.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::data::Position;
use crate::error::FetchError;

/// One-shot delivery channel for a single fix result
pub type FixReceiver = oneshot::Receiver<Result<Position, FetchError>>;

/// A platform capability providing "subscribe once for next fix" semantics
///
/// The receiver returned by `activate` resolves at most once. If the source
/// is deactivated before a fix arrives, the sender side is dropped and the
/// receiver resolves to a channel error; callers treat that as "no fix".
pub trait PositionSource: Send {
    /// Begins listening for position updates
    ///
    /// Fails synchronously with `PositioningUnavailable` when positioning is
    /// disabled. A source that discovers unavailability only after
    /// activation delivers `Err(PositioningUnavailable)` through the
    /// receiver instead.
    fn activate(&mut self) -> Result<FixReceiver, FetchError>;

    /// Stops listening for position updates
    ///
    /// Safe to call when not listening; sources self-stop after delivering
    /// their fix.
    fn deactivate(&mut self);
}

/// The GPS-off analog: positioning is disabled and activation always fails
#[derive(Debug, Default)]
pub struct Disabled;

impl PositionSource for Disabled {
    fn activate(&mut self) -> Result<FixReceiver, FetchError> {
        Err(FetchError::positioning_unavailable(
            "no positioning capability is configured",
        ))
    }

    fn deactivate(&mut self) {}
}

/// A source that immediately reports a position given up front
///
/// Serves the `--lat`/`--lon` override and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource {
    position: Position,
}

impl FixedSource {
    /// Creates a source that always reports `position`
    pub fn new(position: Position) -> Self {
        Self { position }
    }
}

impl PositionSource for FixedSource {
    fn activate(&mut self) -> Result<FixReceiver, FetchError> {
        let (tx, rx) = oneshot::channel();
        // Receiver is alive until returned, so this send cannot fail.
        let _ = tx.send(Ok(self.position));
        Ok(rx)
    }

    fn deactivate(&mut self) {}
}

/// Adapts a raw platform feed of fixes to single-shot delivery
///
/// The underlying feed may keep emitting updates; each activation takes
/// exactly one tick and leaves the rest for later activations. A closed
/// feed reports `PositioningUnavailable` through the receiver.
#[derive(Debug)]
pub struct FeedSource {
    feed: Arc<Mutex<mpsc::Receiver<Position>>>,
    listener: Option<JoinHandle<()>>,
}

impl FeedSource {
    /// Creates a source draining one fix per activation from `feed`
    pub fn new(feed: mpsc::Receiver<Position>) -> Self {
        Self {
            feed: Arc::new(Mutex::new(feed)),
            listener: None,
        }
    }
}

impl PositionSource for FeedSource {
    fn activate(&mut self) -> Result<FixReceiver, FetchError> {
        self.deactivate();

        let (tx, rx) = oneshot::channel();
        let feed = Arc::clone(&self.feed);
        self.listener = Some(tokio::spawn(async move {
            let mut feed = feed.lock().await;
            let result = match feed.recv().await {
                Some(position) => {
                    debug!(
                        latitude = position.latitude,
                        longitude = position.longitude,
                        "fix acquired"
                    );
                    Ok(position)
                }
                None => Err(FetchError::positioning_unavailable(
                    "position feed closed before a fix arrived",
                )),
            };
            let _ = tx.send(result);
        }));

        Ok(rx)
    }

    fn deactivate(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Shape of an ip-api style geolocation response; other fields ignored
#[derive(Debug, Deserialize)]
struct GeoResponse {
    lat: f64,
    lon: f64,
}

/// Coarse positioning through an IP geolocation endpoint
///
/// Single-shot by construction: one GET per activation. Lookup failures are
/// reported as `PositioningUnavailable` since no fix could be acquired.
#[derive(Debug)]
pub struct IpLookupSource {
    client: Client,
    url: String,
    listener: Option<JoinHandle<()>>,
}

impl IpLookupSource {
    /// Creates a source querying `url` with the given request timeout
    pub fn new(url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::transport)?;
        Ok(Self {
            client,
            url,
            listener: None,
        })
    }

    async fn lookup(client: Client, url: String) -> Result<Position, FetchError> {
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|err| FetchError::positioning_unavailable(format!("geolocation: {err}")))?;

        if !response.status().is_success() {
            return Err(FetchError::positioning_unavailable(format!(
                "geolocation endpoint returned status {}",
                response.status()
            )));
        }

        let geo: GeoResponse = response.json().await.map_err(|err| {
            FetchError::positioning_unavailable(format!("geolocation response: {err}"))
        })?;

        Ok(Position::new(geo.lat, geo.lon))
    }
}

impl PositionSource for IpLookupSource {
    fn activate(&mut self) -> Result<FixReceiver, FetchError> {
        self.deactivate();

        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        let url = self.url.clone();
        self.listener = Some(tokio::spawn(async move {
            let _ = tx.send(Self::lookup(client, url).await);
        }));

        Ok(rx)
    }

    fn deactivate(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_disabled_fails_synchronously() {
        let mut source = Disabled;
        let err = source.activate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PositioningUnavailable);
    }

    #[tokio::test]
    async fn test_fixed_source_delivers_its_position() {
        let mut source = FixedSource::new(Position::new(60.1699, 24.9384));
        let rx = source.activate().expect("activation should succeed");
        let fix = rx.await.expect("sender must not be dropped").unwrap();
        assert_eq!(fix, Position::new(60.1699, 24.9384));
    }

    #[tokio::test]
    async fn test_fixed_source_is_reusable() {
        let mut source = FixedSource::new(Position::new(1.0, 2.0));
        for _ in 0..3 {
            let rx = source.activate().unwrap();
            assert!(rx.await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn test_feed_source_delivers_exactly_one_fix_per_activation() {
        let (tx, rx) = mpsc::channel(8);
        // The platform floods updates before the listener even starts.
        for i in 1..=4 {
            tx.send(Position::new(f64::from(i), f64::from(i)))
                .await
                .unwrap();
        }

        let mut source = FeedSource::new(rx);

        let first = source.activate().unwrap().await.unwrap().unwrap();
        assert_eq!(first, Position::new(1.0, 1.0));

        // The remaining ticks were not consumed by the first activation.
        let second = source.activate().unwrap().await.unwrap().unwrap();
        assert_eq!(second, Position::new(2.0, 2.0));
    }

    #[tokio::test]
    async fn test_feed_source_closed_feed_reports_unavailable() {
        let (tx, rx) = mpsc::channel::<Position>(1);
        drop(tx);

        let mut source = FeedSource::new(rx);
        let result = source.activate().unwrap().await.unwrap();
        assert_eq!(
            result.unwrap_err().kind(),
            ErrorKind::PositioningUnavailable
        );
    }

    #[tokio::test]
    async fn test_feed_source_deactivate_delivers_nothing() {
        let (tx, rx) = mpsc::channel(1);
        let mut source = FeedSource::new(rx);

        let fix_rx = source.activate().unwrap();
        source.deactivate();

        // The listener was aborted; a late platform tick goes nowhere.
        let _ = tx.send(Position::new(5.0, 5.0)).await;
        assert!(fix_rx.await.is_err());
    }
}
