//! Fetch orchestration state machine
//!
//! The `App` runs on a single control task and owns all session state. Each
//! background operation (position fix, conditions fetch, icon fetch) runs in
//! its own spawned task and reports back through an mpsc channel, tagged
//! with the session identity captured at dispatch time. The control task
//! never blocks; completions are delivered asynchronously as [`Event`]s.
//!
//! Starting a new session supersedes any in-flight one: stale completions
//! are detected by session identity and dropped, so a superseded session can
//! never surface data through the presentation sink.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::{
    conditions_url, parse_observation, ConditionsClient, IconAsset, IconClient, Position,
    RawPayload, WeatherObservation,
};
use crate::error::FetchError;
use crate::position::PositionSource;
use crate::sink::PresentationSink;

/// Identity of one end-to-end pipeline activation
///
/// Monotonically increasing; completions carry the id of the session that
/// dispatched them so stale results are a simple equality check.
pub type SessionId = u64;

/// Capacity of the completion channel; a session has at most one
/// outstanding operation, so this only needs to absorb superseded stragglers
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Pipeline stage of the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session has started yet
    Idle,
    /// Waiting for the position source to deliver a fix
    AwaitingLocation,
    /// Conditions fetch dispatched, waiting for the payload
    FetchingObservation,
    /// Observation delivered, icon fetch in flight
    FetchingIcon,
    /// Session completed (possibly without an icon)
    Done,
    /// Session failed; the error was surfaced to the sink
    Failed,
}

impl Phase {
    /// Whether the session has reached a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }
}

/// Completion events delivered to the control task by background workers
#[derive(Debug)]
pub enum Event {
    /// The position source produced its single fix result
    Fix {
        session: SessionId,
        result: Result<Position, FetchError>,
    },
    /// The conditions fetch finished
    Payload {
        session: SessionId,
        result: Result<RawPayload, FetchError>,
    },
    /// The icon fetch finished
    Icon {
        session: SessionId,
        result: Result<IconAsset, FetchError>,
    },
}

/// The fetch orchestrator
///
/// Composition root of the core: wires the position source, the conditions
/// and icon clients, and the presentation sink into one session state
/// machine.
pub struct App {
    phase: Phase,
    session: SessionId,
    provider_host: String,
    api_key: String,
    conditions: ConditionsClient,
    icons: IconClient,
    source: Box<dyn PositionSource>,
    sink: Box<dyn PresentationSink>,
    events_tx: mpsc::Sender<Event>,
}

impl App {
    /// Creates an orchestrator from configuration
    ///
    /// Returns the app together with the receiving end of its completion
    /// channel; the caller feeds received events back via
    /// [`App::handle_event`] or lets [`App::run`] drive the loop.
    pub fn new(
        config: &Config,
        source: Box<dyn PositionSource>,
        sink: Box<dyn PresentationSink>,
    ) -> Result<(Self, mpsc::Receiver<Event>), FetchError> {
        let timeout = config.request_timeout();
        let conditions = ConditionsClient::new(timeout)?;
        let icons = IconClient::new(timeout)?;
        Ok(Self::with_clients(
            config.provider_host.clone(),
            config.api_key.clone(),
            conditions,
            icons,
            source,
            sink,
        ))
    }

    /// Creates an orchestrator with custom clients
    ///
    /// Used by tests and by callers that preconfigure their HTTP clients.
    pub fn with_clients(
        provider_host: String,
        api_key: String,
        conditions: ConditionsClient,
        icons: IconClient,
        source: Box<dyn PositionSource>,
        sink: Box<dyn PresentationSink>,
    ) -> (Self, mpsc::Receiver<Event>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let app = Self {
            phase: Phase::Idle,
            session: 0,
            provider_host,
            api_key,
            conditions,
            icons,
            source,
            sink,
            events_tx,
        };
        (app, events_rx)
    }

    /// Current pipeline stage
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Identity of the current session; 0 before the first `begin`
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Starts a new fetch session
    ///
    /// Supersedes any in-flight session: the previous session's completions
    /// become stale and are discarded on arrival. Notifies the sink that
    /// loading started, then activates the position source.
    pub fn begin(&mut self) {
        if self.session > 0 && !self.phase.is_terminal() {
            debug!(session = self.session, "superseding in-flight session");
        }
        self.source.deactivate();

        self.session += 1;
        self.phase = Phase::AwaitingLocation;
        info!(session = self.session, "session started");
        self.sink.on_loading_started();

        match self.source.activate() {
            Ok(fix_rx) => {
                let session = self.session;
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    // A dropped sender means the source was deactivated;
                    // there is nothing to report.
                    if let Ok(result) = fix_rx.await {
                        let _ = events.send(Event::Fix { session, result }).await;
                    }
                });
            }
            Err(err) => self.fail(err),
        }
    }

    /// Applies one completion event to the state machine
    ///
    /// Events from superseded sessions, and duplicate events that do not
    /// match the stage the session is in, are dropped.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Fix { session, result } => {
                if !self.accepts(session, Phase::AwaitingLocation) {
                    return;
                }
                match result {
                    Ok(position) => self.on_fix(position),
                    Err(err) => self.fail(err),
                }
            }
            Event::Payload { session, result } => {
                if !self.accepts(session, Phase::FetchingObservation) {
                    return;
                }
                match result.and_then(|payload| parse_observation(&payload.bytes)) {
                    Ok(observation) => self.on_observation(observation),
                    Err(err) => self.fail(err),
                }
            }
            Event::Icon { session, result } => {
                if !self.accepts(session, Phase::FetchingIcon) {
                    return;
                }
                self.phase = Phase::Done;
                match result {
                    Ok(icon) => self.sink.on_icon_ready(icon),
                    Err(err) => {
                        // The observation already delivered stays valid; an
                        // icon failure never fails the session.
                        warn!(session, error = %err, "icon stage failed");
                        self.sink.on_icon_failed();
                    }
                }
            }
        }
    }

    /// Drives the session started by `begin` to a terminal phase
    pub async fn run(&mut self, events: &mut mpsc::Receiver<Event>) -> Phase {
        self.begin();
        while !self.phase.is_terminal() {
            match events.recv().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
        self.phase
    }

    /// Checks that a completion belongs to the live session and matches the
    /// stage the session is in
    fn accepts(&self, session: SessionId, expected: Phase) -> bool {
        if session != self.session {
            debug!(
                stale = session,
                current = self.session,
                "discarding stale completion"
            );
            return false;
        }
        if self.phase != expected {
            debug!(
                session,
                phase = ?self.phase,
                "discarding out-of-phase completion"
            );
            return false;
        }
        true
    }

    /// Fix delivered: build the request URL and dispatch the conditions fetch
    fn on_fix(&mut self, position: Position) {
        // The source self-stops after its first fix; stop it anyway.
        self.source.deactivate();

        self.phase = Phase::FetchingObservation;
        info!(
            session = self.session,
            latitude = position.latitude,
            longitude = position.longitude,
            "fix received, fetching conditions"
        );

        let url = conditions_url(&self.provider_host, &self.api_key, position);
        let session = self.session;
        let client = self.conditions.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch(&url).await;
            let _ = events.send(Event::Payload { session, result }).await;
        });
    }

    /// Observation parsed: notify the sink and dispatch the icon fetch
    fn on_observation(&mut self, observation: WeatherObservation) {
        self.phase = Phase::FetchingIcon;
        self.sink.on_observation_ready(&observation);

        // The icon URL is taken verbatim from the parsed response.
        let url = observation.icon_url;
        let session = self.session;
        let client = self.icons.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch(&url).await;
            let _ = events.send(Event::Icon { session, result }).await;
        });
    }

    /// Terminal failure of the current stage; surfaced, never retried
    fn fail(&mut self, err: FetchError) {
        warn!(session = self.session, error = %err, "session failed");
        self.phase = Phase::Failed;
        self.sink.on_error(&err);
    }
}
