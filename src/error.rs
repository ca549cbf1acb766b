//! Error taxonomy for the fetch pipeline
//!
//! Every stage of the pipeline reports failures through `FetchError`. Errors
//! are terminal for the stage that produced them; the orchestrator surfaces
//! them to the presentation sink and never retries internally.

use thiserror::Error;

/// Errors produced by the fetch pipeline
#[derive(Debug, Error)]
pub enum FetchError {
    /// Positioning is disabled or the positioning subsystem went away
    #[error("positioning unavailable: {cause}")]
    PositioningUnavailable {
        /// Why no fix could be acquired
        cause: String,
    },

    /// The request URL was malformed; reported before any network I/O
    #[error("invalid request URL: {url}")]
    InvalidUrl {
        /// The offending URL
        url: String,
    },

    /// Connection failure, non-2xx status, or truncated body
    ///
    /// All three are reported uniformly since the orchestrator's recovery
    /// behavior (surface and stop) does not depend on which.
    #[error("transport failure: {cause}")]
    Transport {
        /// Underlying cause, suitable for a user-facing message
        cause: String,
    },

    /// The conditions response was missing a key, had a wrong type, or did
    /// not decode as JSON at all
    #[error("unparseable conditions response at `{path}`")]
    Parse {
        /// Key path of the offending field, or `(root)` for a document-level
        /// decode failure
        path: String,
    },

    /// The icon bytes were fetched but could not be decoded as an image
    #[error("icon image could not be decoded")]
    Decode,
}

/// Discriminant of a `FetchError`, for sinks that branch on the category
/// (e.g. showing a placeholder icon only on decode failure)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PositioningUnavailable,
    InvalidUrl,
    Transport,
    Parse,
    Decode,
}

impl FetchError {
    /// Returns the category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::PositioningUnavailable { .. } => ErrorKind::PositioningUnavailable,
            FetchError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            FetchError::Transport { .. } => ErrorKind::Transport,
            FetchError::Parse { .. } => ErrorKind::Parse,
            FetchError::Decode => ErrorKind::Decode,
        }
    }

    /// Builds a `PositioningUnavailable` error from any displayable cause
    pub fn positioning_unavailable(cause: impl Into<String>) -> Self {
        FetchError::PositioningUnavailable {
            cause: cause.into(),
        }
    }

    /// Builds a `Transport` error from any displayable cause
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        FetchError::Transport {
            cause: cause.to_string(),
        }
    }

    /// Builds a `Parse` error for the given key path
    pub fn parse(path: impl Into<String>) -> Self {
        FetchError::Parse { path: path.into() }
    }
}
