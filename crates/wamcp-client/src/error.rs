//! Error types for the client library.

use thiserror::Error;

/// Errors raised while establishing or managing a session.
///
/// These indicate that the endpoint could not be reached or is not in a
/// usable state; the request itself was never delivered.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConnectionError {
    /// The endpoint did not accept a connection.
    ///
    /// Covers DNS failures, refused connections, and handshake errors.
    #[error("Endpoint '{id}' is unreachable: {reason}")]
    Unreachable {
        /// Id of the endpoint that could not be reached.
        id: String,
        /// Underlying failure description.
        reason: String,
    },

    /// A server process could not be spawned for a stdio endpoint.
    #[error("Failed to spawn server process for endpoint '{id}'")]
    Spawn {
        /// Id of the endpoint whose process failed to start.
        id: String,
        /// The spawn failure.
        #[source]
        source: std::io::Error,
    },

    /// Endpoint credentials could not be applied to the transport.
    #[error("Invalid credentials for endpoint '{id}': {reason}")]
    InvalidCredentials {
        /// Id of the endpoint with bad credentials.
        id: String,
        /// What was wrong with them.
        reason: String,
    },

    /// The named endpoint does not exist in the configuration.
    #[error("Endpoint '{0}' not found in configuration")]
    UnknownEndpoint(String),

    /// The endpoint is configured but has no live session.
    #[error("Endpoint '{0}' is not connected")]
    NotConnected(String),

    /// No endpoints are configured or reachable.
    #[error("No endpoints available")]
    NoEndpoints,

    /// A session could not be shut down cleanly.
    #[error("Failed to close session for endpoint '{id}': {reason}")]
    Shutdown {
        /// Id of the endpoint being closed.
        id: String,
        /// Underlying failure description.
        reason: String,
    },
}

/// Errors raised after a request reached the transport.
///
/// The session itself may still be healthy; these describe the fate of one
/// request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RequestError {
    /// The remote side rejected or failed to process the request.
    #[error("Remote error: {message}")]
    Remote {
        /// Error description returned by the server.
        message: String,
    },

    /// The request payload cannot be represented on the wire.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The server returned data that could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The transport failed mid-request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("Timeout error")]
    Timeout,
}

/// The failure surface of a dispatch.
///
/// Both error kinds propagate directly to the caller; there is no automatic
/// retry or fallback selection.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The selected endpoint had no usable session.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    /// The request failed after reaching the transport.
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl DispatchError {
    /// Check if this failure happened before the request was delivered.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if the remote side reported the failure.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Request(RequestError::Remote { .. }))
    }
}
