//! The pluggable transport seam.
//!
//! The wire protocol of the remote server is not this crate's business. A
//! [`Connector`] turns an endpoint's configuration into a live [`Transport`];
//! the connection manager owns the transport for the lifetime of the session
//! and serializes calls on it per endpoint. The shipped implementation lives
//! in [`crate::mcp`]; tests substitute in-memory fakes.

use async_trait::async_trait;
use serde_json::Value;

use wamcp_common::{EndpointConfig, Request};

use crate::error::{ConnectionError, RequestError};

/// One live session with a remote server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and await its payload.
    ///
    /// Resolves exactly once per request. Dropping the returned future
    /// abandons the exchange; no payload is delivered for it afterwards.
    ///
    /// # Errors
    /// Returns a [`RequestError`] if the remote side rejects the request or
    /// the exchange fails mid-flight.
    async fn call(&self, request: &Request) -> Result<Value, RequestError>;

    /// Tear the session down, releasing its network resources.
    ///
    /// # Errors
    /// Returns a [`ConnectionError`] if the shutdown does not complete
    /// cleanly; resources are released regardless.
    async fn close(self: Box<Self>) -> Result<(), ConnectionError>;
}

/// Factory for sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a session with the given endpoint.
    ///
    /// # Errors
    /// Returns a [`ConnectionError`] if the endpoint is unreachable or the
    /// session could not be established.
    async fn connect(&self, endpoint: &EndpointConfig)
    -> Result<Box<dyn Transport>, ConnectionError>;
}
