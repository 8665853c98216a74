//! Session lifecycle and the send path.
//!
//! The [`ConnectionManager`] owns every session. It is the only component
//! that mutates session state, and sends on one endpoint are serialized by
//! the session's transport lock, so two requests never interleave writes on
//! one connection. Requests on different endpoints proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, RwLock as StdRwLock};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use wamcp_common::{ClientConfig, EndpointConfig, Request, Response};

use crate::error::{ConnectionError, DispatchError, RequestError};
use crate::transport::{Connector, Transport};

/// Lifecycle state of one endpoint's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session exists.
    Disconnected,
    /// A session is being established.
    Connecting,
    /// The session is live and usable.
    Connected,
    /// The last connection attempt failed.
    Failed,
}

impl ConnectionState {
    /// Stable lowercase name, for logs and status output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        }
    }
}

/// One endpoint's session: its state plus the live transport, if any.
struct Session {
    endpoint: EndpointConfig,
    // Sync lock: the cancel guard must write state from a non-async Drop.
    state: StdRwLock<ConnectionState>,
    transport: Mutex<Option<Box<dyn Transport>>>,
}

impl Session {
    fn new(endpoint: EndpointConfig) -> Self {
        Self {
            endpoint,
            state: StdRwLock::new(ConnectionState::Connecting),
            transport: Mutex::new(None),
        }
    }

    fn state(&self) -> ConnectionState {
        self.state
            .read()
            .map_or(ConnectionState::Failed, |state| *state)
    }

    fn set_state(&self, next: ConnectionState) {
        if let Ok(mut state) = self.state.write() {
            *state = next;
        }
    }
}

/// Releases a session when the operation holding it is cancelled.
///
/// Armed for the duration of a connect or send; disarmed once the operation
/// reaches a terminal outcome. If the future is dropped first, the guard
/// moves the session out of Connecting/Connected and drops the transport so
/// its network resources are freed.
struct CancelGuard {
    session: Arc<Session>,
    armed: bool,
}

impl CancelGuard {
    fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // The cancelled future released its transport lock before this runs.
        // If try_lock fails, the cancelled send was still queued behind
        // another in-flight send that owns the transport; the session stays
        // intact for it.
        let Ok(mut slot) = self.session.transport.try_lock() else {
            return;
        };
        log::debug!(
            "Operation on endpoint '{}' cancelled, releasing session",
            self.session.endpoint.id
        );
        *slot = None;
        self.session.set_state(ConnectionState::Disconnected);
    }
}

/// Manages sessions for every configured endpoint.
pub struct ConnectionManager {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    sessions: Arc<RwLock<HashMap<String, Arc<Session>>>>,
}

impl ConnectionManager {
    /// Create a manager over the given configuration and connector.
    ///
    /// No connections are opened yet; call [`Self::connect_all`] or
    /// [`Self::connect`] to establish sessions.
    pub fn new(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The configuration this manager was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Configured endpoints, in dispatch order.
    #[must_use]
    pub fn endpoints(&self) -> &[EndpointConfig] {
        &self.config.endpoints
    }

    /// Connect to every configured endpoint.
    ///
    /// Each endpoint gets `connect_retries` extra attempts with a one-second
    /// pause between them. Endpoints that stay down are left in the Failed
    /// state; the call succeeds as long as at least one endpoint comes up.
    ///
    /// # Errors
    /// Returns [`ConnectionError::NoEndpoints`] if no endpoint could be
    /// connected.
    pub async fn connect_all(&self) -> Result<(), ConnectionError> {
        for endpoint in &self.config.endpoints {
            let id = endpoint.id.clone();

            match self.connect(&id).await {
                Ok(()) => {}
                Err(e) => {
                    log::error!("Failed to connect to endpoint '{id}': {e}");
                    for attempt in 1..=self.config.settings.connect_retries {
                        log::info!(
                            "Retrying connection to '{id}' (attempt {attempt}/{})",
                            self.config.settings.connect_retries
                        );

                        tokio::time::sleep(Duration::from_secs(1)).await;

                        if self.connect(&id).await.is_ok() {
                            break;
                        }
                    }
                }
            }
        }

        let connected = {
            let sessions = self.sessions.read().await;
            sessions
                .values()
                .any(|s| s.state() == ConnectionState::Connected)
        };
        if !connected {
            return Err(ConnectionError::NoEndpoints);
        }

        Ok(())
    }

    /// Establish a session with one endpoint.
    ///
    /// # Errors
    /// Returns an error if the endpoint id is unknown or the connection
    /// attempt fails; the session is then left in the Failed state.
    pub async fn connect(&self, endpoint_id: &str) -> Result<(), ConnectionError> {
        let endpoint = self
            .config
            .endpoint(endpoint_id)
            .ok_or_else(|| ConnectionError::UnknownEndpoint(endpoint_id.to_string()))?
            .clone();

        // A live session must not be silently replaced; close it first so a
        // spawned server process gets its graceful shutdown.
        let existing = self.session(endpoint_id).await;
        if existing.is_some_and(|s| s.state() == ConnectionState::Connected)
            && let Err(e) = self.disconnect(endpoint_id).await
        {
            log::warn!("Failed to close previous session for '{endpoint_id}': {e}");
        }

        let session = Arc::new(Session::new(endpoint.clone()));
        self.sessions
            .write()
            .await
            .insert(endpoint.id.clone(), Arc::clone(&session));

        let guard = CancelGuard::new(Arc::clone(&session));
        let result = self.connector.connect(&endpoint).await;
        guard.disarm();

        match result {
            Ok(transport) => {
                *session.transport.lock().await = Some(transport);
                session.set_state(ConnectionState::Connected);
                log::info!("Endpoint '{}' connected", endpoint.id);
                Ok(())
            }
            Err(e) => {
                session.set_state(ConnectionState::Failed);
                Err(e)
            }
        }
    }

    /// Send a request on an endpoint's session and await the response.
    ///
    /// Sends on one endpoint are serialized; the caller is suspended until
    /// the server answers, errors, or the configured timeout elapses.
    /// Dropping the returned future cancels the exchange and releases the
    /// session; no response is delivered for it.
    ///
    /// # Errors
    /// Returns [`DispatchError::Connection`] if the endpoint has no live
    /// session, [`DispatchError::Request`] if the exchange itself fails.
    pub async fn send(
        &self,
        endpoint_id: &str,
        request: Request,
    ) -> Result<Response, DispatchError> {
        let session = self
            .session(endpoint_id)
            .await
            .ok_or_else(|| ConnectionError::NotConnected(endpoint_id.to_string()))?;

        if session.state() != ConnectionState::Connected {
            return Err(ConnectionError::NotConnected(endpoint_id.to_string()).into());
        }

        let guard = CancelGuard::new(Arc::clone(&session));
        let slot = session.transport.lock().await;
        let transport = slot
            .as_ref()
            .ok_or_else(|| ConnectionError::NotConnected(endpoint_id.to_string()))?;

        let outcome = match self.config.settings.request_timeout_secs {
            Some(secs) => {
                match tokio::time::timeout(Duration::from_secs(secs), transport.call(&request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(RequestError::Timeout),
                }
            }
            None => transport.call(&request).await,
        };

        drop(slot);
        guard.disarm();

        let payload = outcome?;
        Ok(Response::for_request(&request, payload))
    }

    /// Close one endpoint's session.
    ///
    /// # Errors
    /// Returns an error if the transport does not shut down cleanly; the
    /// session is removed either way.
    pub async fn disconnect(&self, endpoint_id: &str) -> Result<(), ConnectionError> {
        let session = self.sessions.write().await.remove(endpoint_id);
        if let Some(session) = session {
            session.set_state(ConnectionState::Disconnected);
            let transport = session.transport.lock().await.take();
            if let Some(transport) = transport {
                log::info!("Closing session for endpoint '{endpoint_id}'");
                transport.close().await?;
            }
        }
        Ok(())
    }

    /// Close every session.
    ///
    /// # Errors
    /// Returns the first shutdown failure; remaining sessions are still
    /// dropped.
    pub async fn shutdown(&self) -> Result<(), ConnectionError> {
        let ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        let mut first_error = None;
        for id in ids {
            if let Err(e) = self.disconnect(&id).await {
                log::error!("Failed to close session for '{id}': {e}");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Per-endpoint state snapshot, covering every configured endpoint.
    pub async fn status(&self) -> HashMap<String, ConnectionState> {
        let sessions = self.sessions.read().await;
        self.config
            .endpoints
            .iter()
            .map(|endpoint| {
                let state = sessions
                    .get(&endpoint.id)
                    .map_or(ConnectionState::Disconnected, |s| s.state());
                (endpoint.id.clone(), state)
            })
            .collect()
    }

    async fn session(&self, endpoint_id: &str) -> Option<Arc<Session>> {
        let mut sessions = self.sessions.write().await;
        // Evict sessions a cancelled send already released.
        if let Some(session) = sessions.get(endpoint_id)
            && session.state() == ConnectionState::Disconnected
        {
            sessions.remove(endpoint_id);
            return None;
        }
        sessions.get(endpoint_id).map(Arc::clone)
    }
}
