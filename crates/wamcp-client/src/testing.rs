//! In-memory connector and transport used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use wamcp_common::{EndpointConfig, Request};

use crate::error::{ConnectionError, RequestError};
use crate::transport::{Connector, Transport};

/// What a mock endpoint does with connections and requests.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Accept connections, answer every request with this payload.
    Respond(Value),
    /// Accept connections, fail every request with a remote error.
    RejectRequests,
    /// Refuse the connection outright.
    RefuseConnection,
    /// Accept connections, never answer a request.
    Hang,
}

/// Connector whose endpoints behave according to [`MockBehavior`].
///
/// Records every call and exposes whether an endpoint's transport has been
/// dropped, so tests can observe resource release.
#[derive(Default)]
pub struct MockConnector {
    behaviors: Mutex<HashMap<String, MockBehavior>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    closes: Arc<Mutex<Vec<String>>>,
    dropped: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl MockConnector {
    pub fn set_behavior(&self, endpoint_id: &str, behavior: MockBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(endpoint_id.to_string(), behavior);
    }

    /// `(endpoint_id, op)` pairs, in call order across all endpoints.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Endpoint ids whose transports were shut down via `close`.
    pub fn closes(&self) -> Vec<String> {
        self.closes.lock().unwrap().clone()
    }

    /// Whether the most recent transport for this endpoint has been dropped.
    pub fn transport_dropped(&self, endpoint_id: &str) -> bool {
        self.dropped
            .lock()
            .unwrap()
            .get(endpoint_id)
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn behavior(&self, endpoint_id: &str) -> MockBehavior {
        self.behaviors
            .lock()
            .unwrap()
            .get(endpoint_id)
            .cloned()
            .unwrap_or(MockBehavior::Respond(
                serde_json::json!({"status": "ok"}),
            ))
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        endpoint: &EndpointConfig,
    ) -> Result<Box<dyn Transport>, ConnectionError> {
        let behavior = self.behavior(&endpoint.id);
        if matches!(behavior, MockBehavior::RefuseConnection) {
            return Err(ConnectionError::Unreachable {
                id: endpoint.id.clone(),
                reason: "connection refused".to_string(),
            });
        }

        let dropped = Arc::new(AtomicBool::new(false));
        self.dropped
            .lock()
            .unwrap()
            .insert(endpoint.id.clone(), Arc::clone(&dropped));

        Ok(Box::new(MockTransport {
            endpoint_id: endpoint.id.clone(),
            behavior,
            calls: Arc::clone(&self.calls),
            closes: Arc::clone(&self.closes),
            dropped,
        }))
    }
}

struct MockTransport {
    endpoint_id: String,
    behavior: MockBehavior,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    closes: Arc<Mutex<Vec<String>>>,
    dropped: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, request: &Request) -> Result<Value, RequestError> {
        self.calls
            .lock()
            .unwrap()
            .push((self.endpoint_id.clone(), request.op.clone()));

        match &self.behavior {
            MockBehavior::Respond(payload) => Ok(payload.clone()),
            MockBehavior::RejectRequests => Err(RequestError::Remote {
                message: "request rejected".to_string(),
            }),
            MockBehavior::Hang => std::future::pending().await,
            MockBehavior::RefuseConnection => unreachable!("never connected"),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), ConnectionError> {
        self.closes.lock().unwrap().push(self.endpoint_id.clone());
        Ok(())
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}
