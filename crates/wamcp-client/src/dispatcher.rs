//! Request routing across endpoints.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use wamcp_common::{Request, Response};

use crate::error::{ConnectionError, DispatchError};
use crate::manager::ConnectionManager;

/// Routes each request to an endpoint and returns its outcome.
///
/// With no explicit target, endpoints are selected round-robin in
/// configuration order. Failure of the selected endpoint is returned to the
/// caller as-is; no fallback endpoint is tried.
pub struct Dispatcher {
    manager: Arc<ConnectionManager>,
    cursor: AtomicUsize,
}

impl Dispatcher {
    /// Create a dispatcher over a connection manager.
    #[must_use]
    pub const fn new(manager: Arc<ConnectionManager>) -> Self {
        Self {
            manager,
            cursor: AtomicUsize::new(0),
        }
    }

    /// The connection manager this dispatcher routes through.
    #[must_use]
    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Dispatch a request, optionally to a named endpoint.
    ///
    /// The caller is suspended until the response or error arrives. Exactly
    /// one terminal outcome is produced per request: a [`Response`]
    /// correlated by the request id, or a [`DispatchError`]. Dropping the
    /// returned future cancels the exchange.
    ///
    /// # Errors
    /// Returns [`DispatchError::Connection`] for an unknown or unconnected
    /// target, [`DispatchError::Request`] if the remote side fails the
    /// request.
    pub async fn dispatch(
        &self,
        request: Request,
        target: Option<&str>,
    ) -> Result<Response, DispatchError> {
        let endpoint_id = match target {
            Some(id) => {
                if self.manager.config().endpoint(id).is_none() {
                    return Err(ConnectionError::UnknownEndpoint(id.to_string()).into());
                }
                id.to_string()
            }
            None => self.next_endpoint()?,
        };

        log::debug!(
            "Dispatching request {} (op '{}') to endpoint '{}'",
            request.id,
            request.op,
            endpoint_id
        );

        self.manager.send(&endpoint_id, request).await
    }

    /// Round-robin selection over the configured endpoint order.
    fn next_endpoint(&self) -> Result<String, ConnectionError> {
        let endpoints = self.manager.endpoints();
        if endpoints.is_empty() {
            return Err(ConnectionError::NoEndpoints);
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % endpoints.len();
        Ok(endpoints[index].id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ConnectionState;
    use crate::testing::{MockBehavior, MockConnector};
    use serde_json::json;
    use wamcp_common::{ClientConfig, EndpointConfig, Settings, TransportConfig};

    fn config(ids: &[&str]) -> ClientConfig {
        ClientConfig {
            endpoints: ids
                .iter()
                .map(|id| EndpointConfig {
                    id: (*id).to_string(),
                    name: format!("Endpoint {id}"),
                    transport: TransportConfig::Http {
                        url: "https://example.com/mcp".to_string(),
                    },
                    credentials: None,
                    working_directory: None,
                })
                .collect(),
            settings: Settings::default(),
        }
    }

    async fn dispatcher_over(
        ids: &[&str],
        connector: Arc<MockConnector>,
    ) -> (Dispatcher, Arc<ConnectionManager>) {
        let manager = Arc::new(ConnectionManager::new(config(ids), connector));
        manager.connect_all().await.unwrap();
        (Dispatcher::new(Arc::clone(&manager)), manager)
    }

    #[tokio::test]
    async fn test_round_robin_alternates_endpoints() {
        let connector = Arc::new(MockConnector::default());
        let (dispatcher, _manager) = dispatcher_over(&["a", "b"], Arc::clone(&connector)).await;

        for op in ["r1", "r2", "r3"] {
            dispatcher
                .dispatch(Request::new(op, json!({})), None)
                .await
                .unwrap();
        }

        let targets: Vec<String> = connector.calls().into_iter().map(|(id, _)| id).collect();
        assert_eq!(targets, vec!["a", "b", "a"]);
    }

    #[tokio::test]
    async fn test_explicit_target_bypasses_rotation() {
        let connector = Arc::new(MockConnector::default());
        let (dispatcher, _manager) = dispatcher_over(&["a", "b"], Arc::clone(&connector)).await;

        for _ in 0..3 {
            dispatcher
                .dispatch(Request::new("ping", json!({})), Some("b"))
                .await
                .unwrap();
        }

        let targets: Vec<String> = connector.calls().into_iter().map(|(id, _)| id).collect();
        assert_eq!(targets, vec!["b", "b", "b"]);
    }

    #[tokio::test]
    async fn test_unknown_target_is_connection_error() {
        let connector = Arc::new(MockConnector::default());
        let (dispatcher, _manager) = dispatcher_over(&["a"], connector).await;

        let err = dispatcher
            .dispatch(Request::new("ping", json!({})), Some("nope"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Connection(ConnectionError::UnknownEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_dispatch_returns_correlated_response() {
        let connector = Arc::new(MockConnector::default());
        connector.set_behavior("a", MockBehavior::Respond(json!({"status": "ok"})));
        let (dispatcher, _manager) = dispatcher_over(&["a"], connector).await;

        let request = Request::new("ping", json!({}));
        let request_id = request.id;
        let response = dispatcher.dispatch(request, None).await.unwrap();

        assert_eq!(response.request_id, request_id);
        assert_eq!(response.payload, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_remote_error_surfaces_as_request_error() {
        let connector = Arc::new(MockConnector::default());
        connector.set_behavior("a", MockBehavior::RejectRequests);
        let (dispatcher, _manager) = dispatcher_over(&["a"], connector).await;

        let err = dispatcher
            .dispatch(Request::new("ping", json!({})), None)
            .await
            .unwrap_err();
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_yields_connection_error() {
        // No connect_all: endpoints configured but never connected.
        let connector = Arc::new(MockConnector::default());
        let manager = Arc::new(ConnectionManager::new(config(&["a", "b"]), connector));
        let dispatcher = Dispatcher::new(Arc::clone(&manager));

        let err = dispatcher
            .dispatch(Request::new("ping", json!({})), None)
            .await
            .unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn test_failed_endpoint_fails_fast() {
        // Endpoint "a" is down; the dispatch that lands on it errors rather
        // than falling back to "b".
        let connector = Arc::new(MockConnector::default());
        connector.set_behavior("a", MockBehavior::RefuseConnection);
        let manager = Arc::new(ConnectionManager::new(config(&["a", "b"]), connector));
        manager.connect_all().await.unwrap();
        let dispatcher = Dispatcher::new(Arc::clone(&manager));

        let err = dispatcher
            .dispatch(Request::new("ping", json!({})), None)
            .await
            .unwrap_err();
        assert!(err.is_connection());

        // The rotation still advances: the next dispatch reaches "b".
        dispatcher
            .dispatch(Request::new("ping", json!({})), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_dispatch_releases_session() {
        let connector = Arc::new(MockConnector::default());
        connector.set_behavior("a", MockBehavior::Hang);
        let (dispatcher, manager) = dispatcher_over(&["a"], Arc::clone(&connector)).await;

        {
            let mut pending = Box::pin(dispatcher.dispatch(Request::new("ping", json!({})), None));
            assert!(futures::poll!(pending.as_mut()).is_pending());
        }

        let status = manager.status().await;
        assert_eq!(status["a"], ConnectionState::Disconnected);
        assert!(connector.transport_dropped("a"));
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_resolve_independently() {
        let connector = Arc::new(MockConnector::default());
        connector.set_behavior("a", MockBehavior::Respond(json!({"from": "a"})));
        connector.set_behavior("b", MockBehavior::Respond(json!({"from": "b"})));
        let (dispatcher, _manager) = dispatcher_over(&["a", "b"], connector).await;

        let r1 = Request::new("ping", json!({}));
        let r2 = Request::new("ping", json!({}));
        let (id1, id2) = (r1.id, r2.id);

        let (first, second) = tokio::join!(
            dispatcher.dispatch(r1, None),
            dispatcher.dispatch(r2, None)
        );

        assert_eq!(first.unwrap().request_id, id1);
        assert_eq!(second.unwrap().request_id, id2);
    }
}
