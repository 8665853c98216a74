use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// A single operation submitted to a remote server.
///
/// The operation name and payload are opaque to the client; they are carried
/// unchanged to the selected endpoint. A request is immutable once submitted
/// and is correlated to its outcome by [`Request::id`].
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct Request {
    /// Correlation id, unique per request.
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,
    /// Name of the remote operation to invoke.
    #[builder(setter(into))]
    pub op: String,
    /// Opaque JSON payload forwarded to the server unchanged.
    #[builder(default = Value::Null)]
    pub payload: Value,
    /// When the request was created.
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl Request {
    /// Create a request with a fresh correlation id.
    pub fn new(op: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            op: op.into(),
            payload,
            created_at: Utc::now(),
        }
    }
}

/// The terminal outcome of a successful round-trip.
///
/// A response exists only for a request that the server processed; failures
/// surface as typed errors instead, never as a fabricated response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Id of the request this response answers.
    pub request_id: Uuid,
    /// Opaque payload returned by the server.
    pub payload: Value,
}

impl Response {
    /// Build a response correlated to `request`.
    #[must_use]
    pub const fn for_request(request: &Request, payload: Value) -> Self {
        Self {
            request_id: request.id,
            payload,
        }
    }
}
