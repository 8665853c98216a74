//! # wamcp-common
//!
//! Shared types for the wamcp client: requests, responses, and the
//! configuration surface for the endpoints the client talks to.
//!
//! The remote server is treated as an opaque collaborator. A [`Request`]
//! carries an operation name and an arbitrary JSON payload; the matching
//! [`Response`] carries the payload the server returned, correlated by the
//! request's id. Nothing in this crate interprets either payload.
//!
//! ## Example
//!
//! ```
//! use wamcp_common::{ClientConfig, EndpointConfig, Request, TransportConfig};
//!
//! // Build a request for an opaque server-side operation
//! let request = Request::new("send_message", serde_json::json!({
//!     "to": "+15555550100",
//!     "body": "hello",
//! }));
//! assert_eq!(request.op, "send_message");
//!
//! // Describe an endpoint the client may connect to
//! let endpoint = EndpointConfig {
//!     id: "primary".to_string(),
//!     name: "Primary server".to_string(),
//!     transport: TransportConfig::Http {
//!         url: "https://example.com/mcp".to_string(),
//!     },
//!     credentials: None,
//!     working_directory: None,
//! };
//!
//! let config = ClientConfig {
//!     endpoints: vec![endpoint],
//!     settings: Default::default(),
//! };
//! assert_eq!(config.endpoints.len(), 1);
//! ```

/// Endpoint and client configuration types.
///
/// Contains the configuration object handed to the connection manager at
/// construction time, loadable from TOML, YAML, or JSON files.
pub mod config;
/// Request and response envelope types.
///
/// Provides the correlated request/response pair that flows between the
/// dispatcher and the remote server.
pub mod request;

pub use config::{ClientConfig, Credentials, EndpointConfig, Settings, TransportConfig};
pub use request::{Request, Response};
