//! # wamcp-client
//!
//! Asynchronous request/response client that multiplexes opaque operations
//! across one or more remote MCP server endpoints.
//!
//! Two components compose trivially:
//!
//! - [`ConnectionManager`] holds the endpoint configuration, establishes and
//!   tears down sessions, and exposes one send-and-await-response operation
//!   per logical request.
//! - [`Dispatcher`] accepts a caller's request, picks a target endpoint
//!   (round-robin, or an explicit id), forwards it through the manager, and
//!   returns the response or a typed failure.
//!
//! The wire protocol is pluggable behind the [`Transport`] and [`Connector`]
//! traits; [`McpConnector`] is the shipped implementation over the `rmcp`
//! SDK. Each request resolves to exactly one terminal outcome: a response
//! correlated by the request's id, or a [`DispatchError`]. Dropping a pending
//! dispatch cancels it and releases the underlying session.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wamcp_client::{ConnectionManager, Dispatcher, McpConnector};
//! use wamcp_common::{ClientConfig, Request};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_file(std::path::Path::new("wamcp.toml"))?;
//! let manager = Arc::new(ConnectionManager::new(config, Arc::new(McpConnector)));
//! manager.connect_all().await?;
//!
//! let dispatcher = Dispatcher::new(Arc::clone(&manager));
//! let response = dispatcher
//!     .dispatch(Request::new("ping", serde_json::json!({})), None)
//!     .await?;
//! println!("{}", response.payload);
//!
//! manager.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod error;
pub mod manager;
pub mod mcp;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatcher::Dispatcher;
pub use error::{ConnectionError, DispatchError, RequestError};
pub use manager::{ConnectionManager, ConnectionState};
pub use mcp::{McpConnector, McpTransport};
pub use transport::{Connector, Transport};
