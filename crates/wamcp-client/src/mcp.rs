//! MCP-backed transport implementation.
//!
//! Connects to servers speaking the Model Context Protocol via the `rmcp`
//! SDK, either by spawning a child process (stdio) or over streamable HTTP.
//! A [`Request`]'s operation name maps to an MCP tool name and its payload to
//! the tool arguments; this is one possible wire mapping behind the
//! [`Transport`] seam, not a contract of the client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::{
    RoleClient, ServiceExt,
    model::CallToolRequestParams,
    service::{RunningService, ServiceError},
    transport::{
        ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess,
        streamable_http_client::StreamableHttpClientTransportConfig,
    },
};
use secrecy::ExposeSecret;
use serde_json::Value;

use wamcp_common::{Credentials, EndpointConfig, Request, TransportConfig};

use crate::error::{ConnectionError, RequestError};
use crate::transport::{Connector, Transport};

/// Connector that builds MCP sessions from endpoint configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct McpConnector;

#[async_trait]
impl Connector for McpConnector {
    async fn connect(
        &self,
        endpoint: &EndpointConfig,
    ) -> Result<Box<dyn Transport>, ConnectionError> {
        log::info!("Connecting to MCP server '{}'...", endpoint.id);

        let service = match &endpoint.transport {
            TransportConfig::Stdio { command, args, env } => {
                let cmd = tokio::process::Command::new(command);
                let cmd = cmd.configure(|c| {
                    c.args(args).envs(env.clone());

                    if let Some(ref cwd) = endpoint.working_directory {
                        c.current_dir(cwd);
                    }
                });

                let transport =
                    TokioChildProcess::new(cmd).map_err(|e| ConnectionError::Spawn {
                        id: endpoint.id.clone(),
                        source: e,
                    })?;
                ().serve(transport)
                    .await
                    .map_err(|e| ConnectionError::Unreachable {
                        id: endpoint.id.clone(),
                        reason: e.to_string(),
                    })?
            }
            TransportConfig::Http { url } => {
                let client = http_client(&endpoint.id, endpoint.credentials.as_ref())?;
                let transport = StreamableHttpClientTransport::with_client(
                    client,
                    StreamableHttpClientTransportConfig::with_uri(url.clone()),
                );
                ().serve(transport)
                    .await
                    .map_err(|e| ConnectionError::Unreachable {
                        id: endpoint.id.clone(),
                        reason: e.to_string(),
                    })?
            }
        };

        if let Some(info) = service.peer_info() {
            log::info!(
                "Connected to MCP server '{}' - {}",
                endpoint.id,
                info.server_info.name
            );
        }

        Ok(Box::new(McpTransport {
            endpoint_id: endpoint.id.clone(),
            service,
        }))
    }
}

/// Build an HTTP client carrying the endpoint's credential headers.
fn http_client(
    endpoint_id: &str,
    credentials: Option<&Credentials>,
) -> Result<reqwest::Client, ConnectionError> {
    let invalid = |reason: String| ConnectionError::InvalidCredentials {
        id: endpoint_id.to_string(),
        reason,
    };

    let mut headers = HeaderMap::new();
    if let Some(credentials) = credentials {
        if let Some(token) = &credentials.bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| invalid(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        for (name, secret) in &credentials.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| invalid(format!("header '{name}': {e}")))?;
            let mut value = HeaderValue::from_str(secret.expose_secret())
                .map_err(|e| invalid(format!("header '{name}': {e}")))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| ConnectionError::Unreachable {
            id: endpoint_id.to_string(),
            reason: e.to_string(),
        })
}

/// One live MCP session.
pub struct McpTransport {
    endpoint_id: String,
    service: RunningService<RoleClient, ()>,
}

#[async_trait]
impl Transport for McpTransport {
    async fn call(&self, request: &Request) -> Result<Value, RequestError> {
        log::debug!(
            "Calling '{}' on server '{}' (request {})",
            request.op,
            self.endpoint_id,
            request.id
        );

        let arguments = match request.payload.clone() {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(RequestError::InvalidPayload(format!(
                    "expected a JSON object or null, got {other}"
                )));
            }
        };

        let params = CallToolRequestParams {
            meta: None,
            name: request.op.clone().into(),
            arguments,
            task: None,
        };

        let result = self
            .service
            .peer()
            .call_tool(params)
            .await
            .map_err(|e| match e {
                ServiceError::McpError(err) => RequestError::Remote {
                    message: err.message.to_string(),
                },
                other => RequestError::Transport(other.to_string()),
            })?;

        if result.is_error.unwrap_or(false) {
            return Err(RequestError::Remote {
                message: format!("{:?}", result.content),
            });
        }

        serde_json::to_value(&result.content)
            .map_err(|e| RequestError::InvalidResponse(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), ConnectionError> {
        let Self {
            endpoint_id,
            service,
        } = *self;
        log::debug!("Closing MCP session for '{endpoint_id}'");
        service.cancel().await.map_err(|e| ConnectionError::Shutdown {
            id: endpoint_id,
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
