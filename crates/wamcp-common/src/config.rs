//! Client configuration types.
//!
//! The connection manager is handed an explicitly constructed [`ClientConfig`]
//! at creation time; there is no process-wide configuration state. A config
//! names one or more server endpoints plus a small set of global settings.
//!
//! ## Configuration File Formats
//!
//! Configuration can be loaded from TOML, YAML, or JSON files using
//! [`ClientConfig::from_file`], which picks the parser from the extension.
//!
//! ## Example TOML Configuration
//!
//! ```toml
//! [settings]
//! connect_retries = 3
//!
//! # Hosted server over streamable HTTP
//! [[endpoints]]
//! id = "whatsapp"
//! name = "WhatsApp bridge"
//! transport = "http"
//! url = "https://example.com/mcp"
//!
//! [endpoints.credentials]
//! bearer_token = "secret-token"
//!
//! [endpoints.credentials.headers]
//! x-whatsapp-phone-id = "123456"
//!
//! # Local server spawned over stdio
//! [[endpoints]]
//! id = "local"
//! name = "Local server"
//! transport = "stdio"
//! command = "python"
//! args = ["server.py"]
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Top-level client configuration.
///
/// Holds the list of endpoints the client may dispatch to and global settings
/// for connection behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Configured server endpoints, in dispatch order.
    pub endpoints: Vec<EndpointConfig>,
    /// Global client settings.
    #[serde(default)]
    pub settings: Settings,
}

/// One addressable server instance the client may connect to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Unique identifier for this endpoint.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// How to reach the endpoint.
    #[serde(flatten)]
    pub transport: TransportConfig,
    /// Opaque credentials handed to the transport.
    #[serde(default)]
    pub credentials: Option<Credentials>,
    /// Working directory for a spawned server process.
    pub working_directory: Option<PathBuf>,
}

/// Transport address for an endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Spawn a server process and talk over stdin/stdout.
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// Connect over streamable HTTP.
    Http { url: String },
}

/// Credentials attached to an endpoint.
///
/// The client never interprets these; they are forwarded to the transport
/// as-is. Secrets are not serialized back out.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Credentials {
    /// Bearer token for an `Authorization` header.
    #[serde(skip_serializing, default)]
    pub bearer_token: Option<SecretString>,
    /// Additional headers sent with every request on this endpoint.
    #[serde(skip_serializing, default)]
    pub headers: HashMap<String, SecretString>,
}

/// Global settings for client behavior.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Extra connection attempts after a failed connect.
    ///
    /// This is the only retry knob; requests themselves are never retried.
    #[serde(default)]
    pub connect_retries: usize,
    /// Per-request timeout in seconds, if any.
    pub request_timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_toml_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from file based on extension
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or has an
    /// unsupported extension.
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            Some("toml") => Self::from_toml_file(path),
            _ => Err(anyhow::anyhow!(
                "Unsupported config file format. Use .yaml, .yml, .json, or .toml"
            )),
        }
    }

    /// Look up an endpoint by id.
    #[must_use]
    pub fn endpoint(&self, id: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|e| e.id == id)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns an error on an empty endpoint list, duplicate endpoint ids,
    /// an unparseable HTTP url, or an empty stdio command.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.endpoints.is_empty() {
            return Err(anyhow::anyhow!("No endpoints configured"));
        }

        let mut seen_ids = std::collections::HashSet::new();
        for endpoint in &self.endpoints {
            if !seen_ids.insert(&endpoint.id) {
                return Err(anyhow::anyhow!(
                    "Duplicate endpoint id found: {}",
                    endpoint.id
                ));
            }

            match &endpoint.transport {
                TransportConfig::Http { url } => {
                    url::Url::parse(url).map_err(|e| {
                        anyhow::anyhow!("Endpoint '{}' has an invalid url: {e}", endpoint.id)
                    })?;
                }
                TransportConfig::Stdio { command, .. } => {
                    if command.is_empty() {
                        return Err(anyhow::anyhow!(
                            "Endpoint '{}' has an empty command",
                            endpoint.id
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}
