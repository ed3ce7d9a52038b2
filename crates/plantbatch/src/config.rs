//! Configuration types for Plantbatch exports.
//!
//! This module provides configuration structures that control where diagrams
//! are rendered and how the rendering server is reached. All types implement
//! [`serde::Deserialize`] for loading from external sources; every field is
//! optional and falls back to its default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining all sections.
//! - [`ServerConfig`] - Rendering server address and transport [`Method`].
//! - [`HttpConfig`] - Timeout and user agent for render requests.
//! - [`ContainerConfig`] - Container tool, image and ports for a local server.
//! - [`ProbeConfig`] - Readiness polling of a freshly started server.
//!
//! # Example
//!
//! ```
//! # use plantbatch::{config::AppConfig, transport::Method};
//! let config = AppConfig::default();
//! assert_eq!(config.server().method(), Method::Auto);
//! assert_eq!(config.container().host_port(), 18080);
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::transport::Method;

/// Public PlantUML server used when no other server is configured.
pub const PUBLIC_SERVER: &str = "https://www.plantuml.com/plantuml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    server: ServerConfig,
    http: HttpConfig,
    container: ContainerConfig,
    probe: ProbeConfig,
}

impl AppConfig {
    /// Returns the server configuration.
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    /// Returns the HTTP configuration.
    pub fn http(&self) -> &HttpConfig {
        &self.http
    }

    /// Returns the container configuration.
    pub fn container(&self) -> &ContainerConfig {
        &self.container
    }

    /// Returns the readiness probe configuration.
    pub fn probe(&self) -> &ProbeConfig {
        &self.probe
    }

    /// Returns the server configuration for modification.
    pub fn server_mut(&mut self) -> &mut ServerConfig {
        &mut self.server
    }

    /// Returns the container configuration for modification.
    pub fn container_mut(&mut self) -> &mut ContainerConfig {
        &mut self.container
    }
}

/// Rendering server selection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of an existing server. Takes precedence over a container.
    url: Option<String>,

    method: Method,
}

impl ServerConfig {
    /// Returns the explicitly configured server URL, if any.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Returns the transport method.
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = Some(url.into());
    }

    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }
}

/// Settings for render requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    timeout_secs: u64,
    user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("plantbatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Returns the upper bound for a single render request.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// Settings for launching a disposable local rendering server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Container tool executable, looked up on `PATH`.
    tool: String,
    image: String,
    /// Port published on the host.
    host_port: u16,
    /// Port the server listens on inside the container.
    container_port: u16,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            tool: "docker".to_string(),
            image: "plantuml/plantuml-server".to_string(),
            host_port: 18080,
            container_port: 8080,
        }
    }
}

impl ContainerConfig {
    /// Creates a new [`ContainerConfig`].
    ///
    /// # Arguments
    ///
    /// * `tool` - Container tool executable, e.g. `docker` or `podman`.
    /// * `image` - Image reference of the rendering server.
    /// * `host_port` - Host port the server is published on.
    /// * `container_port` - Port the server listens on inside the container.
    pub fn new(
        tool: impl Into<String>,
        image: impl Into<String>,
        host_port: u16,
        container_port: u16,
    ) -> Self {
        Self {
            tool: tool.into(),
            image: image.into(),
            host_port,
            container_port,
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn host_port(&self) -> u16 {
        self.host_port
    }

    pub fn container_port(&self) -> u16 {
        self.container_port
    }

    pub fn set_image(&mut self, image: impl Into<String>) {
        self.image = image.into();
    }

    pub fn set_host_port(&mut self, port: u16) {
        self.host_port = port;
    }

    /// Returns the base URL a launched server is reachable on.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.host_port)
    }
}

/// Readiness polling of a launched server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    interval_ms: u64,
    timeout_ms: u64,
    request_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_500,
            timeout_ms: 60_000,
            request_timeout_ms: 2_000,
        }
    }
}

impl ProbeConfig {
    /// Creates a new [`ProbeConfig`].
    ///
    /// # Arguments
    ///
    /// * `interval` - Pause between two probe requests.
    /// * `timeout` - Total time to wait for the server.
    /// * `request_timeout` - Upper bound for one probe request.
    pub fn new(interval: Duration, timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            interval_ms: duration_millis(interval),
            timeout_ms: duration_millis(timeout),
            request_timeout_ms: duration_millis(request_timeout),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
