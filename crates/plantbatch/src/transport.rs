//! Rendering requests against a PlantUML server.
//!
//! Two wire protocols are supported:
//!
//! - `POST {endpoint}/png` with the raw diagram text as the request body.
//! - `GET {endpoint}/png/{payload}` with the diagram text encoded by
//!   [`encoding::encode`].
//!
//! Some servers answer with an error page and a `200` status, so a response
//! only counts as a rendered image when its body starts with the PNG
//! signature. [`Method::Auto`] tries POST first and falls back to a single
//! GET.

use std::{fmt, str::FromStr};

use log::{debug, trace};
use serde::Deserialize;
use thiserror::Error;
use ureq::Agent;

use plantbatch_core::encoding;

use crate::config::HttpConfig;

/// PNG file signature.
pub const PNG_MAGIC: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Transport method used to reach the rendering server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Method {
    /// POST first, then GET if POST did not produce an image.
    #[default]
    Auto,
    Post,
    Get,
}

/// Error returned when parsing an unknown [`Method`] name.
#[derive(Debug, Clone, Error)]
#[error("unknown transport method `{0}` (expected AUTO, POST or GET)")]
pub struct ParseMethodError(String);

impl FromStr for Method {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AUTO" => Ok(Self::Auto),
            "POST" => Ok(Self::Post),
            "GET" => Ok(Self::Get),
            _ => Err(ParseMethodError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = ParseMethodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "AUTO",
            Self::Post => "POST",
            Self::Get => "GET",
        };
        f.write_str(name)
    }
}

/// Failure to obtain an image for one diagram.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("server did not return an image on POST")]
    NotAnImage,

    #[error("GET failed: HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("{method} request failed: {source}")]
    Request {
        method: Method,
        #[source]
        source: ureq::Error,
    },
}

/// Produces image bytes for diagram source text.
pub trait Renderer {
    /// Render one diagram.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when no image could be obtained.
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError>;
}

/// [`Renderer`] backed by a PlantUML server reached over HTTP.
pub struct HttpRenderer {
    agent: Agent,
    endpoint: String,
    method: Method,
    user_agent: String,
}

impl fmt::Debug for HttpRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRenderer")
            .field("endpoint", &self.endpoint)
            .field("method", &self.method)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl HttpRenderer {
    /// Create a renderer for the server at `endpoint`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Server base URL; a trailing `/` is ignored
    /// * `method` - Transport method
    /// * `config` - Request timeout and user agent
    pub fn new(endpoint: &str, method: Method, config: &HttpConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            endpoint: normalize_endpoint(endpoint),
            method,
            user_agent: config.user_agent().to_string(),
        }
    }

    /// Returns the normalized server base URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the transport method.
    pub fn method(&self) -> Method {
        self.method
    }

    fn post(&self, source: &str) -> Result<Vec<u8>, RenderError> {
        let url = format!("{}/png", self.endpoint);
        trace!(url; "POST render request");

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "text/plain; charset=utf-8")
            .header("Accept", "image/png")
            .header("User-Agent", self.user_agent.as_str())
            .send(source.as_bytes())
            .map_err(|source| RenderError::Request {
                method: Method::Post,
                source,
            })?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|source| RenderError::Request {
                method: Method::Post,
                source,
            })?;

        if is_png(&body) {
            Ok(body)
        } else {
            debug!(status; "POST response is not an image");
            Err(RenderError::NotAnImage)
        }
    }

    fn get(&self, source: &str) -> Result<Vec<u8>, RenderError> {
        let url = png_url(&self.endpoint, &encoding::encode(source));
        trace!(url; "GET render request");

        let mut response = self
            .agent
            .get(url.as_str())
            .header("User-Agent", self.user_agent.as_str())
            .call()
            .map_err(|source| RenderError::Request {
                method: Method::Get,
                source,
            })?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|source| RenderError::Request {
                method: Method::Get,
                source,
            })?;

        if is_png(&body) {
            Ok(body)
        } else {
            debug!(status; "GET response is not an image");
            Err(RenderError::HttpStatus { status })
        }
    }
}

impl Renderer for HttpRenderer {
    fn render(&self, source: &str) -> Result<Vec<u8>, RenderError> {
        match self.method {
            Method::Post => self.post(source),
            Method::Get => self.get(source),
            Method::Auto => self.post(source).or_else(|err| {
                debug!(error:% = err; "POST failed, falling back to GET");
                self.get(source)
            }),
        }
    }
}

/// Returns `true` if `bytes` starts with the PNG signature.
pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(PNG_MAGIC)
}

/// Build the GET image URL for an encoded payload.
pub fn png_url(endpoint: &str, payload: &str) -> String {
    format!("{}/png/{payload}", endpoint.trim_end_matches('/'))
}

/// Strip trailing slashes from a server base URL.
pub fn normalize_endpoint(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}
