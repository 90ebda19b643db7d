//! The network seam: one authenticated HTTP round-trip per call.
//!
//! # Design
//! `Transport` never interprets status codes. A 4xx or 5xx answer is a
//! perfectly good `HttpResponse`; only failing to get an answer at all is a
//! `TransportError`. The dispatcher decides what a status means.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};

use crate::config::Credentials;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one HTTP request and returns whatever the service answered.
pub trait Transport {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).request(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).request(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).request(request)
    }
}

/// Blocking transport backed by a ureq agent, sending HTTP Basic
/// authentication on every call.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
    credentials: Credentials,
    authorization: String,
}

impl UreqTransport {
    pub fn new(credentials: Credentials) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self::with_agent(agent, credentials)
    }

    /// Use a preconfigured agent. The agent must not treat HTTP status codes
    /// as errors, otherwise outcome tables never see 4xx/5xx answers.
    pub fn with_agent(agent: Agent, credentials: Credentials) -> Self {
        let token = STANDARD.encode(format!("{}:{}", credentials.username(), credentials.password()));
        Self {
            agent,
            credentials,
            authorization: format!("Basic {token}"),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn prepare<B>(&self, builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
        let mut builder = builder.header("Authorization", &self.authorization);
        if request.method.params_in_query() {
            for (key, value) in &request.params {
                builder = builder.query(key, query_value(value));
            }
        }
        if let Some(timeout) = request.timeout {
            builder = builder.config().timeout_global(Some(timeout)).build();
        }
        builder
    }
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Transport for UreqTransport {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = self
            .credentials
            .endpoint(&request.path)
            .map_err(|e| TransportError::Request(format!("invalid path `{}`: {e}", request.path)))?;
        debug!(method = request.method.as_str(), %url, "sending request");

        let result = match request.method {
            HttpMethod::Get => self.prepare(self.agent.get(url.as_str()), request).call(),
            HttpMethod::Delete if request.params.is_empty() => {
                self.prepare(self.agent.delete(url.as_str()), request).call()
            }
            HttpMethod::Delete => send_json(
                self.prepare(self.agent.delete(url.as_str()), request).force_send_body(),
                request,
            )?,
            HttpMethod::Post => send_json(self.prepare(self.agent.post(url.as_str()), request), request)?,
            HttpMethod::Put => send_json(self.prepare(self.agent.put(url.as_str()), request), request)?,
            HttpMethod::Patch => send_json(self.prepare(self.agent.patch(url.as_str()), request), request)?,
        };

        let mut response = result.map_err(|e| {
            warn!(method = request.method.as_str(), %url, error = %e, "transport failure");
            match e {
                ureq::Error::Timeout(_) => TransportError::Timeout,
                other => TransportError::Connection(other.to_string()),
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        // Video artifacts easily exceed ureq's default body limit.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => TransportError::Timeout,
                other => TransportError::Body(other.to_string()),
            })?;

        Ok(HttpResponse { status, headers, body })
    }
}

fn send_json(
    builder: RequestBuilder<ureq::typestate::WithBody>,
    request: &HttpRequest,
) -> Result<Result<ureq::http::Response<ureq::Body>, ureq::Error>, TransportError> {
    let body = serde_json::to_vec(&request.params)
        .map_err(|e| TransportError::Request(format!("failed to encode body: {e}")))?;
    Ok(builder.content_type("application/json").send(&body[..]))
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
