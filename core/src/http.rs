//! HTTP request and response descriptors exchanged with a [`Transport`].
//!
//! # Design
//! These types describe one call to the identity service as plain data. The
//! dispatcher builds an `HttpRequest` with a path relative to the versioned
//! base URL, and the transport hands back an `HttpResponse` without judging
//! its status code. Keeping both sides as data lets tests swap the network
//! for a stub that records requests and replays canned responses.
//!
//! [`Transport`]: crate::transport::Transport

use std::time::Duration;

use serde_json::{Map, Value};

/// Caller-supplied fields for one operation, keyed by the service's field
/// names. Sent as the query string for GET and as a JSON body otherwise.
pub type Params = Map<String, Value>;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether params travel in the query string rather than the body.
    pub fn params_in_query(self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

/// An HTTP request described as plain data.
///
/// `path` is relative to the base URL held by the transport, e.g.
/// `getStatus/order-1/ExtendedList`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub params: Params,
    pub timeout: Option<Duration>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the `Content-Type` media type is `application/json`,
    /// ignoring parameters such as `charset`.
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .and_then(|value| value.split(';').next())
            .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
    }

    /// Parse the body as JSON. Parsing happens on each call; the raw bytes
    /// stay untouched.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
