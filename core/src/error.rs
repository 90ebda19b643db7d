//! Error types for the identity service client.
//!
//! # Design
//! Failures are split by where they happen. `ConfigError` only occurs while
//! building credentials, before any call. `ValidationError` and
//! `ClientError::UnknownVariant` and `ClientError::InvalidOrderId` are raised
//! before the network is touched.
//! `TransportError` means no HTTP response was received at all, while
//! `ClientError::Request` means the service answered with a status other than
//! the operation's success code.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Missing or malformed credentials, raised once at construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0}")]
    Missing(&'static str),

    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Caller input rejected by an operation's ruleset.
///
/// Holds every failing field, each with every rule it failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    pub(crate) fn add(&mut self, field: &str, message: String) {
        self.errors.entry(field.to_string()).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages for one field, empty if the field passed.
    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.values().flatten().map(String::as_str).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl std::error::Error for ValidationError {}

/// The request never produced an HTTP response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    /// The request could not be put on the wire, e.g. an unencodable body.
    #[error("invalid request: {0}")]
    Request(String),
}

/// Errors returned by `IdentityClient` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid parameters: {0}")]
    Validation(#[from] ValidationError),

    #[error("Variant {variant} does not exist for {operation} method")]
    UnknownVariant {
        variant: String,
        operation: &'static str,
    },

    /// The id cannot be used as a single path segment.
    #[error("invalid order id `{0}`")]
    InvalidOrderId(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with a status other than the success code.
    /// `message` comes from the operation's outcome table, or is
    /// `"Request failed"` for statuses the table does not list.
    #[error("HTTP {status}: {message}")]
    Request { status: u16, message: String },

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ClientError {
    /// HTTP status of a `Request` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_collects_per_field() {
        let mut err = ValidationError::default();
        err.add("tan", "The tan must be at least 6 characters.".to_string());
        err.add("tan", "The tan must be a string.".to_string());
        err.add("mobile", "The mobile field is required.".to_string());

        assert_eq!(err.messages("tan").len(), 2);
        assert_eq!(err.messages("email"), &[] as &[String]);
        assert_eq!(err.fields().collect::<Vec<_>>(), vec!["mobile", "tan"]);
        assert!(err.to_string().starts_with("The mobile field is required."));
    }

    #[test]
    fn unknown_variant_message_names_both() {
        let err = ClientError::UnknownVariant {
            variant: "Bogus".to_string(),
            operation: "getIdentData",
        };
        assert_eq!(err.to_string(), "Variant Bogus does not exist for getIdentData method");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn invalid_order_id_names_the_id() {
        let err = ClientError::InvalidOrderId("../admin".to_string());
        assert_eq!(err.to_string(), "invalid order id `../admin`");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn request_error_exposes_status() {
        let err = ClientError::Request {
            status: 409,
            message: "Wrong TAN given".to_string(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "HTTP 409: Wrong TAN given");
    }
}
