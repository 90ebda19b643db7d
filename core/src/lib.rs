//! Blocking client for a remote identity-verification service.
//!
//! # Overview
//! Turns logical operations ("confirm sign with TAN", "fetch the signed
//! PDF") into Basic-authenticated REST calls against a versioned base URL,
//! and maps each answer's status code to a typed result or a descriptive
//! error.
//!
//! # Design
//! - `Transport` is the only I/O seam. `UreqTransport` is the production
//!   implementation; tests plug in stubs that record requests.
//! - Operations are static data in [`catalog`]: path variants, input rules
//!   and the documented status -> meaning table.
//! - Input rules and path variants are checked before any request is sent.
//! - `IdentityClient` keeps no state between calls; order lifecycle rules
//!   live on the service and reach callers as statuses.

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod operation;
pub mod transport;
pub mod types;
pub mod validation;

pub use client::IdentityClient;
pub use config::Credentials;
pub use error::{ClientError, ConfigError, TransportError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Params};
pub use operation::{Operation, DEFAULT_VARIANT};
pub use transport::{Transport, UreqTransport};
pub use types::{Artifact, SignmeUserCheck};
pub use validation::Rule;
