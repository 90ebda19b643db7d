//! Static operation definitions: path variants, input rules and outcome
//! tables.
//!
//! # Design
//! An `Operation` is pure data compiled into the crate. `build` turns caller
//! input into an `HttpRequest` (validation first, then variant resolution) and
//! `check_status` interprets the answer, so both halves can be exercised
//! without a network. `IdentityClient` glues them to a `Transport`.

use std::time::Duration;

use tracing::warn;

use crate::error::ClientError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Params};
use crate::validation::{self, Ruleset};

pub const DEFAULT_VARIANT: &str = "Default";

/// Message for statuses missing from an outcome table.
pub const GENERIC_FAILURE: &str = "Request failed";

/// One logical API action.
#[derive(Debug)]
pub struct Operation {
    pub name: &'static str,
    pub method: HttpMethod,
    /// First path segment; the order id, if any, follows it.
    pub path: &'static str,
    /// Variant name to path suffix. `""` selects the bare path. Empty when
    /// the operation only has the default path.
    pub variants: &'static [(&'static str, &'static str)],
    pub rules: Ruleset,
    pub success: u16,
    /// Status code to meaning, as documented by the service.
    pub outcomes: &'static [(u16, &'static str)],
}

impl Operation {
    /// Documented meaning of `status`, if the table lists it.
    pub fn outcome(&self, status: u16) -> Option<&'static str> {
        self.outcomes
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, message)| *message)
    }

    /// Names of the variants this operation accepts.
    pub fn variant_names(&self) -> Vec<&'static str> {
        if self.variants.is_empty() {
            return vec![DEFAULT_VARIANT];
        }
        self.variants.iter().map(|(name, _)| *name).collect()
    }

    /// Relative path for `order_id` and `variant`.
    ///
    /// The order id must be a single non-empty path segment: no `/`, `\`,
    /// `?` or `#`, and not `.` or `..`.
    pub fn resolve_path(&self, order_id: Option<&str>, variant: &str) -> Result<String, ClientError> {
        if let Some(id) = order_id {
            if !is_path_segment(id) {
                return Err(ClientError::InvalidOrderId(id.to_string()));
            }
        }
        let suffix = if self.variants.is_empty() {
            (variant == DEFAULT_VARIANT).then_some("")
        } else {
            self.variants
                .iter()
                .find(|(name, _)| *name == variant)
                .map(|(_, suffix)| *suffix)
        };
        let suffix = suffix.ok_or_else(|| ClientError::UnknownVariant {
            variant: variant.to_string(),
            operation: self.name,
        })?;

        let mut path = self.path.to_string();
        if let Some(id) = order_id {
            path.push('/');
            path.push_str(id);
        }
        if !suffix.is_empty() {
            path.push('/');
            path.push_str(suffix);
        }
        Ok(path)
    }

    /// Validate `params` and resolve the path. Fails before any I/O.
    pub fn build(
        &self,
        order_id: Option<&str>,
        variant: &str,
        params: Params,
        timeout: Option<Duration>,
    ) -> Result<HttpRequest, ClientError> {
        if !self.rules.is_empty() {
            validation::validate(&params, self.rules)?;
        }
        let path = self.resolve_path(order_id, variant)?;
        Ok(HttpRequest {
            method: self.method,
            path,
            params,
            timeout,
        })
    }

    /// `Ok` only for the success status; every other status becomes a
    /// `ClientError::Request` with the table's message.
    pub fn check_status(&self, response: &HttpResponse) -> Result<(), ClientError> {
        if response.status == self.success {
            return Ok(());
        }
        let message = self.outcome(response.status).unwrap_or(GENERIC_FAILURE);
        warn!(operation = self.name, status = response.status, message, "request rejected");
        Err(ClientError::Request {
            status: response.status,
            message: message.to_string(),
        })
    }
}

fn is_path_segment(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\', '?', '#'])
}
