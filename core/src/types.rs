//! Request payloads and result shapes for the identity service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document that arrives either as raw bytes (a single PDF) or as a JSON
/// document (several documents bundled by the service).
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Json(Value),
    Bytes(Vec<u8>),
}

impl Artifact {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Artifact::Json(value) => Some(value),
            Artifact::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Artifact::Bytes(bytes) => Some(bytes),
            Artifact::Json(_) => None,
        }
    }
}

/// Payload for checking whether someone already holds a signing account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignmeUserCheck {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "signatureType", skip_serializing_if = "Option::is_none")]
    pub signature_type: Option<String>,
}
