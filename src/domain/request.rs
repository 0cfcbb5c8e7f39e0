//! Inbound export request model

use crate::config::{secret_string, SecretString};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// HTTP methods accepted by the export endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMethod {
    Get,
    Post,
    Options,
}

impl ExportMethod {
    /// Preflight requests bypass the export state machine
    pub fn is_preflight(&self) -> bool {
        matches!(self, ExportMethod::Options)
    }
}

impl FromStr for ExportMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(ExportMethod::Get),
            "POST" => Ok(ExportMethod::Post),
            "OPTIONS" => Ok(ExportMethod::Options),
            other => Err(format!("Unsupported export method: {other}")),
        }
    }
}

impl fmt::Display for ExportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportMethod::Get => "GET",
            ExportMethod::Post => "POST",
            ExportMethod::Options => "OPTIONS",
        };
        write!(f, "{name}")
    }
}

/// A single export trigger, created per inbound call
///
/// The API key is held as a secret so it never shows up in logs.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Correlation id used in log fields
    pub export_id: Uuid,
    pub method: ExportMethod,
    /// Value of the `Origin` header, if any
    pub origin: Option<String>,
    /// Value of the API key header, if any
    pub api_key: Option<SecretString>,
}

impl ExportRequest {
    pub fn new(method: ExportMethod) -> Self {
        Self {
            export_id: Uuid::new_v4(),
            method,
            origin: None,
            api_key: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(secret_string(api_key.into()));
        self
    }

    /// Origin to echo back, empty when the caller sent none
    pub fn origin_or_empty(&self) -> &str {
        self.origin.as_deref().unwrap_or("")
    }
}
