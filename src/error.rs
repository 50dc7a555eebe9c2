// Mediation error types
use serde_json::{json, Value};
use thiserror::Error;

use crate::types::codes;

/// Authentication failures raised while decorating an outbound message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Credential '{field}' could not be resolved from property '{property}'")]
    UnresolvedCredential { field: &'static str, property: String },

    #[error("Credential '{0}' contains a ':' which is not allowed in a basic auth username")]
    InvalidUsername(String),
}

/// Errors raised anywhere in the mediation pipeline
#[derive(Debug, Error)]
pub enum MediationError {
    #[error("Mediator '{mediator}' failed: {message}")]
    MediatorFailure { mediator: String, message: String },

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Delivery to endpoint '{endpoint}' failed: {message}")]
    Delivery { endpoint: String, message: String },

    #[error("Sequence not found: {0}")]
    SequenceNotFound(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("No resource matched request: {0}")]
    RoutingFailure(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid endpoint address: {0}")]
    InvalidAddress(#[from] url::ParseError),
}

impl MediationError {
    pub fn mediator_failure(mediator: impl Into<String>, message: impl Into<String>) -> Self {
        MediationError::MediatorFailure {
            mediator: mediator.into(),
            message: message.into(),
        }
    }

    pub fn delivery(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        MediationError::Delivery {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn routing_failure(message: impl Into<String>) -> Self {
        MediationError::RoutingFailure(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        MediationError::Configuration(message.into())
    }

    /// True for the dedicated authentication failure kind
    pub fn is_auth(&self) -> bool {
        matches!(self, MediationError::Auth(_))
    }

    /// Numeric failure code stamped on the context as `ERROR_CODE`
    pub fn error_code(&self) -> u32 {
        match self {
            MediationError::MediatorFailure { .. } => codes::MEDIATOR_FAILURE,
            MediationError::Auth(_) => codes::ENDPOINT_AUTH_FAILURE,
            MediationError::Delivery { .. } => codes::ENDPOINT_DELIVERY_FAILURE,
            MediationError::SequenceNotFound(_) => codes::SEQUENCE_NOT_FOUND,
            MediationError::TemplateNotFound(_) => codes::TEMPLATE_NOT_FOUND,
            MediationError::RoutingFailure(_) => codes::ROUTING_FAILURE,
            MediationError::Configuration(_) | MediationError::InvalidAddress(_) => {
                codes::CONFIGURATION_ERROR
            }
        }
    }

    /// Stable short name for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            MediationError::MediatorFailure { .. } => "MEDIATOR_FAILURE",
            MediationError::Auth(_) => "AUTH_FAILURE",
            MediationError::Delivery { .. } => "DELIVERY_FAILURE",
            MediationError::SequenceNotFound(_) => "SEQUENCE_NOT_FOUND",
            MediationError::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            MediationError::RoutingFailure(_) => "ROUTING_FAILURE",
            MediationError::Configuration(_) => "CONFIGURATION_ERROR",
            MediationError::InvalidAddress(_) => "INVALID_ADDRESS",
        }
    }

    /// Structured detail recorded on the context when a fault handler runs
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "code": self.error_code(),
            "kind": self.kind(),
            "message": self.to_string(),
        })
    }
}
