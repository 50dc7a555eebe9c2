/// Shared constants and small types used across the mediation core

use serde::{Deserialize, Serialize};

/// Property keys the core reads and writes on a message context
pub mod keys {
    /// Name of the resource picked by the REST dispatcher
    pub const SELECTED_RESOURCE: &str = "SELECTED_RESOURCE";

    /// Failure details stamped by the failure channel and fault handlers
    pub const ERROR_CODE: &str = "ERROR_CODE";
    pub const ERROR_MESSAGE: &str = "ERROR_MESSAGE";
    pub const ERROR_DETAIL: &str = "ERROR_DETAIL";

    /// Set when the debugger claims a message at a breakpoint
    pub const DEBUGGER_DIVERTED_AT: &str = "DEBUGGER_DIVERTED_AT";

    /// Transport header carrying credentials
    pub const AUTHORIZATION_HEADER: &str = "Authorization";
}

/// Failure codes surfaced through `ERROR_CODE`
pub mod codes {
    pub const MEDIATOR_FAILURE: u32 = 500_000;
    pub const SEQUENCE_NOT_FOUND: u32 = 500_100;
    pub const TEMPLATE_NOT_FOUND: u32 = 500_101;
    pub const CONFIGURATION_ERROR: u32 = 500_200;
    pub const ROUTING_FAILURE: u32 = 404_000;
    pub const ENDPOINT_DELIVERY_FAILURE: u32 = 101_500;
    pub const ENDPOINT_AUTH_FAILURE: u32 = 303_100;
}

/// Fixed diagnostic reported when basic auth header injection fails
pub const BASIC_AUTH_FAILURE_MESSAGE: &str = "Error while setting basic auth header";

/// Log level used by the log mediator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}
