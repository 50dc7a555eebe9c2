use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::context::MessageContext;
use crate::endpoints::FailureReporter;
use crate::types::keys;

/// Failure reported by an endpoint, kept on the message context
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub code: u32,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Default failure channel: stamps the error properties, records the
/// failure on the context and logs it
#[derive(Debug, Clone)]
pub struct ContextFailureReporter {
    endpoint: String,
}

impl ContextFailureReporter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }
}

impl FailureReporter for ContextFailureReporter {
    fn inform_failure(&self, ctx: &mut MessageContext, code: u32, message: &str) {
        tracing::error!(
            "Endpoint '{}' failed for message {}: [{}] {}",
            self.endpoint, ctx.message_id(), code, message
        );

        ctx.set_property(keys::ERROR_CODE, code);
        ctx.set_property(keys::ERROR_MESSAGE, message);
        ctx.record_failure(EndpointFailure {
            endpoint: self.endpoint.clone(),
            code,
            message: message.to_string(),
            at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_context;
    use serde_json::json;

    #[test]
    fn stamps_properties_and_records_failure() {
        let mut ctx = test_context();
        let before = Utc::now();

        ContextFailureReporter::new("orders").inform_failure(&mut ctx, 101_503, "connection refused");

        assert_eq!(ctx.get_property(keys::ERROR_CODE), Some(&json!(101_503)));
        assert_eq!(ctx.get_property(keys::ERROR_MESSAGE), Some(&json!("connection refused")));

        let failure = ctx.failure().unwrap();
        assert_eq!(failure.endpoint, "orders");
        assert_eq!(failure.code, 101_503);
        assert!(failure.at >= before);
    }

    #[test]
    fn later_failure_replaces_earlier_one() {
        let mut ctx = test_context();
        let reporter = ContextFailureReporter::new("orders");

        reporter.inform_failure(&mut ctx, 1, "first");
        reporter.inform_failure(&mut ctx, 2, "second");

        assert_eq!(ctx.failure().map(|f| f.code), Some(2));
        assert_eq!(ctx.get_property(keys::ERROR_MESSAGE), Some(&json!("second")));
    }
}
