use async_trait::async_trait;

use crate::context::MessageContext;
use crate::error::MediationError;

/// Anything a message can be sent to
#[async_trait]
pub trait Endpoint: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver the message. Failures that are reported through the failure
    /// channel return `Ok(())` and leave an `EndpointFailure` on the context.
    async fn send(&self, ctx: &mut MessageContext) -> Result<(), MediationError>;
}

/// Decorates an outbound message with credentials
pub trait AuthHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Inject the credential header into the context's transport headers.
    ///
    /// Authentication problems must surface as `MediationError::Auth`; any
    /// other variant is treated as an unexpected failure by callers.
    fn set_auth_header(&self, ctx: &mut MessageContext) -> Result<(), MediationError>;
}

/// Channel used by endpoints to report delivery problems
pub trait FailureReporter: Send + Sync {
    fn inform_failure(&self, ctx: &mut MessageContext, code: u32, message: &str);
}
