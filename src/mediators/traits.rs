use async_trait::async_trait;

use crate::context::MessageContext;
use crate::environment::Environment;
use crate::error::MediationError;

/// Unit of message processing.
///
/// `mediate` returns `Ok(true)` to let the flow continue and `Ok(false)` to
/// stop it. Errors are never swallowed by composites; they travel up to
/// whoever drives the pipeline.
#[async_trait]
pub trait Mediator: Send + Sync {
    /// Name used for logging, breakpoints and fault diagnostics
    fn name(&self) -> &str;

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError>;

    /// Called once when the artifact is deployed
    fn init(&self, _env: &dyn Environment) -> Result<(), MediationError> {
        Ok(())
    }

    /// Called once when the artifact is undeployed
    fn destroy(&self) {}
}
