use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::context::MessageContext;
use crate::error::MediationError;
use crate::mediators::Mediator;
use crate::types::keys;

/// Recovery action kept on a message's fault stack
#[async_trait]
pub trait FaultHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Run the recovery path against the context
    async fn on_fault(&self, ctx: &mut MessageContext) -> Result<bool, MediationError>;

    /// Record the failure on the context, then run the recovery path.
    ///
    /// `ERROR_CODE` and `ERROR_MESSAGE` come from the endpoint failure on the
    /// context when one was reported, otherwise from `error`.
    async fn handle_fault(
        &self,
        ctx: &mut MessageContext,
        error: Option<&MediationError>,
    ) -> Result<bool, MediationError> {
        if let Some(error) = error {
            let (code, message) = match ctx.failure() {
                Some(failure) => (failure.code, failure.message.clone()),
                None => (error.error_code(), error.to_string()),
            };
            ctx.set_property(keys::ERROR_CODE, code);
            ctx.set_property(keys::ERROR_MESSAGE, Value::String(message));
            ctx.set_property(keys::ERROR_DETAIL, error.to_json());
        }

        tracing::info!(
            "Fault handler '{}' handling message {}",
            self.name(), ctx.message_id()
        );
        self.on_fault(ctx).await
    }
}

/// Fault handler that runs a mediator (usually a named sequence)
pub struct MediatorFaultHandler {
    name: String,
    mediator: Arc<dyn Mediator>,
}

impl MediatorFaultHandler {
    pub fn new(mediator: Arc<dyn Mediator>) -> Self {
        Self {
            name: mediator.name().to_string(),
            mediator,
        }
    }

    /// Handler named after the registry key it was resolved from
    pub fn named(name: impl Into<String>, mediator: Arc<dyn Mediator>) -> Self {
        Self {
            name: name.into(),
            mediator,
        }
    }

    pub fn fault_mediator(&self) -> &Arc<dyn Mediator> {
        &self.mediator
    }
}

#[async_trait]
impl FaultHandler for MediatorFaultHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_fault(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        self.mediator.mediate(ctx).await
    }
}

/// Resolve `sequence_name` and push it as a fault handler for `owner`.
///
/// Returns the pushed handler so the owner can later pop exactly it. An
/// unresolvable name is a soft failure: a warning and nothing pushed.
pub fn push_error_handler(
    ctx: &mut MessageContext,
    sequence_name: &str,
    owner: &str,
) -> Option<Arc<dyn FaultHandler>> {
    match ctx.get_sequence(sequence_name) {
        Some(sequence) => {
            tracing::debug!("Setting the onError handler '{}' for '{}'", sequence_name, owner);
            let handler: Arc<dyn FaultHandler> = Arc::new(MediatorFaultHandler::named(sequence_name, sequence));
            ctx.push_fault_handler(handler.clone());
            Some(handler)
        }
        None => {
            tracing::warn!(
                "onError handler '{}' for '{}' cannot be found",
                sequence_name, owner
            );
            None
        }
    }
}

/// Pop `handler` if it is still on top; never touches a handler owned by someone else
pub fn pop_owned_error_handler(ctx: &mut MessageContext, handler: &Arc<dyn FaultHandler>, owner: &str) {
    if ctx.fault_stack_mut().pop_if_owned(handler) {
        tracing::trace!("Popped onError handler '{}' for '{}'", handler.name(), owner);
    } else {
        tracing::debug!(
            "onError handler '{}' for '{}' is no longer on top of the fault stack",
            handler.name(), owner
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::EndpointFailure;
    use crate::mediators::PropertyMediator;
    use crate::testing::{test_context, test_environment};
    use crate::types::codes;
    use chrono::Utc;
    use serde_json::json;

    #[tokio::test]
    async fn handle_fault_stamps_error_and_runs_mediator() {
        let mut ctx = test_context();
        let handler = MediatorFaultHandler::new(Arc::new(PropertyMediator::set("recovered", true)));
        let error = MediationError::mediator_failure("validate", "bad input");

        assert!(handler.handle_fault(&mut ctx, Some(&error)).await.unwrap());
        assert_eq!(ctx.get_property("recovered"), Some(&json!(true)));
        assert_eq!(ctx.get_property(keys::ERROR_CODE), Some(&json!(codes::MEDIATOR_FAILURE)));
        assert_eq!(ctx.get_property(keys::ERROR_DETAIL).unwrap()["kind"], "MEDIATOR_FAILURE");
    }

    #[tokio::test]
    async fn handle_fault_keeps_reported_endpoint_failure() {
        let mut ctx = test_context();
        ctx.record_failure(EndpointFailure {
            endpoint: "orders".to_string(),
            code: codes::ENDPOINT_AUTH_FAILURE,
            message: "auth".to_string(),
            at: Utc::now(),
        });
        let handler = MediatorFaultHandler::new(Arc::new(PropertyMediator::set("r", 1)));
        let error = MediationError::mediator_failure("m", "x");

        handler.handle_fault(&mut ctx, Some(&error)).await.unwrap();
        assert_eq!(ctx.get_property(keys::ERROR_CODE), Some(&json!(codes::ENDPOINT_AUTH_FAILURE)));
        assert_eq!(ctx.get_property(keys::ERROR_MESSAGE), Some(&json!("auth")));
    }

    #[tokio::test]
    async fn handle_fault_replaces_stale_error_properties() {
        let mut ctx = test_context();
        ctx.set_property(keys::ERROR_CODE, 1);
        ctx.set_property(keys::ERROR_MESSAGE, "left over from an earlier fault");
        let handler = MediatorFaultHandler::new(Arc::new(PropertyMediator::set("r", 1)));
        let error = MediationError::mediator_failure("m", "x");

        handler.handle_fault(&mut ctx, Some(&error)).await.unwrap();
        assert_eq!(ctx.get_property(keys::ERROR_CODE), Some(&json!(codes::MEDIATOR_FAILURE)));
        assert_eq!(ctx.get_property(keys::ERROR_MESSAGE), Some(&json!(error.to_string())));
    }

    #[test]
    fn push_error_handler_missing_sequence_pushes_nothing() {
        let mut ctx = test_context();
        assert!(push_error_handler(&mut ctx, "nope", "owner").is_none());
        assert!(ctx.fault_stack().is_empty());
    }

    #[test]
    fn push_then_pop_owned_handler() {
        let env = test_environment();
        env.add_sequence("on_error", Arc::new(PropertyMediator::set("e", 1)));
        let mut ctx = MessageContext::new(env);

        let handler = push_error_handler(&mut ctx, "on_error", "owner").unwrap();
        assert_eq!(ctx.fault_stack().len(), 1);
        pop_owned_error_handler(&mut ctx, &handler, "owner");
        assert!(ctx.fault_stack().is_empty());
    }
}
