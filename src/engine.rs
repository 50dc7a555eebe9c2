// Request processing around the mediation core: dispatch, fault handling
// and delivery to the resource's endpoint

use std::sync::Arc;
use std::time::Instant;

use crate::api::{ChainedDispatcher, Resource, RestDispatcher};
use crate::context::MessageContext;
use crate::error::MediationError;
use crate::mediators::MediatorFaultHandler;

/// Drives a message through one API's resources
pub struct MediationEngine {
    dispatcher: Box<dyn RestDispatcher>,
    resources: Vec<Arc<Resource>>,
}

impl MediationEngine {
    pub fn new(dispatcher: Box<dyn RestDispatcher>) -> Self {
        Self {
            dispatcher,
            resources: Vec::new(),
        }
    }

    /// Resources are tried in registration order
    pub fn register_resource(&mut self, resource: Resource) -> Arc<Resource> {
        let resource = Arc::new(resource);
        tracing::debug!("Registered resource '{}'", resource.name());
        self.resources.push(resource.clone());
        resource
    }

    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    /// Process one message.
    ///
    /// Returns `Ok(true)` when the in-sequence completed (and the endpoint,
    /// if any, was called without a reported failure), `Ok(false)` when the
    /// flow was stopped, or the result of the fault handler that took over.
    /// Errors only escape when no fault handler is available.
    pub async fn process(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        let start_time = Instant::now();

        let resource = self
            .dispatcher
            .find_resource(ctx, &self.resources)
            .ok_or_else(|| MediationError::routing_failure(format!("{} {}", ctx.method(), ctx.path())))?;

        if ctx.environment().config().audit.trace_messages {
            tracing::info!(
                "Processing message {}: {} {} -> resource '{}'",
                ctx.message_id(), ctx.method(), ctx.path(), resource.name()
            );
        }

        let fault_depth = ctx.fault_stack().len();
        let frame_depth = ctx.function_stack_depth();

        if let Some(fault_sequence) = resource.fault_sequence() {
            ctx.push_fault_handler(Arc::new(MediatorFaultHandler::new(fault_sequence.clone())));
        }

        let result = match resource.in_sequence().mediate(ctx).await {
            Ok(true) => self.deliver(&resource, ctx, frame_depth).await,
            Ok(false) => {
                tracing::debug!("Message {} dropped in resource '{}'", ctx.message_id(), resource.name());
                ctx.unwind_function_stack_to(frame_depth);
                Ok(false)
            }
            Err(e) => self.handle_fault(ctx, Some(e), frame_depth).await,
        };

        // Handlers left behind by this resource never outlive the message
        while ctx.fault_stack().len() > fault_depth {
            ctx.fault_stack_mut().pop();
        }

        tracing::debug!(
            "Message {} processed in {:?}",
            ctx.message_id(), start_time.elapsed()
        );
        result
    }

    async fn deliver(
        &self,
        resource: &Resource,
        ctx: &mut MessageContext,
        frame_depth: usize,
    ) -> Result<bool, MediationError> {
        let Some(endpoint) = resource.endpoint() else {
            return Ok(true);
        };

        if let Err(e) = endpoint.send(ctx).await {
            return self.handle_fault(ctx, Some(e), frame_depth).await;
        }

        if let Some(failure) = ctx.failure() {
            tracing::warn!(
                "Endpoint '{}' reported failure {} for message {}",
                failure.endpoint, failure.code, ctx.message_id()
            );
            return self.handle_fault(ctx, None, frame_depth).await;
        }

        Ok(true)
    }

    /// Hand the message to the innermost fault handler, then drop function
    /// frames retained by the failed mediation
    async fn handle_fault(
        &self,
        ctx: &mut MessageContext,
        error: Option<MediationError>,
        frame_depth: usize,
    ) -> Result<bool, MediationError> {
        let handler = ctx.fault_stack_mut().pop();

        let result = match handler {
            Some(handler) => {
                if let Some(e) = &error {
                    tracing::warn!("Mediation of message {} failed: {}", ctx.message_id(), e);
                }
                handler.handle_fault(ctx, error.as_ref()).await
            }
            None => match error {
                Some(e) => {
                    tracing::error!("Mediation of message {} failed with no fault handler: {}", ctx.message_id(), e);
                    Err(e)
                }
                None => Ok(false),
            },
        };

        let removed = ctx.unwind_function_stack_to(frame_depth);
        if removed > 0 {
            tracing::debug!("Unwound {} retained function frame(s) after fault handling", removed);
        }

        result
    }
}

impl Default for MediationEngine {
    fn default() -> Self {
        Self::new(Box::new(ChainedDispatcher::default()))
    }
}
