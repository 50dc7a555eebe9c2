use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::context::MessageContext;
use crate::environment::Environment;
use crate::error::MediationError;
use crate::mediators::Mediator;
use crate::types::keys;

/// Ordered composite of mediators
pub struct ListMediator {
    name: String,
    children: Vec<Arc<dyn Mediator>>,
}

impl ListMediator {
    pub fn new(name: impl Into<String>, children: Vec<Arc<dyn Mediator>>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    pub fn add_child(&mut self, child: Arc<dyn Mediator>) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Arc<dyn Mediator>] {
        &self.children
    }

    /// Run children in order, stopping at the first one that returns false
    pub async fn mediate_children(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        tracing::debug!("Mediating '{}' with {} children", self.name, self.children.len());

        for child in &self.children {
            let started = Instant::now();
            let proceed = child.mediate(ctx).await?;

            tracing::trace!(
                "Mediator '{}' in '{}' returned {} in {:?}",
                child.name(), self.name, proceed, started.elapsed()
            );

            if !proceed {
                tracing::debug!("'{}' stopped by child '{}'", self.name, child.name());
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Let the debugger claim the message at `component`.
    ///
    /// Returns true when the message was diverted; the caller must then
    /// stop mediating it.
    pub fn divert_mediation_route(&self, ctx: &mut MessageContext, component: &str) -> bool {
        if !ctx.environment().should_divert(component) {
            return false;
        }

        tracing::info!(
            "Debugger took over message {} at '{}'",
            ctx.message_id(), component
        );
        ctx.set_property(keys::DEBUGGER_DIVERTED_AT, component);
        true
    }

    pub fn init_children(&self, env: &dyn Environment) -> Result<(), MediationError> {
        for child in &self.children {
            child.init(env)?;
        }
        Ok(())
    }

    pub fn destroy_children(&self) {
        for child in &self.children {
            child.destroy();
        }
    }
}

#[async_trait]
impl Mediator for ListMediator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        self.mediate_children(ctx).await
    }

    fn init(&self, env: &dyn Environment) -> Result<(), MediationError> {
        self.init_children(env)
    }

    fn destroy(&self) {
        self.destroy_children()
    }
}
