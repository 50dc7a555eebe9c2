use async_trait::async_trait;
use std::sync::Arc;

use crate::context::MessageContext;
use crate::environment::Environment;
use crate::error::MediationError;
use crate::mediators::fault::{pop_owned_error_handler, push_error_handler};
use crate::mediators::lifecycle::Lifecycle;
use crate::mediators::{ListMediator, Mediator};

/// Named, deployable sequence of mediators
pub struct SequenceMediator {
    body: ListMediator,
    error_handler: Option<String>,
    dynamic: bool,
    lifecycle: Lifecycle,
}

impl SequenceMediator {
    pub fn new(name: impl Into<String>, children: Vec<Arc<dyn Mediator>>) -> Self {
        Self {
            body: ListMediator::new(name, children),
            error_handler: None,
            dynamic: false,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn with_error_handler(mut self, sequence: impl Into<String>) -> Self {
        self.error_handler = Some(sequence.into());
        self
    }

    pub fn with_dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }
}

#[async_trait]
impl Mediator for SequenceMediator {
    fn name(&self) -> &str {
        self.body.name()
    }

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        let name = self.body.name();

        if ctx.environment().is_debugger_enabled() && self.body.divert_mediation_route(ctx, name) {
            return Ok(true);
        }

        let error_handler = match &self.error_handler {
            Some(sequence) => push_error_handler(ctx, sequence, name),
            None => None,
        };

        let result = self.body.mediate_children(ctx).await;

        if let (Ok(_), Some(handler)) = (&result, &error_handler) {
            pop_owned_error_handler(ctx, handler, name);
        }

        result
    }

    fn init(&self, env: &dyn Environment) -> Result<(), MediationError> {
        self.lifecycle.initialize(|| {
            self.body.init_children(env)?;
            if !self.dynamic {
                env.clear_unavailability_of_artifact(self.body.name());
            }
            Ok(())
        })?;
        Ok(())
    }

    fn destroy(&self) {
        self.lifecycle.destroy(|| self.body.destroy_children());
    }
}

/// Reference to a sequence resolved by key each time it mediates
pub struct SequenceReference {
    key: String,
}

impl SequenceReference {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl Mediator for SequenceReference {
    fn name(&self) -> &str {
        &self.key
    }

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        let sequence = ctx
            .get_sequence(&self.key)
            .ok_or_else(|| MediationError::SequenceNotFound(self.key.clone()))?;

        sequence.mediate(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mediators::PropertyMediator;
    use crate::testing::{test_environment, CountingMediator};
    use serde_json::json;

    #[tokio::test]
    async fn reference_resolves_lazily() {
        let env = test_environment();
        let mut ctx = MessageContext::new(env.clone());
        let reference = SequenceReference::new("later");

        let err = reference.mediate(&mut ctx).await.unwrap_err();
        assert!(matches!(err, MediationError::SequenceNotFound(ref k) if k == "later"));

        env.add_sequence(
            "later",
            Arc::new(SequenceMediator::new("later", vec![Arc::new(PropertyMediator::set("y", 2))])),
        );
        assert!(reference.mediate(&mut ctx).await.unwrap());
        assert_eq!(ctx.get_property("y"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn sequence_pops_its_error_handler_on_success() {
        let env = test_environment();
        env.add_sequence("fault", Arc::new(PropertyMediator::set("f", 1)));
        let mut ctx = MessageContext::new(env);

        let seq = SequenceMediator::new("main", Vec::new()).with_error_handler("fault");
        assert!(seq.mediate(&mut ctx).await.unwrap());
        assert!(ctx.fault_stack().is_empty());
    }

    #[test]
    fn sequence_lifecycle_is_init_once() {
        let env = test_environment();
        let child = Arc::new(CountingMediator::new("c"));
        let seq = SequenceMediator::new("main", vec![child.clone()]);

        seq.init(env.as_ref()).unwrap();
        seq.init(env.as_ref()).unwrap();
        seq.destroy();
        seq.destroy();

        assert_eq!(child.inits(), 1);
        assert_eq!(child.destroys(), 1);
    }
}
