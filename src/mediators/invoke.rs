use async_trait::async_trait;

use crate::context::MessageContext;
use crate::error::MediationError;
use crate::expression::ParamValue;
use crate::mediators::Mediator;

/// Calls a template by name with raw arguments.
///
/// Arguments are staged on the context unevaluated; the template binds them
/// against the caller's state when it pushes its frame.
pub struct InvokeMediator {
    name: String,
    target: String,
    arguments: Vec<(String, ParamValue)>,
}

impl InvokeMediator {
    pub fn new(target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            name: format!("invoke:{}", target),
            target,
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, param: impl Into<String>, value: ParamValue) -> Self {
        self.arguments.push((param.into(), value));
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl Mediator for InvokeMediator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        let template = ctx
            .environment()
            .template(&self.target)
            .ok_or_else(|| MediationError::TemplateNotFound(self.target.clone()))?;

        if !template.is_initialized() {
            tracing::debug!("Invoking template '{}' before it was initialized", self.target);
        }

        for (param, value) in &self.arguments {
            ctx.stage_template_argument(&self.target, param.clone(), value.clone());
        }

        template.mediate(ctx).await
    }
}
