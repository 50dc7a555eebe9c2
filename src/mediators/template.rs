// Function templates: named, reusable sequences invoked with bound parameters
//
// Parameters reach the template body through the message's function stack.
// Each invocation pushes its own TemplateContext frame; mediators inside the
// body read it via `ParamValue::FuncParam` or `MessageContext::function_param`.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::context::{MessageContext, TemplateContext, TemplateParam};
use crate::environment::Environment;
use crate::error::MediationError;
use crate::mediators::fault::{pop_owned_error_handler, push_error_handler};
use crate::mediators::lifecycle::{Lifecycle, LifecycleState};
use crate::mediators::{ListMediator, Mediator};

/// Template invoked with parameters bound into a fresh function frame.
///
/// A successful run unwinds the function stack to the depth recorded before
/// its own frame was pushed, rather than popping a single frame, so frames
/// leaked by the body are dropped with it. A run that stops the flow or
/// fails keeps its frame for the caller to unwind.
pub struct TemplateMediator {
    name: String,
    params: Vec<TemplateParam>,
    body: ListMediator,
    /// Name of the sequence pushed as fault handler for each invocation
    error_handler: Option<String>,
    /// Dynamic templates may be redefined at runtime and skip availability bookkeeping
    dynamic: bool,
    artifact_container_name: Option<String>,
    file_name: Option<String>,
    local_entry_key: Option<String>,
    edited: AtomicBool,
    lifecycle: Lifecycle,
}

impl TemplateMediator {
    pub fn new(name: impl Into<String>, params: Vec<TemplateParam>, children: Vec<Arc<dyn Mediator>>) -> Self {
        let name = name.into();
        Self {
            body: ListMediator::new(name.clone(), children),
            name,
            params,
            error_handler: None,
            dynamic: false,
            artifact_container_name: None,
            file_name: None,
            local_entry_key: None,
            edited: AtomicBool::new(false),
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

    pub fn with_artifact_container(mut self, name: impl Into<String>) -> Self {
        self.artifact_container_name = Some(name.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_local_entry_key(mut self, key: impl Into<String>) -> Self {
        self.local_entry_key = Some(key.into());
        self
    }

    pub fn params(&self) -> &[TemplateParam] {
        &self.params
    }

    pub fn body(&self) -> &ListMediator {
        &self.body
    }

    pub fn error_handler(&self) -> Option<&str> {
        self.error_handler.as_deref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn artifact_container_name(&self) -> Option<&str> {
        self.artifact_container_name.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn local_entry_key(&self) -> Option<&str> {
        self.local_entry_key.as_deref()
    }

    pub fn is_edited(&self) -> bool {
        self.edited.load(Ordering::Relaxed)
    }

    pub fn set_edited(&self, edited: bool) {
        self.edited.store(edited, Ordering::Relaxed);
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    pub fn is_initializing(&self) -> bool {
        self.lifecycle.is_initializing()
    }

    /// Push a fresh activation record bound against the caller's context
    fn push_func_context_to(&self, ctx: &mut MessageContext) {
        let mut frame = TemplateContext::new(self.name.clone(), self.params.clone());
        if let Some(key) = &self.local_entry_key {
            frame.set_local_entry_key(key.clone());
        }

        let warn_on_missing = ctx.environment().config().template.warn_on_missing_params;
        frame.setup_params(ctx, warn_on_missing);

        tracing::debug!(
            "Start : Template '{}' params: {:?}",
            self.name, frame.mapped_values()
        );
        ctx.push_function_frame(frame);
    }

    /// Drop one frame from the function stack; safe to call when there is none
    pub fn pop_func_context_from(&self, ctx: &mut MessageContext) {
        ctx.pop_function_frame();
    }
}

#[async_trait]
impl Mediator for TemplateMediator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        if ctx.environment().is_debugger_enabled() && self.body.divert_mediation_route(ctx, &self.name) {
            // Arguments staged for this call must not bind into a later one
            ctx.take_template_arguments(&self.name);
            return Ok(true);
        }

        let error_handler = match &self.error_handler {
            Some(sequence) => push_error_handler(ctx, sequence, &self.name),
            None => None,
        };

        let depth_before = ctx.function_stack_depth();
        self.push_func_context_to(ctx);

        let result = self.body.mediate_children(ctx).await;

        if let (Ok(_), Some(handler)) = (&result, &error_handler) {
            pop_owned_error_handler(ctx, handler, &self.name);
        }

        match &result {
            Ok(true) => {
                let removed = ctx.unwind_function_stack_to(depth_before);
                if removed > 1 {
                    tracing::warn!(
                        "Template '{}' removed {} unbalanced frames from the function stack",
                        self.name, removed - 1
                    );
                }
                tracing::debug!("End : Template '{}'", self.name);
            }
            // The frame stays on the stack so the outer fault handling still
            // sees this template's scope; the engine unwinds it afterwards.
            Ok(false) => {
                tracing::debug!("Template '{}' stopped the flow; keeping its frame", self.name);
            }
            Err(e) => {
                tracing::debug!("Template '{}' failed: {}; keeping its frame", self.name, e);
            }
        }

        result
    }

    fn init(&self, env: &dyn Environment) -> Result<(), MediationError> {
        let ran = self.lifecycle.initialize(|| {
            self.body.init_children(env)?;
            if !self.dynamic {
                env.clear_unavailability_of_artifact(&self.name);
            }
            Ok(())
        })?;

        if ran {
            tracing::info!("Initialized template '{}'", self.name);
        }
        Ok(())
    }

    fn destroy(&self) {
        if self.lifecycle.destroy(|| self.body.destroy_children()) {
            tracing::info!("Destroyed template '{}'", self.name);
        }
    }
}
