use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::context::MessageContext;

/// Declared parameter of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParam {
    pub name: String,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl TemplateParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mandatory: false,
            default_value: None,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Activation record of one template invocation
#[derive(Debug, Clone)]
pub struct TemplateContext {
    name: String,
    params: Vec<TemplateParam>,
    mapped_values: HashMap<String, Value>,
    local_entry_key: Option<String>,
}

impl TemplateContext {
    pub fn new(name: impl Into<String>, params: Vec<TemplateParam>) -> Self {
        Self {
            name: name.into(),
            params,
            mapped_values: HashMap::new(),
            local_entry_key: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[TemplateParam] {
        &self.params
    }

    pub fn local_entry_key(&self) -> Option<&str> {
        self.local_entry_key.as_deref()
    }

    pub fn set_local_entry_key(&mut self, key: impl Into<String>) {
        self.local_entry_key = Some(key.into());
    }

    /// Bound value of a parameter in this frame
    pub fn get(&self, param: &str) -> Option<&Value> {
        self.mapped_values.get(param)
    }

    pub fn mapped_values(&self) -> &HashMap<String, Value> {
        &self.mapped_values
    }

    /// Bind declared parameters from the arguments staged by the caller.
    ///
    /// Arguments are evaluated against `ctx` now, before this frame is on the
    /// stack, so `FuncParam` arguments read the caller's frame and later
    /// property changes do not leak into the bound values. Staged arguments
    /// are consumed.
    pub fn setup_params(&mut self, ctx: &mut MessageContext, warn_on_missing: bool) {
        let mut raw_args = ctx.take_template_arguments(&self.name);
        let ctx: &MessageContext = ctx;

        for param in &self.params {
            let value = raw_args
                .remove(&param.name)
                .and_then(|raw| raw.evaluate(ctx))
                .or_else(|| param.default_value.clone());

            match value {
                Some(v) => {
                    self.mapped_values.insert(param.name.clone(), v);
                }
                None if param.mandatory && warn_on_missing => {
                    tracing::warn!(
                        "Mandatory parameter '{}' of template '{}' has no value",
                        param.name, self.name
                    );
                }
                None => {}
            }
        }

        for undeclared in raw_args.keys() {
            tracing::debug!(
                "Ignoring argument '{}' not declared by template '{}'",
                undeclared, self.name
            );
        }
    }
}

/// Per-message stack of template activation records
#[derive(Debug, Default, Clone)]
pub struct FunctionStack {
    frames: Vec<TemplateContext>,
}

impl FunctionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: TemplateContext) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<TemplateContext> {
        self.frames.pop()
    }

    pub fn peek(&self) -> Option<&TemplateContext> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Pop frames until at most `depth` remain; returns how many were removed
    pub fn unwind_to(&mut self, depth: usize) -> usize {
        let removed = self.frames.len().saturating_sub(depth);
        self.frames.truncate(depth);
        removed
    }

    /// Frame names from bottom to top
    pub fn names(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.name()).collect()
    }
}
