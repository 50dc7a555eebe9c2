// Leaf mediators
use async_trait::async_trait;
use serde_json::Value;

use crate::context::MessageContext;
use crate::error::MediationError;
use crate::expression::ParamValue;
use crate::mediators::Mediator;
use crate::types::LogLevel;

#[derive(Debug, Clone)]
enum PropertyAction {
    Set(ParamValue),
    Remove,
}

/// Sets or removes one message property
pub struct PropertyMediator {
    name: String,
    property: String,
    action: PropertyAction,
}

impl PropertyMediator {
    pub fn set(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::set_from(property, ParamValue::Literal(value.into()))
    }

    pub fn set_from(property: impl Into<String>, value: ParamValue) -> Self {
        let property = property.into();
        Self {
            name: format!("property:{}", property),
            property,
            action: PropertyAction::Set(value),
        }
    }

    pub fn remove(property: impl Into<String>) -> Self {
        let property = property.into();
        Self {
            name: format!("property:{}", property),
            property,
            action: PropertyAction::Remove,
        }
    }
}

#[async_trait]
impl Mediator for PropertyMediator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        match &self.action {
            PropertyAction::Set(raw) => {
                // Unresolvable sources set an explicit null
                let value = raw.evaluate(ctx).unwrap_or(Value::Null);
                tracing::trace!("Setting property '{}' = {}", self.property, value);
                ctx.set_property(self.property.clone(), value);
            }
            PropertyAction::Remove => {
                ctx.remove_property(&self.property);
            }
        }
        Ok(true)
    }
}

/// Writes a tracing event with selected properties
pub struct LogMediator {
    level: LogLevel,
    message: Option<String>,
    fields: Vec<(String, ParamValue)>,
}

impl LogMediator {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            message: None,
            fields: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    fn render(&self, ctx: &MessageContext) -> String {
        let mut parts = vec![format!("message_id={}", ctx.message_id())];
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        for (name, raw) in &self.fields {
            let value = raw.evaluate(ctx).unwrap_or(Value::Null);
            parts.push(format!("{}={}", name, value));
        }
        parts.join(", ")
    }
}

#[async_trait]
impl Mediator for LogMediator {
    fn name(&self) -> &str {
        "log"
    }

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        let line = self.render(ctx);
        match self.level {
            LogLevel::Trace => tracing::trace!("{}", line),
            LogLevel::Debug => tracing::debug!("{}", line),
            LogLevel::Info => tracing::info!("{}", line),
            LogLevel::Warn => tracing::warn!("{}", line),
            LogLevel::Error => tracing::error!("{}", line),
        }
        Ok(true)
    }
}

/// Stops the flow
#[derive(Default)]
pub struct DropMediator;

impl DropMediator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mediator for DropMediator {
    fn name(&self) -> &str {
        "drop"
    }

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        tracing::debug!("Dropping message {}", ctx.message_id());
        Ok(false)
    }
}
