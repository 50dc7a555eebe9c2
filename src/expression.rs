// Raw parameter values passed into templates and leaf mediators
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::MessageContext;

/// A value that is either fixed at configuration time or read from the
/// message context when it is evaluated.
///
/// Only two scopes are readable: message properties and the current
/// function frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Literal(Value),
    Property(String),
    FuncParam(String),
}

impl ParamValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        ParamValue::Literal(value.into())
    }

    pub fn property(name: impl Into<String>) -> Self {
        ParamValue::Property(name.into())
    }

    pub fn func_param(name: impl Into<String>) -> Self {
        ParamValue::FuncParam(name.into())
    }

    /// Evaluate against the context as it is right now
    pub fn evaluate(&self, ctx: &MessageContext) -> Option<Value> {
        match self {
            ParamValue::Literal(v) => Some(v.clone()),
            ParamValue::Property(name) => ctx.get_property(name).cloned(),
            ParamValue::FuncParam(name) => ctx
                .current_function_frame()
                .and_then(|frame| frame.get(name))
                .cloned(),
        }
    }

    /// Evaluate to a string, rendering non-string JSON values compactly
    pub fn evaluate_string(&self, ctx: &MessageContext) -> Option<String> {
        self.evaluate(ctx).map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    pub fn is_dynamic(&self) -> bool {
        !matches!(self, ParamValue::Literal(_))
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        ParamValue::Literal(value)
    }
}
