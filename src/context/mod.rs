// Per-request mediation state
//
// A MessageContext is created by whatever accepted the request, owned by the
// task processing it, and dropped when the response has been dispatched.

pub mod connection;
pub mod fault_stack;
pub mod function_stack;

pub use connection::*;
pub use fault_stack::*;
pub use function_stack::*;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::Resource;
use crate::endpoints::EndpointFailure;
use crate::environment::Environment;
use crate::expression::ParamValue;
use crate::mediators::fault::FaultHandler;
use crate::mediators::Mediator;
use crate::types::keys;

pub struct MessageContext {
    message_id: Uuid,
    created_at: DateTime<Utc>,
    environment: Arc<dyn Environment>,

    properties: HashMap<String, Value>,
    fault_stack: FaultStack,
    // Created on the first template invocation
    function_stack: Option<FunctionStack>,
    // Raw arguments staged by a caller for the next invocation of a template
    template_arguments: HashMap<String, HashMap<String, ParamValue>>,

    selected_resource: Option<Arc<Resource>>,
    connection_id: Option<ConnectionId>,

    // Request/response surface handed over by the transport layer
    method: String,
    path: String,
    headers: HashMap<String, String>,
    payload: Option<Value>,
    response_status: Option<u16>,
    failure: Option<EndpointFailure>,
}

impl MessageContext {
    pub fn new(environment: Arc<dyn Environment>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            created_at: Utc::now(),
            environment,
            properties: HashMap::new(),
            fault_stack: FaultStack::new(),
            function_stack: None,
            template_arguments: HashMap::new(),
            selected_resource: None,
            connection_id: None,
            method: "POST".to_string(),
            path: "/".to_string(),
            headers: HashMap::new(),
            payload: None,
            response_status: None,
            failure: None,
        }
    }

    /// Set the inbound request line
    pub fn with_request(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.method = method.into().to_uppercase();
        self.path = path.into();
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_connection_id(mut self, connection_id: ConnectionId) -> Self {
        self.connection_id = Some(connection_id);
        self
    }

    pub fn message_id(&self) -> Uuid {
        self.message_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn environment(&self) -> &Arc<dyn Environment> {
        &self.environment
    }

    // === Property bag ===

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn remove_property(&mut self, key: &str) -> Option<Value> {
        self.properties.remove(key)
    }

    pub fn properties(&self) -> &HashMap<String, Value> {
        &self.properties
    }

    // === Fault handlers ===

    pub fn push_fault_handler(&mut self, handler: Arc<dyn FaultHandler>) {
        tracing::trace!("Pushing fault handler '{}' for message {}", handler.name(), self.message_id);
        self.fault_stack.push(handler);
    }

    pub fn fault_stack(&self) -> &FaultStack {
        &self.fault_stack
    }

    pub fn fault_stack_mut(&mut self) -> &mut FaultStack {
        &mut self.fault_stack
    }

    // === Function stack ===

    pub fn function_stack(&self) -> Option<&FunctionStack> {
        self.function_stack.as_ref()
    }

    pub fn push_function_frame(&mut self, frame: TemplateContext) {
        self.function_stack
            .get_or_insert_with(FunctionStack::new)
            .push(frame);
    }

    /// Pops one frame; no-op when no stack exists or it is empty
    pub fn pop_function_frame(&mut self) -> Option<TemplateContext> {
        self.function_stack.as_mut().and_then(FunctionStack::pop)
    }

    pub fn current_function_frame(&self) -> Option<&TemplateContext> {
        self.function_stack.as_ref().and_then(FunctionStack::peek)
    }

    pub fn function_stack_depth(&self) -> usize {
        self.function_stack.as_ref().map_or(0, FunctionStack::len)
    }

    pub fn unwind_function_stack_to(&mut self, depth: usize) -> usize {
        self.function_stack
            .as_mut()
            .map_or(0, |stack| stack.unwind_to(depth))
    }

    /// Value of a parameter in the current template frame
    pub fn function_param(&self, name: &str) -> Option<&Value> {
        self.current_function_frame().and_then(|frame| frame.get(name))
    }

    pub fn stage_template_argument(
        &mut self,
        template: &str,
        param: impl Into<String>,
        value: ParamValue,
    ) {
        self.template_arguments
            .entry(template.to_string())
            .or_default()
            .insert(param.into(), value);
    }

    pub fn take_template_arguments(&mut self, template: &str) -> HashMap<String, ParamValue> {
        self.template_arguments.remove(template).unwrap_or_default()
    }

    // === Registry lookups ===

    /// Resolve a named sequence from the owning environment
    pub fn get_sequence(&self, name: &str) -> Option<Arc<dyn Mediator>> {
        self.environment.sequence(name)
    }

    // === Dispatch ===

    pub fn set_selected_resource(&mut self, resource: Arc<Resource>) {
        self.properties.insert(
            keys::SELECTED_RESOURCE.to_string(),
            Value::String(resource.name().to_string()),
        );
        self.selected_resource = Some(resource);
    }

    pub fn selected_resource(&self) -> Option<&Arc<Resource>> {
        self.selected_resource.as_ref()
    }

    // === Transport surface ===

    pub fn connection_id(&self) -> Option<&ConnectionId> {
        self.connection_id.as_ref()
    }

    pub fn connection_id_mut(&mut self) -> Option<&mut ConnectionId> {
        self.connection_id.as_mut()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn set_payload(&mut self, payload: Value) {
        self.payload = Some(payload);
    }

    pub fn response_status(&self) -> Option<u16> {
        self.response_status
    }

    pub fn set_response_status(&mut self, status: u16) {
        self.response_status = Some(status);
    }

    // === Endpoint failures ===

    pub fn record_failure(&mut self, failure: EndpointFailure) {
        self.failure = Some(failure);
    }

    pub fn failure(&self) -> Option<&EndpointFailure> {
        self.failure.as_ref()
    }

    pub fn take_failure(&mut self) -> Option<EndpointFailure> {
        self.failure.take()
    }
}

impl std::fmt::Debug for MessageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageContext")
            .field("message_id", &self.message_id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("properties", &self.properties)
            .field("fault_stack", &self.fault_stack)
            .field("function_stack", &self.function_stack.as_ref().map(FunctionStack::names))
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}
