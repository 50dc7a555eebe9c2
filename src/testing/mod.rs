// Shared unit test fixtures

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::MediationConfig;
use crate::context::MessageContext;
use crate::endpoints::{Endpoint, FailureReporter};
use crate::environment::{Environment, MediationEnvironment};
use crate::error::MediationError;
use crate::mediators::{FaultHandler, Mediator};
use crate::types::keys;

/// Fresh environment with development defaults, independent of process env vars
pub fn test_environment() -> Arc<MediationEnvironment> {
    Arc::new(MediationEnvironment::from_config(MediationConfig::default()))
}

pub fn test_context() -> MessageContext {
    MessageContext::new(test_environment())
}

/// Fault handler that does nothing but carry a name; every call yields a
/// distinct identity
pub fn named_fault_handler(name: &str) -> Arc<dyn FaultHandler> {
    Arc::new(NamedFaultHandler { name: name.to_string() })
}

struct NamedFaultHandler {
    name: String,
}

#[async_trait]
impl FaultHandler for NamedFaultHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_fault(&self, _ctx: &mut MessageContext) -> Result<bool, MediationError> {
        Ok(false)
    }
}

/// Counts how often it was reached
pub struct RecordingMediator {
    name: String,
    calls: AtomicUsize,
}

impl RecordingMediator {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mediator for RecordingMediator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn mediate(&self, _ctx: &mut MessageContext) -> Result<bool, MediationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// Counts mediations and lifecycle calls
pub struct CountingMediator {
    name: String,
    mediations: AtomicUsize,
    inits: AtomicUsize,
    destroys: AtomicUsize,
}

impl CountingMediator {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            mediations: AtomicUsize::new(0),
            inits: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
        }
    }

    pub fn mediations(&self) -> usize {
        self.mediations.load(Ordering::SeqCst)
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Mediator for CountingMediator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn mediate(&self, _ctx: &mut MessageContext) -> Result<bool, MediationError> {
        self.mediations.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn init(&self, _env: &dyn Environment) -> Result<(), MediationError> {
        // Widen the race window for concurrent init tests
        std::thread::sleep(std::time::Duration::from_millis(5));
        self.inits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

/// Always fails with a mediator failure
pub struct FailingMediator {
    message: String,
}

impl FailingMediator {
    pub fn new(message: &str) -> Self {
        Self { message: message.to_string() }
    }
}

#[async_trait]
impl Mediator for FailingMediator {
    fn name(&self) -> &str {
        "failing"
    }

    async fn mediate(&self, _ctx: &mut MessageContext) -> Result<bool, MediationError> {
        Err(MediationError::mediator_failure("failing", self.message.clone()))
    }
}

/// Pushes a fault handler it does not own. `balanced` pops it again before
/// returning; `new` leaves it on the stack.
pub struct PushForeignHandlerMediator {
    handler: Arc<dyn FaultHandler>,
    balanced: bool,
}

impl PushForeignHandlerMediator {
    pub fn new(handler: Arc<dyn FaultHandler>) -> Self {
        Self { handler, balanced: false }
    }

    pub fn balanced(handler: Arc<dyn FaultHandler>) -> Self {
        Self { handler, balanced: true }
    }
}

#[async_trait]
impl Mediator for PushForeignHandlerMediator {
    fn name(&self) -> &str {
        "push-foreign-handler"
    }

    async fn mediate(&self, ctx: &mut MessageContext) -> Result<bool, MediationError> {
        ctx.push_fault_handler(self.handler.clone());
        if self.balanced {
            ctx.fault_stack_mut().pop_if_owned(&self.handler);
        }
        Ok(true)
    }
}

/// Endpoint that records what it was sent
pub struct RecordingEndpoint {
    name: String,
    sent_headers: Mutex<Vec<Option<String>>>,
}

impl RecordingEndpoint {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sent_headers: Mutex::new(Vec::new()),
        }
    }

    pub fn sends(&self) -> usize {
        self.sent_headers.lock().len()
    }

    /// Authorization header seen on each send
    pub fn sent_headers(&self) -> Vec<Option<String>> {
        self.sent_headers.lock().clone()
    }
}

#[async_trait]
impl Endpoint for RecordingEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, ctx: &mut MessageContext) -> Result<(), MediationError> {
        let header = ctx.header(keys::AUTHORIZATION_HEADER).map(str::to_string);
        self.sent_headers.lock().push(header);
        Ok(())
    }
}

/// Failure reporter that only remembers what it was told
#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<(u32, String)>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<(u32, String)> {
        self.reports.lock().clone()
    }
}

impl FailureReporter for RecordingReporter {
    fn inform_failure(&self, _ctx: &mut MessageContext, code: u32, message: &str) {
        self.reports.lock().push((code, message.to_string()));
    }
}
