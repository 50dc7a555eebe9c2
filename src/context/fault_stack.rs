use std::sync::Arc;

use crate::mediators::fault::FaultHandler;

/// Per-message stack of recovery handlers.
///
/// Pops are identity-checked through [`FaultStack::pop_if_owned`] so a
/// component can remove the handler it pushed without disturbing one that
/// somebody else left on top.
#[derive(Default, Clone)]
pub struct FaultStack {
    handlers: Vec<Arc<dyn FaultHandler>>,
}

impl FaultStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handler: Arc<dyn FaultHandler>) {
        self.handlers.push(handler);
    }

    pub fn peek(&self) -> Option<&Arc<dyn FaultHandler>> {
        self.handlers.last()
    }

    pub fn pop(&mut self) -> Option<Arc<dyn FaultHandler>> {
        self.handlers.pop()
    }

    /// Pop the top handler only when it is the exact instance given
    pub fn pop_if_owned(&mut self, owned: &Arc<dyn FaultHandler>) -> bool {
        match self.handlers.last() {
            Some(top) if same_handler(top, owned) => {
                self.handlers.pop();
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Names from bottom to top, for diagnostics
    pub fn handler_names(&self) -> Vec<String> {
        self.handlers.iter().map(|h| h.name().to_string()).collect()
    }
}

/// Same allocation, compared by data pointer only (vtable pointers ignored)
pub fn same_handler(a: &Arc<dyn FaultHandler>, b: &Arc<dyn FaultHandler>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl std::fmt::Debug for FaultStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.handler_names()).finish()
    }
}
