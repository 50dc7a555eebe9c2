use std::sync::Arc;

use crate::api::Resource;
use crate::context::MessageContext;

/// Picks the resource that serves a request.
///
/// Candidates are tried in the order given and the first acceptable one
/// wins. Dispatchers never reorder candidates, so a catch-all placed first
/// shadows everything after it.
pub trait RestDispatcher: Send + Sync {
    fn find_resource(&self, ctx: &mut MessageContext, candidates: &[Arc<Resource>]) -> Option<Arc<Resource>>;
}

/// Selects the first resource that has no dispatcher helper.
///
/// Helpers are never consulted; resources carrying one are invisible here.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDispatcher;

impl RestDispatcher for DefaultDispatcher {
    fn find_resource(&self, ctx: &mut MessageContext, candidates: &[Arc<Resource>]) -> Option<Arc<Resource>> {
        let resource = candidates
            .iter()
            .find(|resource| resource.dispatcher_helper().is_none())?
            .clone();

        tracing::debug!("Default dispatcher selected resource '{}'", resource.name());
        ctx.set_selected_resource(resource.clone());
        Some(resource)
    }
}

/// Selects the first resource whose helper matches the request and whose
/// method list accepts it. Helper-less resources are left to
/// [`DefaultDispatcher`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlMappingDispatcher;

impl RestDispatcher for UrlMappingDispatcher {
    fn find_resource(&self, ctx: &mut MessageContext, candidates: &[Arc<Resource>]) -> Option<Arc<Resource>> {
        let request: &MessageContext = ctx;
        let resource = candidates
            .iter()
            .filter(|resource| resource.accepts_method(request.method()))
            .find(|resource| {
                resource
                    .dispatcher_helper()
                    .is_some_and(|helper| helper.matches(request))
            })?
            .clone();

        tracing::debug!(
            "URL mapping dispatcher selected resource '{}' for {} {}",
            resource.name(), ctx.method(), ctx.path()
        );
        ctx.set_selected_resource(resource.clone());
        Some(resource)
    }
}

/// Tries each dispatcher in turn until one selects a resource
pub struct ChainedDispatcher {
    dispatchers: Vec<Box<dyn RestDispatcher>>,
}

impl ChainedDispatcher {
    pub fn new(dispatchers: Vec<Box<dyn RestDispatcher>>) -> Self {
        Self { dispatchers }
    }
}

impl Default for ChainedDispatcher {
    /// URL mappings first, then the helper-less fallback
    fn default() -> Self {
        Self::new(vec![Box::new(UrlMappingDispatcher), Box::new(DefaultDispatcher)])
    }
}

impl RestDispatcher for ChainedDispatcher {
    fn find_resource(&self, ctx: &mut MessageContext, candidates: &[Arc<Resource>]) -> Option<Arc<Resource>> {
        self.dispatchers
            .iter()
            .find_map(|dispatcher| dispatcher.find_resource(ctx, candidates))
    }
}
