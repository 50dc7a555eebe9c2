use std::sync::Arc;

use crate::context::MessageContext;
use crate::endpoints::Endpoint;
use crate::mediators::Mediator;

/// Matching strategy attached to a resource
pub trait DispatcherHelper: Send + Sync {
    fn matches(&self, ctx: &MessageContext) -> bool;

    /// Human-readable form of the matching criteria
    fn describe(&self) -> String;
}

/// URL mapping in one of three forms: exact (`/orders`), prefix
/// (`/orders/*`) or extension (`*.json`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlMappingHelper {
    Exact(String),
    Prefix(String),
    Extension(String),
}

impl UrlMappingHelper {
    pub fn parse(mapping: &str) -> Self {
        if let Some(prefix) = mapping.strip_suffix("/*") {
            UrlMappingHelper::Prefix(prefix.to_string())
        } else if let Some(ext) = mapping.strip_prefix("*.") {
            UrlMappingHelper::Extension(ext.to_string())
        } else {
            UrlMappingHelper::Exact(mapping.to_string())
        }
    }

    pub fn matches_path(&self, path: &str) -> bool {
        // Query strings never take part in matching
        let path = path.split('?').next().unwrap_or(path);

        match self {
            UrlMappingHelper::Exact(exact) => path == exact || path.strip_suffix('/') == Some(exact.as_str()),
            UrlMappingHelper::Prefix(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            UrlMappingHelper::Extension(ext) => path
                .rsplit('/')
                .next()
                .and_then(|last| last.rsplit_once('.'))
                .is_some_and(|(_, e)| e == ext),
        }
    }
}

impl DispatcherHelper for UrlMappingHelper {
    fn matches(&self, ctx: &MessageContext) -> bool {
        self.matches_path(ctx.path())
    }

    fn describe(&self) -> String {
        match self {
            UrlMappingHelper::Exact(p) => p.clone(),
            UrlMappingHelper::Prefix(p) => format!("{}/*", p),
            UrlMappingHelper::Extension(e) => format!("*.{}", e),
        }
    }
}

/// Routable unit of an API
pub struct Resource {
    name: String,
    methods: Vec<String>,
    dispatcher_helper: Option<Arc<dyn DispatcherHelper>>,
    in_sequence: Arc<dyn Mediator>,
    fault_sequence: Option<Arc<dyn Mediator>>,
    endpoint: Option<Arc<dyn Endpoint>>,
}

impl Resource {
    /// Resource without a helper, i.e. a catch-all
    pub fn new(name: impl Into<String>, in_sequence: Arc<dyn Mediator>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            dispatcher_helper: None,
            in_sequence,
            fault_sequence: None,
            endpoint: None,
        }
    }

    pub fn with_helper(mut self, helper: Arc<dyn DispatcherHelper>) -> Self {
        self.dispatcher_helper = Some(helper);
        self
    }

    pub fn with_url_mapping(self, mapping: &str) -> Self {
        self.with_helper(Arc::new(UrlMappingHelper::parse(mapping)))
    }

    /// Restrict to HTTP methods; empty means any method
    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.methods = methods.into_iter().map(|m| m.as_ref().to_uppercase()).collect();
        self
    }

    pub fn with_fault_sequence(mut self, sequence: Arc<dyn Mediator>) -> Self {
        self.fault_sequence = Some(sequence);
        self
    }

    pub fn with_endpoint(mut self, endpoint: Arc<dyn Endpoint>) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dispatcher_helper(&self) -> Option<&Arc<dyn DispatcherHelper>> {
        self.dispatcher_helper.as_ref()
    }

    pub fn in_sequence(&self) -> &Arc<dyn Mediator> {
        &self.in_sequence
    }

    pub fn fault_sequence(&self) -> Option<&Arc<dyn Mediator>> {
        self.fault_sequence.as_ref()
    }

    pub fn endpoint(&self) -> Option<&Arc<dyn Endpoint>> {
        self.endpoint.as_ref()
    }

    pub fn accepts_method(&self, method: &str) -> bool {
        self.methods.is_empty() || self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("methods", &self.methods)
            .field("helper", &self.dispatcher_helper.as_ref().map(|h| h.describe()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mapping_forms() {
        assert_eq!(UrlMappingHelper::parse("/orders/*"), UrlMappingHelper::Prefix("/orders".into()));
        assert_eq!(UrlMappingHelper::parse("*.json"), UrlMappingHelper::Extension("json".into()));
        assert_eq!(UrlMappingHelper::parse("/orders"), UrlMappingHelper::Exact("/orders".into()));
    }

    #[test]
    fn prefix_does_not_match_sibling_segments() {
        let helper = UrlMappingHelper::parse("/orders/*");
        assert!(helper.matches_path("/orders"));
        assert!(helper.matches_path("/orders/17?expand=true"));
        assert!(!helper.matches_path("/ordersarchive"));
    }

    #[test]
    fn exact_and_extension_matching() {
        assert!(UrlMappingHelper::parse("/health").matches_path("/health/"));
        assert!(!UrlMappingHelper::parse("/health").matches_path("/health/deep"));
        assert!(UrlMappingHelper::parse("*.xml").matches_path("/feeds/latest.xml"));
        assert!(!UrlMappingHelper::parse("*.xml").matches_path("/feeds.xml/latest"));
        assert_eq!(UrlMappingHelper::parse("/a/*").describe(), "/a/*");
    }
}
