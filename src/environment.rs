// Shared, cross-request environment: artifact registries, availability
// bookkeeping and the mediation debugger switch.

use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::MediationConfig;
use crate::mediators::{Mediator, TemplateMediator};

/// Services the mediation core consumes from its host environment
pub trait Environment: Send + Sync {
    fn is_debugger_enabled(&self) -> bool;

    /// Mark a previously unavailable artifact as available again
    fn clear_unavailability_of_artifact(&self, name: &str);

    fn sequence(&self, name: &str) -> Option<Arc<dyn Mediator>>;

    fn template(&self, name: &str) -> Option<Arc<TemplateMediator>>;

    /// Whether the debugger wants to take over the message at `component`
    fn should_divert(&self, _component: &str) -> bool {
        false
    }

    fn config(&self) -> &MediationConfig;
}

/// In-process environment backing sequences and templates with concurrent maps
pub struct MediationEnvironment {
    config: MediationConfig,
    debugger_enabled: AtomicBool,
    breakpoints: DashSet<String>,
    sequences: DashMap<String, Arc<dyn Mediator>>,
    templates: DashMap<String, Arc<TemplateMediator>>,
    unavailable: DashSet<String>,
}

impl MediationEnvironment {
    pub fn new() -> Self {
        Self::from_config(crate::config::config().clone())
    }

    pub fn from_config(config: MediationConfig) -> Self {
        let breakpoints = DashSet::new();
        for bp in &config.debugger.breakpoints {
            breakpoints.insert(bp.clone());
        }

        Self {
            debugger_enabled: AtomicBool::new(config.debugger.enabled),
            breakpoints,
            sequences: DashMap::new(),
            templates: DashMap::new(),
            unavailable: DashSet::new(),
            config,
        }
    }

    pub fn set_debugger_enabled(&self, enabled: bool) {
        self.debugger_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn add_breakpoint(&self, component: impl Into<String>) {
        self.breakpoints.insert(component.into());
    }

    pub fn remove_breakpoint(&self, component: &str) -> bool {
        self.breakpoints.remove(component).is_some()
    }

    /// Register a named sequence; replaces any previous definition
    pub fn add_sequence(&self, name: impl Into<String>, sequence: Arc<dyn Mediator>) {
        let name = name.into();
        tracing::debug!("Registered sequence '{}'", name);
        self.sequences.insert(name, sequence);
    }

    pub fn remove_sequence(&self, name: &str) -> Option<Arc<dyn Mediator>> {
        self.sequences.remove(name).map(|(_, seq)| seq)
    }

    pub fn add_template(&self, template: Arc<TemplateMediator>) {
        let name = template.name().to_string();
        tracing::debug!("Registered template '{}'", name);
        self.templates.insert(name, template);
    }

    pub fn remove_template(&self, name: &str) -> Option<Arc<TemplateMediator>> {
        self.templates.remove(name).map(|(_, t)| t)
    }

    pub fn mark_artifact_unavailable(&self, name: impl Into<String>) {
        let name = name.into();
        tracing::warn!("Artifact '{}' marked unavailable", name);
        self.unavailable.insert(name);
    }

    pub fn is_artifact_unavailable(&self, name: &str) -> bool {
        self.unavailable.contains(name)
    }
}

impl Default for MediationEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for MediationEnvironment {
    fn is_debugger_enabled(&self) -> bool {
        self.debugger_enabled.load(Ordering::SeqCst)
    }

    fn clear_unavailability_of_artifact(&self, name: &str) {
        if self.unavailable.remove(name).is_some() {
            tracing::info!("Artifact '{}' is available again", name);
        }
    }

    fn sequence(&self, name: &str) -> Option<Arc<dyn Mediator>> {
        self.sequences.get(name).map(|entry| entry.value().clone())
    }

    fn template(&self, name: &str) -> Option<Arc<TemplateMediator>> {
        self.templates.get(name).map(|entry| entry.value().clone())
    }

    fn should_divert(&self, component: &str) -> bool {
        self.is_debugger_enabled() && self.breakpoints.contains(component)
    }

    fn config(&self) -> &MediationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mediators::DropMediator;

    #[test]
    fn breakpoints_only_divert_with_debugger_on() {
        let env = MediationEnvironment::from_config(MediationConfig::default());
        env.add_breakpoint("orders");
        assert!(!env.should_divert("orders"));

        env.set_debugger_enabled(true);
        assert!(env.should_divert("orders"));
        assert!(!env.should_divert("billing"));
    }

    #[test]
    fn unavailability_round_trip() {
        let env = MediationEnvironment::from_config(MediationConfig::default());
        env.mark_artifact_unavailable("seq");
        assert!(env.is_artifact_unavailable("seq"));
        env.clear_unavailability_of_artifact("seq");
        assert!(!env.is_artifact_unavailable("seq"));
    }

    #[test]
    fn sequence_registry_lookup() {
        let env = MediationEnvironment::from_config(MediationConfig::default());
        env.add_sequence("stop", Arc::new(DropMediator::new()));
        assert!(env.sequence("stop").is_some());
        assert!(env.remove_sequence("stop").is_some());
        assert!(env.sequence("stop").is_none());
    }
}
