use anyhow::Context;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediationConfig {
    pub mode: DeploymentMode,
    pub debugger: DebuggerConfig,
    pub endpoint: EndpointConfig,
    pub template: TemplateConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebuggerConfig {
    pub enabled: bool,
    pub breakpoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
    pub http_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub warn_on_missing_params: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub trace_messages: bool,
}

/// Partial overlay read from `MEDIATION_CONFIG_FILE`; absent fields keep the profile value
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverlay {
    debugger_enabled: Option<bool>,
    breakpoints: Option<Vec<String>>,
    endpoint_timeout_ms: Option<u64>,
    endpoint_user_agent: Option<String>,
    endpoint_http_method: Option<String>,
    warn_on_missing_params: Option<bool>,
    trace_messages: Option<bool>,
}

impl MediationConfig {
    pub fn from_env() -> Self {
        // Pick up MEDIATION_* from a local .env when present
        let _ = dotenvy::dotenv();

        let mode = match env::var("MEDIATION_ENV").as_deref() {
            Ok("production") | Ok("prod") => DeploymentMode::Production,
            Ok("staging") | Ok("stage") => DeploymentMode::Staging,
            _ => DeploymentMode::Development,
        };

        let config = Self::for_mode(mode);

        let config = match env::var("MEDIATION_CONFIG_FILE") {
            Ok(path) => match config.clone().with_file_overlay(&path) {
                Ok(overlaid) => overlaid,
                Err(e) => {
                    tracing::warn!("Ignoring mediation config file {}: {:#}", path, e);
                    config
                }
            },
            Err(_) => config,
        };

        config.with_env_overrides()
    }

    pub fn for_mode(mode: DeploymentMode) -> Self {
        match mode {
            DeploymentMode::Production => Self::production(),
            DeploymentMode::Staging => Self::staging(),
            DeploymentMode::Development => Self::development(),
        }
    }

    /// Apply a YAML overlay file on top of the current values
    pub fn with_file_overlay(self, path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.with_yaml_overlay(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn with_yaml_overlay(mut self, yaml: &str) -> anyhow::Result<Self> {
        let overlay: ConfigOverlay = serde_yaml::from_str(yaml)?;

        if let Some(v) = overlay.debugger_enabled {
            self.debugger.enabled = v;
        }
        if let Some(v) = overlay.breakpoints {
            self.debugger.breakpoints = v;
        }
        if let Some(v) = overlay.endpoint_timeout_ms {
            self.endpoint.timeout_ms = v;
        }
        if let Some(v) = overlay.endpoint_user_agent {
            self.endpoint.user_agent = v;
        }
        if let Some(v) = overlay.endpoint_http_method {
            self.endpoint.http_method = v;
        }
        if let Some(v) = overlay.warn_on_missing_params {
            self.template.warn_on_missing_params = v;
        }
        if let Some(v) = overlay.trace_messages {
            self.audit.trace_messages = v;
        }

        Ok(self)
    }

    fn with_env_overrides(mut self) -> Self {
        // Debugger overrides
        if let Ok(v) = env::var("MEDIATION_DEBUGGER_ENABLED") {
            self.debugger.enabled = v.parse().unwrap_or(self.debugger.enabled);
        }
        if let Ok(v) = env::var("MEDIATION_DEBUGGER_BREAKPOINTS") {
            self.debugger.breakpoints = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Endpoint overrides
        if let Ok(v) = env::var("MEDIATION_ENDPOINT_TIMEOUT_MS") {
            self.endpoint.timeout_ms = v.parse().unwrap_or(self.endpoint.timeout_ms);
        }
        if let Ok(v) = env::var("MEDIATION_ENDPOINT_USER_AGENT") {
            self.endpoint.user_agent = v;
        }
        if let Ok(v) = env::var("MEDIATION_ENDPOINT_HTTP_METHOD") {
            self.endpoint.http_method = v.to_uppercase();
        }

        // Template overrides
        if let Ok(v) = env::var("MEDIATION_TEMPLATE_WARN_ON_MISSING_PARAMS") {
            self.template.warn_on_missing_params =
                v.parse().unwrap_or(self.template.warn_on_missing_params);
        }

        // Audit overrides
        if let Ok(v) = env::var("MEDIATION_AUDIT_TRACE_MESSAGES") {
            self.audit.trace_messages = v.parse().unwrap_or(self.audit.trace_messages);
        }

        self
    }

    fn development() -> Self {
        Self {
            mode: DeploymentMode::Development,
            debugger: DebuggerConfig {
                enabled: false,
                breakpoints: Vec::new(),
            },
            endpoint: EndpointConfig {
                timeout_ms: 60_000,
                user_agent: format!("esb-mediation-rust/{}", env!("CARGO_PKG_VERSION")),
                http_method: "POST".to_string(),
            },
            template: TemplateConfig {
                warn_on_missing_params: true,
            },
            audit: AuditConfig {
                trace_messages: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            mode: DeploymentMode::Staging,
            debugger: DebuggerConfig {
                enabled: false,
                breakpoints: Vec::new(),
            },
            endpoint: EndpointConfig {
                timeout_ms: 30_000,
                user_agent: format!("esb-mediation-rust/{}", env!("CARGO_PKG_VERSION")),
                http_method: "POST".to_string(),
            },
            template: TemplateConfig {
                warn_on_missing_params: true,
            },
            audit: AuditConfig {
                trace_messages: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            mode: DeploymentMode::Production,
            debugger: DebuggerConfig {
                enabled: false,
                breakpoints: Vec::new(),
            },
            endpoint: EndpointConfig {
                timeout_ms: 15_000,
                user_agent: format!("esb-mediation-rust/{}", env!("CARGO_PKG_VERSION")),
                http_method: "POST".to_string(),
            },
            template: TemplateConfig {
                warn_on_missing_params: false,
            },
            audit: AuditConfig {
                trace_messages: false,
            },
        }
    }
}

impl Default for MediationConfig {
    fn default() -> Self {
        Self::development()
    }
}

// Global singleton config - initialized once on first access
pub static CONFIG: Lazy<MediationConfig> = Lazy::new(MediationConfig::from_env);

pub fn config() -> &'static MediationConfig {
    &CONFIG
}
