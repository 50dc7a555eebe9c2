use async_trait::async_trait;
use std::sync::Arc;

use crate::context::MessageContext;
use crate::endpoints::{AuthHandler, ContextFailureReporter, Endpoint, FailureReporter};
use crate::error::MediationError;
use crate::types::{codes, BASIC_AUTH_FAILURE_MESSAGE};

/// Endpoint decorator that sets a basic auth header before delegating.
///
/// When the header cannot be set because of an authentication error the
/// wrapped endpoint is never called; the failure goes to the reporter with
/// `ENDPOINT_AUTH_FAILURE` and the fixed basic auth message instead.
pub struct BasicAuthConfiguredEndpoint {
    name: String,
    inner: Arc<dyn Endpoint>,
    auth: Arc<dyn AuthHandler>,
    reporter: Arc<dyn FailureReporter>,
}

impl BasicAuthConfiguredEndpoint {
    pub fn new(inner: Arc<dyn Endpoint>, auth: Arc<dyn AuthHandler>, reporter: Arc<dyn FailureReporter>) -> Self {
        Self {
            name: inner.name().to_string(),
            inner,
            auth,
            reporter,
        }
    }

    /// Decorate with the default context-backed failure channel
    pub fn with_context_reporter(inner: Arc<dyn Endpoint>, auth: Arc<dyn AuthHandler>) -> Self {
        let reporter = Arc::new(ContextFailureReporter::new(inner.name()));
        Self::new(inner, auth, reporter)
    }

    pub fn inner(&self) -> &Arc<dyn Endpoint> {
        &self.inner
    }
}

#[async_trait]
impl Endpoint for BasicAuthConfiguredEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, ctx: &mut MessageContext) -> Result<(), MediationError> {
        match self.auth.set_auth_header(ctx) {
            Ok(()) => {}
            Err(MediationError::Auth(e)) => {
                tracing::warn!("Endpoint '{}' not called: {}", self.name, e);
                self.reporter
                    .inform_failure(ctx, codes::ENDPOINT_AUTH_FAILURE, BASIC_AUTH_FAILURE_MESSAGE);
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        tracing::debug!("Auth header set by '{}' for endpoint '{}'", self.auth.name(), self.name);
        self.inner.send(ctx).await
    }
}
