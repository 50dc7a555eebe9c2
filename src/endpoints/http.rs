use async_trait::async_trait;
use reqwest::{Client, Method, Request};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::EndpointConfig;
use crate::context::MessageContext;
use crate::endpoints::{ContextFailureReporter, Endpoint, FailureReporter};
use crate::error::MediationError;
use crate::types::codes;

/// HTTP endpoint backed by a shared `reqwest` client
pub struct HttpEndpoint {
    name: String,
    address: Url,
    method: Method,
    client: Client,
    reporter: Arc<dyn FailureReporter>,
}

impl HttpEndpoint {
    pub fn new(name: impl Into<String>, address: &str, config: &EndpointConfig) -> Result<Self, MediationError> {
        let name = name.into();
        let address = Url::parse(address)?;

        let method = Method::from_bytes(config.http_method.to_uppercase().as_bytes())
            .map_err(|_| MediationError::configuration(format!("Invalid HTTP method: {}", config.http_method)))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MediationError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            reporter: Arc::new(ContextFailureReporter::new(name.clone())),
            name,
            address,
            method,
            client,
        })
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn FailureReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Build the outbound request from the context's headers and payload
    pub fn build_request(&self, ctx: &MessageContext) -> Result<Request, MediationError> {
        let mut builder = self.client.request(self.method.clone(), self.address.clone());

        for (name, value) in ctx.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(payload) = ctx.payload() {
            builder = builder.json(payload);
        }

        builder
            .build()
            .map_err(|e| MediationError::delivery(&self.name, e.to_string()))
    }
}

#[async_trait]
impl Endpoint for HttpEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, ctx: &mut MessageContext) -> Result<(), MediationError> {
        let request = self.build_request(ctx)?;
        tracing::debug!("Sending {} {} via endpoint '{}'", request.method(), request.url(), self.name);

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                self.reporter
                    .inform_failure(ctx, codes::ENDPOINT_DELIVERY_FAILURE, &e.to_string());
                return Ok(());
            }
        };

        let status = response.status();
        ctx.set_response_status(status.as_u16());

        let body = response
            .bytes()
            .await
            .map_err(|e| MediationError::delivery(&self.name, e.to_string()))?;

        if !body.is_empty() {
            let payload = serde_json::from_slice::<Value>(&body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
            ctx.set_payload(payload);
        }

        tracing::debug!("Endpoint '{}' responded with {}", self.name, status);
        Ok(())
    }
}
