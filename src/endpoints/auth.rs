use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::context::MessageContext;
use crate::endpoints::AuthHandler;
use crate::error::{AuthError, MediationError};
use crate::expression::ParamValue;
use crate::types::keys;

/// HTTP Basic authentication.
///
/// Username and password may be literals or read from the context when the
/// header is set, so per-message credentials work.
#[derive(Debug, Clone)]
pub struct BasicAuthHandler {
    username: ParamValue,
    password: ParamValue,
}

impl BasicAuthHandler {
    pub fn new(username: ParamValue, password: ParamValue) -> Self {
        Self { username, password }
    }

    pub fn from_literals(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(
            ParamValue::literal(username.into()),
            ParamValue::literal(password.into()),
        )
    }

    fn resolve(&self, field: &'static str, value: &ParamValue, ctx: &MessageContext) -> Result<String, AuthError> {
        match value.evaluate_string(ctx) {
            Some(s) if !s.is_empty() => Ok(s),
            Some(_) => Err(AuthError::MissingCredential(field)),
            None => match value {
                ParamValue::Property(p) | ParamValue::FuncParam(p) => Err(AuthError::UnresolvedCredential {
                    field,
                    property: p.clone(),
                }),
                ParamValue::Literal(_) => Err(AuthError::MissingCredential(field)),
            },
        }
    }

    /// Header value for the given context, without touching the headers
    pub fn header_value(&self, ctx: &MessageContext) -> Result<String, AuthError> {
        let username = self.resolve("username", &self.username, ctx)?;
        let password = self.resolve("password", &self.password, ctx)?;

        if username.contains(':') {
            return Err(AuthError::InvalidUsername(username));
        }

        let encoded = STANDARD.encode(format!("{}:{}", username, password));
        Ok(format!("Basic {}", encoded))
    }
}

impl AuthHandler for BasicAuthHandler {
    fn name(&self) -> &str {
        "basic"
    }

    fn set_auth_header(&self, ctx: &mut MessageContext) -> Result<(), MediationError> {
        let value = self.header_value(ctx)?;
        ctx.set_header(keys::AUTHORIZATION_HEADER, value);
        Ok(())
    }
}
