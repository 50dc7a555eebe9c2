pub mod api;
pub mod config;
pub mod context;
pub mod endpoints;
pub mod engine;
pub mod environment;
pub mod error;
pub mod expression;
pub mod mediators;
pub mod types;

pub use context::MessageContext;
pub use engine::MediationEngine;
pub use environment::{Environment, MediationEnvironment};
pub use error::{AuthError, MediationError};

#[cfg(test)]
pub mod testing;
