// Outbound endpoints, credential decoration and the failure channel

pub mod auth;
pub mod basic_auth;
pub mod failure;
pub mod http;
pub mod traits;

pub use auth::*;
pub use basic_auth::*;
pub use failure::*;
pub use http::*;
pub use traits::*;
