// REST API resources and dispatch

pub mod dispatch;
pub mod resource;

pub use dispatch::*;
pub use resource::*;
