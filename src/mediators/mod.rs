// Mediators: the units a message is threaded through

pub mod builtin;
pub mod fault;
pub mod invoke;
pub mod lifecycle;
pub mod list;
pub mod sequence;
pub mod template;
pub mod traits;

// Re-export core types
pub use builtin::*;
pub use fault::{FaultHandler, MediatorFaultHandler};
pub use invoke::*;
pub use lifecycle::{Lifecycle, LifecycleState};
pub use list::*;
pub use sequence::*;
pub use template::*;
pub use traits::*;
