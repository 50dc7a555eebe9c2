use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity token for a logical transport connection.
///
/// This is a plain mutable value holder. Nothing here guarantees that two
/// connections carry different ids; whichever connection pool constructs
/// these values owns that guarantee.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId {
    id: String,
}

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Rebind this token to another connection (pooled connections are reused)
    pub fn set_connection_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self { id }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
