use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a local writer.
///
/// Generated once at first run, persisted by the embedding application and
/// handed to [`StateManager`](crate::StateManager) on every start. The engine
/// never generates or stores it on its own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        ClientId(id.into())
    }

    /// Generate a fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        ClientId(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        ClientId::new(s)
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        ClientId(s)
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
