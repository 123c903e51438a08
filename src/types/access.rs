use serde::{Deserialize, Serialize};

/// Resource type for which access is ever granted.
pub const REPOSITORY_TYPE: &str = "repository";

/// One `(type, name, actions)` triple, used both for what a client requests
/// and for what it is granted. Serialized as the `access` claim entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceActions {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub actions: Vec<String>,
}

impl ResourceActions {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        actions: Vec<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            actions,
        }
    }

    /// Splits a repository name into `(namespace, repository)`.
    /// Returns `None` unless there are exactly two non-empty parts.
    #[must_use]
    pub fn repository_path(&self) -> Option<(&str, &str)> {
        let mut parts = self.name.split('/');
        let namespace = parts.next().filter(|s| !s.is_empty())?;
        let repo = parts.next().filter(|s| !s.is_empty())?;
        if parts.next().is_some() {
            return None;
        }
        Some((namespace, repo))
    }
}
