use std::fmt;

use serde::{Deserialize, Serialize};

/// Set of repository actions, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Actions(u8);

impl Actions {
    pub const NONE: Actions = Actions(0);
    pub const PULL: Actions = Actions(1 << 0); // 1
    pub const PUSH: Actions = Actions(1 << 1); // 2
    pub const DELETE: Actions = Actions(1 << 2); // 4
    pub const ALL: Actions = Actions(Self::PULL.0 | Self::PUSH.0 | Self::DELETE.0);

    /// Returns true if this set contains every action in `required`.
    #[must_use]
    pub const fn has(self, required: Actions) -> bool {
        self.0 & required.0 == required.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn union(self, other: Actions) -> Actions {
        Actions(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersect(self, other: Actions) -> Actions {
        Actions(self.0 & other.0)
    }

    /// Converts a single action name to its bit. Unknown names map to `None`.
    pub fn parse(s: &str) -> Option<Actions> {
        match s {
            "pull" => Some(Self::PULL),
            "push" => Some(Self::PUSH),
            "delete" => Some(Self::DELETE),
            _ => None,
        }
    }

    /// Returns the action names in this set, in pull/push/delete order.
    #[must_use]
    pub fn to_strings(self) -> Vec<&'static str> {
        let mut actions = Vec::new();
        if self.has(Self::PULL) {
            actions.push("pull");
        }
        if self.has(Self::PUSH) {
            actions.push("push");
        }
        if self.has(Self::DELETE) {
            actions.push("delete");
        }
        actions
    }
}

impl fmt::Display for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(","))
    }
}

/// Permission level carried by a personal access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionLevel {
    ReadOnly,
    ReadWrite,
    ReadWriteDelete,
}

impl PermissionLevel {
    /// The actions a credential at this level may ever be granted.
    #[must_use]
    pub const fn allowed_actions(self) -> Actions {
        match self {
            Self::ReadOnly => Actions::PULL,
            Self::ReadWrite => Actions(Actions::PULL.0 | Actions::PUSH.0),
            Self::ReadWriteDelete => Actions::ALL,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "readOnly",
            Self::ReadWrite => "readWrite",
            Self::ReadWriteDelete => "readWriteDelete",
        }
    }

    pub fn parse(s: &str) -> Option<PermissionLevel> {
        match s {
            "readOnly" => Some(Self::ReadOnly),
            "readWrite" => Some(Self::ReadWrite),
            "readWriteDelete" => Some(Self::ReadWriteDelete),
            _ => None,
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
