use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(DealId);
id_newtype!(PriorityId);

/// A priority/label option shown on kanban cards.
///
/// Before the backend assigns an `id` the entry is identified by its
/// [`palette_key`]; afterwards the id is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PriorityId>,
    pub name: String,
    pub color: String,
}

impl Priority {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            color: color.into(),
        }
    }

    pub fn persisted(id: PriorityId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            color: color.into(),
        }
    }

    pub fn key(&self) -> String {
        palette_key(&self.name)
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Case- and whitespace-insensitive identity used before an id exists.
pub fn palette_key(name: &str) -> String {
    name.trim().to_lowercase()
}
