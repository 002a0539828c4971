use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::WorkspaceId;

/// A named scope owning a set of layers.
///
/// `item_count` always equals the number of layers whose `workspace_id` is
/// this workspace; stores recompute it inside every transaction that writes
/// or deletes one of its layers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub item_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<DateTime<Utc>>,
}

impl Workspace {
    /// An empty workspace created now.
    pub fn new(id: WorkspaceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            created: Utc::now(),
            item_count: 0,
            last_active: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_demo(&self) -> bool {
        self.id.is_demo()
    }
}
