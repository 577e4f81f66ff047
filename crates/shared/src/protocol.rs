use serde::{Deserialize, Serialize};

use crate::domain::{DealId, Priority, PriorityId};

/// Entry of the admin priorities endpoint. The backend calls the label
/// text `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRecord {
    pub id: PriorityId,
    pub status: String,
    #[serde(default)]
    pub color: String,
}

impl From<PriorityRecord> for Priority {
    fn from(value: PriorityRecord) -> Self {
        Priority::persisted(value.id, value.status, value.color)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePriorityRequest {
    pub status: String,
    pub color: String,
    pub is_global: bool,
}

impl CreatePriorityRequest {
    pub fn global(status: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            color: color.into(),
            is_global: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPriorityRequest {
    pub priority_id: PriorityId,
}

/// Response of both the assign and the update-priority endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedPriority {
    pub id: PriorityId,
    pub status: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<DealId>,
}

impl AssignedPriority {
    pub fn to_priority(&self) -> Priority {
        Priority::persisted(self.id, self.status.clone(), self.color.clone())
    }
}

/// Pagination metadata that accompanies `{ content: [...] }` list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elements: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}
