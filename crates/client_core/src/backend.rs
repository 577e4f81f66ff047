use async_trait::async_trait;
use shared::{
    domain::{DealId, Priority, PriorityId},
    error::DashboardError,
    protocol::{AssignPriorityRequest, AssignedPriority, CreatePriorityRequest, PriorityRecord},
};

use crate::http::BackendClient;

/// The four priority calls the optimistic flow depends on.
#[async_trait]
pub trait PriorityBackend: Send + Sync {
    async fn list_priorities(&self) -> Result<Vec<Priority>, DashboardError>;
    async fn create_priority(&self, name: &str, color: &str) -> Result<Priority, DashboardError>;
    async fn assign_priority(
        &self,
        deal_id: DealId,
        priority_id: PriorityId,
    ) -> Result<AssignedPriority, DashboardError>;
    /// Alternate endpoint used when `assign_priority` fails.
    async fn update_priority(
        &self,
        deal_id: DealId,
        priority_id: PriorityId,
    ) -> Result<AssignedPriority, DashboardError>;
}

#[async_trait]
impl PriorityBackend for BackendClient {
    async fn list_priorities(&self) -> Result<Vec<Priority>, DashboardError> {
        let records: Vec<PriorityRecord> = self.get_json(&self.endpoints().priorities).await?;
        Ok(records.into_iter().map(Priority::from).collect())
    }

    async fn create_priority(&self, name: &str, color: &str) -> Result<Priority, DashboardError> {
        let created: PriorityRecord = self
            .post_json(
                &self.endpoints().priorities,
                &CreatePriorityRequest::global(name, color),
            )
            .await?;
        Ok(created.into())
    }

    async fn assign_priority(
        &self,
        deal_id: DealId,
        priority_id: PriorityId,
    ) -> Result<AssignedPriority, DashboardError> {
        let path = format!(
            "{}/{deal_id}",
            self.endpoints().assign_priority.trim_end_matches('/')
        );
        self.post_json(&path, &AssignPriorityRequest { priority_id })
            .await
    }

    async fn update_priority(
        &self,
        deal_id: DealId,
        priority_id: PriorityId,
    ) -> Result<AssignedPriority, DashboardError> {
        let path = format!(
            "{}/{deal_id}",
            self.endpoints().update_priority.trim_end_matches('/')
        );
        self.put_json(&path, &AssignPriorityRequest { priority_id })
            .await
    }
}
