use std::{collections::HashMap, sync::Arc};

use shared::{
    domain::{palette_key, Priority},
    error::DashboardError,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::backend::PriorityBackend;

/// Collapse entries sharing a palette key into one, keeping the position of
/// the first occurrence.
///
/// A later entry replaces the kept one when it carries an id the kept one
/// lacks, or when both carry ids and the later one differs in id or color.
/// Entries with a blank name are dropped.
pub fn dedupe_palette<I>(entries: I) -> Vec<Priority>
where
    I: IntoIterator<Item = Priority>,
{
    let mut merged: Vec<Priority> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let key = entry.key();
        if key.is_empty() {
            continue;
        }
        match positions.get(&key) {
            Some(&position) => {
                if supersedes(&merged[position], &entry) {
                    merged[position] = entry;
                }
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(entry);
            }
        }
    }

    merged
}

fn supersedes(kept: &Priority, incoming: &Priority) -> bool {
    match (kept.id, incoming.id) {
        (None, Some(_)) => true,
        (Some(kept_id), Some(incoming_id)) => {
            kept_id != incoming_id || kept.color != incoming.color
        }
        (_, None) => false,
    }
}

/// Session-wide set of known priorities shared by every card on a board.
///
/// Cloning shares the underlying palette. All writes go through
/// [`dedupe_palette`], so concurrent creations of the same label collapse
/// into one entry.
#[derive(Debug, Clone, Default)]
pub struct PaletteStore {
    entries: Arc<RwLock<Vec<Priority>>>,
}

impl PaletteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<Priority>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(dedupe_palette(entries))),
        }
    }

    pub async fn snapshot(&self) -> Vec<Priority> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn find(&self, name: &str) -> Option<Priority> {
        let key = palette_key(name);
        self.entries
            .read()
            .await
            .iter()
            .find(|entry| entry.key() == key)
            .cloned()
    }

    /// Merge `incoming` after the current entries and return the new palette.
    pub async fn merge<I>(&self, incoming: I) -> Vec<Priority>
    where
        I: IntoIterator<Item = Priority>,
    {
        let mut guard = self.entries.write().await;
        let current = std::mem::take(&mut *guard);
        *guard = dedupe_palette(current.into_iter().chain(incoming));
        guard.clone()
    }

    /// Pull the admin palette from the backend and merge it in.
    pub async fn refresh(
        &self,
        backend: &dyn PriorityBackend,
    ) -> Result<Vec<Priority>, DashboardError> {
        let fetched = backend.list_priorities().await?;
        let fetched_count = fetched.len();
        let palette = self.merge(fetched).await;
        info!(
            fetched = fetched_count,
            palette = palette.len(),
            "priority palette refreshed"
        );
        Ok(palette)
    }
}
