use std::{collections::HashMap, fmt, sync::Arc};

use futures::future::join_all;
use shared::{
    domain::{DealId, Priority, PriorityId},
    error::DashboardError,
    protocol::AssignedPriority,
};
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tracing::{error, info, warn};

use crate::{backend::PriorityBackend, cancel::CancelSignal, palette::PaletteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationPhase {
    Idle,
    OptimisticApplied,
    Persisting,
    RetryingFallback,
    Reconciled,
    Failed,
    /// The owning view was cancelled before state could be updated.
    Abandoned,
}

impl MutationPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Reconciled | Self::Failed | Self::Abandoned)
    }
}

impl fmt::Display for MutationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::OptimisticApplied => "optimistic_applied",
            Self::Persisting => "persisting",
            Self::RetryingFallback => "retrying_fallback",
            Self::Reconciled => "reconciled",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistCall {
    Create,
    Assign,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEvent {
    pub deal_id: DealId,
    pub generation: u64,
    pub phase: MutationPhase,
    pub priority: Option<Priority>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub deal_id: DealId,
    pub phase: MutationPhase,
    /// Local value for the deal once the mutation settled.
    pub local: Option<Priority>,
    /// Authoritative value returned by the backend, when one was received.
    pub server: Option<Priority>,
    pub calls: Vec<PersistCall>,
    pub error: Option<DashboardError>,
    /// A newer mutation for the same deal owns the local value.
    pub superseded: bool,
}

/// Per-deal ordering: `issued` counts optimistic applies, `finished` the
/// highest generation whose persistence has ended.
struct DealQueue {
    issued: u64,
    finished: Arc<watch::Sender<u64>>,
}

impl DealQueue {
    fn new() -> Self {
        let (finished, _) = watch::channel(0);
        Self {
            issued: 0,
            finished: Arc::new(finished),
        }
    }
}

/// Marks a generation finished when dropped, so later ones may persist even
/// if the owning future is dropped mid-flight.
struct Turn {
    finished: Arc<watch::Sender<u64>>,
    generation: u64,
}

impl Drop for Turn {
    fn drop(&mut self) {
        let generation = self.generation;
        self.finished
            .send_modify(|done| *done = (*done).max(generation));
    }
}

impl MutationOutcome {
    fn new(deal_id: DealId) -> Self {
        Self {
            deal_id,
            phase: MutationPhase::Idle,
            local: None,
            server: None,
            calls: Vec::new(),
            error: None,
            superseded: false,
        }
    }

    pub fn is_reconciled(&self) -> bool {
        self.phase == MutationPhase::Reconciled
    }

    pub fn user_message(&self) -> Option<String> {
        self.error.as_ref().map(DashboardError::user_message)
    }
}

/// Applies priority choices to a board immediately, then persists them.
///
/// Persistence is create (for labels without an id) then assign, with one
/// update call as fallback when assign fails. The backend response always
/// replaces the optimistic value. Failures leave the optimistic value in
/// place. Mutations on the same deal persist one at a time in the order they
/// were applied, and a response is only applied while its mutation is still
/// the latest for that deal.
pub struct PriorityCoordinator {
    backend: Arc<dyn PriorityBackend>,
    palette: PaletteStore,
    board: RwLock<HashMap<DealId, Priority>>,
    deals: Mutex<HashMap<DealId, DealQueue>>,
    events: broadcast::Sender<MutationEvent>,
}

impl PriorityCoordinator {
    pub fn new(backend: Arc<dyn PriorityBackend>, palette: PaletteStore) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            backend,
            palette,
            board: RwLock::new(HashMap::new()),
            deals: Mutex::new(HashMap::new()),
            events,
        })
    }

    pub fn palette(&self) -> &PaletteStore {
        &self.palette
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<MutationEvent> {
        self.events.subscribe()
    }

    pub async fn refresh_palette(&self) -> Result<Vec<Priority>, DashboardError> {
        self.palette.refresh(self.backend.as_ref()).await
    }

    /// Load assignments already known to the backend, e.g. from a deal list.
    pub async fn seed<I>(&self, assignments: I)
    where
        I: IntoIterator<Item = (DealId, Priority)>,
    {
        let assignments: Vec<(DealId, Priority)> = assignments.into_iter().collect();
        self.palette
            .merge(assignments.iter().map(|(_, priority)| priority.clone()))
            .await;
        self.board.write().await.extend(assignments);
    }

    pub async fn priority_for(&self, deal_id: DealId) -> Option<Priority> {
        self.board.read().await.get(&deal_id).cloned()
    }

    pub async fn board_snapshot(&self) -> HashMap<DealId, Priority> {
        self.board.read().await.clone()
    }

    /// Independent deals persist concurrently; completion order is not
    /// guaranteed.
    pub async fn assign_priorities(
        &self,
        batch: Vec<(DealId, Priority)>,
        cancel: &CancelSignal,
    ) -> Vec<MutationOutcome> {
        join_all(
            batch
                .into_iter()
                .map(|(deal_id, selection)| self.assign_priority(deal_id, selection, cancel)),
        )
        .await
    }

    pub async fn assign_priority(
        &self,
        deal_id: DealId,
        selection: Priority,
        cancel: &CancelSignal,
    ) -> MutationOutcome {
        let mut outcome = MutationOutcome::new(deal_id);
        let selection = Priority {
            name: selection.name.trim().to_string(),
            ..selection
        };

        if selection.name.is_empty() {
            outcome.phase = MutationPhase::Failed;
            outcome.error = Some(DashboardError::invalid("priority name must not be blank"));
            return outcome;
        }
        if cancel.is_cancelled() {
            outcome.phase = MutationPhase::Abandoned;
            return outcome;
        }

        let (turn, mut finished) = self.apply_optimistic(deal_id, &selection).await;
        let generation = turn.generation;
        outcome.phase = MutationPhase::OptimisticApplied;
        outcome.local = Some(selection.clone());
        self.emit(deal_id, generation, MutationPhase::OptimisticApplied, Some(&selection), None);

        // Wait for every earlier generation of this deal to finish persisting.
        let _ = finished.wait_for(|done| *done + 1 >= generation).await;

        outcome.phase = MutationPhase::Persisting;
        self.emit(deal_id, generation, MutationPhase::Persisting, None, None);

        match self
            .persist(deal_id, generation, &selection, &mut outcome)
            .await
        {
            Ok(assigned) => {
                self.reconcile(deal_id, generation, &assigned, cancel, &mut outcome)
                    .await
            }
            Err(err) => {
                error!(
                    deal_id = deal_id.0,
                    priority = %selection.name,
                    status = ?err.status(),
                    error = %err,
                    calls = ?outcome.calls,
                    "priority mutation failed; keeping optimistic value"
                );
                outcome.phase = MutationPhase::Failed;
                self.emit(
                    deal_id,
                    generation,
                    MutationPhase::Failed,
                    None,
                    Some(err.user_message()),
                );
                outcome.error = Some(err);
                outcome.local = self.priority_for(deal_id).await;
            }
        }

        drop(turn);
        outcome
    }

    /// Bumps the generation and updates the board in one critical section,
    /// so generation order is both board order and persistence order.
    async fn apply_optimistic(
        &self,
        deal_id: DealId,
        selection: &Priority,
    ) -> (Turn, watch::Receiver<u64>) {
        if self.palette.find(&selection.name).await.is_none() {
            self.palette.merge([selection.clone()]).await;
        }

        let mut deals = self.deals.lock().await;
        let queue = deals.entry(deal_id).or_insert_with(DealQueue::new);
        queue.issued += 1;
        self.board.write().await.insert(deal_id, selection.clone());
        let turn = Turn {
            finished: Arc::clone(&queue.finished),
            generation: queue.issued,
        };
        (turn, queue.finished.subscribe())
    }

    /// Create (when needed) then assign, falling back to update once.
    async fn persist(
        &self,
        deal_id: DealId,
        generation: u64,
        selection: &Priority,
        outcome: &mut MutationOutcome,
    ) -> Result<AssignedPriority, DashboardError> {
        let priority_id = match self.resolve_identity(selection).await {
            Some(priority_id) => priority_id,
            None => {
                outcome.calls.push(PersistCall::Create);
                let created = self
                    .backend
                    .create_priority(&selection.name, &selection.color)
                    .await?;
                let priority_id = created.id.ok_or_else(|| {
                    DashboardError::malformed("created priority has no id")
                })?;
                info!(
                    deal_id = deal_id.0,
                    priority_id = priority_id.0,
                    priority = %created.name,
                    "priority created"
                );
                self.palette.merge([created]).await;
                priority_id
            }
        };

        outcome.calls.push(PersistCall::Assign);
        match self.backend.assign_priority(deal_id, priority_id).await {
            Ok(assigned) => Ok(assigned),
            Err(assign_err) => {
                warn!(
                    deal_id = deal_id.0,
                    priority_id = priority_id.0,
                    status = ?assign_err.status(),
                    error = %assign_err,
                    "assign priority failed; trying update"
                );
                outcome.phase = MutationPhase::RetryingFallback;
                self.emit(deal_id, generation, MutationPhase::RetryingFallback, None, None);

                outcome.calls.push(PersistCall::Update);
                self.backend.update_priority(deal_id, priority_id).await
            }
        }
    }

    async fn resolve_identity(&self, selection: &Priority) -> Option<PriorityId> {
        if let Some(priority_id) = selection.id {
            return Some(priority_id);
        }
        self.palette
            .find(&selection.name)
            .await
            .and_then(|known| known.id)
    }

    async fn reconcile(
        &self,
        deal_id: DealId,
        generation: u64,
        assigned: &AssignedPriority,
        cancel: &CancelSignal,
        outcome: &mut MutationOutcome,
    ) {
        if assigned.deal_id.is_some_and(|returned| returned != deal_id) {
            warn!(
                deal_id = deal_id.0,
                returned_deal_id = ?assigned.deal_id,
                "backend answered for a different deal"
            );
        }

        let server = assigned.to_priority();
        outcome.server = Some(server.clone());
        self.palette.merge([server.clone()]).await;

        if cancel.is_cancelled() {
            info!(deal_id = deal_id.0, "view cancelled; discarding reconciliation");
            outcome.phase = MutationPhase::Abandoned;
            self.emit(deal_id, generation, MutationPhase::Abandoned, None, None);
            return;
        }

        let applied = {
            let deals = self.deals.lock().await;
            if deals.get(&deal_id).map(|queue| queue.issued) == Some(generation) {
                self.board.write().await.insert(deal_id, server.clone());
                true
            } else {
                false
            }
        };

        outcome.phase = MutationPhase::Reconciled;
        outcome.superseded = !applied;
        outcome.local = self.priority_for(deal_id).await;
        if applied {
            info!(
                deal_id = deal_id.0,
                priority_id = assigned.id.0,
                priority = %server.name,
                "priority reconciled with backend"
            );
            self.emit(deal_id, generation, MutationPhase::Reconciled, Some(&server), None);
        } else {
            info!(
                deal_id = deal_id.0,
                generation,
                "newer mutation pending; skipped stale reconciliation"
            );
            self.emit(deal_id, generation, MutationPhase::Reconciled, None, None);
        }
    }

    fn emit(
        &self,
        deal_id: DealId,
        generation: u64,
        phase: MutationPhase,
        priority: Option<&Priority>,
        error: Option<String>,
    ) {
        let _ = self.events.send(MutationEvent {
            deal_id,
            generation,
            phase,
            priority: priority.cloned(),
            error,
        });
    }
}

