use std::{
    fs,
    path::PathBuf,
    sync::{Arc, RwLock},
};

use shared::error::DashboardError;

/// Supplies the bearer token at call time.
///
/// Implementations are queried on every request so sign-out or token
/// rotation takes effect immediately.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Returns the trimmed token or `Unauthenticated` when none is available.
pub fn require_token(source: &dyn TokenSource) -> Result<String, DashboardError> {
    source
        .bearer_token()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(DashboardError::Unauthenticated)
}

/// In-memory session storage; cloning shares the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(token.into());
    }

    pub fn clear(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
    }
}

impl TokenSource for MemoryTokenStore {
    fn bearer_token(&self) -> Option<String> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[derive(Debug, Clone)]
pub struct EnvTokenSource {
    var: String,
}

impl EnvTokenSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenSource for EnvTokenSource {
    fn bearer_token(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// Token persisted to disk by a separate sign-in step; re-read per call.
#[derive(Debug, Clone)]
pub struct FileTokenSource {
    path: PathBuf,
}

impl FileTokenSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenSource for FileTokenSource {
    fn bearer_token(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok()
    }
}

/// First source that yields a non-blank token wins.
pub struct ChainedTokenSource {
    sources: Vec<Arc<dyn TokenSource>>,
}

impl ChainedTokenSource {
    pub fn new(sources: Vec<Arc<dyn TokenSource>>) -> Self {
        Self { sources }
    }
}

impl TokenSource for ChainedTokenSource {
    fn bearer_token(&self) -> Option<String> {
        self.sources
            .iter()
            .filter_map(|source| source.bearer_token())
            .find(|token| !token.trim().is_empty())
    }
}
