//! Backend access for the dashboard views: authenticated JSON calls, list
//! response normalization, the shared priority palette, and the optimistic
//! priority-assignment flow.

pub mod adapter;
pub mod auth;
pub mod backend;
pub mod cancel;
pub mod config;
pub mod http;
pub mod mutation;
pub mod palette;
pub mod poller;

pub use adapter::{normalize_list_payload, RecordList};
pub use auth::{
    require_token, ChainedTokenSource, EnvTokenSource, FileTokenSource, MemoryTokenStore,
    TokenSource,
};
pub use backend::PriorityBackend;
pub use cancel::{CancelHandle, CancelSignal};
pub use config::{load_settings, Settings};
pub use http::{BackendClient, Endpoints, FileUpload};
pub use mutation::{
    MutationEvent, MutationOutcome, MutationPhase, PersistCall, PriorityCoordinator,
};
pub use palette::{dedupe_palette, PaletteStore};
pub use poller::{ListPoller, PollEvent};

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod http_tests;

#[cfg(test)]
#[path = "tests/palette_tests.rs"]
mod palette_tests;

#[cfg(test)]
#[path = "tests/mutation_tests.rs"]
mod mutation_tests;
