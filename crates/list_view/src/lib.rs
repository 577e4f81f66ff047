//! Client-side list views: filter, search, sort and paginate an in-memory
//! collection fetched from the backend without mutating it.

mod coerce;
pub mod filter;
pub mod page;
pub mod record;
pub mod search;
pub mod sort;
pub mod state;

pub use coerce::parse_timestamp;
pub use filter::{apply_filters, FilterSet, Predicate, ALL};
pub use page::{paginate, Page};
pub use record::{Record, PLACEHOLDER};
pub use search::{apply_search, SearchQuery};
pub use sort::{apply_sort, SortDirection, SortKey};
pub use state::{render, ListViewState, DEFAULT_PAGE_SIZE};

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod engine_tests;

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod state_tests;
