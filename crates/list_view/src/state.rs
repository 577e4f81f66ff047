use shared::error::DashboardError;
use tracing::debug;

use crate::{
    filter::{apply_filters, FilterSet, Predicate},
    page::{paginate, validate_page_size, Page},
    record::Record,
    search::{apply_search, SearchQuery},
    sort::{apply_sort, SortKey},
};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Filter/search/sort/page inputs owned by one list view.
///
/// Every change to the filters or the search resets the page index so the
/// next render cannot land past the last page of the narrowed result.
#[derive(Debug, Clone)]
pub struct ListViewState {
    filters: FilterSet,
    search: SearchQuery,
    sort: Option<SortKey>,
    page_index: usize,
    page_size: usize,
}

impl Default for ListViewState {
    fn default() -> Self {
        Self {
            filters: FilterSet::default(),
            search: SearchQuery::default(),
            sort: None,
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListViewState {
    pub fn new(page_size: usize) -> Result<Self, DashboardError> {
        Ok(Self {
            page_size: validate_page_size(page_size)?,
            ..Self::default()
        })
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn search(&self) -> &SearchQuery {
        &self.search
    }

    pub fn sort(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_filter(&mut self, name: impl Into<String>, predicate: Predicate) {
        self.filters.set(name, predicate);
        self.page_index = 0;
    }

    pub fn clear_filter(&mut self, name: &str) {
        self.filters.remove(name);
        self.page_index = 0;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.page_index = 0;
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search.text = text.into();
        self.page_index = 0;
    }

    pub fn set_search_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search.fields = fields.into_iter().map(Into::into).collect();
        self.page_index = 0;
    }

    pub fn set_sort(&mut self, sort: Option<SortKey>) {
        self.sort = sort;
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), DashboardError> {
        self.page_size = validate_page_size(page_size)?;
        self.page_index = 0;
        Ok(())
    }

    pub fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    pub fn next_page(&mut self) {
        self.page_index = self.page_index.saturating_add(1);
    }

    pub fn prev_page(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    /// Filters, then search, then sort, then the page window.
    pub fn render<'a>(&self, records: &'a [Record]) -> Result<Page<&'a Record>, DashboardError> {
        let all: Vec<&Record> = records.iter().collect();
        let filtered = apply_filters(&all, &self.filters);
        let searched = apply_search(&filtered, &self.search);
        let ordered = match &self.sort {
            Some(key) => apply_sort(&searched, key),
            None => searched,
        };
        let page = paginate(&ordered, self.page_index, self.page_size)?;
        debug!(
            source = records.len(),
            matched = page.total_items,
            requested_page = self.page_index,
            page = page.page_index,
            total_pages = page.total_pages,
            "list view rendered"
        );
        Ok(page)
    }
}

/// One-shot render over an optional collection; `None` renders as empty.
pub fn render<'a>(
    records: Option<&'a [Record]>,
    state: &ListViewState,
) -> Result<Page<&'a Record>, DashboardError> {
    state.render(records.unwrap_or_default())
}
