use serde::Serialize;
use shared::error::DashboardError;

/// One window of an already filtered and sorted collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Effective index after clamping.
    pub page_index: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

pub fn validate_page_size(page_size: usize) -> Result<usize, DashboardError> {
    if page_size == 0 {
        return Err(DashboardError::invalid("page size must be positive"));
    }
    Ok(page_size)
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size)
}

/// Out-of-range indices are clamped to the last page; an empty input yields
/// a single empty page at index 0.
pub fn paginate<T: Clone>(
    records: &[T],
    page_index: usize,
    page_size: usize,
) -> Result<Page<T>, DashboardError> {
    let page_size = validate_page_size(page_size)?;
    let total_items = records.len();
    let total_pages = total_pages(total_items, page_size);

    if total_pages == 0 {
        return Ok(Page {
            items: Vec::new(),
            page_index: 0,
            page_size,
            total_items,
            total_pages,
            has_next: false,
            has_prev: false,
        });
    }

    let page_index = page_index.min(total_pages - 1);
    let start = page_index * page_size;
    let end = (start + page_size).min(total_items);

    Ok(Page {
        items: records[start..end].to_vec(),
        page_index,
        page_size,
        total_items,
        total_pages,
        has_next: page_index + 1 < total_pages,
        has_prev: page_index > 0,
    })
}
