//! Pure derived-view computations over assembled records: filtering,
//! sorting, grouping, pagination and time-relative selection.

pub mod bike;
pub mod bus;
pub mod rail;

/// One page of a longer list. Pages are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}

/// Slices `items` into page `page` of `per_page`. Out-of-range pages clamp to
/// the last page; an empty list has one empty page.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page_count = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, page_count);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());

    Page {
        items: items[start.min(items.len())..end].to_vec(),
        page,
        page_count,
        total: items.len(),
    }
}
