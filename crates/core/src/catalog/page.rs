//! Fixed-size pagination over a derived list.

/// Products per page on the public catalog.
pub const STOREFRONT_PAGE_SIZE: usize = 15;
/// Rows per page in the admin spreadsheet.
pub const ADMIN_PAGE_SIZE: usize = 24;
/// Cards per page in the related-products carousel.
pub const RELATED_PAGE_SIZE: usize = 3;

/// Number of pages needed for `len` items. Zero items means zero pages.
#[must_use]
pub const fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(effective_size(page_size))
}

/// Clamp a 1-based page number into `[1, max(1, total_pages)]`.
#[must_use]
pub fn clamp_page(page: usize, len: usize, page_size: usize) -> usize {
    page.clamp(1, total_pages(len, page_size).max(1))
}

const fn effective_size(page_size: usize) -> usize {
    if page_size == 0 { 1 } else { page_size }
}

/// One page of a list, with the bookkeeping templates need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, already clamped.
    pub number: usize,
    pub total_pages: usize,
    /// Index of the first item on this page.
    pub start: usize,
    /// One past the last item on this page.
    pub end: usize,
    /// Length of the whole list.
    pub total: usize,
}

impl<T> Page<T> {
    /// Cut `items` down to the requested page, clamping out-of-range requests.
    #[must_use]
    pub fn new(items: Vec<T>, page: usize, page_size: usize) -> Self {
        let size = effective_size(page_size);
        let total = items.len();
        let number = clamp_page(page, total, size);
        let start = ((number - 1) * size).min(total);
        let end = (number * size).min(total);

        Self {
            items: items.into_iter().skip(start).take(end - start).collect(),
            number,
            total_pages: total_pages(total, size),
            start,
            end,
            total,
        }
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    #[must_use]
    pub const fn previous_number(&self) -> usize {
        self.number.saturating_sub(1)
    }

    #[must_use]
    pub const fn next_number(&self) -> usize {
        self.number + 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Counter shown under the grid, e.g. `Showing 15 of 20`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("Showing {} of {}", self.end, self.total)
    }

    /// Page numbers for the pager links.
    pub fn numbers(&self) -> impl Iterator<Item = usize> + use<T> {
        1..=self.total_pages
    }
}

/// Page over borrowed items.
#[must_use]
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<&T> {
    Page::new(items.iter().collect(), page, page_size)
}
