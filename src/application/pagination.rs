//! Page-number pagination over a counted collection.
//!
//! Pure math, no storage access: callers count first, then ask for the
//! offset window of a clamped page number.

use std::num::NonZeroU32;

/// Everything a view needs to render one page and its navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub number: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub offset: u64,
    pub limit: u32,
}

/// A page of items together with its [`PageInfo`].
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub info: PageInfo,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: NonZeroU32,
    total: u64,
}

impl Paginator {
    pub fn new(page_size: NonZeroU32, total: u64) -> Self {
        Self { page_size, total }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.get()
    }

    /// Number of pages; an empty collection still has one (empty) page.
    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.page_size.get());
        let pages = self.total.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Clamps `requested` into `1..=total_pages` and returns the window.
    /// Page 0 and out-of-range pages fail softly onto the nearest edge.
    pub fn page(&self, requested: u32) -> PageInfo {
        let total_pages = self.total_pages();
        let number = requested.clamp(1, total_pages);
        let limit = self.page_size.get();
        PageInfo {
            number,
            total_pages,
            total_items: self.total,
            has_previous: number > 1,
            has_next: number < total_pages,
            offset: u64::from(number - 1) * u64::from(limit),
            limit,
        }
    }
}
