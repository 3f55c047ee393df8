use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::Hospital;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// Server-driven page position. This is the authoritative pagination model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PageState {
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl PageState {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
            total_pages: 1,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Controls are only shown when there is more than one page.
    pub fn shows_controls(&self) -> bool {
        self.total_pages > 1
    }

    pub fn previous_page(&self) -> u32 {
        self.clamp(self.page.saturating_sub(1))
    }

    pub fn next_page(&self) -> u32 {
        self.clamp(self.page.saturating_add(1))
    }

    pub fn clamp(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages.max(1))
    }
}

pub fn total_pages(len: usize, items_per_page: usize) -> usize {
    len.div_ceil(items_per_page.max(1))
}

/// The 1-indexed `page` of `items`. Out-of-range pages yield an empty slice.
pub fn page_slice<T>(items: &[T], page: usize, items_per_page: usize) -> &[T] {
    let per = items_per_page.max(1);
    let start = page.saturating_sub(1).saturating_mul(per);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per).min(items.len());
    &items[start..end]
}

/// Order-sensitive fingerprint of a hospital list, used to notice when a section's
/// filtered list has changed under it.
pub fn list_identity(hospitals: &[Hospital]) -> u64 {
    let mut hasher = DefaultHasher::new();
    hospitals.len().hash(&mut hasher);
    for hospital in hospitals {
        hospital.id.hash(&mut hasher);
    }
    hasher.finish()
}

/// Display-only slicing of an already-filtered, in-memory section list.
///
/// The page resets to 1 whenever the list it is showing changes identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPager {
    items_per_page: usize,
    current_page: usize,
    identity: Option<u64>,
}

impl Default for SectionPager {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}

impl SectionPager {
    pub fn new(items_per_page: usize) -> Self {
        Self {
            items_per_page: items_per_page.max(1),
            current_page: 1,
            identity: None,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Record the list being shown; returns `true` if the page was reset.
    pub fn sync(&mut self, hospitals: &[Hospital]) -> bool {
        let identity = list_identity(hospitals);
        let changed = self.identity.is_some_and(|previous| previous != identity);
        self.identity = Some(identity);
        if changed {
            self.current_page = 1;
        }
        changed
    }

    pub fn set_page(&mut self, page: usize, len: usize) {
        let last = total_pages(len, self.items_per_page).max(1);
        self.current_page = page.clamp(1, last);
    }

    pub fn total_pages(&self, len: usize) -> usize {
        total_pages(len, self.items_per_page)
    }

    pub fn slice<'a>(&self, hospitals: &'a [Hospital]) -> &'a [Hospital] {
        page_slice(hospitals, self.current_page, self.items_per_page)
    }
}
