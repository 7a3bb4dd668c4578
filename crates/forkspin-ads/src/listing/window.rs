//! Load-more pagination.

use serde::{Deserialize, Serialize};

/// How much of the listing order is on screen.
///
/// Unlike page-by-page navigation the window only grows: each load-more
/// appends one more page below what is already visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleWindow {
    /// Pages loaded so far (at least 1).
    pub pages: usize,
    /// Items per page.
    pub per_page: usize,
    /// Items in the listing order.
    pub total: usize,
}

impl VisibleWindow {
    /// First page of a listing with `total` items.
    pub fn new(per_page: usize, total: usize) -> Self {
        Self {
            pages: 1,
            per_page: per_page.max(1),
            total,
        }
    }

    /// Number of visible items, capped at the total.
    pub fn visible_count(&self) -> usize {
        self.pages.saturating_mul(self.per_page).min(self.total)
    }

    /// Whether a load-more would reveal anything.
    pub fn has_more(&self) -> bool {
        self.visible_count() < self.total
    }

    /// Reveal one more page. Returns how many items became visible.
    pub fn load_more(&mut self) -> usize {
        if !self.has_more() {
            return 0;
        }
        let before = self.visible_count();
        self.pages += 1;
        self.visible_count() - before
    }

    /// Follow a change in the listing length without resetting.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }
}
