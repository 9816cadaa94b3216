//! Fixed-size windowing over an in-memory record set
//!
//! Pages are 1-indexed. `total_pages` is `ceil(len / page_size)`, so an empty
//! set has zero pages; the cursor still sits on page 1 and the window is empty.

/// Windowed view over the full, ordered record set
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    full_set: Vec<T>,
    page_size: usize,
    page_number: usize,
    total_pages: usize,
}

impl<T> Paginator<T> {
    /// `page_size` must be non-zero; a zero size is treated as one.
    pub fn new(page_size: usize) -> Self {
        Self {
            full_set: Vec::new(),
            page_size: page_size.max(1),
            page_number: 1,
            total_pages: 0,
        }
    }

    /// Replace the full set and recompute the page count
    ///
    /// The cursor is kept, but clamped to `max(total_pages, 1)` when the new
    /// set has fewer pages.
    pub fn set_full_set(&mut self, records: Vec<T>) {
        self.full_set = records;
        self.total_pages = self.full_set.len().div_ceil(self.page_size);
        self.page_number = self.page_number.min(self.total_pages.max(1));
    }

    /// Drop every record; the cursor returns to page 1
    pub fn clear(&mut self) {
        self.full_set.clear();
        self.total_pages = 0;
        self.page_number = 1;
    }

    /// Jump to page `n`; returns false and leaves the cursor alone when out of range
    pub fn goto(&mut self, n: usize) -> bool {
        if n == 0 || n > self.total_pages {
            return false;
        }
        self.page_number = n;
        true
    }

    pub fn next(&mut self) -> bool {
        if self.page_number < self.total_pages {
            self.page_number += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.page_number > 1 {
            self.page_number -= 1;
            true
        } else {
            false
        }
    }

    /// Returns whether the cursor moved
    pub fn first(&mut self) -> bool {
        let moved = self.page_number != 1;
        self.page_number = 1;
        moved
    }

    /// Returns whether the cursor moved
    pub fn last(&mut self) -> bool {
        let target = self.total_pages.max(1);
        let moved = self.page_number != target;
        self.page_number = target;
        moved
    }

    /// Half-open `[start, end)` bounds of the current window
    pub fn bounds(&self) -> (usize, usize) {
        let start = ((self.page_number - 1) * self.page_size).min(self.full_set.len());
        let end = (self.page_number * self.page_size).min(self.full_set.len());
        (start, end)
    }

    pub fn window(&self) -> &[T] {
        let (start, end) = self.bounds();
        &self.full_set[start..end]
    }

    pub fn full_set(&self) -> &[T] {
        &self.full_set
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn len(&self) -> usize {
        self.full_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.full_set.is_empty()
    }

    pub fn is_first_page(&self) -> bool {
        self.page_number == 1
    }

    pub fn is_last_page(&self) -> bool {
        self.page_number >= self.total_pages
    }

    /// Human readable window summary, `"No records"` for an empty set
    pub fn page_info(&self) -> String {
        if self.full_set.is_empty() {
            return "No records".to_string();
        }
        let (start, end) = self.bounds();
        format!("Showing {}-{} of {} records", start + 1, end, self.full_set.len())
    }
}
