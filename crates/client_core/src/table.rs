//! Session table state: stable sorting, fixed-size pages and row selection by name.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use shared::domain::{Session, SessionColumn};
use thiserror::Error;

pub const PAGE_SIZE_OPTIONS: [usize; 3] = [5, 10, 25];
pub const DEFAULT_PAGE_SIZE: usize = 5;
const CELL_PREVIEW_CHARS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("page size {0} is not one of 5, 10, 25")]
    UnsupportedPageSize(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Ascending => "sorted ascending",
            SortDirection::Descending => "sorted descending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: SessionColumn,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: SessionColumn::Name,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortState {
    /// Clicking the active ascending column flips it to descending; anything else sorts
    /// the clicked column ascending.
    pub fn request(&mut self, column: SessionColumn) {
        let was_ascending = self.column == column && self.direction == SortDirection::Ascending;
        self.direction = if was_ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.column = column;
    }

    pub fn compare(&self, a: &Session, b: &Session) -> Ordering {
        let ordering = self.column.compare(a, b);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Sorts references to `items`; elements comparing equal keep their input order.
pub fn stable_sorted<T, F>(items: &[T], mut compare: F) -> Vec<&T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut sorted: Vec<&T> = items.iter().collect();
    // slice::sort_by is a stable merge sort
    sorted.sort_by(|a, b| compare(a, b));
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Result<Self, TableError> {
        let mut pagination = Self::default();
        pagination.set_page_size(page_size)?;
        Ok(pagination)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Changing the page size always returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), TableError> {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return Err(TableError::UnsupportedPageSize(page_size));
        }
        self.page_size = page_size;
        self.page = 0;
        Ok(())
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }

    /// Pulls the cursor back onto the last page when the row count shrank under it.
    pub fn clamp_to(&mut self, total: usize) {
        let last = self.page_count(total).saturating_sub(1);
        self.page = self.page.min(last);
    }

    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page * self.page_size).min(items.len());
        let end = (start + self.page_size).min(items.len());
        &items[start..end]
    }

    /// Blank rows that keep a short last page as tall as a full one.
    pub fn filler_rows(&self, total: usize) -> usize {
        if self.page == 0 {
            return 0;
        }
        ((self.page + 1) * self.page_size).saturating_sub(total)
    }
}

/// Selected session names in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    names: Vec<String>,
}

impl Selection {
    /// Returns whether `name` is selected afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        if let Some(index) = self.names.iter().position(|n| n == name) {
            self.names.remove(index);
            false
        } else {
            self.names.push(name.to_string());
            true
        }
    }

    pub fn set_all(&mut self, checked: bool, rows: &[Session]) {
        self.names = if checked {
            rows.iter().map(|row| row.name.clone()).collect()
        } else {
            Vec::new()
        };
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn single(&self) -> Option<&str> {
        match self.names.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    pub fn is_all(&self, total: usize) -> bool {
        total > 0 && self.names.len() == total
    }

    /// Header checkbox state between none and all.
    pub fn is_partial(&self, total: usize) -> bool {
        !self.names.is_empty() && self.names.len() < total
    }

    pub fn retain_existing(&mut self, rows: &[Session]) {
        self.names
            .retain(|name| rows.iter().any(|row| &row.name == name));
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    rows: Vec<Session>,
    sort: SortState,
    pagination: Pagination,
    selection: Selection,
}

impl SessionTable {
    pub fn new(page_size: usize) -> Result<Self, TableError> {
        Ok(Self {
            pagination: Pagination::new(page_size)?,
            ..Self::default()
        })
    }

    /// Swaps in a freshly fetched list. Selections of vanished sessions are dropped.
    pub fn replace_rows(&mut self, rows: Vec<Session>) {
        self.rows = rows;
        self.selection.retain_existing(&self.rows);
        self.pagination.clamp_to(self.rows.len());
    }

    pub fn rows(&self) -> &[Session] {
        &self.rows
    }

    pub fn find(&self, name: &str) -> Option<&Session> {
        self.rows.iter().find(|row| row.name == name)
    }

    pub fn sort(&self) -> SortState {
        self.sort
    }

    pub fn request_sort(&mut self, column: SessionColumn) {
        self.sort.request(column);
    }

    pub fn sorted_rows(&self) -> Vec<&Session> {
        let sort = self.sort;
        stable_sorted(&self.rows, |a, b| sort.compare(a, b))
    }

    pub fn visible_rows(&self) -> Vec<&Session> {
        let sorted = self.sorted_rows();
        self.pagination.window(&sorted).to_vec()
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn page_count(&self) -> usize {
        self.pagination.page_count(self.rows.len())
    }

    pub fn filler_rows(&self) -> usize {
        self.pagination.filler_rows(self.rows.len())
    }

    pub fn set_page(&mut self, page: usize) {
        self.pagination.set_page(page);
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), TableError> {
        self.pagination.set_page_size(page_size)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Toggles one row. When exactly one row stays selected its record is returned so the
    /// caller can snapshot it into the edit form.
    pub fn toggle_row(&mut self, name: &str) -> Option<&Session> {
        self.selection.toggle(name);
        let single = self.selection.single()?;
        self.rows.iter().find(|row| row.name == single)
    }

    pub fn set_all_selected(&mut self, checked: bool) {
        self.selection.set_all(checked, &self.rows);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

/// First characters of a long cell value followed by `...`.
pub fn abbreviate(value: &str) -> String {
    if value.chars().count() <= CELL_PREVIEW_CHARS {
        return value.to_string();
    }
    let head: String = value.chars().take(CELL_PREVIEW_CHARS).collect();
    format!("{head}...")
}

pub fn expiry_date(expires_at: DateTime<Utc>) -> String {
    expires_at.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
#[path = "tests/table_tests.rs"]
mod tests;
