//! Fixed-size paging over an already-fetched result list.
//!
//! A [`PageSet`] is built once per search and shared behind an `Arc`; a
//! [`Cursor`] is the cheap, per-session position within it. Page changes
//! never re-query the catalog, and out-of-range targets leave the cursor
//! where it was.

use std::sync::Arc;

use serde::Serialize;

/// Results partitioned into pages. The last page may be shorter.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSet<T> {
    pages: Vec<Vec<T>>,
    page_size: usize,
    total_count: i64,
}

impl<T> PageSet<T> {
    /// Partitions `items` eagerly. A zero `page_size` is treated as 1.
    pub fn new(items: Vec<T>, page_size: usize, total_count: i64) -> Self {
        let page_size = page_size.max(1);
        let mut pages = Vec::with_capacity(items.len().div_ceil(page_size));
        let mut iter = items.into_iter().peekable();
        while iter.peek().is_some() {
            pages.push(iter.by_ref().take(page_size).collect());
        }
        Self {
            pages,
            page_size,
            total_count,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&[T]> {
        self.pages.get(index).map(Vec::as_slice)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Total reported by the catalog's COUNT query.
    pub fn total_count(&self) -> i64 {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Relative or absolute page navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    First,
    Prev,
    Next,
    Last,
    To(usize),
}

impl Nav {
    /// Resolves the target index, or `None` when it falls outside the set.
    pub fn target(self, current: usize, page_count: usize) -> Option<usize> {
        let target = match self {
            Nav::First => 0,
            Nav::Prev => current.checked_sub(1)?,
            Nav::Next => current + 1,
            Nav::Last => page_count.checked_sub(1)?,
            Nav::To(i) => i,
        };
        (target < page_count).then_some(target)
    }
}

/// Position within a shared [`PageSet`].
#[derive(Debug)]
pub struct Cursor<T> {
    set: Arc<PageSet<T>>,
    index: usize,
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        Self {
            set: Arc::clone(&self.set),
            index: self.index,
        }
    }
}

impl<T> Cursor<T> {
    pub fn new(set: PageSet<T>) -> Self {
        Self {
            set: Arc::new(set),
            index: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set(&self) -> &PageSet<T> {
        &self.set
    }

    pub fn page(&self) -> &[T] {
        self.set.page(self.index).unwrap_or(&[])
    }

    /// Moves to `index`; out-of-range targets are a no-op returning `false`.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index < self.set.page_count() {
            self.index = index;
            true
        } else {
            false
        }
    }

    pub fn navigate(&mut self, nav: Nav) -> bool {
        match nav.target(self.index, self.set.page_count()) {
            Some(target) => self.go_to(target),
            None => false,
        }
    }
}

impl<T: Clone> Cursor<T> {
    /// Snapshot of the current page for rendering.
    pub fn view(&self) -> PageView<T> {
        PageView::new(&self.set, self.index)
    }
}

/// One rendered page plus the numbers needed for its header and controls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView<T> {
    /// Zero-based page index.
    pub index: usize,
    pub page_count: usize,
    /// One-based position of the first item on this page.
    pub start: i64,
    /// One-based position of the last item on this page.
    pub end: i64,
    pub total: i64,
    pub items: Vec<T>,
}

impl<T: Clone> PageView<T> {
    fn new(set: &PageSet<T>, index: usize) -> Self {
        let size = set.page_size() as i64;
        let page = index as i64;
        Self {
            index,
            page_count: set.page_count(),
            start: size * page + 1,
            end: (size * (page + 1)).min(set.total_count()),
            total: set.total_count(),
            items: set.page(index).map(<[T]>::to_vec).unwrap_or_default(),
        }
    }
}

impl<T> PageView<T> {
    pub fn has_prev(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.page_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (1..=n).collect()
    }

    #[test]
    fn test_partition_45_by_20() {
        let set = PageSet::new(numbers(45), 20, 45);
        assert_eq!(set.page_count(), 3);
        assert_eq!(set.page(0).unwrap().len(), 20);
        assert_eq!(set.page(1).unwrap().len(), 20);
        assert_eq!(set.page(2).unwrap(), &[41, 42, 43, 44, 45]);
        assert!(set.page(3).is_none());
    }

    #[test]
    fn test_empty_set() {
        let set: PageSet<usize> = PageSet::new(Vec::new(), 20, 0);
        assert!(set.is_empty());
        let mut cursor = Cursor::new(set);
        assert!(cursor.page().is_empty());
        assert!(!cursor.navigate(Nav::Last));
        assert!(!cursor.go_to(0));
    }

    #[test]
    fn test_zero_page_size_is_one() {
        let set = PageSet::new(numbers(3), 0, 3);
        assert_eq!(set.page_count(), 3);
        assert_eq!(set.page_size(), 1);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut cursor = Cursor::new(PageSet::new(numbers(45), 20, 45));
        assert!(cursor.go_to(1));
        assert!(!cursor.go_to(5));
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn test_go_to_is_idempotent() {
        let mut cursor = Cursor::new(PageSet::new(numbers(45), 20, 45));
        assert!(cursor.go_to(2));
        let first = cursor.view();
        assert!(cursor.go_to(2));
        assert_eq!(cursor.view(), first);
        assert_eq!(first.items, vec![41, 42, 43, 44, 45]);
    }

    #[test]
    fn test_relative_navigation() {
        let mut cursor = Cursor::new(PageSet::new(numbers(45), 20, 45));
        assert!(!cursor.navigate(Nav::Prev));
        assert!(cursor.navigate(Nav::Next));
        assert_eq!(cursor.index(), 1);
        assert!(cursor.navigate(Nav::Last));
        assert_eq!(cursor.index(), 2);
        assert!(!cursor.navigate(Nav::Next));
        assert_eq!(cursor.index(), 2);
        assert!(cursor.navigate(Nav::First));
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn test_view_header_numbers() {
        let mut cursor = Cursor::new(PageSet::new(numbers(45), 20, 45));
        let v = cursor.view();
        assert_eq!((v.start, v.end, v.total), (1, 20, 45));
        assert!(!v.has_prev());
        assert!(v.has_next());

        cursor.go_to(2);
        let v = cursor.view();
        assert_eq!((v.start, v.end, v.total), (41, 45, 45));
        assert!(v.has_prev());
        assert!(!v.has_next());
    }

    #[test]
    fn test_clones_share_pages() {
        let mut a = Cursor::new(PageSet::new(numbers(45), 20, 45));
        let b = a.clone();
        a.go_to(2);
        assert_eq!(b.index(), 0);
        assert!(std::ptr::eq(a.set(), b.set()));
    }

    #[test]
    fn test_page_controls_need_no_clone() {
        struct Opaque;
        fn controls<T>(view: &PageView<T>) -> (bool, bool) {
            (view.has_prev(), view.has_next())
        }
        let view = PageView {
            index: 1,
            page_count: 3,
            start: 3,
            end: 4,
            total: 6,
            items: vec![Opaque, Opaque],
        };
        assert_eq!(controls(&view), (true, true));
    }
}
