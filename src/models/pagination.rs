use serde::{Deserialize, Serialize};

use crate::constants::pagination::{DEFAULT_LIMIT, DEFAULT_PAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// A column a listing may be ordered by, named the way clients send it.
pub trait SortField: Copy + Default {
    const ALLOWED: &'static [&'static str];

    fn parse(value: &str) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<S> {
    /// 1-based
    pub page: u64,
    pub limit: u64,
    pub sort_by: S,
    pub sort_order: SortOrder,
}

impl<S: Default> Default for PageRequest<S> {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: S::default(),
            sort_order: SortOrder::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(self.limit)
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Drops items after the fact while keeping the page metadata of the
    /// unfiltered query.
    #[must_use]
    pub fn retain(mut self, f: impl FnMut(&T) -> bool) -> Self {
        self.items.retain(f);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u64, limit: u64, total: u64) -> Page<()> {
        Page {
            items: Vec::new(),
            page,
            limit,
            total,
        }
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(page(1, 10, 0).total_pages(), 0);
        assert_eq!(page(1, 10, 10).total_pages(), 1);
        assert_eq!(page(1, 10, 11).total_pages(), 2);
    }

    #[test]
    fn test_navigation_flags() {
        let first = page(1, 10, 25);
        assert!(first.has_next());
        assert!(!first.has_prev());

        let last = page(3, 10, 25);
        assert!(!last.has_next());
        assert!(last.has_prev());

        let beyond = page(5, 10, 25);
        assert!(!beyond.has_next());
        assert!(beyond.has_prev());

        let empty = page(1, 10, 0);
        assert!(!empty.has_next());
        assert!(!empty.has_prev());
    }

    #[test]
    fn test_retain_keeps_metadata() {
        let page = Page {
            items: vec![1, 5, 12, 30],
            page: 2,
            limit: 4,
            total: 20,
        }
        .retain(|n| *n <= 10);

        assert_eq!(page.items, vec![1, 5]);
        assert_eq!(page.total, 20);
        assert_eq!(page.total_pages(), 5);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("asc"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("desc"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::parse("DESC"), None);
    }
}
