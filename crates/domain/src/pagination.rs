use serde::Serialize;

/// One page of an over-fetched query.
///
/// Queries ask for `page_size + 1` rows; the extra row only signals that
/// another page exists and is never shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }

    pub fn overfetch_limit(page_size: i64) -> i64 {
        page_size + 1
    }

    pub fn from_overfetch(mut items: Vec<T>, page_size: i64) -> Self {
        let page_size = usize::try_from(page_size).unwrap_or(0);
        let has_more = items.len() > page_size;
        if has_more {
            items.truncate(page_size);
        }
        Self { items, has_more }
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty()
    }
}
