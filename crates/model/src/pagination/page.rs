use crate::pagination::continuation::ContinuationToken;

/// One batch returned by a paginated store call.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub continuation: Option<ContinuationToken>,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// A page followed by more data reachable through `continuation`.
    pub fn with_continuation(items: Vec<T>, continuation: ContinuationToken) -> Self {
        Self {
            items,
            continuation: Some(continuation),
            has_more: true,
        }
    }

    /// The final page of a listing.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            continuation: None,
            has_more: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            continuation: self.continuation,
            has_more: self.has_more,
        }
    }
}
