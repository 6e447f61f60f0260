// ABOUTME: Offset/limit pagination utilities for list endpoints
// ABOUTME: Provides query parameters, navigation offsets, and the page response wrapper

use serde::{Deserialize, Serialize};

/// Query parameters for offset pagination.
///
/// A `limit` of 0 means "no limit": every row from `offset` to the end is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct LimitOffset {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

impl LimitOffset {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Value for a SQL `LIMIT` clause. SQLite treats a negative limit as unbounded.
    pub fn sql_limit(&self) -> i64 {
        if self.limit == 0 {
            -1
        } else {
            i64::from(self.limit)
        }
    }

    /// Value for a SQL `OFFSET` clause
    pub fn sql_offset(&self) -> i64 {
        i64::from(self.offset)
    }
}

/// Offsets a client can use to fetch the neighbouring pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    pub previous: Option<u64>,
    pub next: Option<u64>,
}

impl PageLinks {
    /// Compute navigation offsets from the total row count, the requested window,
    /// and the number of rows actually returned.
    pub fn compute(count: u64, offset: u64, limit: u64, returned: u64) -> Self {
        if count == 0 {
            return Self::default();
        }

        if limit == 0 {
            // The page already runs to the end; going back means the full view.
            let previous = if offset > 0 { Some(0) } else { None };
            return Self {
                previous,
                next: None,
            };
        }

        let next = if offset + returned < count {
            Some(offset + limit)
        } else {
            None
        };
        let previous = if offset > 0 {
            Some(offset.saturating_sub(limit))
        } else {
            None
        };

        Self { previous, next }
    }
}

/// Paginated response wrapper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// The data items for the current page
    pub items: Vec<T>,

    /// Total number of matching rows, ignoring offset and limit
    pub count: u64,

    /// Offset of the previous page, if any
    pub previous: Option<u64>,

    /// Offset of the next page, if any
    pub next: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, count: u64, params: LimitOffset) -> Self {
        let links = PageLinks::compute(
            count,
            u64::from(params.offset),
            u64::from(params.limit),
            items.len() as u64,
        );

        Self {
            items,
            count,
            previous: links.previous,
            next: links.next,
        }
    }

    /// Transform the items while keeping the navigation data
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            previous: self.previous,
            next: self.next,
        }
    }
}
