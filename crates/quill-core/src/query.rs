//! Listing query builder.
//!
//! Translates raw listing parameters into a sanitized store query and
//! assembles the paginated result envelope.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::PostState;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 20;

/// Sort fields callers may order by. Restricting to this enum keeps arbitrary
/// field names out of the sort clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    ReadCount,
    ReadingTime,
    Timestamp,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "read_count" => Some(Self::ReadCount),
            "reading_time" => Some(Self::ReadingTime),
            "timestamp" => Some(Self::Timestamp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Which slice of the post collection a listing targets.
///
/// The public scope always carries the mandatory visibility filter
/// (published, not deleted). The owner scope bypasses the published
/// requirement but still excludes soft-deleted posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostScope {
    Public { search: Option<String> },
    Owner {
        author_id: Uuid,
        state: Option<PostState>,
    },
}

/// A sanitized listing query ready for the store.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub scope: PostScope,
    pub sort: Option<(SortKey, SortOrder)>,
    pub page: u64,
    pub limit: u64,
}

impl ListQuery {
    /// Build a query from raw request parameters.
    ///
    /// Pages and limits are coerced to positive integers (absent or
    /// non-positive values fall back to the defaults, so the skip offset can
    /// never go negative). A sort applies only when both `order_by` and
    /// `order` parse; an unknown `order_by` value means insertion-order
    /// results rather than an error.
    pub fn new(
        scope: PostScope,
        page: Option<i64>,
        limit: Option<i64>,
        order_by: Option<&str>,
        order: Option<&str>,
    ) -> Self {
        let page = page.filter(|p| *p > 0).map(|p| p as u64).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l > 0)
            .map(|l| l as u64)
            .unwrap_or(DEFAULT_LIMIT);

        let sort = match (order_by.and_then(SortKey::parse), order.and_then(SortOrder::parse)) {
            (Some(key), Some(order)) => Some((key, order)),
            _ => None,
        };

        Self {
            scope,
            sort,
            page,
            limit,
        }
    }

    /// Records to skip before the current page. Saturates rather than
    /// overflowing on absurd page numbers; such pages are simply empty.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Paginated result envelope.
///
/// `total` is the number of items in THIS page, while `total_pages` derives
/// from the global match count. The asymmetry is part of the response
/// contract and preserved deliberately.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

impl<T> Page<T> {
    /// Assemble the envelope from one page of items and the global count of
    /// matching records.
    pub fn assemble(items: Vec<T>, matching: u64, query: &ListQuery) -> Self {
        Self {
            total: items.len() as u64,
            total_pages: matching.div_ceil(query.limit),
            current_page: query.page,
            items,
        }
    }

    /// Zero matches is an empty-state condition, not an error.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn public(search: Option<&str>) -> PostScope {
        PostScope::Public {
            search: search.map(str::to_string),
        }
    }

    #[test]
    fn defaults_apply_when_params_absent() {
        let query = ListQuery::new(public(None), None, None, None, None);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert_eq!(query.offset(), 0);
        assert!(query.sort.is_none());
    }

    #[test]
    fn non_positive_page_and_limit_are_coerced() {
        let query = ListQuery::new(public(None), Some(0), Some(-5), None, None);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn offset_skips_previous_pages() {
        let query = ListQuery::new(public(None), Some(3), Some(10), None, None);
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn absurd_page_numbers_saturate_instead_of_overflowing() {
        let query = ListQuery::new(public(None), Some(i64::MAX), None, None, None);
        assert_eq!(query.offset(), u64::MAX);

        let query = ListQuery::new(public(None), Some(i64::MAX), Some(i64::MAX), None, None);
        assert_eq!(query.offset(), u64::MAX);
    }

    #[test]
    fn sort_key_is_allow_listed() {
        let query = ListQuery::new(public(None), None, None, Some("read_count"), Some("desc"));
        assert_eq!(query.sort, Some((SortKey::ReadCount, SortOrder::Desc)));

        // Arbitrary field names never reach the sort clause.
        let query = ListQuery::new(public(None), None, None, Some("password_hash"), Some("asc"));
        assert!(query.sort.is_none());
    }

    #[test]
    fn sort_requires_both_order_and_order_by() {
        let query = ListQuery::new(public(None), None, None, Some("timestamp"), None);
        assert!(query.sort.is_none());

        let query = ListQuery::new(public(None), None, None, Some("timestamp"), Some("sideways"));
        assert!(query.sort.is_none());

        let query = ListQuery::new(public(None), None, None, None, Some("asc"));
        assert!(query.sort.is_none());
    }

    #[test]
    fn envelope_totals_follow_the_contract() {
        let query = ListQuery::new(public(None), Some(3), Some(10), None, None);
        // 25 global matches, page 3 holds the last 5.
        let page = Page::assemble(vec!["a"; 5], 25, &query);

        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 3);
    }

    #[test]
    fn empty_envelope_is_a_state_not_an_error() {
        let query = ListQuery::new(public(Some("nothing")), None, None, None, None);
        let page: Page<&str> = Page::assemble(vec![], 0, &query);

        assert!(page.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }
}
