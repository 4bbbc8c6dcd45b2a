use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::entity::sea_orm_active_enums::{BorrowingStatus, ItemCondition, ItemStatus};

#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self { page, per_page }
    }

    /// Returns `(page, per_page, offset)` with page ≥ 1 and per_page in 1..=100.
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ItemSortBy {
    CreatedAt,
    Name,
    Available,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ItemQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Case-insensitive match on name or description.
    #[serde(alias = "search")]
    pub q: Option<String>,
    /// Exact category name; `all` or empty disables the filter.
    pub category: Option<String>,
    /// `true` keeps items with stock left, `false` keeps exhausted items.
    pub available: Option<bool>,
    #[param(inline)]
    pub status: Option<ItemStatus>,
    #[param(inline)]
    pub condition: Option<ItemCondition>,
    #[param(inline)]
    pub sort_by: Option<ItemSortBy>,
    #[param(inline)]
    pub sort_order: Option<SortOrder>,
}

impl ItemQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }

    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PopularQuery {
    /// Defaults to 4, at most 50.
    pub limit: Option<u64>,
}

/// Status filter for borrowing listings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum BorrowingStatusFilter {
    #[default]
    #[serde(alias = "all")]
    All,
    Pending,
    Approved,
    Rejected,
    Returned,
    Overdue,
}

impl BorrowingStatusFilter {
    pub fn status(self) -> Option<BorrowingStatus> {
        match self {
            BorrowingStatusFilter::All => None,
            BorrowingStatusFilter::Pending => Some(BorrowingStatus::Pending),
            BorrowingStatusFilter::Approved => Some(BorrowingStatus::Approved),
            BorrowingStatusFilter::Rejected => Some(BorrowingStatus::Rejected),
            BorrowingStatusFilter::Returned => Some(BorrowingStatus::Returned),
            BorrowingStatusFilter::Overdue => Some(BorrowingStatus::Overdue),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[param(inline)]
    pub status: Option<BorrowingStatusFilter>,
    #[param(inline)]
    pub sort_order: Option<SortOrder>,
}

impl BorrowingQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }

    pub fn status(&self) -> Option<BorrowingStatus> {
        self.status.unwrap_or_default().status()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityQuery {
    /// Defaults to 10, at most 50.
    pub limit: Option<u64>,
}

/// Clamp a caller-supplied `limit` to `1..=max`.
pub fn bounded_limit(limit: Option<u64>, default: u64, max: u64) -> u64 {
    limit.unwrap_or(default).clamp(1, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_inputs() {
        assert_eq!(Pagination::new(None, None).normalize(), (1, 20, 0));
        assert_eq!(Pagination::new(Some(0), Some(500)).normalize(), (1, 100, 0));
        assert_eq!(Pagination::new(Some(3), Some(10)).normalize(), (3, 10, 20));
    }

    #[test]
    fn far_pages_saturate_the_offset() {
        let (page, per_page, offset) = Pagination::new(Some(i64::MAX), Some(100)).normalize();
        assert_eq!((page, per_page), (i64::MAX, 100));
        assert_eq!(offset, i64::MAX);
    }

    #[test]
    fn all_category_is_no_filter() {
        let query = ItemQuery {
            category: Some("All".into()),
            q: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(query.category(), None);
        assert_eq!(query.search(), None);
    }

    #[test]
    fn lowercase_all_status_is_accepted() {
        let filter: BorrowingStatusFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(filter.status(), None);
        let filter: BorrowingStatusFilter = serde_json::from_str("\"OVERDUE\"").unwrap();
        assert_eq!(filter.status(), Some(BorrowingStatus::Overdue));
    }

    #[test]
    fn limits_are_bounded() {
        assert_eq!(bounded_limit(None, 10, 50), 10);
        assert_eq!(bounded_limit(Some(0), 10, 50), 1);
        assert_eq!(bounded_limit(Some(999), 10, 50), 50);
    }
}
