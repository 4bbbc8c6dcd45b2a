use sea_orm::{Iterable, entity::prelude::*};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[sea_orm(string_value = "USER")]
    User,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemCondition {
    #[sea_orm(string_value = "GOOD")]
    Good,
    #[sea_orm(string_value = "FAIR")]
    Fair,
    #[sea_orm(string_value = "DAMAGED")]
    Damaged,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemStatus {
    #[sea_orm(string_value = "AVAILABLE")]
    Available,
    #[sea_orm(string_value = "MAINTENANCE")]
    Maintenance,
    #[sea_orm(string_value = "RETIRED")]
    Retired,
}

/// Lifecycle state of a borrowing. Legal moves live in [`crate::lifecycle`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum BorrowingStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "RETURNED")]
    Returned,
    #[sea_orm(string_value = "OVERDUE")]
    Overdue,
}

impl BorrowingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowingStatus::Pending => "PENDING",
            BorrowingStatus::Approved => "APPROVED",
            BorrowingStatus::Rejected => "REJECTED",
            BorrowingStatus::Returned => "RETURNED",
            BorrowingStatus::Overdue => "OVERDUE",
        }
    }

    /// Statuses in which the borrowed units are out of stock.
    pub fn holds_stock(&self) -> bool {
        matches!(self, BorrowingStatus::Approved | BorrowingStatus::Overdue)
    }

    /// Every status whose units are out of stock, for `IN` filters.
    pub fn holding_stock() -> Vec<BorrowingStatus> {
        Self::iter().filter(Self::holds_stock).collect()
    }
}

impl std::fmt::Display for BorrowingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::BorrowingStatus;

    #[test]
    fn only_approved_and_overdue_hold_stock() {
        assert_eq!(
            BorrowingStatus::holding_stock(),
            vec![BorrowingStatus::Approved, BorrowingStatus::Overdue]
        );
        assert!(!BorrowingStatus::Pending.holds_stock());
        assert!(!BorrowingStatus::Returned.holds_stock());
    }
}
