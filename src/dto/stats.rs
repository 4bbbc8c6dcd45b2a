use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDashboardStats {
    pub total_items: i64,
    pub available_items: i64,
    pub borrowed_items: i64,
    pub total_borrowings: i64,
    pub pending_borrowings: i64,
    pub active_borrowings: i64,
    pub overdue_borrowings: i64,
    pub completed_borrowings: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboardStats {
    pub total_items: i64,
    pub total_stock: i64,
    pub available_stock: i64,
    pub borrowed_stock: i64,
    pub pending_borrowings: i64,
    pub active_borrowings: i64,
    pub overdue_borrowings: i64,
    pub total_users: i64,
}

#[derive(Debug, Default, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BorrowingStats {
    pub total: i64,
    pub pending: i64,
    pub active: i64,
    pub rejected: i64,
    pub returned: i64,
    pub overdue: i64,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityKind {
    Borrow,
    Approve,
    Reject,
    Return,
    Overdue,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: Uuid,
    pub user_name: String,
    pub item_id: Uuid,
    pub item_name: String,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ActivityList {
    #[schema(value_type = Vec<Activity>)]
    pub items: Vec<Activity>,
}
