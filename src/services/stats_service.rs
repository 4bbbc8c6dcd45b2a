use sea_orm::{ActiveEnum, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::stats::{
        Activity, ActivityKind, ActivityList, AdminDashboardStats, BorrowingStats,
        UserDashboardStats,
    },
    entity::{
        borrowings::{Column as BorrowCol, Entity as Borrowings},
        sea_orm_active_enums::BorrowingStatus,
        users::Entity as Users,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::Borrowing,
    response::ApiResponse,
    routes::params::{ActivityQuery, bounded_limit},
    services::borrowing_service::hydrate,
    state::AppState,
};

#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
struct ItemTotals {
    item_count: i64,
    in_stock_count: i64,
    total_stock: i64,
    available_stock: i64,
}

impl ItemTotals {
    fn borrowed_stock(&self) -> i64 {
        self.total_stock - self.available_stock
    }
}

async fn item_totals(pool: &DbPool) -> AppResult<ItemTotals> {
    let totals = sqlx::query_as::<_, ItemTotals>(
        r#"
        SELECT
            COUNT(*)::BIGINT AS item_count,
            COUNT(*) FILTER (WHERE available > 0)::BIGINT AS in_stock_count,
            COALESCE(SUM(total), 0)::BIGINT AS total_stock,
            COALESCE(SUM(available), 0)::BIGINT AS available_stock
        FROM items
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(totals)
}

/// Borrowing counts grouped by status, optionally for one user.
async fn status_counts(pool: &DbPool, user_id: Option<Uuid>) -> AppResult<BorrowingStats> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT status, COUNT(*)::BIGINT
        FROM borrowings
        WHERE ($1::UUID IS NULL OR user_id = $1)
        GROUP BY status
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let parsed = rows.into_iter().filter_map(|(raw, count)| {
        match BorrowingStatus::try_from_value(&raw) {
            Ok(status) => Some((status, count)),
            Err(_) => {
                tracing::warn!(status = %raw, "unknown borrowing status in database");
                None
            }
        }
    });
    Ok(fold_status_counts(parsed))
}

fn fold_status_counts(rows: impl IntoIterator<Item = (BorrowingStatus, i64)>) -> BorrowingStats {
    let mut stats = BorrowingStats::default();
    for (status, count) in rows {
        stats.total += count;
        match status {
            BorrowingStatus::Pending => stats.pending += count,
            BorrowingStatus::Approved => stats.active += count,
            BorrowingStatus::Rejected => stats.rejected += count,
            BorrowingStatus::Returned => stats.returned += count,
            BorrowingStatus::Overdue => stats.overdue += count,
        }
    }
    stats
}

pub async fn user_dashboard(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserDashboardStats>> {
    let totals = item_totals(&state.pool).await?;
    let mine = status_counts(&state.pool, Some(user.user_id)).await?;

    let data = UserDashboardStats {
        total_items: totals.item_count,
        available_items: totals.in_stock_count,
        borrowed_items: totals.borrowed_stock(),
        total_borrowings: mine.total,
        pending_borrowings: mine.pending,
        active_borrowings: mine.active,
        overdue_borrowings: mine.overdue,
        completed_borrowings: mine.returned,
    };
    Ok(ApiResponse::success("User dashboard", data, None))
}

pub async fn admin_dashboard(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AdminDashboardStats>> {
    ensure_admin(user)?;
    let totals = item_totals(&state.pool).await?;
    let borrowings = status_counts(&state.pool, None).await?;
    let total_users = Users::find().count(&state.orm).await? as i64;

    let data = AdminDashboardStats {
        total_items: totals.item_count,
        total_stock: totals.total_stock,
        available_stock: totals.available_stock,
        borrowed_stock: totals.borrowed_stock(),
        pending_borrowings: borrowings.pending,
        active_borrowings: borrowings.active,
        overdue_borrowings: borrowings.overdue,
        total_users,
    };
    Ok(ApiResponse::success("Admin dashboard", data, None))
}

pub async fn borrowing_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<BorrowingStats>> {
    ensure_admin(user)?;
    let stats = status_counts(&state.pool, None).await?;
    Ok(ApiResponse::success("Borrowing stats", stats, None))
}

/// The most recently touched borrowings, labelled by where they stand now.
pub async fn recent_activities(
    state: &AppState,
    user: &AuthUser,
    query: ActivityQuery,
) -> AppResult<ApiResponse<ActivityList>> {
    ensure_admin(user)?;
    let limit = bounded_limit(query.limit, 10, 50);

    let rows = Borrowings::find()
        .order_by_desc(BorrowCol::UpdatedAt)
        .limit(limit)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, rows, true)
        .await?
        .iter()
        .filter_map(activity_from)
        .collect();

    Ok(ApiResponse::success("Recent activities", ActivityList { items }, None))
}

pub fn activity_kind(status: BorrowingStatus) -> (ActivityKind, &'static str) {
    match status {
        BorrowingStatus::Pending => (ActivityKind::Borrow, "requested to borrow"),
        BorrowingStatus::Approved => (ActivityKind::Approve, "is borrowing"),
        BorrowingStatus::Rejected => (ActivityKind::Reject, "was refused"),
        BorrowingStatus::Returned => (ActivityKind::Return, "returned"),
        BorrowingStatus::Overdue => (ActivityKind::Overdue, "is late returning"),
    }
}

fn activity_from(borrowing: &Borrowing) -> Option<Activity> {
    let item = borrowing.item.as_ref()?;
    let user = borrowing.user.as_ref()?;
    let (kind, verb) = activity_kind(borrowing.status);
    Some(Activity {
        id: borrowing.id,
        kind,
        description: format!("{} {} {}", user.name, verb, item.name),
        timestamp: borrowing.updated_at,
        user_id: user.id,
        user_name: user.name.clone(),
        item_id: item.id,
        item_name: item.name.clone(),
    })
}
