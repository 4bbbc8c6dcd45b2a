use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::borrowings::{BorrowingList, CreateBorrowingRequest, SweepResult, UpdateBorrowingStatusRequest},
    entity::{
        borrowings::{
            ActiveModel as BorrowActive, Column as BorrowCol, Entity as Borrowings,
            Model as BorrowModel,
        },
        items::{Column as ItemCol, Entity as Items},
        sea_orm_active_enums::{BorrowingStatus, ItemStatus},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    lifecycle::{self, StockEffect},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Borrowing, ItemSummary, UserSummary},
    response::{ApiResponse, Meta},
    routes::params::{BorrowingQuery, SortOrder},
    state::AppState,
};

/// Files a PENDING request. Stock is only checked here; it is taken at approval.
pub async fn create_borrowing(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBorrowingRequest,
) -> AppResult<ApiResponse<Borrowing>> {
    payload.validate()?;

    let item = Items::find_by_id(payload.item_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Item"))?;

    if item.status != ItemStatus::Available {
        return Err(AppError::BadRequest(format!(
            "Item '{}' cannot be borrowed right now",
            item.name
        )));
    }
    if payload.quantity > item.available {
        return Err(AppError::BadRequest(format!(
            "Insufficient stock. Available: {} unit(s)",
            item.available
        )));
    }

    let now = Utc::now();
    if payload.return_date < now.date_naive() {
        return Err(AppError::BadRequest(
            "Return date cannot be in the past".into(),
        ));
    }

    let borrowing = BorrowActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        item_id: Set(item.id),
        quantity: Set(payload.quantity),
        borrow_date: Set(now.into()),
        return_date: Set(payload.return_date),
        actual_return_date: Set(None),
        status: Set(BorrowingStatus::Pending),
        purpose: Set(payload.purpose),
        notes: Set(payload.notes),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(
        borrowing_id = %borrowing.id,
        item_id = %item.id,
        quantity = borrowing.quantity,
        "borrowing requested"
    );

    let summary = ItemSummary::from(&item);
    Ok(ApiResponse::success(
        "Borrowing request created",
        Borrowing::from_entity(borrowing, Some(summary), None),
        None,
    ))
}

pub async fn list_my_borrowings(
    state: &AppState,
    user: &AuthUser,
    query: BorrowingQuery,
) -> AppResult<ApiResponse<BorrowingList>> {
    let condition = Condition::all().add(BorrowCol::UserId.eq(user.user_id));
    list_borrowings(state, condition, query, false).await
}

pub async fn list_all_borrowings(
    state: &AppState,
    user: &AuthUser,
    query: BorrowingQuery,
) -> AppResult<ApiResponse<BorrowingList>> {
    ensure_admin(user)?;
    list_borrowings(state, Condition::all(), query, true).await
}

async fn list_borrowings(
    state: &AppState,
    mut condition: Condition,
    query: BorrowingQuery,
    with_user: bool,
) -> AppResult<ApiResponse<BorrowingList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status() {
        condition = condition.add(BorrowCol::Status.eq(status));
    }

    let mut finder = Borrowings::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(BorrowCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(BorrowCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = hydrate(&state.orm, rows, with_user).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Borrowings", BorrowingList { items }, Some(meta)))
}

/// Owners and admins may read a borrowing; everyone else gets 404.
pub async fn get_borrowing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Borrowing>> {
    let borrowing = Borrowings::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|b| user.is_admin() || b.user_id == user.user_id)
        .ok_or_else(|| AppError::not_found("Borrowing"))?;

    let detail = hydrate_one(&state.orm, borrowing).await?;
    Ok(ApiResponse::success("Borrowing", detail, None))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBorrowingStatusRequest,
) -> AppResult<ApiResponse<Borrowing>> {
    transition(state, user, id, payload.status).await
}

pub async fn approve(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Borrowing>> {
    transition(state, user, id, BorrowingStatus::Approved).await
}

pub async fn reject(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Borrowing>> {
    transition(state, user, id, BorrowingStatus::Rejected).await
}

pub async fn return_borrowing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Borrowing>> {
    transition(state, user, id, BorrowingStatus::Returned).await
}

/// Moves one borrowing to `target`, applying the stock side effect in the
/// same transaction as the status change.
pub async fn transition(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    target: BorrowingStatus,
) -> AppResult<ApiResponse<Borrowing>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let borrowing = Borrowings::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Borrowing"))?;

    let step = lifecycle::plan(borrowing.status, target)?;
    let now: DateTimeWithTimeZone = Utc::now().into();

    match step.stock {
        StockEffect::Checkout => {
            let item = Items::find_by_id(borrowing.item_id)
                .lock(LockType::Update)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::not_found("Item"))?;
            if item.available < borrowing.quantity {
                return Err(AppError::BadRequest(format!(
                    "Insufficient stock. Available: {} unit(s)",
                    item.available
                )));
            }
            Items::update_many()
                .col_expr(
                    ItemCol::Available,
                    Expr::col(ItemCol::Available).sub(borrowing.quantity),
                )
                .col_expr(ItemCol::UpdatedAt, Expr::value(now))
                .filter(ItemCol::Id.eq(borrowing.item_id))
                .exec(&txn)
                .await?;
        }
        StockEffect::Restock => {
            Items::update_many()
                .col_expr(
                    ItemCol::Available,
                    Expr::col(ItemCol::Available).add(borrowing.quantity),
                )
                .col_expr(ItemCol::UpdatedAt, Expr::value(now))
                .filter(ItemCol::Id.eq(borrowing.item_id))
                .exec(&txn)
                .await?;
        }
        StockEffect::None => {}
    }

    let mut active: BorrowActive = borrowing.into();
    active.status = Set(step.to);
    if step.stamps_return {
        active.actual_return_date = Set(Some(now));
    }
    active.updated_at = Set(now);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        borrowing_id = %updated.id,
        from = %step.from,
        to = %step.to,
        actor = %user.user_id,
        "borrowing status changed"
    );

    let message = match step.to {
        BorrowingStatus::Approved => "Borrowing approved",
        BorrowingStatus::Rejected => "Borrowing rejected",
        BorrowingStatus::Returned => "Borrowing returned",
        BorrowingStatus::Overdue => "Borrowing marked overdue",
        BorrowingStatus::Pending => "Borrowing updated",
    };
    let detail = hydrate_one(&state.orm, updated).await?;
    Ok(ApiResponse::success(message, detail, None))
}

pub async fn check_overdue(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<SweepResult>> {
    ensure_admin(user)?;
    let updated = sweep_overdue(&state.orm, Utc::now().date_naive()).await?;
    Ok(ApiResponse::success(
        format!("{updated} borrowing(s) marked overdue"),
        SweepResult { updated },
        None,
    ))
}

/// Marks every APPROVED borrowing due before `today` as OVERDUE in a single
/// statement. Stock was already taken at approval, so nothing else changes.
pub async fn sweep_overdue<C: ConnectionTrait>(conn: &C, today: NaiveDate) -> AppResult<u64> {
    let result = Borrowings::update_many()
        .set(BorrowActive {
            status: Set(BorrowingStatus::Overdue),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        })
        .filter(BorrowCol::Status.eq(BorrowingStatus::Approved))
        .filter(BorrowCol::ReturnDate.lt(today))
        .exec(conn)
        .await?;

    tracing::info!(updated = result.rows_affected, %today, "overdue sweep finished");
    Ok(result.rows_affected)
}

async fn hydrate_one<C: ConnectionTrait>(conn: &C, row: BorrowModel) -> AppResult<Borrowing> {
    hydrate(conn, vec![row], true)
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("borrowing vanished while loading")))
}

/// Attaches item (and optionally user) summaries with one query per table.
pub(crate) async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<BorrowModel>,
    with_user: bool,
) -> AppResult<Vec<Borrowing>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let item_ids: Vec<Uuid> = rows.iter().map(|b| b.item_id).collect();
    let items: HashMap<Uuid, ItemSummary> = Items::find()
        .filter(ItemCol::Id.is_in(item_ids))
        .all(conn)
        .await?
        .iter()
        .map(|item| (item.id, ItemSummary::from(item)))
        .collect();

    let users: HashMap<Uuid, UserSummary> = if with_user {
        let user_ids: Vec<Uuid> = rows.iter().map(|b| b.user_id).collect();
        Users::find()
            .filter(UserCol::Id.is_in(user_ids))
            .all(conn)
            .await?
            .iter()
            .map(|user| (user.id, UserSummary::from(user)))
            .collect()
    } else {
        HashMap::new()
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let item = items.get(&row.item_id).cloned();
            let user = users.get(&row.user_id).cloned();
            Borrowing::from_entity(row, item, user)
        })
        .collect())
}
