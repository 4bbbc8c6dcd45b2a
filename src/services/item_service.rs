use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::items::{CreateItemRequest, ItemList, UpdateItemRequest},
    entity::{
        borrowings::{Column as BorrowCol, Entity as Borrowings},
        items::{ActiveModel, Column, Entity as Items},
        sea_orm_active_enums::{BorrowingStatus, ItemCondition, ItemStatus},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Deleted, Item},
    response::{ApiResponse, Meta},
    routes::params::{ItemQuery, ItemSortBy, PopularQuery, SortOrder, bounded_limit},
    state::AppState,
};

const DEFAULT_IMAGE: &str = "📦";

pub async fn list_items(state: &AppState, query: ItemQuery) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.search() {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category) = query.category() {
        condition = condition.add(Column::Category.eq(category));
    }

    match query.available {
        Some(true) => condition = condition.add(Column::Available.gt(0)),
        Some(false) => condition = condition.add(Column::Available.eq(0)),
        None => {}
    }

    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status));
    }

    if let Some(item_condition) = query.condition {
        condition = condition.add(Column::Condition.eq(item_condition));
    }

    let sort_by = query.sort_by.unwrap_or(ItemSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ItemSortBy::CreatedAt => Column::CreatedAt,
        ItemSortBy::Name => Column::Name,
        ItemSortBy::Available => Column::Available,
    };

    let mut finder = Items::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };
    finder = finder.order_by_asc(Column::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Item::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Items", ItemList { items }, Some(meta)))
}

/// Items with the most units currently out on loan.
pub async fn popular_items(
    state: &AppState,
    query: PopularQuery,
) -> AppResult<ApiResponse<ItemList>> {
    let limit = bounded_limit(query.limit, 4, 50);
    let items = Items::find()
        .filter(Column::Total.gt(0))
        .order_by(
            Expr::col(Column::Total).sub(Expr::col(Column::Available)),
            Order::Desc,
        )
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Item::from)
        .collect();
    Ok(ApiResponse::success("Popular items", ItemList { items }, None))
}

pub async fn get_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Item>> {
    let item = Items::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Item::from)
        .ok_or_else(|| AppError::not_found("Item"))?;
    Ok(ApiResponse::success("Item", item, None))
}

pub async fn create_item(
    state: &AppState,
    user: &AuthUser,
    payload: CreateItemRequest,
) -> AppResult<ApiResponse<Item>> {
    ensure_admin(user)?;
    payload.validate()?;

    let available = payload.available.unwrap_or(payload.total);
    check_stock(payload.total, available)?;

    let now = Utc::now();
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        category: Set(payload.category.trim().to_string()),
        description: Set(payload.description),
        image: Set(Some(
            payload
                .image
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        )),
        total: Set(payload.total),
        available: Set(available),
        condition: Set(payload.condition.unwrap_or(ItemCondition::Good)),
        status: Set(payload.status.unwrap_or(ItemStatus::Available)),
        location: Set(payload.location.trim().to_string()),
        created_by_id: Set(Some(user.user_id)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let item = active.insert(&state.orm).await?;

    tracing::info!(item_id = %item.id, total = item.total, "item created");
    Ok(ApiResponse::success(
        "Item created",
        Item::from(item),
        None,
    ))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateItemRequest,
) -> AppResult<ApiResponse<Item>> {
    ensure_admin(user)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let existing = Items::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Item"))?;

    let total = payload.total.unwrap_or(existing.total);
    let available = payload.available.unwrap_or(existing.available);
    check_stock(total, available)?;
    check_capacity(total, available, units_on_loan(&txn, id).await?)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(category) = payload.category {
        active.category = Set(category.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(condition) = payload.condition {
        active.condition = Set(condition);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(location) = payload.location {
        active.location = Set(location.trim().to_string());
    }
    active.total = Set(total);
    active.available = Set(available);
    active.updated_at = Set(Utc::now().into());

    let item = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(item_id = %item.id, "item updated");
    Ok(ApiResponse::success(
        "Item updated",
        Item::from(item),
        None,
    ))
}

/// Refuses while any borrowing of the item still holds stock.
pub async fn delete_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_admin(user)?;

    let exists = Items::find_by_id(id).count(&state.orm).await? > 0;
    if !exists {
        return Err(AppError::not_found("Item"));
    }

    let outstanding = Borrowings::find()
        .filter(BorrowCol::ItemId.eq(id))
        .filter(BorrowCol::Status.is_in(BorrowingStatus::holding_stock()))
        .count(&state.orm)
        .await?;
    if outstanding > 0 {
        return Err(AppError::BadRequest(
            "Cannot delete an item that is currently borrowed".into(),
        ));
    }

    let result = Items::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Item"));
    }

    tracing::info!(item_id = %id, "item deleted");
    Ok(ApiResponse::success(
        "Item deleted",
        Deleted { id },
        None,
    ))
}

pub(crate) fn check_stock(total: i32, available: i32) -> AppResult<()> {
    if total < 0 || available < 0 {
        return Err(AppError::BadRequest("Stock cannot be negative".into()));
    }
    if available > total {
        return Err(AppError::BadRequest(
            "Available cannot be greater than total".into(),
        ));
    }
    Ok(())
}

/// Units of the item held by APPROVED or OVERDUE borrowings.
pub(crate) async fn units_on_loan<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
) -> AppResult<i64> {
    // SUM over INTEGER is BIGINT in Postgres.
    let sum: Option<Option<i64>> = Borrowings::find()
        .select_only()
        .column_as(Expr::col(BorrowCol::Quantity).sum(), "on_loan")
        .filter(BorrowCol::ItemId.eq(item_id))
        .filter(BorrowCol::Status.is_in(BorrowingStatus::holding_stock()))
        .into_tuple()
        .one(conn)
        .await?;
    Ok(sum.flatten().unwrap_or(0))
}

/// Every loan must fit back on the shelf once returned.
pub(crate) fn check_capacity(total: i32, available: i32, on_loan: i64) -> AppResult<()> {
    if i64::from(available) + on_loan > i64::from(total) {
        return Err(AppError::BadRequest(format!(
            "Total cannot be lower than available plus units on loan ({on_loan})"
        )));
    }
    Ok(())
}
