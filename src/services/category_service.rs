use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::categories::{CategoryList, CreateCategoryRequest},
    entity::{
        categories::{ActiveModel, Column, Entity as Categories},
        items::{Column as ItemCol, Entity as Items},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Deleted},
    response::ApiResponse,
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();
    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;

    let name = payload.name.trim().to_string();
    let taken = Categories::find()
        .filter(Column::Name.eq(name.as_str()))
        .count(&state.orm)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(format!("Category '{name}' already exists")));
    }

    let category = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        icon: Set(payload.icon.filter(|i| !i.trim().is_empty())),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(category_id = %category.id, name = %category.name, "category created");
    Ok(ApiResponse::success(
        "Category created",
        Category::from(category),
        None,
    ))
}

/// Items reference categories by name, so a category still named by any
/// item cannot be removed.
pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_admin(user)?;
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let in_use = Items::find()
        .filter(ItemCol::Category.eq(category.name.as_str()))
        .count(&state.orm)
        .await?;
    if in_use > 0 {
        return Err(AppError::BadRequest(format!(
            "Category '{}' is still used by {in_use} item(s)",
            category.name
        )));
    }

    Categories::delete_by_id(id).exec(&state.orm).await?;

    tracing::info!(category_id = %id, "category deleted");
    Ok(ApiResponse::success(
        "Category deleted",
        Deleted { id },
        None,
    ))
}
