use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entity::sea_orm_active_enums::{ItemCondition, ItemStatus},
    models::Item,
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 200, message = "Item name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Category must not be empty"))]
    pub category: String,
    pub description: Option<String>,
    pub image: Option<String>,
    #[validate(range(min = 0, message = "Total must not be negative"))]
    pub total: i32,
    /// Defaults to `total`.
    #[validate(range(min = 0, message = "Available must not be negative"))]
    pub available: Option<i32>,
    pub condition: Option<ItemCondition>,
    pub status: Option<ItemStatus>,
    #[validate(length(min = 1, max = 200, message = "Location must not be empty"))]
    pub location: String,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 200, message = "Item name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Category must not be empty"))]
    pub category: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[validate(range(min = 0, message = "Total must not be negative"))]
    pub total: Option<i32>,
    #[validate(range(min = 0, message = "Available must not be negative"))]
    pub available: Option<i32>,
    pub condition: Option<ItemCondition>,
    pub status: Option<ItemStatus>,
    #[validate(length(min = 1, max = 200, message = "Location must not be empty"))]
    pub location: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ItemList {
    #[schema(value_type = Vec<Item>)]
    pub items: Vec<Item>,
}
