use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    borrowings, categories, items,
    sea_orm_active_enums::{BorrowingStatus, ItemCondition, ItemStatus, Role},
    users,
};

/// Public view of a user. The borrowing counters are computed from the
/// borrowings table each time a user is read.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub nim: String,
    pub email: String,
    pub phone: Option<String>,
    pub faculty: Option<String>,
    pub program: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub total_borrowings: i64,
    pub active_borrowings: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn from_entity(model: users::Model, counters: BorrowingCounters) -> Self {
        Self {
            id: model.id,
            name: model.name,
            nim: model.nim,
            email: model.email,
            phone: model.phone,
            faculty: model.faculty,
            program: model.program,
            avatar_url: model.avatar_url,
            role: model.role,
            total_borrowings: counters.total,
            active_borrowings: counters.active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BorrowingCounters {
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            icon: model.icon,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub total: i32,
    pub available: i32,
    pub condition: ItemCondition,
    pub status: ItemStatus,
    pub location: String,
    pub created_by_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<items::Model> for Item {
    fn from(model: items::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            category: model.category,
            description: model.description,
            image: model.image,
            total: model.total,
            available: model.available,
            condition: model.condition,
            status: model.status,
            location: model.location,
            created_by_id: model.created_by_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub category: String,
    pub location: String,
}

impl From<&items::Model> for ItemSummary {
    fn from(model: &items::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            image: model.image.clone(),
            category: model.category.clone(),
            location: model.location.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub nim: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&users::Model> for UserSummary {
    fn from(model: &users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            nim: model.nim.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Borrowing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub quantity: i32,
    pub borrow_date: DateTime<Utc>,
    pub return_date: NaiveDate,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub status: BorrowingStatus,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl Borrowing {
    pub fn from_entity(
        model: borrowings::Model,
        item: Option<ItemSummary>,
        user: Option<UserSummary>,
    ) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            item_id: model.item_id,
            quantity: model.quantity,
            borrow_date: model.borrow_date.with_timezone(&Utc),
            return_date: model.return_date,
            actual_return_date: model.actual_return_date.map(|dt| dt.with_timezone(&Utc)),
            status: model.status,
            purpose: model.purpose,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            item,
            user,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Deleted {
    pub id: Uuid,
}
