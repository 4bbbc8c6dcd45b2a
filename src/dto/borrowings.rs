use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{entity::sea_orm_active_enums::BorrowingStatus, models::Borrowing};

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBorrowingRequest {
    pub item_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    /// Calendar date; a full RFC 3339 timestamp is accepted and truncated to its date.
    #[serde(deserialize_with = "date_or_datetime")]
    pub return_date: NaiveDate,
    #[validate(length(max = 500))]
    pub purpose: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBorrowingStatusRequest {
    pub status: BorrowingStatus,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct BorrowingList {
    #[schema(value_type = Vec<Borrowing>)]
    pub items: Vec<Borrowing>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SweepResult {
    pub updated: u64,
}

fn date_or_datetime<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
