use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A rota shift as stored in the scheduling tables.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Shift {
    pub uuid: Uuid,
    pub staff_id: Option<i32>,
    pub date: NaiveDate,
    pub label: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}
