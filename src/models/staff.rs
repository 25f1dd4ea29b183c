use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A staff profile row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Staff {
    pub staff_id: i32,
    pub full_name: String,
    pub short_name: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
}

/// The subset of a staff profile the workflow snapshots into requests.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StaffSummary {
    pub staff_id: i32,
    pub full_name: String,
}
