use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{extractors::AuthenticatedStaff, models::Staff, AppResult, AppState};

/// GET /api/staff - Active staff members, for the swap target picker
#[utoipa::path(
    get,
    path = "/api/staff",
    responses(
        (status = 200, description = "List of active staff members", body = Vec<Staff>)
    ),
    tag = "staff",
    security(("cookie_auth" = []))
)]
pub async fn get_staff_list(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedStaff,
) -> AppResult<Json<Vec<Staff>>> {
    let staff = sqlx::query_as::<_, Staff>(
        r#"SELECT * FROM "Staff" WHERE is_active = true ORDER BY full_name"#,
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch staff list");
        e
    })?;

    Ok(Json(staff))
}
