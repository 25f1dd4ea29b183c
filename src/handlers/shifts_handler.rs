use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{extractors::AuthenticatedStaff, models::Shift, AppError, AppResult, AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetSwappableQuery {
    pub month: Option<i32>,
    pub year: Option<i32>,
}

/// GET /api/shifts/swappable?month=&year=
///
/// Shifts that can appear in a swap proposal: published and assigned.
#[utoipa::path(
    get,
    path = "/api/shifts/swappable",
    params(GetSwappableQuery),
    responses(
        (status = 200, description = "List of shifts available for swapping", body = Vec<Shift>),
        (status = 400, description = "month and year required")
    ),
    tag = "shifts",
    security(("cookie_auth" = []))
)]
pub async fn get_swappable_shifts(
    State(state): State<Arc<AppState>>,
    _auth: AuthenticatedStaff,
    Query(query): Query<GetSwappableQuery>,
) -> AppResult<Json<Vec<Shift>>> {
    let month = query
        .month
        .ok_or_else(|| AppError::BadRequest("month required".to_string()))?;
    let year = query
        .year
        .ok_or_else(|| AppError::BadRequest("year required".to_string()))?;

    let shifts = sqlx::query_as::<_, Shift>(
        r#"
        SELECT
            uuid,
            staff_id,
            date,
            label,
            start,
            "end",
            published,
            created_at
        FROM "Shifts"
        WHERE EXTRACT(YEAR FROM date) = $1
        AND EXTRACT(MONTH FROM date) = $2
        AND staff_id IS NOT NULL
        AND published = true
        ORDER BY date, start
        "#,
    )
    .bind(year)
    .bind(month)
    .fetch_all(&state.db)
    .await?;

    tracing::debug!(year, month, count = shifts.len(), "Fetched swappable shifts");
    Ok(Json(shifts))
}
