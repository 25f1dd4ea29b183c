use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::{DashboardCounts, ShiftSwapRequest, StaffSummary, SwapStatus};

use super::error::{SwapError, SwapResult};
use super::store::{
    NewSwapRecord, ShiftDirectory, ShiftInfo, StaffRole, SwapEffectuator, SwapRequestFilter,
    SwapStore,
};

const SWAP_BASE_QUERY: &str = r#"
    SELECT
        id,
        requesting_staff_id,
        requesting_staff_name,
        target_staff_id,
        target_staff_name,
        requesting_shift_id,
        requesting_shift_date,
        requesting_shift_label,
        requesting_shift_start,
        requesting_shift_end,
        target_shift_id,
        target_shift_date,
        target_shift_label,
        target_shift_start,
        target_shift_end,
        reason,
        status,
        target_staff_accepted,
        rejection_reason,
        resolved_by,
        resolved_at,
        version,
        created_at,
        updated_at
    FROM "SwapRequests"
"#;

#[derive(Debug, FromRow)]
struct SwapRequestRow {
    id: Uuid,
    requesting_staff_id: i32,
    requesting_staff_name: String,
    target_staff_id: i32,
    target_staff_name: String,
    requesting_shift_id: Uuid,
    requesting_shift_date: NaiveDate,
    requesting_shift_label: String,
    requesting_shift_start: Option<String>,
    requesting_shift_end: Option<String>,
    target_shift_id: Uuid,
    target_shift_date: NaiveDate,
    target_shift_label: String,
    target_shift_start: Option<String>,
    target_shift_end: Option<String>,
    reason: String,
    status: String,
    target_staff_accepted: Option<bool>,
    rejection_reason: Option<String>,
    resolved_by: Option<i32>,
    resolved_at: Option<DateTime<Utc>>,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn row_to_request(row: SwapRequestRow) -> SwapResult<ShiftSwapRequest> {
    let status = SwapStatus::parse(&row.status).ok_or_else(|| {
        SwapError::Store(format!(
            "request {} has unknown status '{}'",
            row.id, row.status
        ))
    })?;

    Ok(ShiftSwapRequest {
        id: row.id,
        requesting_staff_id: row.requesting_staff_id,
        requesting_staff_name: row.requesting_staff_name,
        target_staff_id: row.target_staff_id,
        target_staff_name: row.target_staff_name,
        requesting_shift_id: row.requesting_shift_id,
        requesting_shift_date: row.requesting_shift_date,
        requesting_shift_label: row.requesting_shift_label,
        requesting_shift_start: row.requesting_shift_start,
        requesting_shift_end: row.requesting_shift_end,
        target_shift_id: row.target_shift_id,
        target_shift_date: row.target_shift_date,
        target_shift_label: row.target_shift_label,
        target_shift_start: row.target_shift_start,
        target_shift_end: row.target_shift_end,
        reason: row.reason,
        status,
        target_staff_accepted: row.target_staff_accepted,
        rejection_reason: row.rejection_reason,
        resolved_by: row.resolved_by,
        resolved_at: row.resolved_at,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn db_err(context: &str, e: sqlx::Error) -> SwapError {
    tracing::error!(error = %e, context, "Swap store query failed");
    SwapError::Store(e.to_string())
}

/// Swap-request persistence backed by the `"SwapRequests"` table.
#[derive(Clone)]
pub struct PgSwapStore {
    pool: PgPool,
}

impl PgSwapStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SwapStore for PgSwapStore {
    async fn get(&self, id: Uuid) -> SwapResult<Option<ShiftSwapRequest>> {
        let row = sqlx::query_as::<_, SwapRequestRow>(&format!("{SWAP_BASE_QUERY} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_err("get", e))?;

        row.map(row_to_request).transpose()
    }

    async fn insert(&self, record: NewSwapRecord) -> SwapResult<ShiftSwapRequest> {
        let row = sqlx::query_as::<_, SwapRequestRow>(
            r#"
            INSERT INTO "SwapRequests" (
                requesting_staff_id, requesting_staff_name,
                target_staff_id, target_staff_name,
                requesting_shift_id, requesting_shift_date, requesting_shift_label,
                requesting_shift_start, requesting_shift_end,
                target_shift_id, target_shift_date, target_shift_label,
                target_shift_start, target_shift_end,
                reason, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(record.requesting_staff_id)
        .bind(&record.requesting_staff_name)
        .bind(record.target_staff_id)
        .bind(&record.target_staff_name)
        .bind(record.requesting_shift_id)
        .bind(record.requesting_shift_date)
        .bind(&record.requesting_shift_label)
        .bind(&record.requesting_shift_start)
        .bind(&record.requesting_shift_end)
        .bind(record.target_shift_id)
        .bind(record.target_shift_date)
        .bind(&record.target_shift_label)
        .bind(&record.target_shift_start)
        .bind(&record.target_shift_end)
        .bind(&record.reason)
        .bind(SwapStatus::PendingTargetResponse.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("insert", e))?;

        row_to_request(row)
    }

    async fn update(
        &self,
        request: &ShiftSwapRequest,
        expected_version: i32,
    ) -> SwapResult<ShiftSwapRequest> {
        let row = sqlx::query_as::<_, SwapRequestRow>(
            r#"
            UPDATE "SwapRequests"
            SET status = $1,
                target_staff_accepted = $2,
                rejection_reason = $3,
                resolved_by = $4,
                resolved_at = $5,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $6 AND version = $7
            RETURNING *
            "#,
        )
        .bind(request.status.as_str())
        .bind(request.target_staff_accepted)
        .bind(&request.rejection_reason)
        .bind(request.resolved_by)
        .bind(request.resolved_at)
        .bind(request.id)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("update", e))?;

        match row {
            Some(row) => row_to_request(row),
            None => {
                // Distinguish a lost race from a missing record.
                let exists: Option<i32> =
                    sqlx::query_scalar(r#"SELECT version FROM "SwapRequests" WHERE id = $1"#)
                        .bind(request.id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(|e| db_err("update-verify", e))?;

                match exists {
                    Some(_) => Err(SwapError::Conflict(format!(
                        "request {} was modified concurrently",
                        request.id
                    ))),
                    None => Err(SwapError::NotFound(format!(
                        "Swap request {} not found",
                        request.id
                    ))),
                }
            }
        }
    }

    async fn find_active_by_shift_pair(
        &self,
        shift_a: Uuid,
        shift_b: Uuid,
    ) -> SwapResult<Option<ShiftSwapRequest>> {
        let row = sqlx::query_as::<_, SwapRequestRow>(&format!(
            r#"{SWAP_BASE_QUERY}
            WHERE status IN ('PENDING_TARGET_RESPONSE', 'PENDING_MANAGER_APPROVAL')
              AND ((requesting_shift_id = $1 AND target_shift_id = $2)
                OR (requesting_shift_id = $2 AND target_shift_id = $1))
            LIMIT 1
            "#
        ))
        .bind(shift_a)
        .bind(shift_b)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_active_by_shift_pair", e))?;

        row.map(row_to_request).transpose()
    }

    async fn list(&self, filter: &SwapRequestFilter) -> SwapResult<(Vec<ShiftSwapRequest>, i64)> {
        let status = filter.status.map(|s| s.as_str());
        let offset = (filter.page - 1) * filter.size;

        let staff_clause = match filter.staff_role {
            StaffRole::Either => "(requesting_staff_id = $2 OR target_staff_id = $2)",
            StaffRole::Requester => "requesting_staff_id = $2",
            StaffRole::Target => "target_staff_id = $2",
        };

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*) FROM "SwapRequests"
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::int4 IS NULL OR {staff_clause})
            "#
        ))
        .bind(status)
        .bind(filter.staff_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("list-count", e))?;

        let rows = sqlx::query_as::<_, SwapRequestRow>(&format!(
            r#"{SWAP_BASE_QUERY}
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::int4 IS NULL OR {staff_clause})
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(status)
        .bind(filter.staff_id)
        .bind(filter.size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list", e))?;

        let items = rows
            .into_iter()
            .map(row_to_request)
            .collect::<SwapResult<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn counts(&self, staff_id: i32) -> SwapResult<DashboardCounts> {
        let mine: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM "SwapRequests" WHERE requesting_staff_id = $1"#,
        )
        .bind(staff_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("counts-mine", e))?;

        let incoming: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM "SwapRequests"
            WHERE target_staff_id = $1 AND status = 'PENDING_TARGET_RESPONSE'
            "#,
        )
        .bind(staff_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("counts-incoming", e))?;

        let pending_approval: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM "SwapRequests" WHERE status = 'PENDING_MANAGER_APPROVAL'"#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("counts-pending", e))?;

        Ok(DashboardCounts {
            mine,
            incoming,
            pending_approval,
        })
    }
}

#[derive(Debug, FromRow)]
struct ShiftRow {
    uuid: Uuid,
    staff_id: Option<i32>,
    date: NaiveDate,
    label: String,
    start: Option<String>,
    end: Option<String>,
}

/// Rota and staff-directory reads backed by the scheduling tables.
#[derive(Clone)]
pub struct PgShiftDirectory {
    pool: PgPool,
}

impl PgShiftDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShiftDirectory for PgShiftDirectory {
    async fn get_shift(&self, shift_id: Uuid) -> SwapResult<Option<ShiftInfo>> {
        let row = sqlx::query_as::<_, ShiftRow>(
            r#"SELECT uuid, staff_id, date, label, start, "end" FROM "Shifts" WHERE uuid = $1"#,
        )
        .bind(shift_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_shift", e))?;

        Ok(row.map(|row| ShiftInfo {
            id: row.uuid,
            staff_id: row.staff_id,
            date: row.date,
            label: row.label,
            start: row.start,
            end: row.end,
        }))
    }

    async fn get_staff(&self, staff_id: i32) -> SwapResult<Option<StaffSummary>> {
        sqlx::query_as::<_, StaffSummary>(
            r#"SELECT staff_id, full_name FROM "Staff" WHERE staff_id = $1 AND is_active = true"#,
        )
        .bind(staff_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("get_staff", e))
    }
}

/// Applies approved swaps to the `"Shifts"` table: both reassignments run
/// in one transaction.
#[derive(Clone)]
pub struct PgSwapEffectuator {
    pool: PgPool,
}

impl PgSwapEffectuator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SwapEffectuator for PgSwapEffectuator {
    async fn swap_assignments(
        &self,
        requesting_shift_id: Uuid,
        requesting_staff_id: i32,
        target_shift_id: Uuid,
        target_staff_id: i32,
    ) -> SwapResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("swap-begin", e))?;

        // The requester takes the target's shift and vice versa.
        let reassigned =
            sqlx::query(r#"UPDATE "Shifts" SET staff_id = $1 WHERE uuid = $2 AND staff_id = $3"#)
                .bind(target_staff_id)
                .bind(requesting_shift_id)
                .bind(requesting_staff_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| db_err("swap-requesting-shift", e))?;
        if reassigned.rows_affected() != 1 {
            return Err(SwapError::Effectuation(format!(
                "shift {requesting_shift_id} is no longer assigned to staff {requesting_staff_id}"
            )));
        }

        let reassigned =
            sqlx::query(r#"UPDATE "Shifts" SET staff_id = $1 WHERE uuid = $2 AND staff_id = $3"#)
                .bind(requesting_staff_id)
                .bind(target_shift_id)
                .bind(target_staff_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| db_err("swap-target-shift", e))?;
        if reassigned.rows_affected() != 1 {
            return Err(SwapError::Effectuation(format!(
                "shift {target_shift_id} is no longer assigned to staff {target_staff_id}"
            )));
        }

        tx.commit().await.map_err(|e| {
            tracing::error!(
                error = %e,
                requesting_shift_id = %requesting_shift_id,
                target_shift_id = %target_shift_id,
                "Transaction rollback while applying shift swap"
            );
            SwapError::Effectuation(format!("failed to commit shift reassignment: {e}"))
        })?;

        tracing::info!(
            requesting_shift_id = %requesting_shift_id,
            target_shift_id = %target_shift_id,
            "Shift assignments swapped"
        );
        Ok(())
    }
}
