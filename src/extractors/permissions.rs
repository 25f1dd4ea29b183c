use moka::future::Cache;
use once_cell::sync::Lazy;
use std::time::Duration;

// Cache StaffRoleRows per staff_id (30-second TTL)
static ROLES_CACHE: Lazy<Cache<i32, Vec<StaffRoleRow>>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(30))
        .max_capacity(1_000)
        .build()
});

/// Fetch staff roles with caching
async fn get_cached_roles(
    db: &sqlx::PgPool,
    staff_id: i32,
) -> Result<Vec<StaffRoleRow>, sqlx::Error> {
    if let Some(cached) = ROLES_CACHE.get(&staff_id).await {
        return Ok(cached);
    }

    let roles = sqlx::query_as::<_, StaffRoleRow>(
        r#"SELECT * FROM "StaffRoles" WHERE staff_id = $1"#,
    )
    .bind(staff_id)
    .fetch_all(db)
    .await?;

    ROLES_CACHE.insert(staff_id, roles.clone()).await;
    Ok(roles)
}

/// Check if the staff member has the required permission
pub async fn has_permission(
    db: &sqlx::PgPool,
    staff_id: i32,
    is_admin: bool,
    permission_check: impl Fn(&StaffRoleRow) -> bool,
) -> Result<bool, sqlx::Error> {
    if is_admin {
        return Ok(true);
    }

    let roles = get_cached_roles(db, staff_id).await?;
    Ok(roles.iter().any(permission_check))
}

#[derive(sqlx::FromRow, Clone)]
pub struct StaffRoleRow {
    pub id: i32,
    pub staff_id: i32,
    pub can_manage_swaps: bool,
}

// Permission check functions
pub fn can_manage_swaps(role: &StaffRoleRow) -> bool {
    role.can_manage_swaps
}
