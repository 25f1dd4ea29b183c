use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;

use crate::{auth, AppState};

/// Extracts the session token from either the portal's pascs_session cookie
/// or an Authorization header (the latter is what scripts and API tests use).
fn extract_token_from_request(parts: &Parts) -> Option<String> {
    if let Some(cookie_header) = parts.headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            // Parse cookies manually (cookie = "name=value; name2=value2")
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(value) = cookie.strip_prefix("pascs_session=") {
                    return Some(value.to_string());
                }
            }
        }
    }

    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    None
}

#[derive(Debug, Clone)]
pub struct AuthenticatedStaff {
    pub staff_id: i32,
    pub full_name: String,
    pub is_admin: bool,
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedStaff {
    type Rejection = (StatusCode, axum::Json<serde_json::Value>);

    fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = extract_token_from_request(parts);
        let state = state.clone();

        async move {
            let token = token.ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(json!({"error": "Missing authentication: no pascs_session cookie or Authorization header"})),
                )
            })?;

            let claims = auth::validate_session_token(&token, &state.config.session_secret)
                .map_err(|e| {
                    (
                        StatusCode::UNAUTHORIZED,
                        axum::Json(json!({"error": e})),
                    )
                })?;

            let staff_id: i32 = claims.sub.parse().map_err(|_| {
                (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(json!({"error": format!("Invalid staff id in session token: {}", claims.sub)})),
                )
            })?;

            // The token only proves identity; the profile row decides
            // whether the account is still usable.
            let staff = sqlx::query_as::<_, crate::models::Staff>(
                r#"SELECT * FROM "Staff" WHERE staff_id = $1"#,
            )
            .bind(staff_id)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, staff_id, "Database query failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({"error": "Database error"})),
                )
            })?
            .ok_or_else(|| {
                tracing::warn!(staff_id, "Session token references unknown staff profile");
                (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(json!({"error": format!("Staff profile {staff_id} not found")})),
                )
            })?;

            if !staff.is_active {
                tracing::warn!(staff_id, "Deactivated staff profile attempted access");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    axum::Json(json!({"error": "Staff profile is deactivated"})),
                ));
            }

            tracing::debug!(staff_id, "Staff profile resolved");
            Ok(AuthenticatedStaff {
                staff_id: staff.staff_id,
                full_name: staff.full_name,
                is_admin: staff.is_admin,
            })
        }
    }
}
