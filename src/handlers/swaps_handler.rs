use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::{generate_link_token, validate_link_token},
    extractors::{permissions, AuthenticatedStaff},
    models::{
        CreateSwapRequestInput, DashboardCounts, ManagerDecisionInput, ShareLinkResponse,
        ShiftSwapRequest, SwapMutationResponse, SwapRequestPage, SwapStatus, TargetResponseInput,
    },
    workflow::{NewSwapRequest, StaffRole, SwapRequestFilter},
    AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetSwapsQuery {
    pub status: Option<SwapStatus>,
    #[serde(rename = "staffId")]
    pub staff_id: Option<i32>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

async fn can_manage(state: &AppState, auth: &AuthenticatedStaff) -> AppResult<bool> {
    permissions::has_permission(
        &state.db,
        auth.staff_id,
        auth.is_admin,
        permissions::can_manage_swaps,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, staff_id = auth.staff_id, "Permission check failed");
        AppError::Internal(format!(
            "Permission check failed for staff {}: {}",
            auth.staff_id, e
        ))
    })
}

async fn ensure_can_manage(state: &AppState, auth: &AuthenticatedStaff) -> AppResult<()> {
    if !can_manage(state, auth).await? {
        tracing::warn!(
            staff_id = auth.staff_id,
            "Staff attempted a manager-only swap operation without permission"
        );
        return Err(AppError::Forbidden(
            "Missing can_manage_swaps permission".to_string(),
        ));
    }
    Ok(())
}

/// Participants see their own requests; everyone else needs the manager
/// permission.
async fn ensure_can_view(
    state: &AppState,
    auth: &AuthenticatedStaff,
    request: &ShiftSwapRequest,
) -> AppResult<()> {
    if request.requesting_staff_id == auth.staff_id || request.target_staff_id == auth.staff_id {
        return Ok(());
    }
    ensure_can_manage(state, auth).await
}

/// POST /api/swaps - Create a new shift-swap request
#[utoipa::path(
    post,
    path = "/api/swaps",
    request_body = CreateSwapRequestInput,
    responses(
        (status = 200, description = "Swap request created", body = ShiftSwapRequest),
        (status = 404, description = "Shift or staff member not found"),
        (status = 409, description = "An active request already covers these shifts"),
        (status = 422, description = "Empty reason, self-swap, or shift not owned by its purported owner")
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn create_swap_request(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedStaff,
    Json(input): Json<CreateSwapRequestInput>,
) -> AppResult<Json<ShiftSwapRequest>> {
    let request = state
        .swaps
        .create_request(NewSwapRequest {
            requesting_staff_id: auth.staff_id,
            target_staff_id: input.target_staff_id,
            requesting_shift_id: input.requesting_shift_id,
            target_shift_id: input.target_shift_id,
            reason: input.reason,
        })
        .await?;

    Ok(Json(request))
}

/// GET /api/swaps?status=&staffId=&page=&size=
#[utoipa::path(
    get,
    path = "/api/swaps",
    params(GetSwapsQuery),
    responses(
        (status = 200, description = "Page of swap requests", body = SwapRequestPage),
        (status = 403, description = "Staff may only list their own requests")
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn get_swap_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedStaff,
    Query(query): Query<GetSwapsQuery>,
) -> AppResult<Json<SwapRequestPage>> {
    // Managers may scope freely (including no scope at all); staff are
    // pinned to requests they participate in.
    let staff_id = if can_manage(&state, &auth).await? {
        query.staff_id
    } else {
        match query.staff_id {
            Some(id) if id != auth.staff_id => {
                return Err(AppError::Forbidden(
                    "Staff may only list their own swap requests".to_string(),
                ));
            }
            _ => Some(auth.staff_id),
        }
    };

    let page = state
        .swaps
        .list_requests(SwapRequestFilter {
            status: query.status,
            staff_id,
            staff_role: StaffRole::Either,
            page: query.page.unwrap_or(1),
            size: query.size.unwrap_or(20),
        })
        .await?;

    Ok(Json(page))
}

/// GET /api/swaps/my - Requests created by the caller
#[utoipa::path(
    get,
    path = "/api/swaps/my",
    params(GetSwapsQuery),
    responses(
        (status = 200, description = "Page of the caller's own swap requests", body = SwapRequestPage)
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn get_my_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedStaff,
    Query(query): Query<GetSwapsQuery>,
) -> AppResult<Json<SwapRequestPage>> {
    let page = state
        .swaps
        .list_requests(SwapRequestFilter {
            status: query.status,
            staff_id: Some(auth.staff_id),
            staff_role: StaffRole::Requester,
            page: query.page.unwrap_or(1),
            size: query.size.unwrap_or(20),
        })
        .await?;

    Ok(Json(page))
}

/// GET /api/swaps/incoming - Proposals awaiting the caller's response
#[utoipa::path(
    get,
    path = "/api/swaps/incoming",
    params(GetSwapsQuery),
    responses(
        (status = 200, description = "Page of proposals addressed to the caller", body = SwapRequestPage)
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn get_incoming_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedStaff,
    Query(query): Query<GetSwapsQuery>,
) -> AppResult<Json<SwapRequestPage>> {
    let page = state
        .swaps
        .list_requests(SwapRequestFilter {
            status: Some(SwapStatus::PendingTargetResponse),
            staff_id: Some(auth.staff_id),
            staff_role: StaffRole::Target,
            page: query.page.unwrap_or(1),
            size: query.size.unwrap_or(20),
        })
        .await?;

    Ok(Json(page))
}

/// GET /api/swaps/approvals - Requests awaiting a manager decision
#[utoipa::path(
    get,
    path = "/api/swaps/approvals",
    params(GetSwapsQuery),
    responses(
        (status = 200, description = "Page of requests pending manager approval", body = SwapRequestPage),
        (status = 403, description = "Missing can_manage_swaps permission")
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn get_approval_requests(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedStaff,
    Query(query): Query<GetSwapsQuery>,
) -> AppResult<Json<SwapRequestPage>> {
    ensure_can_manage(&state, &auth).await?;

    let page = state
        .swaps
        .list_requests(SwapRequestFilter {
            status: Some(SwapStatus::PendingManagerApproval),
            staff_id: None,
            staff_role: StaffRole::Either,
            page: query.page.unwrap_or(1),
            size: query.size.unwrap_or(20),
        })
        .await?;

    Ok(Json(page))
}

/// GET /api/swaps/dashboard
#[utoipa::path(
    get,
    path = "/api/swaps/dashboard",
    responses(
        (status = 200, description = "Swap counts for the caller's dashboard", body = DashboardCounts)
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedStaff,
) -> AppResult<Json<DashboardCounts>> {
    let counts = state.swaps.dashboard(auth.staff_id).await?;
    Ok(Json(counts))
}

/// GET /api/swaps/{id}
#[utoipa::path(
    get,
    path = "/api/swaps/{id}",
    params(
        ("id" = Uuid, Path, description = "Swap request ID")
    ),
    responses(
        (status = 200, description = "The swap request", body = ShiftSwapRequest),
        (status = 403, description = "Caller is neither a participant nor a manager"),
        (status = 404, description = "Request not found")
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn get_swap_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    auth: AuthenticatedStaff,
) -> AppResult<Json<ShiftSwapRequest>> {
    let request = state.swaps.get(request_id).await?;
    ensure_can_view(&state, &auth, &request).await?;
    Ok(Json(request))
}

/// POST /api/swaps/{id}/respond - Target staff accepts or declines
#[utoipa::path(
    post,
    path = "/api/swaps/{id}/respond",
    params(
        ("id" = Uuid, Path, description = "Swap request ID")
    ),
    request_body = TargetResponseInput,
    responses(
        (status = 200, description = "Response recorded", body = ShiftSwapRequest),
        (status = 403, description = "Caller is not the target of this request"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is no longer awaiting a target response"),
        (status = 422, description = "Declining requires a rejection reason")
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn respond_to_swap_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    auth: AuthenticatedStaff,
    Json(input): Json<TargetResponseInput>,
) -> AppResult<Json<ShiftSwapRequest>> {
    let request = state
        .swaps
        .respond_as_target(request_id, auth.staff_id, input.accept, input.rejection_reason)
        .await?;

    Ok(Json(request))
}

/// POST /api/swaps/{id}/decision - Manager approves or rejects
#[utoipa::path(
    post,
    path = "/api/swaps/{id}/decision",
    params(
        ("id" = Uuid, Path, description = "Swap request ID")
    ),
    request_body = ManagerDecisionInput,
    responses(
        (status = 200, description = "Decision recorded; shifts reassigned on approval", body = ShiftSwapRequest),
        (status = 403, description = "Missing can_manage_swaps permission"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not awaiting manager approval"),
        (status = 422, description = "Rejecting requires a rejection reason"),
        (status = 500, description = "Shift reassignment failed; the decision may be retried")
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn decide_swap_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    auth: AuthenticatedStaff,
    Json(input): Json<ManagerDecisionInput>,
) -> AppResult<Json<ShiftSwapRequest>> {
    ensure_can_manage(&state, &auth).await?;

    let request = state
        .swaps
        .decide_as_manager(
            request_id,
            auth.staff_id,
            input.approve,
            input.rejection_reason,
        )
        .await?;

    Ok(Json(request))
}

/// DELETE /api/swaps/{id} - Requester withdraws the proposal
#[utoipa::path(
    delete,
    path = "/api/swaps/{id}",
    params(
        ("id" = Uuid, Path, description = "Swap request ID")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = SwapMutationResponse),
        (status = 403, description = "Only the requester may cancel"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request can no longer be cancelled")
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn cancel_swap_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    auth: AuthenticatedStaff,
) -> AppResult<Json<SwapMutationResponse>> {
    state.swaps.cancel(request_id, auth.staff_id).await?;

    Ok(Json(SwapMutationResponse {
        success: true,
        message: Some("Request cancelled successfully".to_string()),
    }))
}

/// POST /api/swaps/{id}/link - Mint a signed share link for a request
#[utoipa::path(
    post,
    path = "/api/swaps/{id}/link",
    params(
        ("id" = Uuid, Path, description = "Swap request ID")
    ),
    responses(
        (status = 200, description = "Signed share token", body = ShareLinkResponse),
        (status = 403, description = "Caller is neither a participant nor a manager"),
        (status = 404, description = "Request not found")
    ),
    tag = "swaps",
    security(("cookie_auth" = []))
)]
pub async fn create_share_link(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    auth: AuthenticatedStaff,
) -> AppResult<Json<ShareLinkResponse>> {
    let request = state.swaps.get(request_id).await?;
    ensure_can_view(&state, &auth, &request).await?;

    let (token, expires_at) = generate_link_token(request.id, &state.config.link_secret)?;

    tracing::debug!(request_id = %request.id, staff_id = auth.staff_id, "Share link minted");
    Ok(Json(ShareLinkResponse { token, expires_at }))
}

/// GET /api/swaps/shared/{token} - Resolve a share link
///
/// The signed token is the credential here; there is no session check, so a
/// forwarded link works for anyone the participants chose to share it with.
#[utoipa::path(
    get,
    path = "/api/swaps/shared/{token}",
    params(
        ("token" = String, Path, description = "Signed share token")
    ),
    responses(
        (status = 200, description = "The shared swap request", body = ShiftSwapRequest),
        (status = 401, description = "Token is invalid, tampered with, or expired"),
        (status = 404, description = "Request no longer exists")
    ),
    tag = "swaps"
)]
pub async fn get_shared_request(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> AppResult<Json<ShiftSwapRequest>> {
    let request_id = validate_link_token(&token, &state.config.link_secret)?;
    let request = state.swaps.get(request_id).await?;
    Ok(Json(request))
}
