use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Input for creating a shift-swap request. The requesting staff member is
/// the authenticated caller; both shifts are validated for ownership.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSwapRequestInput {
    pub target_staff_id: i32,
    pub requesting_shift_id: Uuid,
    pub target_shift_id: Uuid,
    pub reason: String,
}

/// Target staff member's response to a proposed swap.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TargetResponseInput {
    pub accept: bool,
    pub rejection_reason: Option<String>,
}

/// Manager decision on a swap awaiting approval.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManagerDecisionInput {
    pub approve: bool,
    pub rejection_reason: Option<String>,
}

/// Response for swap mutations that do not return the full request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SwapMutationResponse {
    pub success: bool,
    pub message: Option<String>,
}

/// A minted share link for a swap request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareLinkResponse {
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}
