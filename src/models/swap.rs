use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a shift-swap request.
///
/// The only serialized form is the SCREAMING_SNAKE text below; the database
/// column and the JSON payloads both use it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapStatus {
    PendingTargetResponse,
    PendingManagerApproval,
    Approved,
    RejectedByTarget,
    RejectedByManager,
    Cancelled,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::PendingTargetResponse => "PENDING_TARGET_RESPONSE",
            SwapStatus::PendingManagerApproval => "PENDING_MANAGER_APPROVAL",
            SwapStatus::Approved => "APPROVED",
            SwapStatus::RejectedByTarget => "REJECTED_BY_TARGET",
            SwapStatus::RejectedByManager => "REJECTED_BY_MANAGER",
            SwapStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING_TARGET_RESPONSE" => Some(SwapStatus::PendingTargetResponse),
            "PENDING_MANAGER_APPROVAL" => Some(SwapStatus::PendingManagerApproval),
            "APPROVED" => Some(SwapStatus::Approved),
            "REJECTED_BY_TARGET" => Some(SwapStatus::RejectedByTarget),
            "REJECTED_BY_MANAGER" => Some(SwapStatus::RejectedByManager),
            "CANCELLED" => Some(SwapStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal records never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapStatus::Approved
                | SwapStatus::RejectedByTarget
                | SwapStatus::RejectedByManager
                | SwapStatus::Cancelled
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shift-swap request between two staff members.
///
/// Staff names and the shift date/label/time fields are snapshotted at
/// creation time, so terminal records stay meaningful as an audit trail
/// even after the rota itself changes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShiftSwapRequest {
    pub id: Uuid,
    pub requesting_staff_id: i32,
    pub requesting_staff_name: String,
    pub target_staff_id: i32,
    pub target_staff_name: String,
    pub requesting_shift_id: Uuid,
    pub requesting_shift_date: NaiveDate,
    pub requesting_shift_label: String,
    pub requesting_shift_start: Option<String>,
    pub requesting_shift_end: Option<String>,
    pub target_shift_id: Uuid,
    pub target_shift_date: NaiveDate,
    pub target_shift_label: String,
    pub target_shift_start: Option<String>,
    pub target_shift_end: Option<String>,
    pub reason: String,
    pub status: SwapStatus,
    pub target_staff_accepted: Option<bool>,
    pub rejection_reason: Option<String>,
    pub resolved_by: Option<i32>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of swap requests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SwapRequestPage {
    pub items: Vec<ShiftSwapRequest>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

/// Per-staff counts for the portal dashboard widgets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardCounts {
    pub mine: i64,
    pub incoming: i64,
    pub pending_approval: i64,
}
