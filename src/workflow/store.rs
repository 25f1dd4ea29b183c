use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{DashboardCounts, ShiftSwapRequest, StaffSummary, SwapStatus};

use super::error::SwapResult;

/// Fields the workflow hands to the store for a new request. The store
/// assigns `id`, `version` and the timestamps.
#[derive(Debug, Clone)]
pub struct NewSwapRecord {
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
}

/// Which side of a request a staff filter matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaffRole {
    #[default]
    Either,
    Requester,
    Target,
}

/// Listing filter. Scoping decisions (who may pass which filter) belong to
/// the caller.
#[derive(Debug, Clone, Default)]
pub struct SwapRequestFilter {
    pub status: Option<SwapStatus>,
    pub staff_id: Option<i32>,
    pub staff_role: StaffRole,
    pub page: i64,
    pub size: i64,
}

/// Persistence collaborator. `update` must guarantee at-most-one winner for
/// concurrent transitions on the same request: it compares the stored
/// version against `expected_version` and fails with `Conflict` when
/// another writer got there first.
#[async_trait]
pub trait SwapStore: Send + Sync {
    async fn get(&self, id: Uuid) -> SwapResult<Option<ShiftSwapRequest>>;

    async fn insert(&self, record: NewSwapRecord) -> SwapResult<ShiftSwapRequest>;

    async fn update(
        &self,
        request: &ShiftSwapRequest,
        expected_version: i32,
    ) -> SwapResult<ShiftSwapRequest>;

    /// Any non-terminal request covering the same unordered shift pair.
    async fn find_active_by_shift_pair(
        &self,
        shift_a: Uuid,
        shift_b: Uuid,
    ) -> SwapResult<Option<ShiftSwapRequest>>;

    /// Returns the requested page plus the total match count.
    async fn list(&self, filter: &SwapRequestFilter) -> SwapResult<(Vec<ShiftSwapRequest>, i64)>;

    async fn counts(&self, staff_id: i32) -> SwapResult<DashboardCounts>;
}

/// A shift as the scheduling store knows it, for ownership checks and the
/// creation-time snapshot.
#[derive(Debug, Clone)]
pub struct ShiftInfo {
    pub id: Uuid,
    pub staff_id: Option<i32>,
    pub date: NaiveDate,
    pub label: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Read access to the rota and the staff directory.
#[async_trait]
pub trait ShiftDirectory: Send + Sync {
    async fn get_shift(&self, shift_id: Uuid) -> SwapResult<Option<ShiftInfo>>;

    async fn get_staff(&self, staff_id: i32) -> SwapResult<Option<StaffSummary>>;
}

/// Applies an approved swap to the scheduling store: both reassignments
/// succeed or neither does.
#[async_trait]
pub trait SwapEffectuator: Send + Sync {
    async fn swap_assignments(
        &self,
        requesting_shift_id: Uuid,
        requesting_staff_id: i32,
        target_shift_id: Uuid,
        target_staff_id: i32,
    ) -> SwapResult<()>;
}

/// Lifecycle events emitted after each successful transition.
#[derive(Debug, Clone)]
pub enum SwapEvent {
    Created { request: ShiftSwapRequest },
    TargetResponded { request: ShiftSwapRequest, accepted: bool },
    ManagerDecided { request: ShiftSwapRequest, approved: bool, decided_by: i32 },
    Cancelled { request: ShiftSwapRequest },
}

impl SwapEvent {
    pub fn request(&self) -> &ShiftSwapRequest {
        match self {
            SwapEvent::Created { request }
            | SwapEvent::TargetResponded { request, .. }
            | SwapEvent::ManagerDecided { request, .. }
            | SwapEvent::Cancelled { request } => request,
        }
    }
}

/// Delivery capability for lifecycle events. Delivery is best-effort: the
/// workflow treats it as infallible and sinks decide how to cope.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: SwapEvent);
}

/// Default sink: structured log lines, picked up by the portal's log
/// shipping. UI freshness comes from client polling, not from this path.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, event: SwapEvent) {
        let request = event.request();
        match &event {
            SwapEvent::Created { .. } => {
                tracing::info!(
                    request_id = %request.id,
                    requesting_staff_id = request.requesting_staff_id,
                    target_staff_id = request.target_staff_id,
                    "Swap request created"
                );
            }
            SwapEvent::TargetResponded { accepted, .. } => {
                tracing::info!(
                    request_id = %request.id,
                    target_staff_id = request.target_staff_id,
                    accepted,
                    "Target staff responded to swap request"
                );
            }
            SwapEvent::ManagerDecided { approved, decided_by, .. } => {
                tracing::info!(
                    request_id = %request.id,
                    decided_by,
                    approved,
                    "Manager decided swap request"
                );
            }
            SwapEvent::Cancelled { .. } => {
                tracing::info!(
                    request_id = %request.id,
                    requesting_staff_id = request.requesting_staff_id,
                    "Swap request cancelled by requester"
                );
            }
        }
    }
}
