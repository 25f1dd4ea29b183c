pub mod error;
pub mod postgres;
pub mod store;

pub use error::{SwapError, SwapResult};
pub use postgres::{PgShiftDirectory, PgSwapEffectuator, PgSwapStore};
pub use store::{
    LogNotifier, NewSwapRecord, NotificationSink, ShiftDirectory, ShiftInfo, StaffRole,
    SwapEffectuator, SwapEvent, SwapRequestFilter, SwapStore,
};

use chrono::Utc;
use uuid::Uuid;

use crate::models::{DashboardCounts, ShiftSwapRequest, SwapRequestPage, SwapStatus};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// A proposed swap as submitted by the requesting staff member.
#[derive(Debug, Clone)]
pub struct NewSwapRequest {
    pub requesting_staff_id: i32,
    pub target_staff_id: i32,
    pub requesting_shift_id: Uuid,
    pub target_shift_id: Uuid,
    pub reason: String,
}

/// Owns the lifecycle of shift-swap requests.
///
/// The valid transitions:
///
/// ```text
/// PendingTargetResponse   accept (target)   -> PendingManagerApproval
///                         decline (target)  -> RejectedByTarget
///                         cancel (requester)-> Cancelled
/// PendingManagerApproval  approve (manager) -> Approved
///                         reject (manager)  -> RejectedByManager
/// ```
///
/// Everything else is rejected without touching the stored record. Each
/// transition is one read-modify-write; the store's version check decides
/// the winner when two actors race on the same request.
#[derive(Clone)]
pub struct ShiftSwapWorkflow<S, D, E, N> {
    store: S,
    directory: D,
    effectuator: E,
    notifier: N,
}

impl<S, D, E, N> ShiftSwapWorkflow<S, D, E, N>
where
    S: SwapStore,
    D: ShiftDirectory,
    E: SwapEffectuator,
    N: NotificationSink,
{
    pub fn new(store: S, directory: D, effectuator: E, notifier: N) -> Self {
        Self {
            store,
            directory,
            effectuator,
            notifier,
        }
    }

    /// Create a new request in `PendingTargetResponse`.
    ///
    /// Both shifts must exist and belong to their purported owners, the two
    /// staff members must be distinct, and no active request may already
    /// cover the same shift pair.
    pub async fn create_request(&self, proposal: NewSwapRequest) -> SwapResult<ShiftSwapRequest> {
        let reason = proposal.reason.trim();
        if reason.is_empty() {
            return Err(SwapError::Validation("reason must not be empty".to_string()));
        }
        if proposal.requesting_staff_id == proposal.target_staff_id {
            return Err(SwapError::Validation(
                "cannot request a swap with yourself".to_string(),
            ));
        }
        if proposal.requesting_shift_id == proposal.target_shift_id {
            return Err(SwapError::Validation(
                "the two shifts must be distinct".to_string(),
            ));
        }

        let requesting_shift = self
            .directory
            .get_shift(proposal.requesting_shift_id)
            .await?
            .ok_or_else(|| {
                SwapError::NotFound(format!("Shift {} not found", proposal.requesting_shift_id))
            })?;
        if requesting_shift.staff_id != Some(proposal.requesting_staff_id) {
            return Err(SwapError::Validation(
                "the offered shift is not assigned to the requesting staff member".to_string(),
            ));
        }

        let target_shift = self
            .directory
            .get_shift(proposal.target_shift_id)
            .await?
            .ok_or_else(|| {
                SwapError::NotFound(format!("Shift {} not found", proposal.target_shift_id))
            })?;
        if target_shift.staff_id != Some(proposal.target_staff_id) {
            return Err(SwapError::Validation(
                "the requested shift is not assigned to the target staff member".to_string(),
            ));
        }

        let requester = self
            .directory
            .get_staff(proposal.requesting_staff_id)
            .await?
            .ok_or_else(|| {
                SwapError::NotFound(format!("Staff {} not found", proposal.requesting_staff_id))
            })?;
        let target = self
            .directory
            .get_staff(proposal.target_staff_id)
            .await?
            .ok_or_else(|| {
                SwapError::NotFound(format!("Staff {} not found", proposal.target_staff_id))
            })?;

        if let Some(existing) = self
            .store
            .find_active_by_shift_pair(proposal.requesting_shift_id, proposal.target_shift_id)
            .await?
        {
            return Err(SwapError::Conflict(format!(
                "an active swap request ({}) already covers these shifts",
                existing.id
            )));
        }

        let record = NewSwapRecord {
            requesting_staff_id: requester.staff_id,
            requesting_staff_name: requester.full_name,
            target_staff_id: target.staff_id,
            target_staff_name: target.full_name,
            requesting_shift_id: requesting_shift.id,
            requesting_shift_date: requesting_shift.date,
            requesting_shift_label: requesting_shift.label,
            requesting_shift_start: requesting_shift.start,
            requesting_shift_end: requesting_shift.end,
            target_shift_id: target_shift.id,
            target_shift_date: target_shift.date,
            target_shift_label: target_shift.label,
            target_shift_start: target_shift.start,
            target_shift_end: target_shift.end,
            reason: reason.to_string(),
        };

        let request = self.store.insert(record).await?;
        self.notifier
            .notify(SwapEvent::Created {
                request: request.clone(),
            })
            .await;
        Ok(request)
    }

    /// Target staff member accepts or declines the proposal.
    pub async fn respond_as_target(
        &self,
        request_id: Uuid,
        actor_id: i32,
        accept: bool,
        rejection_reason: Option<String>,
    ) -> SwapResult<ShiftSwapRequest> {
        let request = self.load(request_id).await?;

        if request.target_staff_id != actor_id {
            return Err(SwapError::Authorization(format!(
                "only the target staff member may respond to request {request_id}"
            )));
        }
        Self::expect_status(&request, SwapStatus::PendingTargetResponse)?;

        let mut updated = request.clone();
        if accept {
            updated.status = SwapStatus::PendingManagerApproval;
            updated.target_staff_accepted = Some(true);
        } else {
            let reason = non_empty(rejection_reason).ok_or_else(|| {
                SwapError::Validation("a rejection reason is required when declining".to_string())
            })?;
            updated.status = SwapStatus::RejectedByTarget;
            updated.target_staff_accepted = Some(false);
            updated.rejection_reason = Some(reason);
            updated.resolved_by = Some(actor_id);
            updated.resolved_at = Some(Utc::now());
        }

        let saved = self.store.update(&updated, request.version).await?;
        self.notifier
            .notify(SwapEvent::TargetResponded {
                request: saved.clone(),
                accepted: accept,
            })
            .await;
        Ok(saved)
    }

    /// Manager approves or rejects a target-accepted swap. Approval first
    /// wins the concurrency race on the status write, then applies the
    /// reassignment; an effectuation failure restores the pending status so
    /// the decision can be retried.
    pub async fn decide_as_manager(
        &self,
        request_id: Uuid,
        actor_id: i32,
        approve: bool,
        rejection_reason: Option<String>,
    ) -> SwapResult<ShiftSwapRequest> {
        let request = self.load(request_id).await?;
        Self::expect_status(&request, SwapStatus::PendingManagerApproval)?;

        if !approve {
            let reason = non_empty(rejection_reason).ok_or_else(|| {
                SwapError::Validation("a rejection reason is required when rejecting".to_string())
            })?;
            let mut updated = request.clone();
            updated.status = SwapStatus::RejectedByManager;
            updated.rejection_reason = Some(reason);
            updated.resolved_by = Some(actor_id);
            updated.resolved_at = Some(Utc::now());

            let saved = self.store.update(&updated, request.version).await?;
            self.notifier
                .notify(SwapEvent::ManagerDecided {
                    request: saved.clone(),
                    approved: false,
                    decided_by: actor_id,
                })
                .await;
            return Ok(saved);
        }

        let mut updated = request.clone();
        updated.status = SwapStatus::Approved;
        updated.resolved_by = Some(actor_id);
        updated.resolved_at = Some(Utc::now());

        let approved = self.store.update(&updated, request.version).await?;

        if let Err(e) = self
            .effectuator
            .swap_assignments(
                request.requesting_shift_id,
                request.requesting_staff_id,
                request.target_shift_id,
                request.target_staff_id,
            )
            .await
        {
            tracing::warn!(
                request_id = %request_id,
                decided_by = actor_id,
                error = %e,
                "Shift reassignment failed, restoring PENDING_MANAGER_APPROVAL"
            );
            let mut rollback = approved.clone();
            rollback.status = SwapStatus::PendingManagerApproval;
            rollback.resolved_by = None;
            rollback.resolved_at = None;
            self.store.update(&rollback, approved.version).await?;

            let message = match e {
                SwapError::Effectuation(m) | SwapError::Store(m) => m,
                other => other.to_string(),
            };
            return Err(SwapError::Effectuation(message));
        }

        self.notifier
            .notify(SwapEvent::ManagerDecided {
                request: approved.clone(),
                approved: true,
                decided_by: actor_id,
            })
            .await;
        Ok(approved)
    }

    /// Requester withdraws the proposal before the target has responded.
    pub async fn cancel(&self, request_id: Uuid, actor_id: i32) -> SwapResult<ShiftSwapRequest> {
        let request = self.load(request_id).await?;

        if request.requesting_staff_id != actor_id {
            return Err(SwapError::Authorization(format!(
                "only the requester may cancel request {request_id}"
            )));
        }
        Self::expect_status(&request, SwapStatus::PendingTargetResponse)?;

        let mut updated = request.clone();
        updated.status = SwapStatus::Cancelled;
        updated.resolved_by = Some(actor_id);
        updated.resolved_at = Some(Utc::now());

        let saved = self.store.update(&updated, request.version).await?;
        self.notifier
            .notify(SwapEvent::Cancelled {
                request: saved.clone(),
            })
            .await;
        Ok(saved)
    }

    pub async fn get(&self, request_id: Uuid) -> SwapResult<ShiftSwapRequest> {
        self.load(request_id).await
    }

    pub async fn list_requests(&self, mut filter: SwapRequestFilter) -> SwapResult<SwapRequestPage> {
        if filter.page < 1 {
            filter.page = 1;
        }
        if filter.size < 1 {
            filter.size = DEFAULT_PAGE_SIZE;
        }
        if filter.size > MAX_PAGE_SIZE {
            filter.size = MAX_PAGE_SIZE;
        }
        let (items, total) = self.store.list(&filter).await?;
        Ok(SwapRequestPage {
            items,
            total,
            page: filter.page,
            size: filter.size,
        })
    }

    pub async fn dashboard(&self, staff_id: i32) -> SwapResult<DashboardCounts> {
        self.store.counts(staff_id).await
    }

    async fn load(&self, request_id: Uuid) -> SwapResult<ShiftSwapRequest> {
        self.store
            .get(request_id)
            .await?
            .ok_or_else(|| SwapError::NotFound(format!("Swap request {request_id} not found")))
    }

    fn expect_status(request: &ShiftSwapRequest, expected: SwapStatus) -> SwapResult<()> {
        if request.status != expected {
            return Err(SwapError::InvalidState(format!(
                "request {} is {}, expected {}",
                request.id, request.status, expected
            )));
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::models::StaffSummary;

    const ALICE: i32 = 1;
    const BEN: i32 = 2;
    const CARA: i32 = 3;
    const MANAGER: i32 = 9;

    fn shift_a() -> Uuid {
        Uuid::from_u128(0xa1)
    }

    fn shift_b() -> Uuid {
        Uuid::from_u128(0xb2)
    }

    fn shift_c() -> Uuid {
        Uuid::from_u128(0xc3)
    }

    #[derive(Clone, Default)]
    struct MemStore {
        rows: Arc<Mutex<HashMap<Uuid, ShiftSwapRequest>>>,
    }

    impl MemStore {
        fn snapshot(&self, id: Uuid) -> ShiftSwapRequest {
            self.rows.lock().unwrap().get(&id).unwrap().clone()
        }
    }

    #[async_trait]
    impl SwapStore for MemStore {
        async fn get(&self, id: Uuid) -> SwapResult<Option<ShiftSwapRequest>> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn insert(&self, record: NewSwapRecord) -> SwapResult<ShiftSwapRequest> {
            let now = Utc::now();
            let request = ShiftSwapRequest {
                id: Uuid::new_v4(),
                requesting_staff_id: record.requesting_staff_id,
                requesting_staff_name: record.requesting_staff_name,
                target_staff_id: record.target_staff_id,
                target_staff_name: record.target_staff_name,
                requesting_shift_id: record.requesting_shift_id,
                requesting_shift_date: record.requesting_shift_date,
                requesting_shift_label: record.requesting_shift_label,
                requesting_shift_start: record.requesting_shift_start,
                requesting_shift_end: record.requesting_shift_end,
                target_shift_id: record.target_shift_id,
                target_shift_date: record.target_shift_date,
                target_shift_label: record.target_shift_label,
                target_shift_start: record.target_shift_start,
                target_shift_end: record.target_shift_end,
                reason: record.reason,
                status: SwapStatus::PendingTargetResponse,
                target_staff_accepted: None,
                rejection_reason: None,
                resolved_by: None,
                resolved_at: None,
                version: 1,
                created_at: now,
                updated_at: now,
            };
            self.rows
                .lock()
                .unwrap()
                .insert(request.id, request.clone());
            Ok(request)
        }

        async fn update(
            &self,
            request: &ShiftSwapRequest,
            expected_version: i32,
        ) -> SwapResult<ShiftSwapRequest> {
            let mut rows = self.rows.lock().unwrap();
            let current = rows
                .get_mut(&request.id)
                .ok_or_else(|| SwapError::NotFound(format!("Swap request {} not found", request.id)))?;
            if current.version != expected_version {
                return Err(SwapError::Conflict(format!(
                    "request {} was modified concurrently",
                    request.id
                )));
            }
            let mut next = request.clone();
            next.version = expected_version + 1;
            next.updated_at = Utc::now();
            *current = next.clone();
            Ok(next)
        }

        async fn find_active_by_shift_pair(
            &self,
            shift_a: Uuid,
            shift_b: Uuid,
        ) -> SwapResult<Option<ShiftSwapRequest>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|r| {
                    r.status.is_active()
                        && ((r.requesting_shift_id == shift_a && r.target_shift_id == shift_b)
                            || (r.requesting_shift_id == shift_b && r.target_shift_id == shift_a))
                })
                .cloned())
        }

        async fn list(
            &self,
            filter: &SwapRequestFilter,
        ) -> SwapResult<(Vec<ShiftSwapRequest>, i64)> {
            let rows = self.rows.lock().unwrap();
            let mut items: Vec<ShiftSwapRequest> = rows
                .values()
                .filter(|r| filter.status.map_or(true, |s| r.status == s))
                .filter(|r| {
                    filter.staff_id.map_or(true, |id| match filter.staff_role {
                        StaffRole::Either => {
                            r.requesting_staff_id == id || r.target_staff_id == id
                        }
                        StaffRole::Requester => r.requesting_staff_id == id,
                        StaffRole::Target => r.target_staff_id == id,
                    })
                })
                .cloned()
                .collect();
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let total = items.len() as i64;
            let start = ((filter.page - 1) * filter.size) as usize;
            let page = items
                .into_iter()
                .skip(start)
                .take(filter.size as usize)
                .collect();
            Ok((page, total))
        }

        async fn counts(&self, staff_id: i32) -> SwapResult<DashboardCounts> {
            let rows = self.rows.lock().unwrap();
            Ok(DashboardCounts {
                mine: rows
                    .values()
                    .filter(|r| r.requesting_staff_id == staff_id)
                    .count() as i64,
                incoming: rows
                    .values()
                    .filter(|r| {
                        r.target_staff_id == staff_id
                            && r.status == SwapStatus::PendingTargetResponse
                    })
                    .count() as i64,
                pending_approval: rows
                    .values()
                    .filter(|r| r.status == SwapStatus::PendingManagerApproval)
                    .count() as i64,
            })
        }
    }

    #[derive(Clone, Default)]
    struct MemDirectory {
        shifts: Arc<Mutex<HashMap<Uuid, ShiftInfo>>>,
        staff: Arc<Mutex<HashMap<i32, StaffSummary>>>,
    }

    impl MemDirectory {
        fn with_shift(self, shift: ShiftInfo) -> Self {
            self.shifts.lock().unwrap().insert(shift.id, shift);
            self
        }

        fn with_staff(self, staff_id: i32, full_name: &str) -> Self {
            self.staff.lock().unwrap().insert(
                staff_id,
                StaffSummary {
                    staff_id,
                    full_name: full_name.to_string(),
                },
            );
            self
        }
    }

    #[async_trait]
    impl ShiftDirectory for MemDirectory {
        async fn get_shift(&self, shift_id: Uuid) -> SwapResult<Option<ShiftInfo>> {
            Ok(self.shifts.lock().unwrap().get(&shift_id).cloned())
        }

        async fn get_staff(&self, staff_id: i32) -> SwapResult<Option<StaffSummary>> {
            Ok(self.staff.lock().unwrap().get(&staff_id).cloned())
        }
    }

    #[derive(Clone, Default)]
    struct FlakyEffectuator {
        fail: Arc<AtomicBool>,
        swaps: Arc<Mutex<Vec<(Uuid, i32, Uuid, i32)>>>,
    }

    #[async_trait]
    impl SwapEffectuator for FlakyEffectuator {
        async fn swap_assignments(
            &self,
            requesting_shift_id: Uuid,
            requesting_staff_id: i32,
            target_shift_id: Uuid,
            target_staff_id: i32,
        ) -> SwapResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(SwapError::Effectuation(
                    "scheduling store rejected the reassignment".to_string(),
                ));
            }
            self.swaps.lock().unwrap().push((
                requesting_shift_id,
                requesting_staff_id,
                target_shift_id,
                target_staff_id,
            ));
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        events: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingNotifier {
        async fn notify(&self, event: SwapEvent) {
            let label = match event {
                SwapEvent::Created { .. } => "created",
                SwapEvent::TargetResponded { accepted: true, .. } => "target_accepted",
                SwapEvent::TargetResponded { accepted: false, .. } => "target_declined",
                SwapEvent::ManagerDecided { approved: true, .. } => "approved",
                SwapEvent::ManagerDecided { approved: false, .. } => "rejected",
                SwapEvent::Cancelled { .. } => "cancelled",
            };
            self.events.lock().unwrap().push(label.to_string());
        }
    }

    struct Fixture {
        workflow: ShiftSwapWorkflow<MemStore, MemDirectory, FlakyEffectuator, RecordingNotifier>,
        store: MemStore,
        effectuator: FlakyEffectuator,
        notifier: RecordingNotifier,
    }

    fn fixture() -> Fixture {
        let directory = MemDirectory::default()
            .with_staff(ALICE, "Alice Nguyen")
            .with_staff(BEN, "Ben Ortiz")
            .with_staff(CARA, "Cara Silva")
            .with_shift(ShiftInfo {
                id: shift_a(),
                staff_id: Some(ALICE),
                date: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
                label: "EARLY".to_string(),
                start: Some("08:00".to_string()),
                end: Some("16:00".to_string()),
            })
            .with_shift(ShiftInfo {
                id: shift_b(),
                staff_id: Some(BEN),
                date: NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
                label: "LATE".to_string(),
                start: Some("12:00".to_string()),
                end: Some("20:00".to_string()),
            })
            .with_shift(ShiftInfo {
                id: shift_c(),
                staff_id: Some(CARA),
                date: NaiveDate::from_ymd_opt(2025, 11, 3).unwrap(),
                label: "NIGHT".to_string(),
                start: Some("20:00".to_string()),
                end: None,
            });

        let store = MemStore::default();
        let effectuator = FlakyEffectuator::default();
        let notifier = RecordingNotifier::default();
        let workflow = ShiftSwapWorkflow::new(
            store.clone(),
            directory,
            effectuator.clone(),
            notifier.clone(),
        );
        Fixture {
            workflow,
            store,
            effectuator,
            notifier,
        }
    }

    fn proposal() -> NewSwapRequest {
        NewSwapRequest {
            requesting_staff_id: ALICE,
            target_staff_id: BEN,
            requesting_shift_id: shift_a(),
            target_shift_id: shift_b(),
            reason: "swap for personal reasons".to_string(),
        }
    }

    #[tokio::test]
    async fn create_starts_pending_target_response() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();

        assert_eq!(request.status, SwapStatus::PendingTargetResponse);
        assert_eq!(request.requesting_staff_name, "Alice Nguyen");
        assert_eq!(request.target_staff_name, "Ben Ortiz");
        assert_eq!(request.requesting_shift_label, "EARLY");
        assert_eq!(request.target_shift_label, "LATE");
        assert_eq!(request.target_staff_accepted, None);
        assert_eq!(request.version, 1);
        assert_eq!(
            f.notifier.events.lock().unwrap().as_slice(),
            ["created".to_string()]
        );
    }

    #[tokio::test]
    async fn create_rejects_blank_reason() {
        let f = fixture();
        let result = f
            .workflow
            .create_request(NewSwapRequest {
                reason: "   ".to_string(),
                ..proposal()
            })
            .await;
        assert!(matches!(result, Err(SwapError::Validation(_))));
    }

    #[tokio::test]
    async fn create_rejects_self_swap() {
        let f = fixture();
        let result = f
            .workflow
            .create_request(NewSwapRequest {
                target_staff_id: ALICE,
                ..proposal()
            })
            .await;
        assert!(matches!(result, Err(SwapError::Validation(_))));
    }

    #[tokio::test]
    async fn create_rejects_identical_shifts() {
        let f = fixture();
        let result = f
            .workflow
            .create_request(NewSwapRequest {
                target_shift_id: shift_a(),
                ..proposal()
            })
            .await;
        assert!(matches!(result, Err(SwapError::Validation(_))));
    }

    #[tokio::test]
    async fn create_rejects_shift_not_owned_by_target() {
        let f = fixture();
        // shift B belongs to Ben, not Cara
        let result = f
            .workflow
            .create_request(NewSwapRequest {
                target_staff_id: CARA,
                ..proposal()
            })
            .await;
        assert!(matches!(result, Err(SwapError::Validation(_))));
    }

    #[tokio::test]
    async fn create_unknown_shift_is_not_found() {
        let f = fixture();
        let result = f
            .workflow
            .create_request(NewSwapRequest {
                target_shift_id: Uuid::from_u128(0xdead),
                ..proposal()
            })
            .await;
        assert!(matches!(result, Err(SwapError::NotFound(_))));
    }

    #[tokio::test]
    async fn create_duplicate_shift_pair_conflicts() {
        let f = fixture();
        f.workflow.create_request(proposal()).await.unwrap();

        let result = f.workflow.create_request(proposal()).await;
        assert!(matches!(result, Err(SwapError::Conflict(_))));

        // Same pair proposed from the other side collides too.
        let reversed = NewSwapRequest {
            requesting_staff_id: BEN,
            target_staff_id: ALICE,
            requesting_shift_id: shift_b(),
            target_shift_id: shift_a(),
            reason: "counter-proposal".to_string(),
        };
        let result = f.workflow.create_request(reversed).await;
        assert!(matches!(result, Err(SwapError::Conflict(_))));
    }

    #[tokio::test]
    async fn terminal_request_frees_the_shift_pair() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();
        f.workflow.cancel(request.id, ALICE).await.unwrap();

        // The cancelled record stays around but no longer blocks a retry.
        let again = f.workflow.create_request(proposal()).await.unwrap();
        assert_ne!(again.id, request.id);
        assert_eq!(
            f.store.snapshot(request.id).status,
            SwapStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn target_accept_moves_to_manager_approval() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();

        let updated = f
            .workflow
            .respond_as_target(request.id, BEN, true, None)
            .await
            .unwrap();
        assert_eq!(updated.status, SwapStatus::PendingManagerApproval);
        assert_eq!(updated.target_staff_accepted, Some(true));
        assert_eq!(updated.rejection_reason, None);
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn target_decline_requires_reason() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();

        let result = f
            .workflow
            .respond_as_target(request.id, BEN, false, None)
            .await;
        assert!(matches!(result, Err(SwapError::Validation(_))));

        let result = f
            .workflow
            .respond_as_target(request.id, BEN, false, Some("  ".to_string()))
            .await;
        assert!(matches!(result, Err(SwapError::Validation(_))));

        // No mutation happened.
        let stored = f.store.snapshot(request.id);
        assert_eq!(stored.status, SwapStatus::PendingTargetResponse);
        assert_eq!(stored.target_staff_accepted, None);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn target_decline_records_reason() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();

        let updated = f
            .workflow
            .respond_as_target(
                request.id,
                BEN,
                false,
                Some("cannot work that shift".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, SwapStatus::RejectedByTarget);
        assert_eq!(updated.target_staff_accepted, Some(false));
        assert_eq!(
            updated.rejection_reason.as_deref(),
            Some("cannot work that shift")
        );
        assert_eq!(updated.resolved_by, Some(BEN));
        assert!(updated.resolved_at.is_some());

        // Terminal: a manager decision afterwards is rejected.
        let result = f
            .workflow
            .decide_as_manager(request.id, MANAGER, true, None)
            .await;
        assert!(matches!(result, Err(SwapError::InvalidState(_))));
    }

    #[tokio::test]
    async fn respond_requires_target_actor() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();

        let result = f
            .workflow
            .respond_as_target(request.id, ALICE, true, None)
            .await;
        assert!(matches!(result, Err(SwapError::Authorization(_))));
    }

    #[tokio::test]
    async fn respond_twice_is_invalid_state() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();
        f.workflow
            .respond_as_target(request.id, BEN, true, None)
            .await
            .unwrap();

        let result = f
            .workflow
            .respond_as_target(request.id, BEN, true, None)
            .await;
        assert!(matches!(result, Err(SwapError::InvalidState(_))));
    }

    #[tokio::test]
    async fn cancel_while_pending_target_response() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();

        let cancelled = f.workflow.cancel(request.id, ALICE).await.unwrap();
        assert_eq!(cancelled.status, SwapStatus::Cancelled);
        assert_eq!(cancelled.resolved_by, Some(ALICE));
        assert_eq!(
            f.notifier.events.lock().unwrap().last().map(String::as_str),
            Some("cancelled")
        );
    }

    #[tokio::test]
    async fn cancel_by_non_requester_is_denied() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();

        let result = f.workflow.cancel(request.id, BEN).await;
        assert!(matches!(result, Err(SwapError::Authorization(_))));
    }

    #[tokio::test]
    async fn cancel_after_target_accept_is_invalid_state() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();
        f.workflow
            .respond_as_target(request.id, BEN, true, None)
            .await
            .unwrap();

        let result = f.workflow.cancel(request.id, ALICE).await;
        assert!(matches!(result, Err(SwapError::InvalidState(_))));
        assert_eq!(
            f.store.snapshot(request.id).status,
            SwapStatus::PendingManagerApproval
        );
    }

    #[tokio::test]
    async fn approval_swaps_the_assignments() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();
        f.workflow
            .respond_as_target(request.id, BEN, true, None)
            .await
            .unwrap();

        let approved = f
            .workflow
            .decide_as_manager(request.id, MANAGER, true, None)
            .await
            .unwrap();
        assert_eq!(approved.status, SwapStatus::Approved);
        assert_eq!(approved.resolved_by, Some(MANAGER));

        let swaps = f.effectuator.swaps.lock().unwrap();
        assert_eq!(swaps.as_slice(), [(shift_a(), ALICE, shift_b(), BEN)]);
    }

    #[tokio::test]
    async fn manager_rejection_requires_reason() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();
        f.workflow
            .respond_as_target(request.id, BEN, true, None)
            .await
            .unwrap();

        let result = f
            .workflow
            .decide_as_manager(request.id, MANAGER, false, None)
            .await;
        assert!(matches!(result, Err(SwapError::Validation(_))));
        assert_eq!(
            f.store.snapshot(request.id).status,
            SwapStatus::PendingManagerApproval
        );
    }

    #[tokio::test]
    async fn manager_rejection_records_reason() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();
        f.workflow
            .respond_as_target(request.id, BEN, true, None)
            .await
            .unwrap();

        let rejected = f
            .workflow
            .decide_as_manager(
                request.id,
                MANAGER,
                false,
                Some("coverage rules".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, SwapStatus::RejectedByManager);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("coverage rules"));
        assert!(f.effectuator.swaps.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn decision_before_target_response_is_invalid_state() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();

        let result = f
            .workflow
            .decide_as_manager(request.id, MANAGER, true, None)
            .await;
        assert!(matches!(result, Err(SwapError::InvalidState(_))));
    }

    #[tokio::test]
    async fn effectuation_failure_rolls_back_and_allows_retry() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();
        f.workflow
            .respond_as_target(request.id, BEN, true, None)
            .await
            .unwrap();

        f.effectuator.fail.store(true, Ordering::SeqCst);
        let result = f
            .workflow
            .decide_as_manager(request.id, MANAGER, true, None)
            .await;
        assert!(matches!(result, Err(SwapError::Effectuation(_))));

        // No partial commit: still awaiting approval, no reassignment.
        let stored = f.store.snapshot(request.id);
        assert_eq!(stored.status, SwapStatus::PendingManagerApproval);
        assert_eq!(stored.resolved_by, None);
        assert!(f.effectuator.swaps.lock().unwrap().is_empty());

        // Once the scheduling store recovers the decision goes through.
        f.effectuator.fail.store(false, Ordering::SeqCst);
        let approved = f
            .workflow
            .decide_as_manager(request.id, MANAGER, true, None)
            .await
            .unwrap();
        assert_eq!(approved.status, SwapStatus::Approved);
        assert_eq!(f.effectuator.swaps.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn terminal_requests_are_immutable() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();
        f.workflow
            .respond_as_target(request.id, BEN, true, None)
            .await
            .unwrap();
        f.workflow
            .decide_as_manager(request.id, MANAGER, true, None)
            .await
            .unwrap();

        let before = f.store.snapshot(request.id);

        let result = f
            .workflow
            .decide_as_manager(request.id, MANAGER, true, None)
            .await;
        assert!(matches!(result, Err(SwapError::InvalidState(_))));

        let result = f
            .workflow
            .respond_as_target(request.id, BEN, true, None)
            .await;
        assert!(matches!(result, Err(SwapError::InvalidState(_))));

        let result = f.workflow.cancel(request.id, ALICE).await;
        assert!(matches!(result, Err(SwapError::InvalidState(_))));

        let after = f.store.snapshot(request.id);
        assert_eq!(after.status, before.status);
        assert_eq!(after.version, before.version);
        assert_eq!(f.effectuator.swaps.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_version_write_loses_the_race() {
        let f = fixture();
        let request = f.workflow.create_request(proposal()).await.unwrap();

        // First writer wins.
        f.workflow
            .respond_as_target(request.id, BEN, true, None)
            .await
            .unwrap();

        // A writer still holding the version-1 snapshot must lose.
        let mut stale = request.clone();
        stale.status = SwapStatus::Cancelled;
        let result = f.store.update(&stale, request.version).await;
        assert!(matches!(result, Err(SwapError::Conflict(_))));
    }

    #[tokio::test]
    async fn listing_filters_and_paginates() {
        let f = fixture();
        let first = f.workflow.create_request(proposal()).await.unwrap();
        f.workflow
            .create_request(NewSwapRequest {
                requesting_staff_id: CARA,
                target_staff_id: BEN,
                requesting_shift_id: shift_c(),
                target_shift_id: shift_b(),
                reason: "childcare".to_string(),
            })
            .await
            .unwrap();
        f.workflow
            .respond_as_target(first.id, BEN, true, None)
            .await
            .unwrap();

        let page = f
            .workflow
            .list_requests(SwapRequestFilter {
                staff_id: Some(ALICE),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, first.id);
        assert_eq!(page.size, 20);

        let page = f
            .workflow
            .list_requests(SwapRequestFilter {
                status: Some(SwapStatus::PendingTargetResponse),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let page = f
            .workflow
            .list_requests(SwapRequestFilter {
                page: 2,
                size: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.page, 2);

        // Oversized page requests are clamped.
        let page = f
            .workflow
            .list_requests(SwapRequestFilter {
                size: 10_000,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.size, 100);

        // Role-scoped staff filters: Ben is the target of both requests
        // but the requester of neither.
        let page = f
            .workflow
            .list_requests(SwapRequestFilter {
                staff_id: Some(BEN),
                staff_role: StaffRole::Target,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);

        let page = f
            .workflow
            .list_requests(SwapRequestFilter {
                staff_id: Some(BEN),
                staff_role: StaffRole::Requester,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn dashboard_counts_by_staff() {
        let f = fixture();
        let first = f.workflow.create_request(proposal()).await.unwrap();
        f.workflow
            .create_request(NewSwapRequest {
                requesting_staff_id: CARA,
                target_staff_id: BEN,
                requesting_shift_id: shift_c(),
                target_shift_id: shift_b(),
                reason: "childcare".to_string(),
            })
            .await
            .unwrap();
        f.workflow
            .respond_as_target(first.id, BEN, true, None)
            .await
            .unwrap();

        let counts = f.workflow.dashboard(BEN).await.unwrap();
        assert_eq!(counts.mine, 0);
        assert_eq!(counts.incoming, 1);
        assert_eq!(counts.pending_approval, 1);

        let counts = f.workflow.dashboard(ALICE).await.unwrap();
        assert_eq!(counts.mine, 1);
        assert_eq!(counts.incoming, 0);
    }

    #[tokio::test]
    async fn full_lifecycle_happy_path() {
        let f = fixture();

        let request = f.workflow.create_request(proposal()).await.unwrap();
        assert_eq!(request.status, SwapStatus::PendingTargetResponse);
        assert_eq!(
            request.requesting_shift_date,
            NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
        );
        assert_eq!(
            request.target_shift_date,
            NaiveDate::from_ymd_opt(2025, 11, 2).unwrap()
        );
        assert_eq!(request.reason, "swap for personal reasons");

        let request = f
            .workflow
            .respond_as_target(request.id, BEN, true, None)
            .await
            .unwrap();
        assert_eq!(request.status, SwapStatus::PendingManagerApproval);

        let request = f
            .workflow
            .decide_as_manager(request.id, MANAGER, true, None)
            .await
            .unwrap();
        assert_eq!(request.status, SwapStatus::Approved);
        assert_eq!(
            f.effectuator.swaps.lock().unwrap().as_slice(),
            [(shift_a(), ALICE, shift_b(), BEN)]
        );
        assert_eq!(
            f.notifier.events.lock().unwrap().as_slice(),
            [
                "created".to_string(),
                "target_accepted".to_string(),
                "approved".to_string()
            ]
        );
    }
}
