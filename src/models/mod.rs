pub mod shift;
pub mod staff;
pub mod swap;
pub mod swap_input;

pub use shift::Shift;
pub use staff::{Staff, StaffSummary};
pub use swap::{DashboardCounts, ShiftSwapRequest, SwapRequestPage, SwapStatus};
pub use swap_input::{
    CreateSwapRequestInput, ManagerDecisionInput, ShareLinkResponse, SwapMutationResponse,
    TargetResponseInput,
};
