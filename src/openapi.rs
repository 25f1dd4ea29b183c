use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::Modify;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PASCS Swap API",
        version = "1.0.0",
        description = "Back-office shift-swap workflow service for the PASCS portal",
        contact(
            name = "API Support",
            email = "support@pascs.example"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // Health
        crate::handlers::health::health_check,

        // Swaps
        crate::handlers::swaps_handler::create_swap_request,
        crate::handlers::swaps_handler::get_swap_requests,
        crate::handlers::swaps_handler::get_my_requests,
        crate::handlers::swaps_handler::get_incoming_requests,
        crate::handlers::swaps_handler::get_approval_requests,
        crate::handlers::swaps_handler::get_dashboard,
        crate::handlers::swaps_handler::get_swap_request,
        crate::handlers::swaps_handler::respond_to_swap_request,
        crate::handlers::swaps_handler::decide_swap_request,
        crate::handlers::swaps_handler::cancel_swap_request,
        crate::handlers::swaps_handler::create_share_link,
        crate::handlers::swaps_handler::get_shared_request,

        // Shifts
        crate::handlers::shifts_handler::get_swappable_shifts,

        // Staff
        crate::handlers::staff_handler::get_staff_list,
    ),
    components(
        schemas(
            // Core models
            crate::models::ShiftSwapRequest,
            crate::models::SwapStatus,
            crate::models::SwapRequestPage,
            crate::models::DashboardCounts,
            crate::models::Shift,
            crate::models::Staff,

            // Input models
            crate::models::CreateSwapRequestInput,
            crate::models::TargetResponseInput,
            crate::models::ManagerDecisionInput,
            crate::models::SwapMutationResponse,
            crate::models::ShareLinkResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check"),
        (name = "swaps", description = "Shift-swap request workflow"),
        (name = "shifts", description = "Rota shifts eligible for swapping"),
        (name = "staff", description = "Staff directory"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("pascs_session"))),
            )
        }
    }
}
