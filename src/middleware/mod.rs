pub mod metrics;
pub mod ops_auth;
pub mod request_id;

pub use metrics::metrics_middleware;
pub use ops_auth::require_ops_key;
pub use request_id::{request_id_middleware, RequestId};
