pub mod health;
pub mod metrics;
pub mod shifts_handler;
pub mod staff_handler;
pub mod swaps_handler;

pub use health::health_check;
pub use metrics::{metrics_handler, setup_metrics_recorder, MetricsState};
