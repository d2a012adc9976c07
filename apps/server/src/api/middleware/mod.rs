//! HTTP middleware.

pub mod layers;
pub mod metrics;
pub mod request_id;

pub use layers::{compression, cors};
pub use metrics::metrics_middleware;
pub use request_id::request_id_middleware;
