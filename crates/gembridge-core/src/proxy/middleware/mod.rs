// Middleware module - Axum middleware

pub mod admission;
pub mod cors;
pub mod rate_limiter;
pub mod scan_detector;

pub use admission::{admission_middleware, client_identity};
pub use cors::cors_middleware;
pub use rate_limiter::{Admission, RateLimiter};
pub use scan_detector::ScanDetector;
