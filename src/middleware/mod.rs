//! Request-processing stages. Each is a `(request, next) -> response`
//! function with no shared mutable state; `router` composes them.

pub mod access_log;
pub mod cors;
pub mod security;

pub use access_log::log_requests;
pub use cors::{AllowedOrigins, reject_disallowed_origin};
pub use security::cross_origin_isolation;
