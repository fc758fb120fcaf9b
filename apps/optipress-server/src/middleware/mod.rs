//! Cross-cutting HTTP layers

pub mod rate_limit;
pub mod security_headers;

pub use rate_limit::{rate_limit, RateLimiter};
pub use security_headers::with_security_headers;
