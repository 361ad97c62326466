/// Middleware modules for the API server
///
/// - `rate_limit`: Redis-backed token bucket for the auth endpoints
/// - `security`: OWASP-recommended response headers

pub mod rate_limit;
pub mod security;
