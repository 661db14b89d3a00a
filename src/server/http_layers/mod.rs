mod cors;
mod requests_logging;

pub use cors::{
    allow_any_origin, cors_headers, preflight_headers, ALLOWED_HEADERS, ALLOWED_METHODS,
};
pub use requests_logging::{log_requests, RequestsLoggingLevel};
