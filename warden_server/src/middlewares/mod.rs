pub mod auth;
pub mod cache;
pub mod context;
pub mod rate_limit;
pub mod request_id;
pub mod timeout;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
