//! linktitle HTTP gateway
//!
//! Serves the batch resolve API with per-client rate limiting, CORS and a
//! structured access log.

pub mod error;
pub mod health_api;
pub mod rate_limit;
pub mod request_log;
pub mod resolve_api;
pub mod server;

pub use error::ApiError;
pub use rate_limit::{RateDecision, RateLimiter};
pub use resolve_api::{ResolveRequest, ResolveResponse};
pub use server::{build_router, start_server, GatewayState};
