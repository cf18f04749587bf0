//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with method, uri, `request_id`, `user_id`)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is not a layer: handlers that need a caller take the
//! [`RequireUser`] extractor, which resolves the bearer token per request.

pub mod auth;
pub mod request_id;

pub use auth::{RequireUser, bearer_token};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
