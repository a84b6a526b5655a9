//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is an extractor ([`RequireUser`]) rather than a layer so
//! the public `/user/create`, `/user/api_token` and health routes need no
//! exemptions.

pub mod auth;
pub mod request_id;

pub use auth::RequireUser;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
