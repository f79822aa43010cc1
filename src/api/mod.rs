//! HTTP surface for the estimation service.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server. Handlers are thin: schema in, estimation
//! core call, schema out; all error mapping lives in `error`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod types;

pub use router::api_router;
pub use types::ApiContext;
