//! API layer
//!
//! HTTP handlers for:
//! - Users and follows (`/users`)
//! - Posts, feed and likes (`/products`)
//! - Metrics (Prometheus)

mod dto;
pub mod metrics;
mod products;
mod users;

pub use dto::*;

pub use metrics::{metrics_router, track_requests};
pub use products::products_router;
pub use users::users_router;
