//! API layer
//!
//! HTTP handlers for:
//! - ActivityPub (actors, collections, outbox)
//! - WebFinger discovery
//! - Metrics (Prometheus)

mod activitypub;
pub mod middleware;
pub mod metrics;
mod response;
mod wellknown;

pub use activitypub::activitypub_router;
pub use metrics::metrics_router;
pub use response::{ActivityJson, JrdJson};
pub use wellknown::wellknown_router;
