//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database and federation operations.

mod outbox;
mod provision;

pub use outbox::{ActivityDocument, OutboxService};
pub use provision::ProvisionService;
