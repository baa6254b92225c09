//! Data models
//!
//! Rust structs representing database rows.
//! All models use UUIDv4 for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (hyphenated UUIDv4, 36 characters)
///
/// Example: "67e55044-10b1-426f-9247-bb680e5fe0c8"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new UUIDv4
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Actor
// =============================================================================

/// A local actor
///
/// `(name, domain)` is unique. The private key never leaves the node.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub domain: String,
    /// RSA private key (PEM format)
    #[serde(skip_serializing)]
    pub private_key_pem: String,
    /// RSA public key (PEM format)
    pub public_key_pem: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Graph
// =============================================================================

/// Directed follow edge: `follower` follows `actor`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GraphEdge {
    pub id: String,
    /// URI of the followed actor
    pub actor: String,
    /// URI of the following actor
    pub follower: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Activities
// =============================================================================

/// Activity envelope as published by a local actor
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    pub id: String,
    /// Normalized JSON document
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Object carried by an activity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Object {
    pub id: String,
    /// Attributed actor
    pub actor_id: String,
    /// Normalized JSON document
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Links an activity to its publishing actor
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActorActivity {
    pub id: String,
    pub actor_id: String,
    pub activity_id: String,
    /// Listed in the actor's outbox collection
    pub public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rows written together for one outbox submission
#[derive(Debug, Clone)]
pub struct OutboxRecord {
    pub activity: Activity,
    pub object: Object,
    pub actor_activity: ActorActivity,
}
