//! Actor provisioning
//!
//! Seeds the configured local actors and a full follow mesh between them.
//! Safe to run on every start: existing actors keep their keys and
//! existing edges are left alone.

use std::sync::Arc;

use chrono::Utc;

use crate::data::{Actor, Database, EntityId};
use crate::error::AppError;
use crate::federation::{ActorUri, KeyPairProvider};

/// Actor provisioning service
pub struct ProvisionService {
    db: Arc<Database>,
    keys: Arc<dyn KeyPairProvider>,
    domain: String,
}

impl ProvisionService {
    /// Create new provisioning service
    pub fn new(db: Arc<Database>, keys: Arc<dyn KeyPairProvider>, domain: String) -> Self {
        Self { db, keys, domain }
    }

    /// Make sure a local actor named `name` exists
    ///
    /// A keypair is generated only when the actor is missing.
    ///
    /// # Returns
    /// The stored actor
    pub async fn ensure_actor(&self, name: &str) -> Result<Actor, AppError> {
        if let Some(actor) = self.db.get_actor(name, &self.domain).await? {
            tracing::debug!(user = name, domain = %self.domain, "Actor already provisioned");
            return Ok(actor);
        }

        let keypair = self.keys.generate()?;
        let now = Utc::now();
        let actor = Actor {
            id: EntityId::new().0,
            name: name.to_string(),
            domain: self.domain.clone(),
            private_key_pem: keypair.private_key_pem,
            public_key_pem: keypair.public_key_pem,
            created_at: now,
            updated_at: now,
        };

        let stored = self.db.insert_actor_if_absent(&actor).await?;
        tracing::info!(user = name, domain = %self.domain, "Actor provisioned");
        Ok(stored)
    }

    /// Provision every name and make each actor follow every other one
    ///
    /// # Returns
    /// Number of actors hosted under the domain afterwards
    pub async fn provision(&self, names: &[String]) -> Result<u64, AppError> {
        for name in names {
            self.ensure_actor(name).await?;
        }

        let uris: Vec<ActorUri> = names
            .iter()
            .map(|name| ActorUri::new(name, &self.domain))
            .collect();

        for follower in &uris {
            for actor in &uris {
                if follower == actor {
                    continue;
                }
                self.db
                    .insert_graph_edge_if_absent(follower.as_str(), actor.as_str())
                    .await?;
            }
        }

        let total = self.db.count_actors(&self.domain).await?;
        crate::metrics::set_actors_total(total);
        tracing::info!(
            provisioned = names.len(),
            total,
            domain = %self.domain,
            "Provisioning complete"
        );

        Ok(total)
    }
}
