//! SQLite database operations
//!
//! All database access goes through this module.
//! Uniqueness of actors and graph edges is enforced by table constraints,
//! and the outbox write runs in a single transaction.

use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper
pub struct Database {
    pool: Pool<Sqlite>,
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Actors
    // =========================================================================

    /// Whether an actor `(name, domain)` exists
    pub async fn actor_exists(&self, name: &str, domain: &str) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM actors WHERE name = ? AND domain = ?",
        )
        .bind(name)
        .bind(domain)
        .fetch_one(&self.pool)
        .await?;

        Ok(count == 1)
    }

    /// Get an actor by `(name, domain)`
    pub async fn get_actor(&self, name: &str, domain: &str) -> Result<Option<Actor>, AppError> {
        let actor =
            sqlx::query_as::<_, Actor>("SELECT * FROM actors WHERE name = ? AND domain = ?")
                .bind(name)
                .bind(domain)
                .fetch_optional(&self.pool)
                .await?;

        Ok(actor)
    }

    /// Get an actor's internal ID
    pub async fn get_actor_id(&self, name: &str, domain: &str) -> Result<Option<String>, AppError> {
        let id = sqlx::query_scalar::<_, String>(
            "SELECT id FROM actors WHERE name = ? AND domain = ?",
        )
        .bind(name)
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(id)
    }

    /// Get an actor's public key (PEM)
    pub async fn get_actor_public_key(
        &self,
        name: &str,
        domain: &str,
    ) -> Result<Option<String>, AppError> {
        let key = sqlx::query_scalar::<_, String>(
            "SELECT public_key_pem FROM actors WHERE name = ? AND domain = ?",
        )
        .bind(name)
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(key)
    }

    /// Insert an actor unless `(name, domain)` already exists
    ///
    /// # Returns
    /// The stored actor, which is the pre-existing row on conflict.
    pub async fn insert_actor_if_absent(&self, actor: &Actor) -> Result<Actor, AppError> {
        sqlx::query(
            r#"
            INSERT INTO actors (
                id, name, domain, private_key_pem, public_key_pem, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (name, domain) DO NOTHING
            "#,
        )
        .bind(&actor.id)
        .bind(&actor.name)
        .bind(&actor.domain)
        .bind(&actor.private_key_pem)
        .bind(&actor.public_key_pem)
        .bind(actor.created_at)
        .bind(actor.updated_at)
        .execute(&self.pool)
        .await?;

        let stored =
            sqlx::query_as::<_, Actor>("SELECT * FROM actors WHERE name = ? AND domain = ?")
                .bind(&actor.name)
                .bind(&actor.domain)
                .fetch_one(&self.pool)
                .await?;

        Ok(stored)
    }

    /// Count actors hosted under `domain`
    pub async fn count_actors(&self, domain: &str) -> Result<u64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM actors WHERE domain = ?")
            .bind(domain)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    // =========================================================================
    // Follow graph
    // =========================================================================

    /// Record that `follower` follows `actor`, keeping an existing edge
    pub async fn insert_graph_edge_if_absent(
        &self,
        follower: &str,
        actor: &str,
    ) -> Result<GraphEdge, AppError> {
        let now = chrono::Utc::now();
        sqlx::query(
            r#"
            INSERT INTO graph (id, actor, follower, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (actor, follower) DO NOTHING
            "#,
        )
        .bind(EntityId::new().0)
        .bind(actor)
        .bind(follower)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let edge =
            sqlx::query_as::<_, GraphEdge>("SELECT * FROM graph WHERE actor = ? AND follower = ?")
                .bind(actor)
                .bind(follower)
                .fetch_one(&self.pool)
                .await?;

        Ok(edge)
    }

    /// Count followers of `actor`
    pub async fn count_followers(&self, actor: &str) -> Result<u64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM graph WHERE actor = ?")
            .bind(actor)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Follower URIs of `actor`, oldest edge first
    pub async fn get_followers_page(
        &self,
        actor: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<String>, AppError> {
        let followers = sqlx::query_scalar::<_, String>(
            r#"
            SELECT follower FROM graph
            WHERE actor = ?
            ORDER BY created_at ASC, rowid ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(actor)
        .bind(to_sql_int(limit))
        .bind(to_sql_int(offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(followers)
    }

    /// Count actors `follower` follows
    pub async fn count_following(&self, follower: &str) -> Result<u64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM graph WHERE follower = ?")
            .bind(follower)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// URIs of actors `follower` follows, oldest edge first
    pub async fn get_following_page(
        &self,
        follower: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<String>, AppError> {
        let following = sqlx::query_scalar::<_, String>(
            r#"
            SELECT actor FROM graph
            WHERE follower = ?
            ORDER BY created_at ASC, rowid ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(follower)
        .bind(to_sql_int(limit))
        .bind(to_sql_int(offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(following)
    }

    // =========================================================================
    // Outbox
    // =========================================================================

    /// Count public activities published by `actor_id`
    pub async fn count_public_actor_activities(&self, actor_id: &str) -> Result<u64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM actor_activities WHERE actor_id = ? AND public = 1",
        )
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    /// IDs of public activities published by `actor_id`, oldest first
    pub async fn get_public_actor_activity_ids(
        &self,
        actor_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT activity_id FROM actor_activities
            WHERE actor_id = ? AND public = 1
            ORDER BY created_at ASC, rowid ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(actor_id)
        .bind(to_sql_int(limit))
        .bind(to_sql_int(offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Store an activity, its object and the actor join atomically
    ///
    /// Nothing is written unless all three inserts succeed.
    pub async fn insert_outbox_record(&self, record: &OutboxRecord) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO activities (id, payload, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.activity.id)
        .bind(&record.activity.payload)
        .bind(record.activity.created_at)
        .bind(record.activity.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO objects (id, actor_id, payload, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.object.id)
        .bind(&record.object.actor_id)
        .bind(&record.object.payload)
        .bind(record.object.created_at)
        .bind(record.object.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO actor_activities (id, actor_id, activity_id, public, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.actor_activity.id)
        .bind(&record.actor_activity.actor_id)
        .bind(&record.actor_activity.activity_id)
        .bind(record.actor_activity.public)
        .bind(record.actor_activity.created_at)
        .bind(record.actor_activity.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Get a stored activity
    pub async fn get_activity(&self, id: &str) -> Result<Option<Activity>, AppError> {
        let activity = sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(activity)
    }

    /// Get a stored object
    pub async fn get_object(&self, id: &str) -> Result<Option<Object>, AppError> {
        let object = sqlx::query_as::<_, Object>("SELECT * FROM objects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(object)
    }
}
