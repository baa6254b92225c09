//! Outbox service
//!
//! Turns a document submitted to an actor's outbox into a stored
//! Activity and Object.
//!
//! # Pipeline
//! 1. Resolve the publishing actor
//! 2. Parse the body as a JSON object
//! 3. Compact against the ActivityStreams context
//! 4. Validate the Note shape
//! 5. Split off the embedded Object
//! 6. Assign activity and object URIs
//! 7. Persist activity, object and actor join in one transaction
//! 8. Return the activity with the built object embedded

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::data::{Activity, ActorActivity, Database, EntityId, Object, OutboxRecord};
use crate::error::AppError;
use crate::federation::{ActorUri, Compactor, activity_uri, base_context, object_uri};

/// Object types accepted by the outbox
const SUPPORTED_TYPES: &[&str] = &["Note"];

/// Wire form of a submitted activity
///
/// Only the keys the pipeline inspects are named; everything else is
/// carried through untouched in `extra`. A submitted `id` of any shape is
/// replaced by the minted activity URI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub to: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub cc: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `Some` for any present key, so an explicit `null` survives
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ActivityDocument {
    /// Read a compacted document
    pub fn from_value(document: Value) -> Result<Self, AppError> {
        serde_json::from_value(document).map_err(|e| AppError::ValidationFailed(e.to_string()))
    }

    /// Check the minimal shape of a publishable Note
    pub fn validate(&self) -> Result<(), AppError> {
        match self.kind.as_deref() {
            Some(kind) if SUPPORTED_TYPES.contains(&kind) => {}
            Some(kind) => {
                return Err(AppError::ValidationFailed(format!(
                    "unsupported type {kind}"
                )));
            }
            None => return Err(AppError::ValidationFailed("missing type".to_string())),
        }

        if self.published.as_deref().is_none_or(str::is_empty) {
            return Err(AppError::ValidationFailed(
                "published must be a non-empty string".to_string(),
            ));
        }
        if self.content.as_deref().is_none_or(str::is_empty) {
            return Err(AppError::ValidationFailed(
                "content must be a non-empty string".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the embedded object
    ///
    /// A submitted `object` map is kept as the base and the Note fields
    /// are written over it.
    pub fn build_object(&self) -> Map<String, Value> {
        let mut object = match &self.object {
            Some(Value::Object(base)) => base.clone(),
            _ => Map::new(),
        };

        let fields = [
            ("type", self.kind.clone().map(Value::String)),
            ("content", self.content.clone().map(Value::String)),
            ("published", self.published.clone().map(Value::String)),
            ("to", self.to.clone()),
            ("cc", self.cc.clone()),
            ("bcc", self.bcc.clone()),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                object.insert(key.to_string(), value);
            }
        }

        object
    }
}

/// Outbox service
pub struct OutboxService {
    db: Arc<Database>,
    compactor: Arc<dyn Compactor>,
    domain: String,
}

impl OutboxService {
    /// Create new outbox service
    pub fn new(db: Arc<Database>, compactor: Arc<dyn Compactor>, domain: String) -> Self {
        Self {
            db,
            compactor,
            domain,
        }
    }

    /// Accept a submission to `user`'s outbox
    ///
    /// # Returns
    /// The stored activity document
    ///
    /// # Errors
    /// - `MalformedBody` if the body is not a JSON object
    /// - `ValidationFailed` if the document is not a publishable Note
    /// - 5xx variants for missing actors, compaction and storage failures
    pub async fn submit(&self, user: &str, body: &[u8]) -> Result<Value, AppError> {
        // 1. Resolve actor. The existence gate has already admitted `user`.
        let actor_id = self
            .db
            .get_actor_id(user, &self.domain)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "actor {}@{} has no id",
                    user,
                    self.domain
                ))
            })?;
        let actor = ActorUri::new(user, &self.domain);

        // 2. Parse
        let parsed: Value =
            serde_json::from_slice(body).map_err(|e| AppError::MalformedBody(e.to_string()))?;
        if !parsed.is_object() {
            return Err(AppError::MalformedBody(
                "document must be a JSON object".to_string(),
            ));
        }

        // 3. Compact
        let compacted = self.compactor.compact(parsed, &base_context())?;

        // 4. Validate
        let mut document = ActivityDocument::from_value(compacted)?;
        document.validate()?;

        // 5. Decompose
        let mut object = document.build_object();

        // 6. Assign identifiers
        let activity_id = EntityId::new();
        let object_id = EntityId::new();
        document.id = Some(Value::String(activity_uri(&self.domain, &activity_id.0)));
        object.insert(
            "id".to_string(),
            Value::String(object_uri(&self.domain, &object_id.0)),
        );
        object.insert(
            "attributedTo".to_string(),
            Value::String(actor.as_str().to_string()),
        );
        let object = Value::Object(object);
        document.object = Some(object.clone());

        // 7. Persist
        let activity =
            serde_json::to_value(&document).map_err(|e| AppError::Internal(e.into()))?;
        let now = Utc::now();
        let record = OutboxRecord {
            activity: Activity {
                id: activity_id.0.clone(),
                payload: activity.to_string(),
                created_at: now,
                updated_at: now,
            },
            object: Object {
                id: object_id.0.clone(),
                actor_id: actor_id.clone(),
                payload: object.to_string(),
                created_at: now,
                updated_at: now,
            },
            actor_activity: ActorActivity {
                id: EntityId::new().0,
                actor_id,
                activity_id: activity_id.0.clone(),
                public: true,
                created_at: now,
                updated_at: now,
            },
        };
        self.db.insert_outbox_record(&record).await?;

        tracing::info!(
            user,
            domain = %self.domain,
            activity_id = %activity_id,
            object_id = %object_id,
            "Outbox activity stored"
        );

        // 8. Respond
        Ok(activity)
    }
}
