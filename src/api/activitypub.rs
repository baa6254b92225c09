//! ActivityPub endpoints
//!
//! - Actor profile
//! - Outbox (listing and submission)
//! - Followers/Following collections
//!
//! Every route here sits behind the media type gate and the local actor gate.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::{
    Router,
    extract::{Path, Query, State},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use serde_json::{Value, json};

use crate::AppState;
use crate::api::middleware::{require_activity_media_type, require_local_actor};
use crate::api::response::ActivityJson;
use crate::data::Database;
use crate::error::AppError;
use crate::federation::{
    ActorUri, Collection, CollectionKind, CollectionSource, actor_context, activity_uri,
};
use crate::metrics::{COLLECTION_REQUESTS_TOTAL, OUTBOX_SUBMISSIONS_TOTAL};
use crate::service::OutboxService;

/// Create ActivityPub router
///
/// Routes:
/// - GET /users/:user - Actor profile
/// - GET /users/:user/followers - Followers collection
/// - GET /users/:user/following - Following collection
/// - GET /users/:user/outbox - Outbox collection
/// - POST /users/:user/outbox - Publish a Note
pub fn activitypub_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/:user", get(actor))
        .route("/users/:user/followers", get(followers))
        .route("/users/:user/following", get(following))
        .route("/users/:user/outbox", get(outbox).post(submit_outbox))
        .route_layer(from_fn_with_state(state, require_local_actor))
        .route_layer(from_fn(require_activity_media_type))
}

/// Query pairs of a collection request
///
/// Kept as a list so a repeated `page` never rejects the request.
type PageQuery = Vec<(String, String)>;

/// First `page` value, if any
fn page_param(query: &[(String, String)]) -> Option<&str> {
    query
        .iter()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.as_str())
}

// =============================================================================
// Collection sources
// =============================================================================

/// Actors following `actor`
struct FollowersSource<'a> {
    db: &'a Database,
    actor: &'a ActorUri,
}

#[async_trait]
impl CollectionSource for FollowersSource<'_> {
    async fn count(&self) -> Result<u64, AppError> {
        self.db.count_followers(self.actor.as_str()).await
    }

    async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<String>, AppError> {
        self.db
            .get_followers_page(self.actor.as_str(), offset, limit)
            .await
    }
}

/// Actors `actor` follows
struct FollowingSource<'a> {
    db: &'a Database,
    actor: &'a ActorUri,
}

#[async_trait]
impl CollectionSource for FollowingSource<'_> {
    async fn count(&self) -> Result<u64, AppError> {
        self.db.count_following(self.actor.as_str()).await
    }

    async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<String>, AppError> {
        self.db
            .get_following_page(self.actor.as_str(), offset, limit)
            .await
    }
}

/// Public activities published by an actor, as activity URIs
struct OutboxSource<'a> {
    db: &'a Database,
    actor_id: &'a str,
    domain: &'a str,
}

#[async_trait]
impl CollectionSource for OutboxSource<'_> {
    async fn count(&self) -> Result<u64, AppError> {
        self.db.count_public_actor_activities(self.actor_id).await
    }

    async fn fetch(&self, offset: u64, limit: u64) -> Result<Vec<String>, AppError> {
        let ids = self
            .db
            .get_public_actor_activity_ids(self.actor_id, offset, limit)
            .await?;
        Ok(ids
            .iter()
            .map(|id| activity_uri(self.domain, id))
            .collect())
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /users/:user
///
/// Returns the Person document, including the actor's public key.
async fn actor(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<ActivityJson<Value>, AppError> {
    let domain = &state.config.server.domain;
    let public_key_pem = state
        .db
        .get_actor_public_key(&user, domain)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("actor {}@{} has no public key", user, domain))
        })
        .inspect_err(|e| tracing::error!(user = %user, domain = %domain, error = %e, "Actor lookup failed"))?;

    let uri = ActorUri::new(&user, domain);
    let document = json!({
        "type": "Person",
        "id": uri.as_str(),
        "preferredUsername": user,
        "url": uri.as_str(),
        "inbox": uri.inbox(),
        "outbox": uri.outbox(),
        "followers": uri.followers(),
        "following": uri.following(),
        "publicKey": {
            "id": uri.main_key(),
            "owner": uri.as_str(),
            "publicKeyPem": public_key_pem
        }
    });

    let document = state.compactor.compact(document, &actor_context())?;
    Ok(ActivityJson(document))
}

/// GET /users/:user/followers
async fn followers(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<ActivityJson<Value>, AppError> {
    let domain = &state.config.server.domain;
    let actor = ActorUri::new(&user, domain);
    let source = FollowersSource {
        db: &state.db,
        actor: &actor,
    };

    render_collection(&state, CollectionKind::Followers, actor.clone(), &source, query)
        .await
        .inspect_err(|e| tracing::error!(user = %user, domain = %domain, error = %e, "Followers collection failed"))
}

/// GET /users/:user/following
async fn following(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<ActivityJson<Value>, AppError> {
    let domain = &state.config.server.domain;
    let actor = ActorUri::new(&user, domain);
    let source = FollowingSource {
        db: &state.db,
        actor: &actor,
    };

    render_collection(&state, CollectionKind::Following, actor.clone(), &source, query)
        .await
        .inspect_err(|e| tracing::error!(user = %user, domain = %domain, error = %e, "Following collection failed"))
}

/// GET /users/:user/outbox
///
/// Only public activities are listed.
async fn outbox(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<ActivityJson<Value>, AppError> {
    let domain = &state.config.server.domain;
    let actor_id = state.db.get_actor_id(&user, domain).await?.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("actor {}@{} has no id", user, domain))
    })?;
    let source = OutboxSource {
        db: &state.db,
        actor_id: &actor_id,
        domain,
    };

    render_collection(
        &state,
        CollectionKind::Outbox,
        ActorUri::new(&user, domain),
        &source,
        query,
    )
    .await
    .inspect_err(|e| tracing::error!(user = %user, domain = %domain, error = %e, "Outbox collection failed"))
}

async fn render_collection<S>(
    state: &AppState,
    kind: CollectionKind,
    actor: ActorUri,
    source: &S,
    query: PageQuery,
) -> Result<ActivityJson<Value>, AppError>
where
    S: CollectionSource,
{
    let collection = Collection::new(kind, actor);
    let page = page_param(&query);
    let document_kind = match page {
        Some(raw) if !raw.is_empty() => "page",
        _ => "index",
    };

    let document = state.paginator.render(&collection, source, page).await?;

    COLLECTION_REQUESTS_TOTAL
        .with_label_values(&[kind.as_str(), document_kind])
        .inc();

    Ok(ActivityJson(document))
}

/// POST /users/:user/outbox
///
/// Accepts a Note and answers with the stored activity.
async fn submit_outbox(
    State(state): State<AppState>,
    Path(user): Path<String>,
    body: Bytes,
) -> Result<ActivityJson<Value>, AppError> {
    let domain = state.config.server.domain.clone();
    let service = OutboxService::new(state.db.clone(), state.compactor.clone(), domain.clone());

    match service.submit(&user, &body).await {
        Ok(activity) => {
            OUTBOX_SUBMISSIONS_TOTAL
                .with_label_values(&["accepted"])
                .inc();
            Ok(ActivityJson(activity))
        }
        Err(e) => {
            OUTBOX_SUBMISSIONS_TOTAL
                .with_label_values(&["rejected"])
                .inc();
            tracing::warn!(user = %user, domain = %domain, error = %e, "Outbox submission rejected");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> PageQuery {
        raw.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn first_page_value_wins() {
        assert_eq!(page_param(&pairs(&[("page", "abc"), ("page", "2")])), Some("abc"));
        assert_eq!(page_param(&pairs(&[("other", "x"), ("page", "3")])), Some("3"));
        assert_eq!(page_param(&pairs(&[("page", "")])), Some(""));
        assert_eq!(page_param(&pairs(&[("other", "x")])), None);
    }
}
