//! Well-known endpoints
//!
//! - /.well-known/webfinger

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::AppState;
use crate::api::response::JrdJson;
use crate::error::AppError;
use crate::federation::{WebFingerResponse, generate_webfinger_response, parse_resource};
use crate::metrics::WEBFINGER_LOOKUPS_TOTAL;

/// Create well-known router
///
/// Routes:
/// - GET /.well-known/webfinger
pub fn wellknown_router() -> Router<AppState> {
    Router::new().route("/.well-known/webfinger", get(webfinger))
}

/// WebFinger query parameters
#[derive(Debug, Deserialize)]
struct WebFingerQuery {
    resource: Option<String>,
}

/// GET /.well-known/webfinger
///
/// Responds to WebFinger queries for local actors.
///
/// Query: ?resource=acct:user@domain
async fn webfinger(
    State(state): State<AppState>,
    Query(query): Query<WebFingerQuery>,
) -> Result<JrdJson<WebFingerResponse>, AppError> {
    let result = lookup(&state, query.resource.as_deref()).await;

    let outcome = match &result {
        Ok(_) => "found",
        Err(AppError::ActorNotFound) => "not_found",
        Err(AppError::MalformedResource(_)) => "malformed",
        Err(_) => "error",
    };
    WEBFINGER_LOOKUPS_TOTAL.with_label_values(&[outcome]).inc();

    result.map(JrdJson)
}

async fn lookup(state: &AppState, resource: Option<&str>) -> Result<WebFingerResponse, AppError> {
    let resource = resource
        .ok_or_else(|| AppError::MalformedResource("missing resource parameter".to_string()))?;
    let domain = &state.config.server.domain;

    let account = parse_resource(resource, domain).inspect_err(|e| {
        tracing::debug!(resource, error = %e, "Rejected webfinger resource");
    })?;

    if !state.db.actor_exists(&account.user, domain).await? {
        tracing::debug!(user = %account.user, domain = %domain, "Webfinger lookup for unknown actor");
        return Err(AppError::ActorNotFound);
    }

    Ok(generate_webfinger_response(&account.user, domain))
}
